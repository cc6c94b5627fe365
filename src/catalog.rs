//! Demonstration post catalog
//!
//! The ten pre-tagged posts shown in the Boundier sample feed. Timestamps are
//! relative to the time the catalog is built.

use crate::types::{AudioFlag, Expression, Post, PostType, Thumbnail};
use chrono::{DateTime, Duration, Utc};

struct Entry {
    id: &'static str,
    post_type: PostType,
    title: &'static str,
    text: &'static str,
    saturation: f64,
    faces: u32,
    expression: Expression,
    high_tension: bool,
    speech_rate: f64,
    punctuation_intensity: u32,
    caps_intensity: u32,
    clickbait_words: &'static [&'static str],
    age: Duration,
    image_url: Option<&'static str>,
    bias_score: f64,
}

fn entries() -> [Entry; 10] {
    [
        Entry {
            id: "post-1",
            post_type: PostType::Headline,
            title: "Experts warn board exams may be harder this year",
            text: "New study suggests changing patterns will increase difficulty.",
            saturation: 0.2,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &[],
            age: Duration::hours(3),
            image_url: Some("stock/student_taking_exam.jpg"),
            bias_score: 0.2,
        },
        Entry {
            id: "post-2",
            post_type: PostType::Video,
            title: "This ONE trick will ruin your exam score — watch now!",
            text: "Students accidentally ignore this crucial step.",
            saturation: 0.9,
            faces: 1,
            expression: Expression::Shocked,
            high_tension: true,
            speech_rate: 1.4,
            punctuation_intensity: 2,
            caps_intensity: 1,
            clickbait_words: &["one trick", "ruin", "watch now"],
            age: Duration::days(1),
            image_url: Some("stock/shocked_student.jpg"),
            bias_score: 0.8,
        },
        Entry {
            id: "post-3",
            post_type: PostType::Image,
            title: "Only 2 hours left to claim the scholarship!",
            text: "Limited seats, apply immediately.",
            saturation: 0.8,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: true,
            speech_rate: 1.2,
            punctuation_intensity: 1,
            caps_intensity: 1,
            clickbait_words: &["only 2 hours", "limited"],
            age: Duration::hours(10),
            image_url: Some("stock/graduation_scholarship.jpg"),
            bias_score: 0.6,
        },
        Entry {
            id: "post-4",
            post_type: PostType::Headline,
            title: "You won’t believe what happened at the exam center...",
            text: "A bizarre turn of events shocked students.",
            saturation: 0.85,
            faces: 1,
            expression: Expression::Shocked,
            high_tension: true,
            speech_rate: 1.6,
            punctuation_intensity: 3,
            caps_intensity: 0,
            clickbait_words: &["you won't believe", "shocking"],
            age: Duration::days(4),
            image_url: Some("stock/student_taking_exam.jpg"),
            bias_score: 0.9,
        },
        Entry {
            id: "post-5",
            post_type: PostType::Image,
            title: "How study groups helped me improve",
            text: "A student shares practical tips with evidence.",
            saturation: 0.25,
            faces: 2,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 0.95,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &[],
            age: Duration::days(2),
            image_url: Some("stock/group_of_students.jpg"),
            bias_score: 0.1,
        },
        Entry {
            id: "post-6",
            post_type: PostType::Video,
            title: "Survey: Teachers reveal the top mistakes students make",
            text: "Research-based suggestions inside.",
            saturation: 0.3,
            faces: 1,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &["survey", "reveal"],
            age: Duration::days(5),
            image_url: Some("stock/classroom_teacher.jpg"),
            bias_score: 0.3,
        },
        Entry {
            id: "post-7",
            post_type: PostType::Headline,
            title: "People like you are skipping this chapter — experts say",
            text: "Identity framing and pressure to conform.",
            saturation: 0.4,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &["people like you"],
            age: Duration::hours(6),
            image_url: Some("stock/student_taking_exam.jpg"),
            bias_score: 0.7,
        },
        Entry {
            id: "post-8",
            post_type: PostType::Image,
            title: "Beautiful sunset at the campus today 🌅",
            text: "Just taking a moment to appreciate the view after a long day of classes.",
            saturation: 0.6,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &[],
            age: Duration::hours(2),
            image_url: None,
            bias_score: 0.0,
        },
        Entry {
            id: "post-9",
            post_type: PostType::Headline,
            title: "Coffee shop recommendations near the library?",
            text: "Looking for a quiet place to study with good wifi. Any suggestions?",
            saturation: 0.1,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &[],
            age: Duration::minutes(30),
            image_url: None,
            bias_score: 0.0,
        },
        Entry {
            id: "post-10",
            post_type: PostType::Image,
            title: "My new setup for coding!",
            text: "Finally upgraded my monitor. Productivity boost incoming.",
            saturation: 0.4,
            faces: 0,
            expression: Expression::Neutral,
            high_tension: false,
            speech_rate: 1.0,
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: &[],
            age: Duration::hours(5),
            image_url: None,
            bias_score: 0.0,
        },
    ]
}

impl Entry {
    fn to_post(&self, now: DateTime<Utc>) -> Post {
        Post {
            id: self.id.to_string(),
            post_type: self.post_type,
            title: self.title.to_string(),
            text: self.text.to_string(),
            thumbnail: Thumbnail {
                saturation: self.saturation,
                faces: self.faces,
                expression: self.expression,
            },
            audio_flag: AudioFlag {
                high_tension: self.high_tension,
                speech_rate: self.speech_rate,
            },
            punctuation_intensity: self.punctuation_intensity,
            caps_intensity: self.caps_intensity,
            clickbait_words: self.clickbait_words.iter().map(|w| w.to_string()).collect(),
            timestamp: now - self.age,
            image_url: self.image_url.map(str::to_string),
            bias_score: self.bias_score,
        }
    }
}

/// The sample feed, timestamped relative to `now`
pub fn sample_posts_at(now: DateTime<Utc>) -> Vec<Post> {
    entries().iter().map(|e| e.to_post(now)).collect()
}

/// The sample feed, timestamped relative to the current time
pub fn sample_posts() -> Vec<Post> {
    sample_posts_at(Utc::now())
}

/// Look up a sample post by id
pub fn find(id: &str) -> Option<Post> {
    let now = Utc::now();
    entries().iter().find(|e| e.id == id).map(|e| e.to_post(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PostScorer;
    use crate::types::InteractionMetrics;

    #[test]
    fn test_catalog_ids_are_unique() {
        let posts = sample_posts();
        assert_eq!(posts.len(), 10);
        let mut ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_find_unknown_id() {
        assert!(find("post-404").is_none());
        assert_eq!(find("post-7").unwrap().bias_score, 0.7);
    }

    #[test]
    fn test_neutral_posts_score_low() {
        let scorer = PostScorer::default();
        let interaction = InteractionMetrics::simulated();

        // "today" is an urgency word; nothing else should fire
        let sunset = scorer.analyze(&find("post-8").unwrap(), &interaction);
        assert!((sunset.influence_vector.urgency - 0.5).abs() < 1e-9);
        assert_eq!(sunset.influence_vector.fear, 0.0);
        assert_eq!(sunset.distortion_vector.narrative_skew, 0.0);

        let coffee = scorer.analyze(&find("post-9").unwrap(), &interaction);
        assert!((coffee.influence_vector.curiosity - 0.4).abs() < 1e-9);
        assert_eq!(coffee.influence_vector.hype, 0.0);
    }

    #[test]
    fn test_timestamps_relative_to_now() {
        let now = Utc::now();
        let posts = sample_posts_at(now);
        assert_eq!(posts[0].timestamp, now - Duration::hours(3));
        assert!(posts.iter().all(|p| p.timestamp < now));
    }
}
