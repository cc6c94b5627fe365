//! Core data types for the Conscient engine
//!
//! Posts and interaction samples come in from the host application; the three
//! score vectors and the pattern points flow out of the engine and into the
//! persistence gateway. JSON keys follow the host catalog format (camelCase
//! for posts and interactions, snake_case for score fields, epoch
//! milliseconds for timestamps).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clamp a score to the unit interval. NaN collapses to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Kind of content item in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Headline,
    Video,
    Image,
}

/// Facial expression tagged on a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Shocked,
    Happy,
    Sad,
}

/// Pre-computed visual tags of a post thumbnail
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Colour saturation (0-1)
    pub saturation: f64,
    /// Number of detected faces
    #[serde(default)]
    pub faces: u32,
    /// Dominant facial expression
    #[serde(default)]
    pub expression: Expression,
}

/// Pre-computed audio tags (video posts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFlag {
    /// Tense music or voice-over detected
    #[serde(default)]
    pub high_tension: bool,
    /// Speech rate relative to normal (1.0)
    #[serde(rename = "speechRate", default = "default_speech_rate")]
    pub speech_rate: f64,
}

fn default_speech_rate() -> f64 {
    1.0
}

impl Default for AudioFlag {
    fn default() -> Self {
        Self {
            high_tension: false,
            speech_rate: default_speech_rate(),
        }
    }
}

/// A feed item with its pre-tagged linguistic and visual attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thumbnail: Thumbnail,
    #[serde(default)]
    pub audio_flag: AudioFlag,
    /// Count of emphatic punctuation runs ("!!", "?!")
    #[serde(default)]
    pub punctuation_intensity: u32,
    /// Count of ALL-CAPS words
    #[serde(default)]
    pub caps_intensity: u32,
    /// Clickbait phrases found by the tagger, in order of appearance
    #[serde(default)]
    pub clickbait_words: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Tagger estimate of one-sided wording (0-1)
    #[serde(default)]
    pub bias_score: f64,
}

/// Scroll speed observed while the post was on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollSpeed {
    Fast,
    Slow,
    #[default]
    Normal,
}

/// Behavioral signal for one viewing of a post
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMetrics {
    /// Time the post stayed on screen, in milliseconds
    #[serde(default)]
    pub dwell_time_ms: f64,
    #[serde(default)]
    pub tap_count: u32,
    #[serde(default)]
    pub scroll_speed: ScrollSpeed,
    #[serde(rename = "clickedWithin2s", default)]
    pub clicked_within_2s: bool,
    /// How many times the post was opened
    #[serde(default)]
    pub open_count: u32,
}

impl InteractionMetrics {
    /// The fixed viewing sample the feed uses when no telemetry is captured:
    /// 4 s dwell, one tap, normal scroll, clicked within 2 s, opened once.
    pub fn simulated() -> Self {
        Self {
            dwell_time_ms: 4000.0,
            tap_count: 1,
            scroll_speed: ScrollSpeed::Normal,
            clicked_within_2s: true,
            open_count: 1,
        }
    }
}

/// Persuasion axes scored per post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceAxis {
    Fear,
    Urgency,
    Hype,
    Authority,
    Curiosity,
    VisualHype,
}

impl InfluenceAxis {
    /// All axes in declaration order
    pub const ALL: [InfluenceAxis; 6] = [
        InfluenceAxis::Fear,
        InfluenceAxis::Urgency,
        InfluenceAxis::Hype,
        InfluenceAxis::Authority,
        InfluenceAxis::Curiosity,
        InfluenceAxis::VisualHype,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InfluenceAxis::Fear => "fear",
            InfluenceAxis::Urgency => "urgency",
            InfluenceAxis::Hype => "hype",
            InfluenceAxis::Authority => "authority",
            InfluenceAxis::Curiosity => "curiosity",
            InfluenceAxis::VisualHype => "visual_hype",
        }
    }
}

/// Detected persuasion-cue intensities for one post (all fields 0-1).
///
/// The same shape is used for the persisted vulnerability profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InfluenceVector {
    pub fear: f64,
    pub urgency: f64,
    pub hype: f64,
    pub authority: f64,
    pub curiosity: f64,
    pub visual_hype: f64,
}

impl InfluenceVector {
    pub fn get(&self, axis: InfluenceAxis) -> f64 {
        match axis {
            InfluenceAxis::Fear => self.fear,
            InfluenceAxis::Urgency => self.urgency,
            InfluenceAxis::Hype => self.hype,
            InfluenceAxis::Authority => self.authority,
            InfluenceAxis::Curiosity => self.curiosity,
            InfluenceAxis::VisualHype => self.visual_hype,
        }
    }

    pub fn get_mut(&mut self, axis: InfluenceAxis) -> &mut f64 {
        match axis {
            InfluenceAxis::Fear => &mut self.fear,
            InfluenceAxis::Urgency => &mut self.urgency,
            InfluenceAxis::Hype => &mut self.hype,
            InfluenceAxis::Authority => &mut self.authority,
            InfluenceAxis::Curiosity => &mut self.curiosity,
            InfluenceAxis::VisualHype => &mut self.visual_hype,
        }
    }

    /// `(name, value)` pairs in declaration order
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        InfluenceAxis::ALL.map(|axis| (axis.name(), self.get(axis)))
    }

    /// Apply `f` to every field
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut out = *self;
        for axis in InfluenceAxis::ALL {
            *out.get_mut(axis) = f(self.get(axis));
        }
        out
    }

    /// Apply `f` to each pair of matching fields
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut out = Self::default();
        for axis in InfluenceAxis::ALL {
            *out.get_mut(axis) = f(self.get(axis), other.get(axis));
        }
        out
    }

    pub fn mean(&self) -> f64 {
        self.entries().iter().map(|(_, v)| v).sum::<f64>() / 6.0
    }
}

/// Structural framing distortion for one post (all fields 0-1).
///
/// The same shape is used for the persisted distortion profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistortionVector {
    pub emotional_overload: f64,
    pub selective_framing: f64,
    pub narrative_skew: f64,
}

impl DistortionVector {
    /// `(name, value)` pairs in declaration order
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            ("emotional_overload", self.emotional_overload),
            ("selective_framing", self.selective_framing),
            ("narrative_skew", self.narrative_skew),
        ]
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            emotional_overload: f(self.emotional_overload),
            selective_framing: f(self.selective_framing),
            narrative_skew: f(self.narrative_skew),
        }
    }

    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            emotional_overload: f(self.emotional_overload, other.emotional_overload),
            selective_framing: f(self.selective_framing, other.selective_framing),
            narrative_skew: f(self.narrative_skew, other.narrative_skew),
        }
    }

    pub fn mean(&self) -> f64 {
        (self.emotional_overload + self.selective_framing + self.narrative_skew) / 3.0
    }
}

/// Simulated reaction to one viewing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseVector {
    pub engagement: f64,
    pub hesitation: f64,
    pub fixation: f64,
    /// 1.0 when the post was clicked within two seconds, else 0.0
    pub clickbait_response: f64,
}

impl ResponseVector {
    /// Mean of the four response components
    pub fn magnitude(&self) -> f64 {
        (self.engagement + self.hesitation + self.fixation + self.clickbait_response) / 4.0
    }
}

/// Immutable result of analyzing one post viewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub influence_vector: InfluenceVector,
    pub distortion_vector: DistortionVector,
    pub response_vector: ResponseVector,
    pub explanation: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub post_id: String,
}

/// One point of the echo-risk / exposure-health time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratedPattern {
    /// Mean of the influence vector for the event
    pub influence: f64,
    /// Mean of the distortion vector for the event
    pub distortion: f64,
    pub echo_risk: f64,
    pub exposure_health: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Entry of the interaction event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub post_id: String,
    pub interaction: InteractionMetrics,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Dashboard view of the accumulated state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub vulnerability: InfluenceVector,
    pub distortion: DistortionVector,
    pub pattern: Vec<IntegratedPattern>,
    pub history_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_post_parses_catalog_format() {
        let json = r#"{
            "id": "post-3",
            "type": "image",
            "title": "Only 2 hours left to claim the scholarship!",
            "text": "Limited seats, apply immediately.",
            "thumbnail": { "saturation": 0.8, "faces": 0, "expression": "neutral" },
            "audioFlag": { "high_tension": true, "speechRate": 1.2 },
            "punctuationIntensity": 1,
            "capsIntensity": 1,
            "clickbaitWords": ["only 2 hours", "limited"],
            "timestamp": 1700000000000,
            "biasScore": 0.6
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.post_type, PostType::Image);
        assert!(post.audio_flag.high_tension);
        assert_eq!(post.audio_flag.speech_rate, 1.2);
        assert_eq!(post.clickbait_words.len(), 2);
        assert_eq!(post.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert!(post.image_url.is_none());
    }

    #[test]
    fn test_interaction_wire_names() {
        let metrics = InteractionMetrics::simulated();
        let value = serde_json::to_value(&metrics).unwrap();

        assert_eq!(value["dwellTimeMs"], 4000.0);
        assert_eq!(value["tapCount"], 1);
        assert_eq!(value["scrollSpeed"], "normal");
        assert_eq!(value["clickedWithin2s"], true);
        assert_eq!(value["openCount"], 1);
    }

    #[test]
    fn test_influence_entries_follow_declaration_order() {
        let vector = InfluenceVector {
            fear: 0.1,
            urgency: 0.2,
            hype: 0.3,
            authority: 0.4,
            curiosity: 0.5,
            visual_hype: 0.6,
        };
        let names: Vec<&str> = vector.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["fear", "urgency", "hype", "authority", "curiosity", "visual_hype"]
        );
        assert!((vector.mean() - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_response_magnitude() {
        let response = ResponseVector {
            engagement: 0.5,
            hesitation: 0.1,
            fixation: 0.4,
            clickbait_response: 1.0,
        };
        assert!((response.magnitude() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
