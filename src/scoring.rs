//! Post scoring
//!
//! Turns a post and one interaction sample into influence, distortion and
//! response vectors plus a one-line explanation. Scoring is pure: the only
//! input not taken from the arguments is the result timestamp, and
//! [`PostScorer::analyze_at`] takes that explicitly too.

use crate::rules::RuleSet;
use crate::types::{
    clamp_unit, AnalysisResult, DistortionVector, InfluenceVector, InteractionMetrics, Post,
    ResponseVector,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Dwell time at which engagement saturates (8 s)
const ENGAGEMENT_SATURATION_MS: f64 = 8000.0;

/// Dwell time at which fixation saturates (6 s)
const FIXATION_SATURATION_MS: f64 = 6000.0;

/// Dwell below this with a tap reads as a hesitant bounce
const HESITATION_DWELL_MS: f64 = 300.0;

const HESITANT: f64 = 0.6;
const BASELINE_HESITATION: f64 = 0.1;

/// Scorer for posts, driven by a cue rule table
#[derive(Debug, Clone, Default)]
pub struct PostScorer {
    rules: RuleSet,
}

impl PostScorer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Analyze one viewing, stamped with the current time
    pub fn analyze(&self, post: &Post, interaction: &InteractionMetrics) -> AnalysisResult {
        self.analyze_at(post, interaction, Utc::now())
    }

    /// Analyze one viewing with an explicit timestamp
    pub fn analyze_at(
        &self,
        post: &Post,
        interaction: &InteractionMetrics,
        at: DateTime<Utc>,
    ) -> AnalysisResult {
        let influence = self.rules.score(post);
        let distortion = compute_distortion(post, &influence);
        let response = compute_response(interaction);
        let explanation = explain(&influence, &distortion);

        tracing::debug!(
            post_id = %post.id,
            fear = influence.fear,
            hype = influence.hype,
            narrative_skew = distortion.narrative_skew,
            "analyzed post"
        );

        AnalysisResult {
            influence_vector: influence,
            distortion_vector: distortion,
            response_vector: response,
            explanation,
            timestamp: at,
            post_id: post.id.clone(),
        }
    }
}

/// Derive framing distortion from the influence scores and the post's bias tag
///
/// Formulas:
/// ```text
/// emotional_overload = (fear + hype + urgency) / 3 + 0.2 if any emphatic punctuation
/// selective_framing  = 0.5 * authority + 0.5 * (fear + hype)
/// narrative_skew     = 1.2 * bias_score
/// ```
pub fn compute_distortion(post: &Post, influence: &InfluenceVector) -> DistortionVector {
    let punctuation_boost = if post.punctuation_intensity > 0 { 0.2 } else { 0.0 };

    DistortionVector {
        emotional_overload: clamp_unit(
            (influence.fear + influence.hype + influence.urgency) / 3.0 + punctuation_boost,
        ),
        selective_framing: clamp_unit(
            influence.authority * 0.5 + (influence.fear + influence.hype) * 0.5,
        ),
        narrative_skew: clamp_unit(post.bias_score * 1.2),
    }
}

/// Derive the simulated response from interaction timing and counts
pub fn compute_response(interaction: &InteractionMetrics) -> ResponseVector {
    let dwell = interaction.dwell_time_ms;

    let engagement = clamp_unit(dwell / ENGAGEMENT_SATURATION_MS);

    let hesitation = if dwell < HESITATION_DWELL_MS && interaction.tap_count > 0 {
        HESITANT
    } else {
        BASELINE_HESITATION
    };

    let fixation = if interaction.open_count > 1 || dwell > FIXATION_SATURATION_MS {
        1.0
    } else {
        clamp_unit(dwell / FIXATION_SATURATION_MS)
    };

    let clickbait_response = if interaction.clicked_within_2s { 1.0 } else { 0.0 };

    ResponseVector {
        engagement,
        hesitation,
        fixation,
        clickbait_response,
    }
}

/// Rank `(name, score)` pairs highest first; ties keep declaration order
fn ranked<const N: usize>(entries: [(&'static str, f64); N]) -> Vec<&'static str> {
    let mut entries = entries.to_vec();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries.into_iter().map(|(name, _)| name).collect()
}

/// One-line summary naming the two strongest cues and the strongest distortion
pub fn explain(influence: &InfluenceVector, distortion: &DistortionVector) -> String {
    let top_cues = ranked(influence.entries());
    let top_distortion = ranked(distortion.entries())
        .first()
        .map(|name| name.replace('_', " "))
        .unwrap_or_default();

    format!(
        "Detected high {} cues. Distortion signal: {}.",
        top_cues[..2].join(" & "),
        top_distortion
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::types::{AudioFlag, Expression, PostType, ScrollSpeed, Thumbnail};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn empty_post() -> Post {
        Post {
            id: "empty".to_string(),
            post_type: PostType::Headline,
            title: String::new(),
            text: String::new(),
            thumbnail: Thumbnail::default(),
            audio_flag: AudioFlag::default(),
            punctuation_intensity: 0,
            caps_intensity: 0,
            clickbait_words: vec![],
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap(),
            image_url: None,
            bias_score: 0.0,
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_one_trick_post_scores() {
        let post = catalog::find("post-2").unwrap();
        let result =
            PostScorer::default().analyze_at(&post, &InteractionMetrics::simulated(), fixed_time());

        let influence = result.influence_vector;
        // alarm word + high tension + shocked face
        assert!((influence.fear - 1.0).abs() < 1e-9);
        // "now", emphasis, saturation 0.9
        assert!((influence.urgency - 0.9).abs() < 1e-9);
        // clickbait list only; no "shocking" in the title
        assert!((influence.hype - 0.6).abs() < 1e-9);
        assert_eq!(influence.authority, 0.0);
        assert_eq!(influence.curiosity, 0.0);
        assert!((influence.visual_hype - 0.73).abs() < 1e-9);

        let distortion = result.distortion_vector;
        assert_eq!(distortion.emotional_overload, 1.0);
        assert!((distortion.selective_framing - 0.8).abs() < 1e-9);
        assert!((distortion.narrative_skew - 0.96).abs() < 1e-9);

        assert_eq!(result.response_vector.clickbait_response, 1.0);
        assert_eq!(
            result.explanation,
            "Detected high fear & urgency cues. Distortion signal: emotional overload."
        );
        assert_eq!(result.post_id, "post-2");
        assert_eq!(result.timestamp, fixed_time());
    }

    #[test]
    fn test_empty_post_zero_interaction() {
        let result = PostScorer::default().analyze_at(
            &empty_post(),
            &InteractionMetrics::default(),
            fixed_time(),
        );

        assert_eq!(result.influence_vector, InfluenceVector::default());
        assert_eq!(result.distortion_vector, DistortionVector::default());
        assert_eq!(
            result.response_vector,
            ResponseVector {
                engagement: 0.0,
                hesitation: 0.1,
                fixation: 0.0,
                clickbait_response: 0.0,
            }
        );
        // all ties: declaration order wins
        assert_eq!(
            result.explanation,
            "Detected high fear & urgency cues. Distortion signal: emotional overload."
        );
    }

    #[test]
    fn test_hesitation_on_quick_tap() {
        let interaction = InteractionMetrics {
            dwell_time_ms: 250.0,
            tap_count: 2,
            scroll_speed: ScrollSpeed::Fast,
            clicked_within_2s: false,
            open_count: 1,
        };
        let response = compute_response(&interaction);
        assert_eq!(response.hesitation, 0.6);
        assert!((response.engagement - 250.0 / 8000.0).abs() < 1e-12);
    }

    #[test]
    fn test_fixation_on_reopen_or_long_dwell() {
        let reopened = InteractionMetrics {
            dwell_time_ms: 1000.0,
            open_count: 2,
            ..Default::default()
        };
        assert_eq!(compute_response(&reopened).fixation, 1.0);

        let long_dwell = InteractionMetrics {
            dwell_time_ms: 7000.0,
            open_count: 1,
            ..Default::default()
        };
        let response = compute_response(&long_dwell);
        assert_eq!(response.fixation, 1.0);
        assert!((response.engagement - 0.875).abs() < 1e-12);

        let short = InteractionMetrics {
            dwell_time_ms: 3000.0,
            open_count: 1,
            ..Default::default()
        };
        assert!((compute_response(&short).fixation - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_negative_dwell_is_clamped() {
        let interaction = InteractionMetrics {
            dwell_time_ms: -500.0,
            ..Default::default()
        };
        let response = compute_response(&interaction);
        assert_eq!(response.engagement, 0.0);
        assert_eq!(response.fixation, 0.0);
    }

    #[test]
    fn test_explanation_ranks_by_score() {
        let influence = InfluenceVector {
            fear: 0.1,
            urgency: 0.2,
            hype: 0.6,
            authority: 0.5,
            curiosity: 0.4,
            visual_hype: 0.6,
        };
        let distortion = DistortionVector {
            emotional_overload: 0.2,
            selective_framing: 0.3,
            narrative_skew: 0.9,
        };
        assert_eq!(
            explain(&influence, &distortion),
            "Detected high hype & visual_hype cues. Distortion signal: narrative skew."
        );
    }

    #[test]
    fn test_emphatic_punctuation_boosts_overload() {
        let mut post = empty_post();
        post.punctuation_intensity = 3;
        let influence = crate::rules::RuleSet::boundier().score(&post);
        let distortion = compute_distortion(&post, &influence);

        // urgency 0.2 from emphasis: 0.2 / 3 + 0.2
        assert!((distortion.emotional_overload - (0.2 / 3.0 + 0.2)).abs() < 1e-9);
    }

    fn arb_post() -> impl Strategy<Value = Post> {
        (
            ".{0,40}",
            -1.0f64..2.0,
            0u32..5,
            prop::sample::select(vec![
                Expression::Neutral,
                Expression::Shocked,
                Expression::Happy,
                Expression::Sad,
            ]),
            any::<bool>(),
            0u32..5,
            0u32..5,
            prop::collection::vec("[a-z ]{1,12}", 0..4),
            -1.0f64..2.0,
        )
            .prop_map(
                |(title, saturation, faces, expression, high_tension, punct, caps, words, bias)| {
                    let mut post = empty_post();
                    post.title = title;
                    post.thumbnail = Thumbnail {
                        saturation,
                        faces,
                        expression,
                    };
                    post.audio_flag.high_tension = high_tension;
                    post.punctuation_intensity = punct;
                    post.caps_intensity = caps;
                    post.clickbait_words = words;
                    post.bias_score = bias;
                    post
                },
            )
    }

    fn arb_interaction() -> impl Strategy<Value = InteractionMetrics> {
        (-1000.0f64..20000.0, 0u32..10, any::<bool>(), 0u32..5).prop_map(
            |(dwell, taps, clicked, opens)| InteractionMetrics {
                dwell_time_ms: dwell,
                tap_count: taps,
                scroll_speed: ScrollSpeed::Normal,
                clicked_within_2s: clicked,
                open_count: opens,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_all_scores_in_unit_range(post in arb_post(), interaction in arb_interaction()) {
            let result = PostScorer::default().analyze_at(&post, &interaction, fixed_time());

            for (_, v) in result.influence_vector.entries() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
            for (_, v) in result.distortion_vector.entries() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
            let r = result.response_vector;
            for v in [r.engagement, r.hesitation, r.fixation] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
            prop_assert!(r.clickbait_response == 0.0 || r.clickbait_response == 1.0);
        }
    }
}
