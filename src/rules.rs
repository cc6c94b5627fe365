//! Cue rule table
//!
//! Influence scoring is driven by a table of `(axis, trigger, weight)` rules.
//! Each rule contributes `weight * trigger.strength(post)` to its axis; the
//! per-axis sums are clamped to 0-1. The default table encodes the Boundier
//! heuristics; custom tables can be loaded from JSON.

use crate::error::EngineError;
use crate::types::{clamp_unit, Expression, InfluenceAxis, InfluenceVector, Post};
use serde::{Deserialize, Serialize};

/// Saturation above which a thumbnail reads as urgent
const URGENT_SATURATION: f64 = 0.7;

/// Condition evaluated against a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Title (case-insensitive) contains any phrase or starts with any prefix
    Title {
        #[serde(default)]
        contains: Vec<String>,
        #[serde(default)]
        starts_with: Vec<String>,
    },
    /// Audio track flagged as high tension
    HighTensionAudio,
    /// Thumbnail shows the given expression
    Expression { expression: Expression },
    /// Any emphatic punctuation or ALL-CAPS word
    Emphasis,
    /// Thumbnail saturation strictly above `threshold`
    SaturationAbove { threshold: f64 },
    /// The tagger found at least one clickbait phrase
    ClickbaitWords,
    /// Strength equals the thumbnail saturation
    Saturation,
    /// At least one face on the thumbnail
    FacesPresent,
}

impl Trigger {
    /// Activation strength: 0 or 1 for predicates, the raw value for `Saturation`.
    ///
    /// `lower_title` must be the lower-cased post title.
    pub fn strength(&self, post: &Post, lower_title: &str) -> f64 {
        let fired = match self {
            Trigger::Title {
                contains,
                starts_with,
            } => {
                contains
                    .iter()
                    .any(|phrase| lower_title.contains(phrase.to_lowercase().as_str()))
                    || starts_with
                        .iter()
                        .any(|prefix| lower_title.starts_with(prefix.to_lowercase().as_str()))
            }
            Trigger::HighTensionAudio => post.audio_flag.high_tension,
            Trigger::Expression { expression } => post.thumbnail.expression == *expression,
            Trigger::Emphasis => post.punctuation_intensity >= 1 || post.caps_intensity >= 1,
            Trigger::SaturationAbove { threshold } => post.thumbnail.saturation > *threshold,
            Trigger::ClickbaitWords => !post.clickbait_words.is_empty(),
            Trigger::Saturation => return post.thumbnail.saturation,
            Trigger::FacesPresent => post.thumbnail.faces > 0,
        };
        if fired {
            1.0
        } else {
            0.0
        }
    }
}

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueRule {
    pub axis: InfluenceAxis,
    pub trigger: Trigger,
    pub weight: f64,
}

impl CueRule {
    pub fn new(axis: InfluenceAxis, trigger: Trigger, weight: f64) -> Self {
        Self {
            axis,
            trigger,
            weight,
        }
    }
}

/// Ordered rule table used to score influence cues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<CueRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::boundier()
    }
}

fn title_contains(phrases: &[&str]) -> Trigger {
    Trigger::Title {
        contains: phrases.iter().map(|p| p.to_string()).collect(),
        starts_with: Vec::new(),
    }
}

impl RuleSet {
    pub fn new(rules: Vec<CueRule>) -> Self {
        Self { rules }
    }

    /// The stock Boundier heuristics
    pub fn boundier() -> Self {
        use InfluenceAxis::*;

        Self::new(vec![
            CueRule::new(
                Fear,
                title_contains(&["warn", "danger", "risk", "ruin", "experts warn"]),
                0.6,
            ),
            CueRule::new(Fear, Trigger::HighTensionAudio, 0.2),
            CueRule::new(
                Fear,
                Trigger::Expression {
                    expression: Expression::Shocked,
                },
                0.2,
            ),
            CueRule::new(
                Urgency,
                title_contains(&["now", "today", "last", "only", "limited"]),
                0.5,
            ),
            CueRule::new(Urgency, Trigger::Emphasis, 0.2),
            CueRule::new(
                Urgency,
                Trigger::SaturationAbove {
                    threshold: URGENT_SATURATION,
                },
                0.2,
            ),
            CueRule::new(Hype, Trigger::ClickbaitWords, 0.6),
            CueRule::new(Hype, title_contains(&["you won't believe", "shocking"]), 0.2),
            CueRule::new(
                Authority,
                title_contains(&["expert", "study", "research", "survey", "experts"]),
                0.5,
            ),
            CueRule::new(
                Curiosity,
                Trigger::Title {
                    contains: vec!["?".to_string(), "...".to_string()],
                    starts_with: vec!["guess".to_string()],
                },
                0.4,
            ),
            CueRule::new(VisualHype, Trigger::Saturation, 0.7),
            CueRule::new(VisualHype, Trigger::FacesPresent, 0.1),
        ])
    }

    /// Score a post against the table. Every axis is clamped to 0-1.
    pub fn score(&self, post: &Post) -> InfluenceVector {
        let lower_title = post.title.to_lowercase();
        let mut raw = InfluenceVector::default();

        for rule in &self.rules {
            *raw.get_mut(rule.axis) += rule.weight * rule.trigger.strength(post, &lower_title);
        }

        raw.map(clamp_unit)
    }

    /// Reject rules that would match everything or produce non-finite scores
    pub fn validate(&self) -> Result<(), EngineError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.weight.is_finite() {
                return Err(EngineError::InvalidRule(format!(
                    "rule {} ({}) has a non-finite weight",
                    index,
                    rule.axis.name()
                )));
            }
            match &rule.trigger {
                Trigger::Title {
                    contains,
                    starts_with,
                } => {
                    if contains.is_empty() && starts_with.is_empty() {
                        return Err(EngineError::InvalidRule(format!(
                            "rule {} ({}) has an empty title trigger",
                            index,
                            rule.axis.name()
                        )));
                    }
                    if contains.iter().chain(starts_with).any(|p| p.is_empty()) {
                        return Err(EngineError::InvalidRule(format!(
                            "rule {} ({}) contains an empty phrase",
                            index,
                            rule.axis.name()
                        )));
                    }
                }
                Trigger::SaturationAbove { threshold } if !threshold.is_finite() => {
                    return Err(EngineError::InvalidRule(format!(
                        "rule {} ({}) has a non-finite saturation threshold",
                        index,
                        rule.axis.name()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Load and validate a rule table from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Serialize the rule table to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudioFlag, PostType, Thumbnail};
    use chrono::{TimeZone, Utc};

    fn make_post(title: &str) -> Post {
        Post {
            id: "test".to_string(),
            post_type: PostType::Headline,
            title: title.to_string(),
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

    #[test]
    fn test_title_match_is_case_insensitive_substring() {
        let rules = RuleSet::boundier();

        let post = make_post("Experts WARN board exams may be harder");
        let scores = rules.score(&post);
        assert!((scores.fear - 0.6).abs() < 1e-9);
        assert!((scores.authority - 0.5).abs() < 1e-9);

        // "unknown" contains "now"
        let post = make_post("An unknown result");
        assert!((rules.score(&post).urgency - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_curiosity_prefix_and_punctuation() {
        let rules = RuleSet::boundier();

        assert!((rules.score(&make_post("Guess what changed")).curiosity - 0.4).abs() < 1e-9);
        assert!((rules.score(&make_post("What changed?")).curiosity - 0.4).abs() < 1e-9);
        assert!((rules.score(&make_post("Then this happened...")).curiosity - 0.4).abs() < 1e-9);
        // prefix only counts at the start of the title
        assert_eq!(rules.score(&make_post("Can you guess")).curiosity, 0.0);
    }

    #[test]
    fn test_visual_hype_formula() {
        let rules = RuleSet::boundier();
        let mut post = make_post("plain");
        post.thumbnail.saturation = 0.5;
        post.thumbnail.faces = 2;

        let scores = rules.score(&post);
        assert!((scores.visual_hype - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_scores_are_clamped() {
        let rules = RuleSet::new(vec![
            CueRule::new(InfluenceAxis::Hype, Trigger::ClickbaitWords, 0.9),
            CueRule::new(InfluenceAxis::Hype, Trigger::ClickbaitWords, 0.9),
            CueRule::new(InfluenceAxis::Fear, Trigger::ClickbaitWords, -2.0),
        ]);
        let mut post = make_post("plain");
        post.clickbait_words = vec!["one trick".to_string()];

        let scores = rules.score(&post);
        assert_eq!(scores.hype, 1.0);
        assert_eq!(scores.fear, 0.0);
    }

    #[test]
    fn test_validate_rejects_empty_phrase() {
        let rules = RuleSet::new(vec![CueRule::new(
            InfluenceAxis::Fear,
            Trigger::Title {
                contains: vec![String::new()],
                starts_with: vec![],
            },
            0.5,
        )]);
        assert!(matches!(rules.validate(), Err(EngineError::InvalidRule(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_weight() {
        let rules = RuleSet::new(vec![CueRule::new(
            InfluenceAxis::Fear,
            Trigger::HighTensionAudio,
            f64::INFINITY,
        )]);
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let rules = RuleSet::boundier();
        let json = rules.to_json().unwrap();
        let loaded = RuleSet::from_json(&json).unwrap();
        assert_eq!(rules, loaded);
    }

    #[test]
    fn test_custom_rule_from_json() {
        let json = r#"{
            "rules": [
                { "axis": "authority", "trigger": { "kind": "title", "contains": ["professor"] }, "weight": 0.7 }
            ]
        }"#;
        let rules = RuleSet::from_json(json).unwrap();
        let scores = rules.score(&make_post("A Professor explains"));
        assert!((scores.authority - 0.7).abs() < 1e-9);
        assert_eq!(scores.fear, 0.0);
    }
}
