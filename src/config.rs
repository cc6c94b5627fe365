//! Engine configuration

use crate::error::EngineError;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default EWMA smoothing factor
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.15;

/// Default number of pattern points kept
pub const DEFAULT_PATTERN_CAPACITY: usize = 20;

/// Tunables for the profile accumulator, pattern tracker and scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weight of the newest observation in the profile EWMA (0 < alpha <= 1)
    pub smoothing_alpha: f64,
    /// Maximum number of integrated pattern points retained
    pub pattern_capacity: usize,
    /// When set, profile folds with a response magnitude below this value are
    /// skipped. Unset means every event is folded, so low-response events
    /// decay the profiles toward zero.
    pub response_gate: Option<f64>,
    /// Cue rule table used for influence scoring
    pub rules: RuleSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            pattern_capacity: DEFAULT_PATTERN_CAPACITY,
            response_gate: None,
            rules: RuleSet::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if self.pattern_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "pattern_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(gate) = self.response_gate {
            if !(0.0..=1.0).contains(&gate) {
                return Err(EngineError::InvalidConfig(format!(
                    "response_gate must be in [0, 1], got {}",
                    gate
                )));
            }
        }
        self.rules.validate()
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.smoothing_alpha, 0.15);
        assert_eq!(config.pattern_capacity, 20);
        assert_eq!(config.response_gate, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "pattern_capacity": 5 }"#).unwrap();
        assert_eq!(config.pattern_capacity, 5);
        assert_eq!(config.smoothing_alpha, 0.15);
        assert_eq!(config.rules, RuleSet::boundier());
    }

    #[test]
    fn test_rejects_bad_alpha() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "smoothing_alpha": 0.0 }"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{ "smoothing_alpha": 1.5 }"#).is_err());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(EngineConfig::from_json(r#"{ "pattern_capacity": 0 }"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_gate() {
        assert!(EngineConfig::from_json(r#"{ "response_gate": 2.0 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "response_gate": 0.2 }"#).is_ok());
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig {
            response_gate: Some(0.1),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
