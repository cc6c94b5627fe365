//! Vulnerability and distortion profile accumulation
//!
//! Both profiles are exponentially weighted moving averages of the per-post
//! vectors, with each observation pre-scaled by how strongly the user
//! responded to the post:
//!
//! `new = alpha * (input * magnitude) + (1 - alpha) * current`
//!
//! Without a response gate the fold runs for every event, so a post the user
//! ignored still pulls the profile toward zero.

use crate::config::{EngineConfig, DEFAULT_SMOOTHING_ALPHA};
use crate::types::{clamp_unit, DistortionVector, InfluenceVector};

/// Profile shown before any viewing has been recorded
pub fn default_vulnerability_profile() -> InfluenceVector {
    InfluenceVector {
        fear: 0.45,
        urgency: 0.3,
        hype: 0.6,
        authority: 0.2,
        curiosity: 0.1,
        visual_hype: 0.4,
    }
}

/// Distortion profile shown before any viewing has been recorded
pub fn default_distortion_profile() -> DistortionVector {
    DistortionVector {
        emotional_overload: 0.3,
        selective_framing: 0.4,
        narrative_skew: 0.2,
    }
}

/// EWMA folder for the two profiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileAccumulator {
    alpha: f64,
    response_gate: Option<f64>,
}

impl Default for ProfileAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA, None)
    }
}

impl ProfileAccumulator {
    pub fn new(alpha: f64, response_gate: Option<f64>) -> Self {
        Self {
            alpha,
            response_gate,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.smoothing_alpha, config.response_gate)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether an event with this response magnitude updates the profiles
    pub fn accepts(&self, magnitude: f64) -> bool {
        match self.response_gate {
            Some(gate) => magnitude >= gate,
            None => true,
        }
    }

    fn step(&self, current: f64, input: f64, magnitude: f64) -> f64 {
        clamp_unit(self.alpha * (input * magnitude) + (1.0 - self.alpha) * current)
    }

    pub fn fold_influence(
        &self,
        current: &InfluenceVector,
        input: &InfluenceVector,
        magnitude: f64,
    ) -> InfluenceVector {
        current.zip_with(input, |cur, inp| self.step(cur, inp, magnitude))
    }

    pub fn fold_distortion(
        &self,
        current: &DistortionVector,
        input: &DistortionVector,
        magnitude: f64,
    ) -> DistortionVector {
        current.zip_with(input, |cur, inp| self.step(cur, inp, magnitude))
    }
}
