//! Integrated pattern tracking
//!
//! Keeps a bounded, oldest-first sequence of echo-risk / exposure-health
//! points. Each processed viewing moves echo risk up and exposure health down
//! in proportion to the post's average distortion and the user's response,
//! against a small per-event drift back toward a healthy feed.

use crate::config::DEFAULT_PATTERN_CAPACITY;
use crate::types::{clamp_unit, DistortionVector, InfluenceVector, IntegratedPattern};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::VecDeque;

/// Echo risk assumed before the first point
pub const BOOTSTRAP_ECHO_RISK: f64 = 0.3;

/// Exposure health assumed before the first point
pub const BOOTSTRAP_EXPOSURE_HEALTH: f64 = 0.7;

/// Scale from distortion x response to the per-event shift
const SHIFT_SCALE: f64 = 0.1;

/// Per-event decay of echo risk
const ECHO_DECAY: f64 = 0.02;

/// Per-event recovery of exposure health
const EXPOSURE_RECOVERY: f64 = 0.01;

/// Number of points in the first-run placeholder graph
pub const PLACEHOLDER_POINTS: usize = 10;

/// Bounded FIFO of pattern points
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTracker {
    points: VecDeque<IntegratedPattern>,
    capacity: usize,
}

impl Default for PatternTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CAPACITY)
    }
}

impl PatternTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Resume from a stored sequence, dropping the oldest points beyond capacity
    pub fn from_points(points: Vec<IntegratedPattern>, capacity: usize) -> Self {
        let mut points = VecDeque::from(points);
        while points.len() > capacity {
            points.pop_front();
        }
        Self { points, capacity }
    }

    /// Append the point for one processed viewing and return it
    pub fn record(
        &mut self,
        influence: &InfluenceVector,
        distortion: &DistortionVector,
        magnitude: f64,
        at: DateTime<Utc>,
    ) -> IntegratedPattern {
        let avg_distortion = distortion.mean();
        let (last_echo, last_exposure) = self
            .points
            .back()
            .map(|p| (p.echo_risk, p.exposure_health))
            .unwrap_or((BOOTSTRAP_ECHO_RISK, BOOTSTRAP_EXPOSURE_HEALTH));

        let shift = avg_distortion * magnitude * SHIFT_SCALE;
        let point = IntegratedPattern {
            influence: influence.mean(),
            distortion: avg_distortion,
            echo_risk: clamp_unit(last_echo + shift - ECHO_DECAY),
            exposure_health: clamp_unit(last_exposure - shift + EXPOSURE_RECOVERY),
            timestamp: at,
        };

        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }

        point
    }

    pub fn points(&self) -> &VecDeque<IntegratedPattern> {
        &self.points
    }

    pub fn last(&self) -> Option<&IntegratedPattern> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_vec(self) -> Vec<IntegratedPattern> {
        self.points.into()
    }
}

/// Display-only graph for a user with no recorded viewings.
///
/// Points are one second apart ending just before `now`; echo risk ramps up
/// and exposure health ramps down while influence and distortion are drawn at
/// random. Nothing here is persisted.
pub fn placeholder_points<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<IntegratedPattern> {
    (0..PLACEHOLDER_POINTS)
        .map(|i| {
            let step = i as f64;
            IntegratedPattern {
                influence: rng.gen_range(0.3..0.7),
                distortion: rng.gen_range(0.2..0.5),
                echo_risk: 0.2 + step * 0.05,
                exposure_health: 0.8 - step * 0.04,
                timestamp: now - Duration::milliseconds(((PLACEHOLDER_POINTS - i) * 1000) as i64),
            }
        })
        .collect()
}
