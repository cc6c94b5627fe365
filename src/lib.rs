//! Conscient - on-device persuasion exposure engine
//!
//! Conscient scores feed posts for persuasion cues and framing distortion,
//! folds each viewing into a long-running vulnerability profile, and tracks an
//! echo-risk / exposure-health time series: post + interaction → influence,
//! distortion and response vectors → profile EWMA → pattern point.
//!
//! ## Modules
//!
//! - **Scoring**: pure, rule-table driven analysis of a single viewing
//! - **Engine**: stateful accumulation over a pluggable key-value store

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod profile;
pub mod rules;
pub mod scoring;
pub mod storage;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use engine::ConscientEngine;
pub use error::EngineError;
pub use rules::{CueRule, RuleSet, Trigger};
pub use scoring::PostScorer;
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistenceGateway, StorageKey};
pub use types::{
    AnalysisResult, DistortionVector, InfluenceVector, IntegratedPattern, InteractionEvent,
    InteractionMetrics, Post, ProfileSnapshot, ResponseVector,
};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "conscient-engine";
