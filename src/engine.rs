//! Engine orchestration
//!
//! [`ConscientEngine`] ties the scorer, the profile accumulator and the
//! pattern tracker to a persistence gateway. It owns its store explicitly:
//! open (load or default), mutate, flush.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pattern::{placeholder_points, PatternTracker};
use crate::profile::{default_distortion_profile, default_vulnerability_profile, ProfileAccumulator};
use crate::scoring::PostScorer;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, PersistenceGateway, StorageKey};
use crate::types::{
    AnalysisResult, DistortionVector, InfluenceVector, IntegratedPattern, InteractionEvent,
    InteractionMetrics, Post, ProfileSnapshot, ResponseVector,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::PathBuf;

/// Keys cleared by [`ConscientEngine::reset_data`]. History survives a reset.
const RESET_KEYS: [StorageKey; 4] = [
    StorageKey::Events,
    StorageKey::Profile,
    StorageKey::Distortion,
    StorageKey::Pattern,
];

/// Stateful engine over a key-value store
#[derive(Debug)]
pub struct ConscientEngine<S> {
    gateway: PersistenceGateway<S>,
    scorer: PostScorer,
    accumulator: ProfileAccumulator,
    pattern_capacity: usize,
}

impl ConscientEngine<MemoryStore> {
    /// Engine with default settings and nothing persisted
    pub fn in_memory() -> Self {
        Self::from_parts(MemoryStore::new(), EngineConfig::default())
    }
}

impl ConscientEngine<FileStore> {
    /// Engine backed by the JSON document at `path`
    pub fn open_file(path: impl Into<PathBuf>, config: EngineConfig) -> Result<Self, EngineError> {
        let store = FileStore::open(path)?;
        Self::new(store, config)
    }
}

impl<S: KeyValueStore> ConscientEngine<S> {
    /// Create an engine over `store` after validating `config`
    pub fn new(store: S, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::from_parts(store, config))
    }

    fn from_parts(store: S, config: EngineConfig) -> Self {
        Self {
            gateway: PersistenceGateway::new(store),
            accumulator: ProfileAccumulator::from_config(&config),
            pattern_capacity: config.pattern_capacity,
            scorer: PostScorer::new(config.rules),
        }
    }

    pub fn scorer(&self) -> &PostScorer {
        &self.scorer
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn into_store(self) -> S {
        self.gateway.into_inner()
    }

    /// Score one viewing without touching persisted state
    pub fn analyze(&self, post: &Post, interaction: &InteractionMetrics) -> AnalysisResult {
        self.scorer.analyze(post, interaction)
    }

    pub fn analyze_at(
        &self,
        post: &Post,
        interaction: &InteractionMetrics,
        at: DateTime<Utc>,
    ) -> AnalysisResult {
        self.scorer.analyze_at(post, interaction, at)
    }

    /// Fold one analysis into the profiles and the pattern sequence, then flush.
    ///
    /// Returns the pattern point that was appended.
    pub fn update_vulnerability_profile(
        &mut self,
        influence: &InfluenceVector,
        distortion: &DistortionVector,
        response: &ResponseVector,
    ) -> Result<IntegratedPattern, EngineError> {
        let point = self.apply_update(influence, distortion, response, Utc::now())?;
        self.gateway.flush()?;
        Ok(point)
    }

    fn apply_update(
        &mut self,
        influence: &InfluenceVector,
        distortion: &DistortionVector,
        response: &ResponseVector,
        at: DateTime<Utc>,
    ) -> Result<IntegratedPattern, EngineError> {
        let magnitude = response.magnitude();

        if self.accumulator.accepts(magnitude) {
            // A missing profile folds from zero, not from the display seed
            let current: InfluenceVector = self.gateway.get(StorageKey::Profile, InfluenceVector::default());
            let next = self.accumulator.fold_influence(&current, influence, magnitude);
            self.gateway.set(StorageKey::Profile, &next)?;

            let current: DistortionVector =
                self.gateway.get(StorageKey::Distortion, DistortionVector::default());
            let next = self.accumulator.fold_distortion(&current, distortion, magnitude);
            self.gateway.set(StorageKey::Distortion, &next)?;
        } else {
            tracing::debug!(magnitude, "response below gate, profiles unchanged");
        }

        let stored: Vec<IntegratedPattern> = self.gateway.get(StorageKey::Pattern, Vec::new());
        let mut tracker = PatternTracker::from_points(stored, self.pattern_capacity);
        let point = tracker.record(influence, distortion, magnitude, at);
        self.gateway.set(StorageKey::Pattern, &tracker.into_vec())?;

        tracing::debug!(
            magnitude,
            echo_risk = point.echo_risk,
            exposure_health = point.exposure_health,
            "updated profile"
        );

        Ok(point)
    }

    /// Stored vulnerability profile, or the seed profile when none exists
    pub fn vulnerability_profile(&self) -> InfluenceVector {
        self.gateway
            .get_or_else(StorageKey::Profile, default_vulnerability_profile)
    }

    /// Stored distortion profile, or the seed profile when none exists
    pub fn distortion_profile(&self) -> DistortionVector {
        self.gateway
            .get_or_else(StorageKey::Distortion, default_distortion_profile)
    }

    /// Stored pattern sequence without placeholders
    pub fn stored_pattern(&self) -> Vec<IntegratedPattern> {
        self.gateway.get(StorageKey::Pattern, Vec::new())
    }

    /// Pattern sequence for display; a random placeholder graph when empty
    pub fn pattern_graph(&self) -> Vec<IntegratedPattern> {
        self.pattern_graph_with_rng(&mut rand::thread_rng())
    }

    pub fn pattern_graph_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<IntegratedPattern> {
        let stored = self.stored_pattern();
        if stored.is_empty() {
            placeholder_points(rng, Utc::now())
        } else {
            stored
        }
    }

    /// Drop the event log, both profiles and the pattern sequence in one
    /// store operation, then flush.
    pub fn reset_data(&mut self) -> Result<(), EngineError> {
        self.gateway.clear(&RESET_KEYS)?;
        self.gateway.flush()?;
        tracing::info!("engine data reset");
        Ok(())
    }

    pub fn record_history(&mut self, result: &AnalysisResult) -> Result<(), EngineError> {
        self.gateway.append(StorageKey::History, result.clone())
    }

    /// Recorded analyses, oldest first
    pub fn history(&self) -> Vec<AnalysisResult> {
        self.gateway.get(StorageKey::History, Vec::new())
    }

    pub fn clear_history(&mut self) -> Result<(), EngineError> {
        self.gateway.clear(&[StorageKey::History])?;
        self.gateway.flush()
    }

    pub fn record_event(&mut self, event: &InteractionEvent) -> Result<(), EngineError> {
        self.gateway.append(StorageKey::Events, event.clone())
    }

    pub fn events(&self) -> Vec<InteractionEvent> {
        self.gateway.get(StorageKey::Events, Vec::new())
    }

    /// Analyze a viewing and record everything it touches: the event log, the
    /// profiles, the pattern sequence and the history. Flushes once.
    pub fn process(
        &mut self,
        post: &Post,
        interaction: &InteractionMetrics,
    ) -> Result<AnalysisResult, EngineError> {
        self.process_at(post, interaction, Utc::now())
    }

    pub fn process_at(
        &mut self,
        post: &Post,
        interaction: &InteractionMetrics,
        at: DateTime<Utc>,
    ) -> Result<AnalysisResult, EngineError> {
        let result = self.scorer.analyze_at(post, interaction, at);

        self.record_event(&InteractionEvent {
            post_id: post.id.clone(),
            interaction: interaction.clone(),
            timestamp: at,
        })?;
        self.apply_update(
            &result.influence_vector,
            &result.distortion_vector,
            &result.response_vector,
            at,
        )?;
        self.record_history(&result)?;
        self.gateway.flush()?;

        tracing::info!(post_id = %post.id, explanation = %result.explanation, "processed viewing");
        Ok(result)
    }

    /// Current profiles and stored pattern for dashboards
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            vulnerability: self.vulnerability_profile(),
            distortion: self.distortion_profile(),
            pattern: self.stored_pattern(),
            history_len: self.history().len(),
        }
    }

    /// Persist pending writes (history and event appends are buffered until
    /// the next flush)
    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.gateway.flush()
    }
}
