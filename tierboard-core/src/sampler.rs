//! The sampling loop that fills a board.
//!
//! Each attempt draws a random id, fetches its record, scores it and offers
//! it to the tier the ladder picks. A run stops when every tier is full or
//! the attempt budget is spent, whichever comes first. Fetches are issued
//! strictly one after another.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

use crate::board::{Board, BoardEntry, Placement, TIER_CAPACITY};
use crate::source::{EntitySource, FetchError};
use crate::tier::TierLadder;

/// Default cap on attempts per run.
pub const DEFAULT_ATTEMPT_BUDGET: u32 = 500;

/// What to do when a fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FetchFailurePolicy {
    /// Count the attempt and keep sampling.
    #[default]
    Skip,
    /// Stop the run and hand back what was collected so far.
    Abort,
}

impl fmt::Display for FetchFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailurePolicy::Skip => f.write_str("skip"),
            FetchFailurePolicy::Abort => f.write_str("abort"),
        }
    }
}

impl FromStr for FetchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "continue" => Ok(FetchFailurePolicy::Skip),
            "abort" | "stop" => Ok(FetchFailurePolicy::Abort),
            other => Err(format!(
                "unknown fetch policy '{other}' (expected 'skip' or 'abort')"
            )),
        }
    }
}

/// Knobs for a sampling run.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Maximum number of draws per run.
    pub attempt_budget: u32,
    /// Ids are drawn uniformly from this range.
    pub id_range: RangeInclusive<u32>,
    /// Entries per tier.
    pub capacity: usize,
    pub ladder: TierLadder,
    pub on_fetch_error: FetchFailurePolicy,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            attempt_budget: DEFAULT_ATTEMPT_BUDGET,
            id_range: pokeapi::MIN_DEX_ID..=pokeapi::MAX_DEX_ID,
            capacity: TIER_CAPACITY,
            ladder: TierLadder::CLASSIC,
            on_fetch_error: FetchFailurePolicy::Skip,
        }
    }
}

impl SamplerConfig {
    pub fn with_attempt_budget(mut self, budget: u32) -> Self {
        self.attempt_budget = budget;
        self
    }

    pub fn with_id_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.id_range = range;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ladder(mut self, ladder: TierLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    fn validate(&self) -> Result<(), SampleError> {
        if self.attempt_budget == 0 {
            return Err(SampleError::InvalidConfig(
                "attempt budget must be at least 1".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(SampleError::InvalidConfig(
                "tier capacity must be at least 1".to_string(),
            ));
        }
        if self.id_range.is_empty() {
            return Err(SampleError::InvalidConfig(format!(
                "id range {}..={} is empty",
                self.id_range.start(),
                self.id_range.end()
            )));
        }
        Ok(())
    }
}

/// Snapshot emitted after every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub attempts: u32,
    pub accepted: usize,
    pub budget: u32,
}

/// A finished run: the board plus how the attempts were spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub board: Board,
    pub attempts: u32,
    /// Draws whose name was already on the board.
    pub duplicates: u32,
    /// Draws whose tier had no room left.
    pub tier_full: u32,
    pub network_failures: u32,
    pub malformed_records: u32,
    /// The run stopped on the budget with at least one tier short.
    pub budget_exhausted: bool,
}

impl GenerationReport {
    fn new(board: Board) -> Self {
        Self {
            board,
            attempts: 0,
            duplicates: 0,
            tier_full: 0,
            network_failures: 0,
            malformed_records: 0,
            budget_exhausted: false,
        }
    }

    /// True when every tier reached capacity.
    pub fn is_complete(&self) -> bool {
        self.board.is_full()
    }

    pub fn accepted(&self) -> usize {
        self.board.len()
    }

    pub fn fetch_failures(&self) -> u32 {
        self.network_failures + self.malformed_records
    }

    fn record_failure(&mut self, error: &FetchError) {
        match error {
            FetchError::Network(_) => self.network_failures += 1,
            FetchError::Malformed(_) => self.malformed_records += 1,
        }
    }
}

/// Errors from a sampling run.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Invalid sampler configuration: {0}")]
    InvalidConfig(String),

    #[error("Generation aborted after {attempts} attempts: {error}")]
    Aborted {
        attempts: u32,
        error: FetchError,
        /// Whatever the run had collected before it stopped.
        partial: Box<GenerationReport>,
    },
}

/// Fills boards according to a [`SamplerConfig`].
#[derive(Debug, Clone)]
pub struct Sampler {
    config: SamplerConfig,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Result<Self, SampleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Run one generation to completion.
    pub async fn generate<S, R>(
        &self,
        source: &S,
        rng: &mut R,
    ) -> Result<GenerationReport, SampleError>
    where
        S: EntitySource + ?Sized,
        R: Rng,
    {
        self.generate_with_progress(source, rng, |_| {}).await
    }

    /// Run one generation, calling `on_progress` after every attempt.
    ///
    /// The board is created fresh here and only leaves this function inside
    /// the returned report, so no caller ever observes it half-filled.
    pub async fn generate_with_progress<S, R, F>(
        &self,
        source: &S,
        rng: &mut R,
        mut on_progress: F,
    ) -> Result<GenerationReport, SampleError>
    where
        S: EntitySource + ?Sized,
        R: Rng,
        F: FnMut(Progress),
    {
        let budget = self.config.attempt_budget;
        let mut report = GenerationReport::new(Board::new(self.config.capacity));

        while !report.board.is_full() && report.attempts < budget {
            report.attempts += 1;
            let id = rng.gen_range(self.config.id_range.clone());

            let fetched = match source.fetch(id).await {
                Ok(record) => record.score().map(|score| (record, score)),
                Err(error) => Err(error),
            };

            match fetched {
                Err(error) => {
                    report.record_failure(&error);
                    log::warn!("attempt {}: fetch of id {id} failed: {error}", report.attempts);

                    if self.config.on_fetch_error == FetchFailurePolicy::Abort {
                        let attempts = report.attempts;
                        return Err(SampleError::Aborted {
                            attempts,
                            error,
                            partial: Box::new(report),
                        });
                    }
                }
                Ok((record, score)) => {
                    let tier = self.config.ladder.assign(score);
                    let name = record.name.clone();

                    match report.board.place(tier, BoardEntry::from_record(record, score)) {
                        Placement::Accepted => {
                            log::debug!("attempt {}: {name} ({score}) -> {tier}", report.attempts);
                        }
                        Placement::TierFull => {
                            report.tier_full += 1;
                            log::debug!(
                                "attempt {}: {tier} full, dropping {name}",
                                report.attempts
                            );
                        }
                        Placement::Duplicate => {
                            report.duplicates += 1;
                            log::debug!(
                                "attempt {}: {name} already on the board",
                                report.attempts
                            );
                        }
                    }
                }
            }

            on_progress(Progress {
                attempts: report.attempts,
                accepted: report.board.len(),
                budget,
            });
        }

        report.budget_exhausted = !report.board.is_full();
        if report.budget_exhausted {
            log::info!(
                "budget of {budget} attempts spent with {} entries placed \
                 ({} duplicates, {} full-tier rejections, {} failed fetches)",
                report.accepted(),
                report.duplicates,
                report.tier_full,
                report.fetch_failures()
            );
        } else {
            log::info!("board filled in {} attempts", report.attempts);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EntityRecord;
    use crate::testing::MockSource;
    use crate::tier::Tier;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_config_matches_board_rules() {
        let config = SamplerConfig::default();
        assert_eq!(config.attempt_budget, 500);
        assert_eq!(config.id_range, 1..=1025);
        assert_eq!(config.capacity, 5);
        assert_eq!(config.ladder, TierLadder::CLASSIC);
        assert_eq!(config.on_fetch_error, FetchFailurePolicy::Skip);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(Sampler::new(SamplerConfig::default().with_attempt_budget(0)).is_err());
        assert!(Sampler::new(SamplerConfig::default().with_capacity(0)).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 10..=1;
        assert!(Sampler::new(SamplerConfig::default().with_id_range(empty)).is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("skip".parse::<FetchFailurePolicy>(), Ok(FetchFailurePolicy::Skip));
        assert_eq!("ABORT".parse::<FetchFailurePolicy>(), Ok(FetchFailurePolicy::Abort));
        assert!("retry".parse::<FetchFailurePolicy>().is_err());
    }

    #[tokio::test]
    async fn test_fills_board_from_distinct_records() {
        // 25 ids, five per tier, every one distinct.
        let source = MockSource::tiered(1..=25, |id| match (id - 1) / 5 {
            0 => 650,
            1 => 520,
            2 => 420,
            3 => 310,
            _ => 200,
        });
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=25)
                .with_attempt_budget(5_000),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let report = sampler.generate(&source, &mut rng).await.unwrap();

        assert!(report.is_complete());
        assert!(!report.budget_exhausted);
        assert_eq!(report.accepted(), 25);
        for tier in Tier::DESCENDING {
            assert_eq!(report.board.bucket(tier).len(), 5);
        }
        assert_eq!(report.attempts as usize, source.calls());
    }

    #[tokio::test]
    async fn test_stops_at_budget_when_tiers_cannot_fill() {
        // Everything scores tier one, so four tiers stay empty forever.
        let source = MockSource::tiered(1..=50, |_| 100);
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=50)
                .with_attempt_budget(40),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let report = sampler.generate(&source, &mut rng).await.unwrap();

        assert_eq!(report.attempts, 40);
        assert_eq!(source.calls(), 40);
        assert!(report.budget_exhausted);
        assert_eq!(report.board.bucket(Tier::One).len(), 5);
        assert!(report.board.bucket(Tier::Five).is_empty());
        assert_eq!(
            report.duplicates + report.tier_full + report.accepted() as u32,
            40
        );
    }

    #[tokio::test]
    async fn test_skip_policy_consumes_one_attempt_per_failure() {
        let source = MockSource::new()
            .with_record(EntityRecord::new(1, "weedle").with_stat("total", 195))
            .failing(2)
            .malformed(3);
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=3)
                .with_attempt_budget(30),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(99);
        let report = sampler.generate(&source, &mut rng).await.unwrap();

        assert_eq!(report.attempts, 30);
        assert_eq!(report.accepted(), 1);
        assert!(report.network_failures > 0);
        assert!(report.malformed_records > 0);
        assert_eq!(
            report.fetch_failures() + report.duplicates + report.accepted() as u32,
            30
        );
    }

    #[tokio::test]
    async fn test_abort_policy_returns_partial_board() {
        let source = MockSource::new()
            .with_record(EntityRecord::new(1, "magikarp").with_stat("total", 200))
            .failing(2);
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=2)
                .with_fetch_failure_policy(FetchFailurePolicy::Abort),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let result = sampler.generate(&source, &mut rng).await;

        match result {
            Err(SampleError::Aborted {
                attempts,
                error,
                partial,
            }) => {
                assert!(matches!(error, FetchError::Network(_)));
                assert_eq!(partial.attempts, attempts);
                assert_eq!(partial.network_failures, 1);
                assert_eq!(partial.malformed_records, 0);
                assert_eq!(partial.tier_full, 0);

                // Every attempt before the failing one drew magikarp: the
                // first placed it and the rest were duplicates.
                let drawn_before = attempts - 1;
                assert_eq!(partial.duplicates, drawn_before.saturating_sub(1));
                let expected: Vec<&str> = if drawn_before > 0 {
                    vec!["magikarp"]
                } else {
                    Vec::new()
                };
                let placed: Vec<&str> = partial
                    .board
                    .bucket(Tier::One)
                    .entries()
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect();
                assert_eq!(placed, expected);
                assert_eq!(partial.board.len(), expected.len());
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_overflowing_stats_count_as_malformed() {
        let source = MockSource::new().with_record(
            EntityRecord::new(1, "glitch")
                .with_stat("hp", u32::MAX)
                .with_stat("attack", 1),
        );
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=1)
                .with_attempt_budget(20),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(8);
        let report = sampler.generate(&source, &mut rng).await.unwrap();

        assert_eq!(report.attempts, 20);
        assert_eq!(report.malformed_records, 20);
        assert_eq!(report.network_failures, 0);
        assert_eq!(report.accepted(), 0);
        assert!(report.budget_exhausted);
    }

    #[tokio::test]
    async fn test_overflowing_stats_abort_under_abort_policy() {
        let source = MockSource::new().with_record(
            EntityRecord::new(1, "glitch")
                .with_stat("hp", u32::MAX)
                .with_stat("attack", 1),
        );
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=1)
                .with_fetch_failure_policy(FetchFailurePolicy::Abort),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(8);
        match sampler.generate(&source, &mut rng).await {
            Err(SampleError::Aborted {
                attempts, error, ..
            }) => {
                assert_eq!(attempts, 1);
                assert!(matches!(error, FetchError::Malformed(_)));
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_progress_reported_every_attempt() {
        let source = MockSource::tiered(1..=10, |_| 450);
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=10)
                .with_attempt_budget(12),
        )
        .unwrap();

        let mut seen = Vec::new();
        let mut rng = StdRng::seed_from_u64(11);
        let report = sampler
            .generate_with_progress(&source, &mut rng, |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(seen.len(), report.attempts as usize);
        assert!(seen.windows(2).all(|w| w[1].attempts == w[0].attempts + 1));
        assert!(seen.iter().all(|p| p.budget == 12));
        assert_eq!(seen.last().map(|p| p.accepted), Some(report.accepted()));
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let source = MockSource::tiered(1..=200, |id| 150 + id * 3);
        let sampler = Sampler::new(SamplerConfig::default().with_id_range(1..=200)).unwrap();

        let first = sampler
            .generate(&source, &mut StdRng::seed_from_u64(2024))
            .await
            .unwrap();
        let second = sampler
            .generate(&source, &mut StdRng::seed_from_u64(2024))
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
