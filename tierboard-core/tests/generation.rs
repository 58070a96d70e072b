//! Board invariants that must hold for every generated board, whatever the
//! randomness.
//!
//! Each test sweeps a range of seeds against scripted sources that repeat
//! names, fail some fetches, and can never fill every tier.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tierboard_core::testing::MockSource;
use tierboard_core::{
    BoardView, EntityRecord, FetchFailurePolicy, Sampler, SamplerConfig, Tier, TierLadder,
    DEFAULT_ATTEMPT_BUDGET,
};

/// 300 ids sharing 60 names, every seventh id down, scores spread across
/// the whole ladder.
fn noisy_source() -> MockSource {
    (1..=300u32).fold(MockSource::new(), |source, id| {
        if id % 7 == 0 {
            source.failing(id)
        } else {
            source.with_record(
                EntityRecord::new(id, format!("mon-{}", id % 60))
                    .with_stat("hp", 40 + (id * 37) % 120)
                    .with_stat("attack", 50 + (id * 53) % 140)
                    .with_stat("speed", 30 + (id * 11) % 130),
            )
        }
    })
}

fn sampler(range_end: u32) -> Sampler {
    Sampler::new(SamplerConfig::default().with_id_range(1..=range_end)).unwrap()
}

#[tokio::test]
async fn test_buckets_never_exceed_capacity() {
    let source = noisy_source();
    let sampler = sampler(300);

    for seed in 0..40 {
        let report = sampler
            .generate(&source, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        for tier in Tier::DESCENDING {
            assert!(
                report.board.bucket(tier).len() <= 5,
                "seed {seed}: {tier} holds {}",
                report.board.bucket(tier).len()
            );
        }
    }
}

#[tokio::test]
async fn test_names_are_unique_across_the_board() {
    let source = noisy_source();
    let sampler = sampler(300);

    for seed in 0..40 {
        let report = sampler
            .generate(&source, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        let mut seen = HashSet::new();
        for (_, entry) in report.board.entries() {
            assert!(seen.insert(entry.name.clone()), "seed {seed}: {} twice", entry.name);
        }
    }
}

#[tokio::test]
async fn test_attempts_are_bounded_when_tiers_cannot_fill() {
    // Three names only, so at most three entries can ever be placed.
    let source = (1..=50u32).fold(MockSource::new(), |source, id| {
        source.with_record(EntityRecord::new(id, format!("mon-{}", id % 3)).with_stat("total", 610))
    });
    let sampler = sampler(50);

    for seed in 0..10 {
        let before = source.calls();
        let report = sampler
            .generate(&source, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();

        assert_eq!(report.attempts, DEFAULT_ATTEMPT_BUDGET);
        assert_eq!(source.calls() - before, DEFAULT_ATTEMPT_BUDGET as usize);
        assert!(report.budget_exhausted);
        assert!(report.accepted() <= 3);
    }
}

#[tokio::test]
async fn test_every_attempt_is_accounted_for() {
    let source = noisy_source();
    let sampler = sampler(300);

    for seed in 0..20 {
        let report = sampler
            .generate(&source, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        let spent = report.accepted() as u32
            + report.duplicates
            + report.tier_full
            + report.fetch_failures();
        assert_eq!(spent, report.attempts, "seed {seed}");
        assert!(report.attempts <= DEFAULT_ATTEMPT_BUDGET);
    }
}

#[tokio::test]
async fn test_entries_sit_in_the_tier_their_score_earns() {
    let source = noisy_source();

    for ladder in [TierLadder::CLASSIC, TierLadder::REBALANCED] {
        let sampler = Sampler::new(
            SamplerConfig::default()
                .with_id_range(1..=300)
                .with_ladder(ladder),
        )
        .unwrap();
        let report = sampler
            .generate(&source, &mut StdRng::seed_from_u64(31))
            .await
            .unwrap();

        for (tier, entry) in report.board.entries() {
            assert_eq!(ladder.assign(entry.score), tier, "{}", entry.name);
        }
    }
}

#[tokio::test]
async fn test_abort_stops_at_first_failure() {
    let source = (1..=300u32)
        .filter(|id| id % 2 == 0)
        .fold(noisy_source(), |source, id| source.failing(id));
    let sampler = Sampler::new(
        SamplerConfig::default()
            .with_id_range(1..=300)
            .with_fetch_failure_policy(FetchFailurePolicy::Abort),
    )
    .unwrap();

    let error = sampler
        .generate(&source, &mut StdRng::seed_from_u64(12))
        .await
        .unwrap_err();
    match error {
        tierboard_core::SampleError::Aborted { partial, attempts, .. } => {
            assert_eq!(partial.fetch_failures(), 1);
            assert_eq!(partial.attempts, attempts);
            // The partial board obeys the same invariants.
            let view = BoardView::render(&partial.board);
            assert_eq!(view.rows.len(), 5);
            assert_eq!(view.card_count(), partial.accepted());
        }
        other => panic!("expected abort, got {other:?}"),
    }
}
