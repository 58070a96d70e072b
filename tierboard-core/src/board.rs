//! The tier board and its buckets.
//!
//! A [`Board`] is owned by exactly one generation run. It enforces the two
//! structural invariants itself: no bucket grows past its capacity, and no
//! name is accepted twice anywhere on the board.

use serde::Serialize;
use std::collections::HashSet;

use crate::sampler::GenerationReport;
use crate::source::EntityRecord;
use crate::tier::Tier;

/// Default number of entries per tier.
pub const TIER_CAPACITY: usize = 5;

/// An accepted entity, reduced to what the board displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    pub id: u32,
    pub name: String,
    pub sprite: Option<String>,
    /// Strength score the tier was assigned from.
    pub score: u32,
}

impl BoardEntry {
    pub fn from_record(record: EntityRecord, score: u32) -> Self {
        Self {
            id: record.id,
            name: record.name,
            sprite: record.sprite,
            score,
        }
    }
}

/// One tier's bucket of accepted entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierBucket {
    tier: Tier,
    capacity: usize,
    entries: Vec<BoardEntry>,
}

impl TierBucket {
    pub fn new(tier: Tier, capacity: usize) -> Self {
        Self {
            tier,
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }
}

/// Names already accepted during the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedNames(HashSet<String>);

impl UsedNames {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String) -> bool {
        self.0.insert(name)
    }
}

/// What happened when an entry was offered to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Accepted,
    /// The name is already on the board.
    Duplicate,
    /// The target tier has no room left.
    TierFull,
}

/// Five tier buckets plus the names they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Indexed by `Tier::index()`, so tier one sits at position zero.
    buckets: [TierBucket; 5],
    #[serde(skip)]
    used: UsedNames,
}

impl Board {
    /// An empty board whose buckets each hold `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: [
                TierBucket::new(Tier::One, capacity),
                TierBucket::new(Tier::Two, capacity),
                TierBucket::new(Tier::Three, capacity),
                TierBucket::new(Tier::Four, capacity),
                TierBucket::new(Tier::Five, capacity),
            ],
            used: UsedNames::default(),
        }
    }

    pub fn bucket(&self, tier: Tier) -> &TierBucket {
        &self.buckets[tier.index()]
    }

    /// Buckets in display order, strongest tier first.
    pub fn buckets(&self) -> impl Iterator<Item = &TierBucket> {
        self.buckets.iter().rev()
    }

    /// Every entry on the board, strongest tier first.
    pub fn entries(&self) -> impl Iterator<Item = (Tier, &BoardEntry)> {
        self.buckets()
            .flat_map(|bucket| bucket.entries().iter().map(move |e| (bucket.tier(), e)))
    }

    pub fn used_names(&self) -> &UsedNames {
        &self.used
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// True once every bucket has reached capacity.
    pub fn is_full(&self) -> bool {
        self.buckets.iter().all(TierBucket::is_full)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(TierBucket::is_empty)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(TierBucket::len).sum()
    }

    /// Offer an entry to `tier`. The board only changes on `Accepted`.
    pub fn place(&mut self, tier: Tier, entry: BoardEntry) -> Placement {
        if self.used.contains(&entry.name) {
            return Placement::Duplicate;
        }

        let bucket = &mut self.buckets[tier.index()];
        if bucket.is_full() {
            return Placement::TierFull;
        }

        self.used.insert(entry.name.clone());
        bucket.entries.push(entry);
        Placement::Accepted
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new(TIER_CAPACITY)
    }
}

/// What the front ends are allowed to show.
///
/// There is no partially-filled variant: an in-flight run only exposes its
/// attempt counter, and its board appears all at once when the run ends.
#[derive(Debug, Clone, Default)]
pub enum BoardState {
    #[default]
    Empty,
    Loading { attempts: u32, budget: u32 },
    Ready(GenerationReport),
}

impl BoardState {
    pub fn board(&self) -> Option<&Board> {
        match self {
            BoardState::Ready(report) => Some(&report.board),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        match self {
            BoardState::Ready(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, BoardState::Loading { .. })
    }
}
