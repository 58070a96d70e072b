//! Price tiers and the threshold ladders that assign them.
//!
//! A ladder is a total, order-preserving step function from strength score
//! to tier: a higher score never lands in a lower tier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five ranked buckets. `Five` is the strongest and most
/// expensive, `One` the weakest and cheapest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Tier {
    /// All tiers, strongest first. This is the board's row order.
    pub const DESCENDING: [Tier; 5] = [Tier::Five, Tier::Four, Tier::Three, Tier::Two, Tier::One];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Tier> {
        match value {
            1 => Some(Tier::One),
            2 => Some(Tier::Two),
            3 => Some(Tier::Three),
            4 => Some(Tier::Four),
            5 => Some(Tier::Five),
            _ => None,
        }
    }

    /// Row label shown on the board, e.g. `$5`.
    pub fn label(self) -> String {
        format!("${}", self.value())
    }

    /// Zero-based position counted from tier one.
    pub(crate) fn index(self) -> usize {
        self.value() as usize - 1
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.value())
    }
}

/// Which threshold ladder a [`TierLadder`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LadderKind {
    /// 600 / 500 / 400 / 300.
    #[default]
    Classic,
    /// 550 / 450 / 350 / 300.
    Rebalanced,
    /// User-supplied floors.
    Custom,
}

impl LadderKind {
    pub fn name(self) -> &'static str {
        match self {
            LadderKind::Classic => "classic",
            LadderKind::Rebalanced => "rebalanced",
            LadderKind::Custom => "custom",
        }
    }

    /// The ladder for a named kind. `Custom` has no predefined floors and
    /// yields `None`.
    pub fn ladder(self) -> Option<TierLadder> {
        match self {
            LadderKind::Classic => Some(TierLadder::CLASSIC),
            LadderKind::Rebalanced => Some(TierLadder::REBALANCED),
            LadderKind::Custom => None,
        }
    }
}

impl fmt::Display for LadderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LadderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" | "a" => Ok(LadderKind::Classic),
            "rebalanced" | "b" => Ok(LadderKind::Rebalanced),
            other => Err(format!(
                "unknown ladder '{other}' (expected 'classic' or 'rebalanced')"
            )),
        }
    }
}

/// Score floors for tiers five through two. Anything below the last floor
/// is tier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLadder {
    kind: LadderKind,
    floors: [u32; 4],
}

impl TierLadder {
    pub const CLASSIC: TierLadder = TierLadder {
        kind: LadderKind::Classic,
        floors: [600, 500, 400, 300],
    };

    pub const REBALANCED: TierLadder = TierLadder {
        kind: LadderKind::Rebalanced,
        floors: [550, 450, 350, 300],
    };

    /// Build a custom ladder from floors for tiers 5, 4, 3 and 2.
    ///
    /// Floors must be strictly descending.
    pub fn new(floors: [u32; 4]) -> Result<Self, String> {
        if floors.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(format!("ladder floors must be strictly descending, got {floors:?}"));
        }
        Ok(Self {
            kind: LadderKind::Custom,
            floors,
        })
    }

    pub fn kind(&self) -> LadderKind {
        self.kind
    }

    /// Map a strength score to its tier.
    pub fn assign(&self, score: u32) -> Tier {
        self.floors
            .iter()
            .zip([Tier::Five, Tier::Four, Tier::Three, Tier::Two])
            .find(|(floor, _)| score >= **floor)
            .map(|(_, tier)| tier)
            .unwrap_or(Tier::One)
    }

    /// Lowest score that lands in `tier`.
    pub fn floor(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Five => self.floors[0],
            Tier::Four => self.floors[1],
            Tier::Three => self.floors[2],
            Tier::Two => self.floors[3],
            Tier::One => 0,
        }
    }
}

impl Default for TierLadder {
    fn default() -> Self {
        TierLadder::CLASSIC
    }
}
