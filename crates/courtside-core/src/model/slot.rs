// Rotation slots: the eight (quarter, swap) windows of a game.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RotationError;

/// Quarters per game.
pub const QUARTERS: u8 = 4;

/// Swaps (rotation windows) per quarter.
pub const SWAPS_PER_QUARTER: u8 = 2;

/// Rotation slots per game.
pub const SLOTS_PER_GAME: u8 = QUARTERS * SWAPS_PER_QUARTER;

/// Length of one slot in minutes. No player is ever credited more than this
/// for a single slot.
pub const SLOT_MINUTES: u32 = 4;

/// Nominal lineup size. Smaller rosters field everyone they have.
pub const PLAYERS_ON_COURT: usize = 5;

/// Minutes a player is expected to share in over a game, used to derive the
/// per-player target (`GAME_MINUTES / attending`).
pub const GAME_MINUTES: f64 = 32.0;

/// Upper bound accepted by an explicit per-player minute correction.
pub const MAX_EDIT_MINUTES: u32 = 8;

/// One of the eight rotation windows. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SlotRepr")]
pub struct Slot {
    quarter: u8,
    swap: u8,
}

/// Unchecked wire form; validated on the way in.
#[derive(Deserialize)]
struct SlotRepr {
    quarter: u8,
    swap: u8,
}

impl TryFrom<SlotRepr> for Slot {
    type Error = RotationError;

    fn try_from(repr: SlotRepr) -> Result<Self, Self::Error> {
        Slot::new(repr.quarter, repr.swap)
    }
}

impl Slot {
    /// Build a slot from a 1-based quarter (1..=4) and swap (1..=2).
    pub fn new(quarter: u8, swap: u8) -> Result<Self, RotationError> {
        if !(1..=QUARTERS).contains(&quarter) || !(1..=SWAPS_PER_QUARTER).contains(&swap) {
            return Err(RotationError::InvalidSlot { quarter, swap });
        }
        Ok(Slot { quarter, swap })
    }

    /// Build a slot from its rotation number (1..=8).
    ///
    /// `quarter = ceil(n / 2)`, `swap = ((n - 1) mod 2) + 1`.
    pub fn from_number(number: u8) -> Result<Self, RotationError> {
        if !(1..=SLOTS_PER_GAME).contains(&number) {
            return Err(RotationError::InvalidSlot {
                quarter: number.div_ceil(SWAPS_PER_QUARTER),
                swap: 0,
            });
        }
        Ok(Slot {
            quarter: number.div_ceil(SWAPS_PER_QUARTER),
            swap: (number - 1) % SWAPS_PER_QUARTER + 1,
        })
    }

    /// The first slot of a game.
    pub fn first() -> Self {
        Slot { quarter: 1, swap: 1 }
    }

    /// All eight slots in play order.
    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=QUARTERS).flat_map(|quarter| {
            (1..=SWAPS_PER_QUARTER).map(move |swap| Slot { quarter, swap })
        })
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    pub fn swap(&self) -> u8 {
        self.swap
    }

    /// 1-based rotation number (1..=8).
    pub fn number(&self) -> u8 {
        (self.quarter - 1) * SWAPS_PER_QUARTER + self.swap
    }

    /// The slot after this one, or `None` once the game is over.
    pub fn next(&self) -> Option<Slot> {
        if self.swap < SWAPS_PER_QUARTER {
            Some(Slot {
                quarter: self.quarter,
                swap: self.swap + 1,
            })
        } else if self.quarter < QUARTERS {
            Some(Slot {
                quarter: self.quarter + 1,
                swap: 1,
            })
        } else {
            None
        }
    }

    /// Storage key used for per-slot maps, e.g. `q2s1`.
    pub fn key(&self) -> String {
        format!("q{}s{}", self.quarter, self.swap)
    }

    /// Parse a key produced by [`Slot::key`].
    pub fn from_key(key: &str) -> Option<Slot> {
        let rest = key.strip_prefix('q')?;
        let (quarter, swap) = rest.split_once('s')?;
        Slot::new(quarter.parse().ok()?, swap.parse().ok()?).ok()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} swap {}", self.quarter, self.swap)
    }
}
