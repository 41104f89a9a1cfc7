// Error kinds raised by rotation bookkeeping and scheduling.

use thiserror::Error;

use crate::model::{GameId, PlayerId, Slot};

/// Every rotation error is fatal to the operation that raised it and leaves
/// the game untouched. None of them are transient, so callers never retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RotationError {
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("invalid substitution in {slot}: {reason}")]
    InvalidSubstitution { slot: Slot, reason: String },

    #[error("invalid minutes for {player} in {slot}: {minutes} (allowed 0..={max})")]
    InvalidMinutes {
        slot: Slot,
        player: PlayerId,
        minutes: i64,
        max: u32,
    },

    #[error("no attending players available to fill {slot}")]
    InsufficientRoster { slot: Slot },

    #[error("invalid slot: quarter {quarter}, swap {swap}")]
    InvalidSlot { quarter: u8, swap: u8 },

    #[error("invalid rotation for {slot}: {reason}")]
    InvalidRotation { slot: Slot, reason: String },

    #[error("invalid swaps attended for {player}: {swaps} (allowed 0..=8)")]
    InvalidAttendance { player: PlayerId, swaps: u8 },

    #[error("game {0} has not been started")]
    GameNotStarted(GameId),
}
