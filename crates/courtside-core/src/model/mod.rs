// Domain model: players, games, rotation slots.

pub mod game;
pub mod player;
pub mod slot;
pub mod strategy;

pub use game::{Game, GameStatus, PlayerGameStats, Rotation, StatKind};
pub use player::{GameId, Player, PlayerId};
pub use slot::{
    Slot, GAME_MINUTES, MAX_EDIT_MINUTES, PLAYERS_ON_COURT, SLOTS_PER_GAME, SLOT_MINUTES,
};
pub use strategy::Strategy;
