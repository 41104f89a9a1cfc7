// Game aggregate: attendance, append-only rotation history, per-player stats
// and manual rotation overrides.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::player::{GameId, PlayerId};
use super::slot::{Slot, PLAYERS_ON_COURT, SLOTS_PER_GAME, SLOT_MINUTES};
use crate::error::RotationError;

// ---------------------------------------------------------------------------
// Rotation history entries
// ---------------------------------------------------------------------------

/// One history entry for a slot.
///
/// A slot may accumulate several entries (the opening lineup followed by one
/// entry per substitution). The latest entry for a slot is authoritative: it
/// holds the current on-court set and the full per-player minute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(flatten)]
    pub slot: Slot,
    pub players_on_court: Vec<PlayerId>,
    /// Minutes credited per player for this slot, each in `0..=SLOT_MINUTES`.
    #[serde(default)]
    pub player_minutes: BTreeMap<PlayerId, u32>,
    /// Legacy flat minutes figure from before per-player crediting existed.
    /// Cleared by [`Game::migrate_legacy_minutes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

impl Rotation {
    /// A fresh lineup for `slot`, each player credited the full slot.
    pub fn new(slot: Slot, players_on_court: Vec<PlayerId>) -> Self {
        let player_minutes = players_on_court
            .iter()
            .map(|id| (id.clone(), SLOT_MINUTES))
            .collect();
        Rotation {
            slot,
            players_on_court,
            player_minutes,
            minutes: None,
        }
    }

    /// Minutes credited to `player` in this slot (0 when absent).
    pub fn minutes_for(&self, player: &PlayerId) -> u32 {
        self.player_minutes.get(player).copied().unwrap_or(0)
    }

    pub fn is_on_court(&self, player: &PlayerId) -> bool {
        self.players_on_court.contains(player)
    }

    /// Sum of credited minutes across every player in the slot.
    pub fn total_minutes(&self) -> u32 {
        self.player_minutes.values().sum()
    }

    /// Convert the legacy flat `minutes` field into per-player minutes.
    /// Returns `true` if anything changed. Running it twice is a no-op.
    fn migrate_legacy(&mut self) -> bool {
        let Some(flat) = self.minutes.take() else {
            return false;
        };
        if self.player_minutes.is_empty() {
            let credited = flat.min(SLOT_MINUTES);
            for id in &self.players_on_court {
                self.player_minutes.insert(id.clone(), credited);
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Per-player game stats
// ---------------------------------------------------------------------------

/// Counters tracked per player per game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    #[serde(default)]
    pub steals: u32,
    #[serde(default)]
    pub rebounds: u32,
    #[serde(default)]
    pub attempts_1pt: u32,
    #[serde(default)]
    pub made_1pt: u32,
    #[serde(default)]
    pub attempts_2pt: u32,
    #[serde(default)]
    pub made_2pt: u32,
    #[serde(default)]
    pub attempts_3pt: u32,
    #[serde(default)]
    pub made_3pt: u32,
    /// Derived from the rotation history; refreshed explicitly.
    #[serde(default)]
    pub play_time_minutes: u32,
    /// Slots of this game the player was present for. `None` means the
    /// player attended the whole game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swaps_attended: Option<u8>,
}

impl PlayerGameStats {
    /// Slots attended, defaulting to a full game.
    pub fn swaps_attended_or_full(&self) -> u8 {
        self.swaps_attended.unwrap_or(SLOTS_PER_GAME)
    }

    pub fn points(&self) -> u32 {
        self.made_1pt + self.made_2pt * 2 + self.made_3pt * 3
    }
}

/// A countable in-game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Steal,
    Rebound,
    Attempt1pt,
    Made1pt,
    Attempt2pt,
    Made2pt,
    Attempt3pt,
    Made3pt,
}

// ---------------------------------------------------------------------------
// Game aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Completed,
}

/// The aggregate root for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub opponent: String,
    pub date: NaiveDate,
    pub location: String,
    pub status: GameStatus,
    #[serde(default)]
    pub attendance: BTreeSet<PlayerId>,
    /// Append-only history. See [`Rotation`].
    #[serde(default)]
    pub rotations: Vec<Rotation>,
    #[serde(default)]
    pub stats: BTreeMap<PlayerId, PlayerGameStats>,
    /// The slot currently being played, once the game has started.
    #[serde(default)]
    pub current_slot: Option<Slot>,
    /// Manual lineups keyed by [`Slot::key`].
    #[serde(default)]
    pub manual_rotations: BTreeMap<String, Vec<PlayerId>>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn new(opponent: &str, date: NaiveDate, location: &str) -> Self {
        Game {
            id: GameId::generate(),
            opponent: opponent.trim().to_string(),
            date,
            location: location.trim().to_string(),
            status: GameStatus::Scheduled,
            attendance: BTreeSet::new(),
            rotations: Vec::new(),
            stats: BTreeMap::new(),
            current_slot: None,
            manual_rotations: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_attending(&self, player: &PlayerId) -> bool {
        self.attendance.contains(player)
    }

    // ------------------------------------------------------------------
    // History reads
    // ------------------------------------------------------------------

    /// The authoritative (latest) entry for `slot`, if it has been played.
    pub fn slot_state(&self, slot: Slot) -> Option<&Rotation> {
        self.rotations.iter().rev().find(|r| r.slot == slot)
    }

    /// Mutable access to the latest entry for `slot`. Only per-player minute
    /// corrections should go through here; everything else appends.
    pub fn slot_state_mut(&mut self, slot: Slot) -> Option<&mut Rotation> {
        self.rotations.iter_mut().rev().find(|r| r.slot == slot)
    }

    pub fn has_history(&self, slot: Slot) -> bool {
        self.rotations.iter().any(|r| r.slot == slot)
    }

    /// Every slot with at least one history entry, in play order.
    pub fn played_slots(&self) -> BTreeSet<Slot> {
        self.rotations.iter().map(|r| r.slot).collect()
    }

    /// Minutes credited to `player` across the whole game.
    pub fn player_minutes(&self, player: &PlayerId) -> u32 {
        self.played_slots()
            .into_iter()
            .filter_map(|slot| self.slot_state(slot))
            .map(|r| r.minutes_for(player))
            .sum()
    }

    /// Stats for `player`, or an empty record.
    pub fn stats_for(&self, player: &PlayerId) -> PlayerGameStats {
        self.stats.get(player).cloned().unwrap_or_default()
    }

    /// Slots of this game `player` attended (8 unless recorded otherwise).
    pub fn swaps_attended(&self, player: &PlayerId) -> u8 {
        self.stats
            .get(player)
            .map(PlayerGameStats::swaps_attended_or_full)
            .unwrap_or(SLOTS_PER_GAME)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Record the opening lineup for `slot`.
    ///
    /// A slot is written once; later changes go through substitutions. The
    /// lineup must hold between 1 and 5 distinct players.
    pub fn record_rotation(
        &mut self,
        slot: Slot,
        players: Vec<PlayerId>,
    ) -> Result<&Rotation, RotationError> {
        if players.is_empty() {
            return Err(RotationError::InsufficientRoster { slot });
        }
        if players.len() > PLAYERS_ON_COURT {
            return Err(RotationError::InvalidRotation {
                slot,
                reason: format!(
                    "{} players on court (at most {PLAYERS_ON_COURT})",
                    players.len()
                ),
            });
        }
        let distinct: BTreeSet<&PlayerId> = players.iter().collect();
        if distinct.len() != players.len() {
            return Err(RotationError::InvalidRotation {
                slot,
                reason: "duplicate player in lineup".into(),
            });
        }
        if self.has_history(slot) {
            return Err(RotationError::InvalidRotation {
                slot,
                reason: "slot already recorded".into(),
            });
        }

        debug!(game = %self.id, %slot, players = players.len(), "recording rotation");
        let idx = self.rotations.len();
        self.rotations.push(Rotation::new(slot, players));
        Ok(&self.rotations[idx])
    }

    /// Append a superseding entry for a slot that already has history.
    pub fn append_rotation(&mut self, rotation: Rotation) {
        self.rotations.push(rotation);
    }

    /// Record how many slots `player` was present for.
    pub fn set_swaps_attended(&mut self, player: &PlayerId, swaps: u8) -> Result<(), RotationError> {
        if swaps > SLOTS_PER_GAME {
            return Err(RotationError::InvalidAttendance {
                player: player.clone(),
                swaps,
            });
        }
        self.stats.entry(player.clone()).or_default().swaps_attended = Some(swaps);
        Ok(())
    }

    /// Bump one counter for `player`.
    pub fn increment_stat(&mut self, player: &PlayerId, kind: StatKind) {
        let stats = self.stats.entry(player.clone()).or_default();
        let counter = match kind {
            StatKind::Steal => &mut stats.steals,
            StatKind::Rebound => &mut stats.rebounds,
            StatKind::Attempt1pt => &mut stats.attempts_1pt,
            StatKind::Made1pt => &mut stats.made_1pt,
            StatKind::Attempt2pt => &mut stats.attempts_2pt,
            StatKind::Made2pt => &mut stats.made_2pt,
            StatKind::Attempt3pt => &mut stats.attempts_3pt,
            StatKind::Made3pt => &mut stats.made_3pt,
        };
        *counter += 1;
    }

    /// Start the game at slot 1. Requires at least one attending player.
    pub fn start(&mut self) -> Result<(), RotationError> {
        if self.attendance.is_empty() {
            return Err(RotationError::InsufficientRoster { slot: Slot::first() });
        }
        self.status = GameStatus::InProgress;
        self.current_slot = Some(Slot::first());
        Ok(())
    }

    /// Move to the next slot. Returns the new slot, or `None` when the last
    /// slot has been played and the game is now complete.
    pub fn advance(&mut self) -> Result<Option<Slot>, RotationError> {
        let current = self
            .current_slot
            .filter(|_| self.status == GameStatus::InProgress)
            .ok_or_else(|| RotationError::GameNotStarted(self.id.clone()))?;
        match current.next() {
            Some(next) => {
                self.current_slot = Some(next);
                Ok(Some(next))
            }
            None => {
                self.status = GameStatus::Completed;
                Ok(None)
            }
        }
    }

    pub fn end(&mut self) {
        self.status = GameStatus::Completed;
    }

    /// Upgrade legacy flat-minute entries to per-player minutes.
    ///
    /// Applied once when a game is loaded so that the rest of the code only
    /// ever sees the per-player form. Returns the number of entries upgraded.
    pub fn migrate_legacy_minutes(&mut self) -> usize {
        let migrated = self
            .rotations
            .iter_mut()
            .map(Rotation::migrate_legacy)
            .filter(|changed| *changed)
            .count();
        if migrated > 0 {
            debug!(game = %self.id, migrated, "migrated legacy rotation minutes");
        }
        migrated
    }
}
