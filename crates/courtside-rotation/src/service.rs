// Service facade: sequences load -> mutate -> save against a GameStore so
// callers never hold partially-applied state.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use courtside_core::config::WeightedWeights;
use courtside_core::model::{Game, GameId, Player, PlayerId, Rotation, Slot, StatKind, Strategy};
use courtside_core::store::GameStore;
use courtside_core::RotationError;

use crate::optimizer::{self, PlanRequest, RotationPlan};
use crate::scoring::RankedPlayer;
use crate::stats::{self, SeasonStats};
use crate::{manual, recommend, substitution};

/// Errors surfaced by [`RotationService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    /// The domain error, if this is one.
    pub fn rotation(&self) -> Option<&RotationError> {
        match self {
            ServiceError::Rotation(e) => Some(e),
            ServiceError::Storage(_) => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entry point for hosts. Every mutation loads the game, applies the change
/// to that copy and saves only on success.
pub struct RotationService<S> {
    store: S,
    weights: WeightedWeights,
}

impl<S: GameStore> RotationService<S> {
    pub fn new(store: S, weights: WeightedWeights) -> Self {
        RotationService { store, weights }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn weights(&self) -> WeightedWeights {
        self.weights
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn add_player(&self, name: &str, jersey_number: u16) -> ServiceResult<Player> {
        let player = Player::new(name, jersey_number);
        self.store.save_player(&player)?;
        info!(player = %player.id, name = %player.name, jersey_number, "player added");
        Ok(player)
    }

    pub fn players(&self) -> ServiceResult<Vec<Player>> {
        Ok(self.store.list_players()?)
    }

    pub fn player(&self, id: &PlayerId) -> ServiceResult<Player> {
        self.store
            .load_player(id)?
            .ok_or_else(|| RotationError::PlayerNotFound(id.clone()).into())
    }

    /// Season totals for `player` across every stored game.
    pub fn season_stats(&self, player: &PlayerId) -> ServiceResult<SeasonStats> {
        self.player(player)?;
        let games = self.store.list_games()?;
        Ok(stats::season_stats(player, &games))
    }

    // ------------------------------------------------------------------
    // Game lifecycle
    // ------------------------------------------------------------------

    pub fn create_game(&self, opponent: &str, date: NaiveDate, location: &str) -> ServiceResult<Game> {
        let game = Game::new(opponent, date, location);
        self.store.save_game(&game)?;
        info!(game = %game.id, opponent = %game.opponent, %date, "game created");
        Ok(game)
    }

    pub fn game(&self, id: &GameId) -> ServiceResult<Game> {
        self.store
            .load_game(id)?
            .ok_or_else(|| RotationError::GameNotFound(id.clone()).into())
    }

    pub fn games(&self) -> ServiceResult<Vec<Game>> {
        Ok(self.store.list_games()?)
    }

    /// Mark `player` as attending (or not) the game.
    pub fn set_attendance(&self, id: &GameId, player: &PlayerId, attending: bool) -> ServiceResult<Game> {
        self.player(player)?;
        self.update(id, |game| {
            if attending {
                game.attendance.insert(player.clone());
            } else {
                game.attendance.remove(player);
            }
            Ok(game.clone())
        })
    }

    pub fn set_swaps_attended(&self, id: &GameId, player: &PlayerId, swaps: u8) -> ServiceResult<()> {
        self.player(player)?;
        self.update(id, |game| game.set_swaps_attended(player, swaps))
    }

    pub fn record_stat(&self, id: &GameId, player: &PlayerId, kind: StatKind) -> ServiceResult<()> {
        self.player(player)?;
        self.update(id, |game| {
            game.increment_stat(player, kind);
            Ok(())
        })
    }

    pub fn start_game(&self, id: &GameId) -> ServiceResult<Slot> {
        self.update(id, |game| {
            game.start()?;
            info!(game = %game.id, attending = game.attendance.len(), "game started");
            Ok(Slot::first())
        })
    }

    /// Record the opening lineup of `slot`. Every player must be rostered.
    pub fn record_rotation(&self, id: &GameId, slot: Slot, players: Vec<PlayerId>) -> ServiceResult<Rotation> {
        for player in &players {
            self.player(player)?;
        }
        self.update(id, |game| game.record_rotation(slot, players).cloned())
    }

    /// Move to the next slot; `None` once the game is over.
    pub fn advance(&self, id: &GameId) -> ServiceResult<Option<Slot>> {
        self.update(id, |game| {
            let next = game.advance()?;
            match next {
                Some(slot) => info!(game = %game.id, %slot, "advanced"),
                None => info!(game = %game.id, "final slot played, game completed"),
            }
            Ok(next)
        })
    }

    pub fn end_game(&self, id: &GameId) -> ServiceResult<()> {
        self.update(id, |game| {
            stats::refresh_play_time(game);
            game.end();
            info!(game = %game.id, "game ended");
            Ok(())
        })
    }

    /// Rewrite each attendee's derived play time from the rotation history.
    pub fn refresh_play_time(&self, id: &GameId) -> ServiceResult<()> {
        self.update(id, |game| {
            stats::refresh_play_time(game);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Rank attendees for the next slot from what has been played so far.
    pub fn recommend(
        &self,
        id: &GameId,
        strategy: Strategy,
        count: usize,
        exclude: &BTreeSet<PlayerId>,
    ) -> ServiceResult<Vec<RankedPlayer>> {
        let game = self.game(id)?;
        let roster = self.store.list_players()?;
        let season = self.store.list_games()?;
        Ok(recommend::recommend(
            &game,
            &roster,
            &season,
            strategy,
            self.weights,
            count,
            exclude,
        )?)
    }

    /// Plan all 8 slots. Under `manual`, lineups chosen for slots with no
    /// entry are stored as that slot's manual entry.
    pub fn optimize(&self, id: &GameId, strategy: Strategy) -> ServiceResult<RotationPlan> {
        let game = self.game(id)?;
        let roster = self.store.list_players()?;
        let season = self.store.list_games()?;
        let attending: Vec<PlayerId> = game.attendance.iter().cloned().collect();

        let plan = optimizer::optimize(&PlanRequest {
            game: &game,
            roster: &roster,
            season_games: &season,
            attending: &attending,
            strategy,
            weights: self.weights,
        })?;

        if !plan.seeded_overrides.is_empty() {
            let seeds = plan.seeded_overrides.clone();
            let applied = self.update(id, |game| Ok(manual::apply_seeds(game, &seeds)))?;
            info!(game = %id, applied, "manual lineups seeded");
        }
        Ok(plan)
    }

    // ------------------------------------------------------------------
    // Manual overrides
    // ------------------------------------------------------------------

    pub fn manual_lineup(&self, id: &GameId, slot: Slot) -> ServiceResult<Option<Vec<PlayerId>>> {
        let game = self.game(id)?;
        Ok(manual::get(&game, slot).map(<[PlayerId]>::to_vec))
    }

    pub fn set_manual_lineup(&self, id: &GameId, slot: Slot, players: Vec<PlayerId>) -> ServiceResult<()> {
        for player in &players {
            self.player(player)?;
        }
        self.update(id, |game| manual::set(game, slot, players))
    }

    pub fn toggle_manual_player(&self, id: &GameId, slot: Slot, player: &PlayerId) -> ServiceResult<Vec<PlayerId>> {
        self.player(player)?;
        self.update(id, |game| {
            manual::toggle(game, slot, player)?;
            Ok(manual::get(game, slot).map(<[PlayerId]>::to_vec).unwrap_or_default())
        })
    }

    /// Clear one slot's manual lineup, or all of them.
    pub fn clear_manual(&self, id: &GameId, slot: Option<Slot>) -> ServiceResult<()> {
        self.update(id, |game| {
            match slot {
                Some(slot) => manual::clear(game, slot),
                None => manual::clear_all(game),
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // In-slot changes
    // ------------------------------------------------------------------

    pub fn substitute(
        &self,
        id: &GameId,
        slot: Slot,
        player_out: &PlayerId,
        player_in: &PlayerId,
    ) -> ServiceResult<Rotation> {
        self.player(player_in)?;
        self.update(id, |game| substitution::substitute(game, slot, player_out, player_in))
    }

    pub fn edit_minutes(&self, id: &GameId, slot: Slot, player: &PlayerId, minutes: i64) -> ServiceResult<()> {
        self.update(id, |game| substitution::edit_minutes(game, slot, player, minutes))
    }

    /// Load, apply `f` to a copy, save on success. On error nothing is
    /// written.
    fn update<T, F>(&self, id: &GameId, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Game) -> Result<T, RotationError>,
    {
        let mut game = self.game(id)?;
        let out = f(&mut game).map_err(|e| {
            warn!(game = %id, error = %e, "operation rejected");
            e
        })?;
        self.store.save_game(&game)?;
        Ok(out)
    }
}
