// Persistence seam: where games and players come from and go back to.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;

use crate::model::{Game, GameId, Player, PlayerId};

/// Storage collaborator for the rotation engine.
///
/// Implementations hand back games that already satisfy the model
/// invariants; `load_game` must apply [`Game::migrate_legacy_minutes`] before
/// returning so callers only ever see per-player minutes.
pub trait GameStore {
    fn load_game(&self, id: &GameId) -> Result<Option<Game>>;
    fn save_game(&self, game: &Game) -> Result<()>;
    /// Every stored game, oldest first.
    fn list_games(&self) -> Result<Vec<Game>>;

    fn load_player(&self, id: &PlayerId) -> Result<Option<Player>>;
    fn save_player(&self, player: &Player) -> Result<()>;
    /// Every rostered player, ordered by creation time.
    fn list_players(&self) -> Result<Vec<Player>>;
}

/// Process-local store, handy for tests and for embedding the engine
/// without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: BTreeMap<GameId, Game>,
    players: BTreeMap<PlayerId, Player>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means another caller panicked mid-write of a
        // whole value; the maps themselves are still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GameStore for MemoryStore {
    fn load_game(&self, id: &GameId) -> Result<Option<Game>> {
        let mut game = self.inner().games.get(id).cloned();
        if let Some(game) = game.as_mut() {
            game.migrate_legacy_minutes();
        }
        Ok(game)
    }

    fn save_game(&self, game: &Game) -> Result<()> {
        self.inner().games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    fn list_games(&self) -> Result<Vec<Game>> {
        let mut games: Vec<Game> = self.inner().games.values().cloned().collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        for game in &mut games {
            game.migrate_legacy_minutes();
        }
        Ok(games)
    }

    fn load_player(&self, id: &PlayerId) -> Result<Option<Player>> {
        Ok(self.inner().players.get(id).cloned())
    }

    fn save_player(&self, player: &Player) -> Result<()> {
        self.inner().players.insert(player.id.clone(), player.clone());
        Ok(())
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self.inner().players.values().cloned().collect();
        players.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(players)
    }
}
