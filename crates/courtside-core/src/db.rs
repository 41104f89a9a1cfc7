// SQLite persistence layer for players and games.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::model::{Game, GameId, Player, PlayerId};
use crate::store::GameStore;

/// SQLite-backed store. Players are stored as rows; each game aggregate is
/// stored whole as a JSON document, since the engine always reads and writes
/// a game as a unit.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                jersey_number INTEGER NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS games (
                id         TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Persist an arbitrary JSON value under `key`. Repeated saves overwrite
    /// the previous value.
    pub fn save_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize setting")?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save setting")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query setting")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize setting"))
            .transpose()
    }

    /// Delete every game and setting. Players are preserved.
    pub fn clear_games(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM games", [])
            .context("failed to delete games")?;
        tx.execute("DELETE FROM settings", [])
            .context("failed to delete settings")?;
        tx.commit().context("failed to commit clear_games")?;
        Ok(())
    }
}

fn parse_game(payload: &str) -> Result<Game> {
    let mut game: Game = serde_json::from_str(payload).context("failed to deserialize game")?;
    game.migrate_legacy_minutes();
    Ok(game)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp `{raw}`"))?
        .with_timezone(&Utc))
}

impl GameStore for Database {
    fn load_game(&self, id: &GameId) -> Result<Option<Game>> {
        let conn = self.conn();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM games WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query game")?;

        payload.as_deref().map(parse_game).transpose()
    }

    fn save_game(&self, game: &Game) -> Result<()> {
        let conn = self.conn();
        let payload = serde_json::to_string(game).context("failed to serialize game")?;
        conn.execute(
            "INSERT INTO games (id, payload, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                payload    = excluded.payload,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![game.id.as_str(), payload, game.created_at.to_rfc3339()],
        )
        .context("failed to save game")?;
        debug!(game = %game.id, rotations = game.rotations.len(), "game saved");
        Ok(())
    }

    fn list_games(&self) -> Result<Vec<Game>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT payload FROM games ORDER BY created_at, id")
            .context("failed to prepare list_games query")?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("failed to query games")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map game rows")?;

        payloads.iter().map(|p| parse_game(p)).collect()
    }

    fn load_player(&self, id: &PlayerId) -> Result<Option<Player>> {
        let conn = self.conn();
        let row: Option<(String, String, u16, String)> = conn
            .query_row(
                "SELECT id, name, jersey_number, created_at FROM players WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .context("failed to query player")?;

        row.map(|(id, name, jersey_number, created_at)| {
            Ok(Player {
                id: PlayerId::from(id),
                name,
                jersey_number,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .transpose()
    }

    fn save_player(&self, player: &Player) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO players (id, name, jersey_number, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name          = excluded.name,
                jersey_number = excluded.jersey_number",
            params![
                player.id.as_str(),
                player.name,
                player.jersey_number,
                player.created_at.to_rfc3339(),
            ],
        )
        .context("failed to save player")?;
        Ok(())
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, jersey_number, created_at FROM players
                 ORDER BY created_at, id",
            )
            .context("failed to prepare list_players query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u16>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        rows.into_iter()
            .map(|(id, name, jersey_number, created_at)| {
                Ok(Player {
                    id: PlayerId::from(id),
                    name,
                    jersey_number,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rotation, Slot};
    use chrono::NaiveDate;
    use serde_json::json;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_game() -> Game {
        let mut game = Game::new("Hornets", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Gym");
        game.attendance = ["a", "b", "c"].iter().map(|&s| PlayerId::from(s)).collect();
        game
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"players".to_string()));
        assert!(tables.contains(&"games".to_string()));
        assert!(tables.contains(&"settings".to_string()));
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    #[test]
    fn save_and_list_players() {
        let db = test_db();
        let first = Player::new("Ava", 4);
        let mut second = Player::new("Ben", 11);
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        db.save_player(&second).unwrap();
        db.save_player(&first).unwrap();

        let players = db.list_players().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Ava");
        assert_eq!(players[1].jersey_number, 11);

        let loaded = db.load_player(&first.id).unwrap().unwrap();
        assert_eq!(loaded.created_at, first.created_at);
    }

    #[test]
    fn save_player_updates_in_place() {
        let db = test_db();
        let mut player = Player::new("Ava", 4);
        db.save_player(&player).unwrap();

        player.jersey_number = 23;
        db.save_player(&player).unwrap();

        let players = db.list_players().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].jersey_number, 23);
    }

    #[test]
    fn load_player_missing_is_none() {
        let db = test_db();
        assert!(db.load_player(&"ghost".into()).unwrap().is_none());
    }

    // ------------------------------------------------------------------
    // Games
    // ------------------------------------------------------------------

    #[test]
    fn save_and_load_game() {
        let db = test_db();
        let mut game = sample_game();
        game.record_rotation(Slot::first(), vec!["a".into(), "b".into()])
            .unwrap();
        game.manual_rotations
            .insert(Slot::first().key(), vec!["a".into()]);

        db.save_game(&game).unwrap();
        let loaded = db.load_game(&game.id).unwrap().unwrap();
        assert_eq!(loaded, game);
    }

    #[test]
    fn save_game_overwrites_previous_payload() {
        let db = test_db();
        let mut game = sample_game();
        db.save_game(&game).unwrap();

        game.record_rotation(Slot::first(), vec!["c".into()]).unwrap();
        db.save_game(&game).unwrap();

        let games = db.list_games().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].rotations.len(), 1);
    }

    #[test]
    fn load_game_migrates_legacy_minutes() {
        let db = test_db();
        let mut game = sample_game();
        game.rotations.push(Rotation {
            slot: Slot::first(),
            players_on_court: vec!["a".into(), "b".into()],
            player_minutes: Default::default(),
            minutes: Some(4),
        });
        db.save_game(&game).unwrap();

        let loaded = db.load_game(&game.id).unwrap().unwrap();
        assert_eq!(loaded.player_minutes(&"a".into()), 4);
        assert!(loaded.rotations.iter().all(|r| r.minutes.is_none()));
    }

    #[test]
    fn load_game_missing_is_none() {
        let db = test_db();
        assert!(db.load_game(&"nope".into()).unwrap().is_none());
    }

    #[test]
    fn list_games_in_creation_order() {
        let db = test_db();
        let older = sample_game();
        let mut newer = sample_game();
        newer.created_at = older.created_at + chrono::Duration::days(1);

        db.save_game(&newer).unwrap();
        db.save_game(&older).unwrap();

        let games = db.list_games().unwrap();
        assert_eq!(games[0].id, older.id);
        assert_eq!(games[1].id, newer.id);
    }

    // ------------------------------------------------------------------
    // Settings (key-value)
    // ------------------------------------------------------------------

    #[test]
    fn settings_round_trip_and_overwrite() {
        let db = test_db();
        assert!(db.load_setting("active_game").unwrap().is_none());

        db.save_setting("active_game", &json!("g1")).unwrap();
        db.save_setting("active_game", &json!("g2")).unwrap();
        assert_eq!(db.load_setting("active_game").unwrap(), Some(json!("g2")));
    }

    #[test]
    fn clear_games_keeps_players() {
        let db = test_db();
        db.save_player(&Player::new("Ava", 4)).unwrap();
        db.save_game(&sample_game()).unwrap();
        db.save_setting("active_game", &json!("g1")).unwrap();

        db.clear_games().unwrap();

        assert!(db.list_games().unwrap().is_empty());
        assert!(db.load_setting("active_game").unwrap().is_none());
        assert_eq!(db.list_players().unwrap().len(), 1);
    }

    #[test]
    fn reopen_on_disk_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courtside.db");
        let path_str = path.to_str().unwrap();

        let game = sample_game();
        {
            let db = Database::open(path_str).unwrap();
            db.save_game(&game).unwrap();
        }

        let db = Database::open(path_str).unwrap();
        assert_eq!(db.load_game(&game.id).unwrap(), Some(game));
    }
}
