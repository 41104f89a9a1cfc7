// Manual override store: explicit per-slot lineups honored by the `manual`
// strategy, kept on the game under the slot key.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use courtside_core::model::{Game, PlayerId, Slot, PLAYERS_ON_COURT};
use courtside_core::RotationError;

/// The manual lineup for `slot`, if one is set.
pub fn get(game: &Game, slot: Slot) -> Option<&[PlayerId]> {
    game.manual_rotations.get(&slot.key()).map(Vec::as_slice)
}

/// Every manual entry, keyed by slot.
pub fn entries(game: &Game) -> BTreeMap<Slot, Vec<PlayerId>> {
    game.manual_rotations
        .iter()
        .filter_map(|(key, players)| Slot::from_key(key).map(|slot| (slot, players.clone())))
        .collect()
}

/// Replace the manual lineup for `slot`. An empty lineup removes the entry.
pub fn set(game: &mut Game, slot: Slot, players: Vec<PlayerId>) -> Result<(), RotationError> {
    validate(slot, &players)?;
    if players.is_empty() {
        game.manual_rotations.remove(&slot.key());
    } else {
        debug!(game = %game.id, %slot, players = players.len(), "manual lineup set");
        game.manual_rotations.insert(slot.key(), players);
    }
    Ok(())
}

/// Add `player` to the slot's manual lineup, or remove them if present.
pub fn toggle(game: &mut Game, slot: Slot, player: &PlayerId) -> Result<(), RotationError> {
    let mut players = get(game, slot).map(<[PlayerId]>::to_vec).unwrap_or_default();
    match players.iter().position(|p| p == player) {
        Some(idx) => {
            players.remove(idx);
        }
        None => players.push(player.clone()),
    }
    set(game, slot, players)
}

/// Remove the manual lineup for one slot.
pub fn clear(game: &mut Game, slot: Slot) {
    game.manual_rotations.remove(&slot.key());
}

/// Remove every manual lineup.
pub fn clear_all(game: &mut Game) {
    game.manual_rotations.clear();
}

/// Store lineups the optimizer chose for slots that had no manual entry.
/// Existing entries are never overwritten.
pub fn apply_seeds(game: &mut Game, seeds: &BTreeMap<Slot, Vec<PlayerId>>) -> usize {
    let mut applied = 0;
    for (slot, players) in seeds {
        if players.is_empty() || game.manual_rotations.contains_key(&slot.key()) {
            continue;
        }
        game.manual_rotations.insert(slot.key(), players.clone());
        applied += 1;
    }
    applied
}

fn validate(slot: Slot, players: &[PlayerId]) -> Result<(), RotationError> {
    if players.len() > PLAYERS_ON_COURT {
        return Err(RotationError::InvalidRotation {
            slot,
            reason: format!("{} players selected (at most {PLAYERS_ON_COURT})", players.len()),
        });
    }
    let distinct: BTreeSet<&PlayerId> = players.iter().collect();
    if distinct.len() != players.len() {
        return Err(RotationError::InvalidRotation {
            slot,
            reason: "duplicate player in manual lineup".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game() -> Game {
        Game::new("Hornets", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "Gym")
    }

    fn ids(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|n| PlayerId::from(*n)).collect()
    }

    #[test]
    fn set_and_get_use_slot_key() {
        let mut game = game();
        let slot = Slot::new(2, 1).unwrap();
        set(&mut game, slot, ids(&["a", "b"])).unwrap();
        assert_eq!(get(&game, slot).unwrap(), ids(&["a", "b"]).as_slice());
        assert!(game.manual_rotations.contains_key("q2s1"));
        assert!(get(&game, Slot::first()).is_none());
    }

    #[test]
    fn toggle_is_symmetric_difference() {
        let mut game = game();
        let slot = Slot::first();
        toggle(&mut game, slot, &"a".into()).unwrap();
        toggle(&mut game, slot, &"b".into()).unwrap();
        assert_eq!(get(&game, slot).unwrap(), ids(&["a", "b"]).as_slice());

        toggle(&mut game, slot, &"a".into()).unwrap();
        assert_eq!(get(&game, slot).unwrap(), ids(&["b"]).as_slice());

        toggle(&mut game, slot, &"b".into()).unwrap();
        assert!(get(&game, slot).is_none());
    }

    #[test]
    fn sixth_player_is_rejected() {
        let mut game = game();
        let slot = Slot::first();
        set(&mut game, slot, ids(&["a", "b", "c", "d", "e"])).unwrap();
        assert!(matches!(
            toggle(&mut game, slot, &"f".into()),
            Err(RotationError::InvalidRotation { .. })
        ));
        assert_eq!(get(&game, slot).unwrap().len(), 5);
    }

    #[test]
    fn seeds_never_overwrite_entries() {
        let mut game = game();
        let s1 = Slot::first();
        let s2 = Slot::from_number(2).unwrap();
        set(&mut game, s1, ids(&["a"])).unwrap();

        let seeds: BTreeMap<Slot, Vec<PlayerId>> =
            [(s1, ids(&["z"])), (s2, ids(&["b", "c"]))].into_iter().collect();
        assert_eq!(apply_seeds(&mut game, &seeds), 1);
        assert_eq!(get(&game, s1).unwrap(), ids(&["a"]).as_slice());
        assert_eq!(entries(&game).len(), 2);

        clear(&mut game, s1);
        assert!(get(&game, s1).is_none());
        clear_all(&mut game);
        assert!(entries(&game).is_empty());
    }
}
