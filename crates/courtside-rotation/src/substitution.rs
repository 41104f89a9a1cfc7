// Substitution and time-split engine: mid-slot swaps and per-player minute
// corrections on slots that already have history.

use tracing::{info, warn};

use courtside_core::model::{Game, PlayerId, Rotation, Slot, MAX_EDIT_MINUTES, SLOT_MINUTES};
use courtside_core::RotationError;

/// Swap `player_out` for `player_in` inside a started slot.
///
/// The outgoing player's credited minutes `t` (0 when absent) are split:
/// `clamp(t / 2, 1, 4)` minutes move to the incoming player, who joins the
/// court unless already on it. The result is appended as the slot's new
/// latest entry and returned.
pub fn substitute(
    game: &mut Game,
    slot: Slot,
    player_out: &PlayerId,
    player_in: &PlayerId,
) -> Result<Rotation, RotationError> {
    let reject = |reason: String| {
        warn!(game = %game.id, %slot, %player_out, %player_in, %reason, "substitution rejected");
        RotationError::InvalidSubstitution { slot, reason }
    };

    let Some(current) = game.slot_state(slot) else {
        return Err(reject("slot has not been played".into()));
    };
    if player_out == player_in {
        return Err(reject("player cannot replace themselves".into()));
    }
    if !current.is_on_court(player_out) {
        return Err(reject(format!("{player_out} is not on court")));
    }

    let mut next = current.clone();
    let remaining = next
        .player_minutes
        .get(player_out)
        .copied()
        .unwrap_or(0);
    let exchanged = (remaining / 2).clamp(1, SLOT_MINUTES);

    let out_minutes = remaining.saturating_sub(exchanged);
    if out_minutes == 0 {
        next.player_minutes.remove(player_out);
    } else {
        next.player_minutes.insert(player_out.clone(), out_minutes);
    }
    let in_minutes = (next.minutes_for(player_in) + exchanged).min(SLOT_MINUTES);
    next.player_minutes.insert(player_in.clone(), in_minutes);

    next.players_on_court.retain(|p| p != player_out);
    if !next.is_on_court(player_in) {
        next.players_on_court.push(player_in.clone());
    }

    info!(
        game = %game.id,
        %slot,
        %player_out,
        %player_in,
        exchanged,
        "substitution recorded"
    );
    game.append_rotation(next.clone());
    Ok(next)
}

/// Correct the minutes credited to `player` in a played slot. A value of 0
/// removes the player's entry.
pub fn edit_minutes(
    game: &mut Game,
    slot: Slot,
    player: &PlayerId,
    minutes: i64,
) -> Result<(), RotationError> {
    let credited = u32::try_from(minutes)
        .ok()
        .filter(|m| *m <= MAX_EDIT_MINUTES)
        .ok_or_else(|| RotationError::InvalidMinutes {
            slot,
            player: player.clone(),
            minutes,
            max: MAX_EDIT_MINUTES,
        })?;

    let game_id = game.id.clone();
    let state = game
        .slot_state_mut(slot)
        .ok_or_else(|| RotationError::InvalidSubstitution {
            slot,
            reason: "slot has not been played".into(),
        })?;

    if credited == 0 {
        state.player_minutes.remove(player);
    } else {
        state.player_minutes.insert(player.clone(), credited);
    }
    info!(game = %game_id, %slot, %player, minutes = credited, "minutes edited");
    Ok(())
}
