// Candidate assembly and the live next-slot recommendation.

use std::collections::BTreeSet;

use tracing::debug;

use courtside_core::config::WeightedWeights;
use courtside_core::model::{Game, Player, PlayerId, Strategy};
use courtside_core::RotationError;

use crate::scoring::{self, Candidate, RankedPlayer, RankingContext, ScoringRule};
use crate::stats::season_stats;

/// Build one candidate per attending id, with history taken from every
/// season game except `game` itself. Current-game fields start at zero.
pub fn build_candidates<'a, I>(
    game: &Game,
    roster: &[Player],
    season_games: &[Game],
    attending: I,
) -> Result<Vec<Candidate>, RotationError>
where
    I: IntoIterator<Item = &'a PlayerId>,
{
    attending
        .into_iter()
        .map(|id| {
            let player = roster
                .iter()
                .find(|p| &p.id == id)
                .ok_or_else(|| RotationError::PlayerNotFound(id.clone()))?;
            let history = season_stats(id, season_games.iter().filter(|g| g.id != game.id));
            Ok(Candidate::new(player, history))
        })
        .collect()
}

/// Rank the game's attendees for the next slot using what has actually been
/// played so far.
///
/// Players in `exclude` are left out of the ranking but still count toward
/// the roster-wide figures. At most `count` entries are returned.
pub fn recommend(
    game: &Game,
    roster: &[Player],
    season_games: &[Game],
    strategy: Strategy,
    weights: WeightedWeights,
    count: usize,
    exclude: &BTreeSet<PlayerId>,
) -> Result<Vec<RankedPlayer>, RotationError> {
    let mut candidates = build_candidates(game, roster, season_games, &game.attendance)?;
    for c in &mut candidates {
        c.current_minutes = game.player_minutes(&c.player_id);
        c.current_slots = game.swaps_attended(&c.player_id);
    }

    let ctx = RankingContext::from_attendees(&candidates, weights);
    candidates.retain(|c| !exclude.contains(&c.player_id));

    let mut ranked = scoring::rank(ScoringRule::from(strategy), &candidates, &ctx);
    ranked.truncate(count);
    debug!(
        game = %game.id,
        %strategy,
        eligible = candidates.len(),
        returned = ranked.len(),
        "recommendation ranked"
    );
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use courtside_core::model::Slot;

    fn roster(n: u16) -> Vec<Player> {
        (1..=n)
            .map(|j| {
                let mut p = Player::new(&format!("Player {j}"), j);
                p.id = PlayerId::from(format!("p{j}"));
                p
            })
            .collect()
    }

    fn game_for(players: &[Player]) -> Game {
        let mut game = Game::new("Hornets", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), "Gym");
        game.attendance = players.iter().map(|p| p.id.clone()).collect();
        game
    }

    fn ids(ranked: &[RankedPlayer]) -> Vec<&str> {
        ranked.iter().map(|r| r.player_id.as_str()).collect()
    }

    #[test]
    fn unknown_attendee_is_player_not_found() {
        let players = roster(2);
        let mut game = game_for(&players);
        game.attendance.insert("ghost".into());
        let err = recommend(
            &game,
            &players,
            &[],
            Strategy::Simple,
            WeightedWeights::default(),
            5,
            &BTreeSet::new(),
        )
        .unwrap_err();
        assert_eq!(err, RotationError::PlayerNotFound("ghost".into()));
    }

    #[test]
    fn players_who_played_drop_down_the_list() {
        let players = roster(6);
        let mut game = game_for(&players);
        game.record_rotation(
            Slot::first(),
            ["p1", "p2", "p3", "p4", "p5"].iter().map(|&s| s.into()).collect(),
        )
        .unwrap();

        let ranked = recommend(
            &game,
            &players,
            &[],
            Strategy::Preferred,
            WeightedWeights::default(),
            2,
            &BTreeSet::new(),
        )
        .unwrap();
        assert_eq!(ids(&ranked), vec!["p6", "p1"]);
    }

    #[test]
    fn excluded_players_are_skipped() {
        let players = roster(4);
        let game = game_for(&players);
        let exclude: BTreeSet<PlayerId> = ["p1".into(), "p3".into()].into_iter().collect();
        let ranked = recommend(
            &game,
            &players,
            &[],
            Strategy::Manual,
            WeightedWeights::default(),
            5,
            &exclude,
        )
        .unwrap();
        assert_eq!(ids(&ranked), vec!["p2", "p4"]);
    }

    #[test]
    fn history_ignores_the_current_game() {
        let players = roster(2);
        let mut past = game_for(&players);
        past.record_rotation(Slot::first(), vec!["p1".into()]).unwrap();
        let mut current = game_for(&players);
        current.record_rotation(Slot::first(), vec!["p2".into()]).unwrap();

        let season = vec![past, current.clone()];
        let cands = build_candidates(&current, &players, &season, &current.attendance).unwrap();
        assert_eq!(cands[0].history.total_minutes, 4);
        assert_eq!(cands[1].history.total_minutes, 0);
        assert_eq!(cands[1].current_minutes, 0);
    }
}
