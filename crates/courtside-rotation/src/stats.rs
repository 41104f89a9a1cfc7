// Season stats aggregation: credited minutes and fractional attendance
// folded across every game a player attended.

use serde::Serialize;

use courtside_core::model::{Game, PlayerId, SLOTS_PER_GAME};

/// Season totals for one player. Always derived from the games on demand;
/// never cached, since live play keeps mutating the underlying records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonStats {
    /// Minutes credited across all attended games.
    pub total_minutes: u32,
    /// Games whose attendance list contains the player.
    pub games_attended: u32,
    /// Attended games in which the player was credited any minutes.
    pub games_played: u32,
    /// Sum of `swaps_attended / 8` across attended games.
    pub effective_games_attended: f64,
    /// Sum of `swaps_attended` across attended games.
    pub slots_attended: u32,
    /// `total_minutes / effective_games_attended`, or 0 with no attendance.
    pub normalized_play_time: f64,
    pub steals: u32,
    pub rebounds: u32,
    pub attempts_1pt: u32,
    pub made_1pt: u32,
    pub attempts_2pt: u32,
    pub made_2pt: u32,
    pub attempts_3pt: u32,
    pub made_3pt: u32,
    pub total_points: u32,
    /// Percentage of made shots over attempts (0 with no attempts).
    pub field_goal_percentage: f64,
}

/// Fold `player`'s records from `games` into season totals.
///
/// Only games whose attendance includes the player contribute. A missing
/// `swaps_attended` counts as a full game.
pub fn season_stats<'a, I>(player: &PlayerId, games: I) -> SeasonStats
where
    I: IntoIterator<Item = &'a Game>,
{
    let mut stats = SeasonStats::default();

    for game in games.into_iter().filter(|g| g.is_attending(player)) {
        let swaps = game.swaps_attended(player);
        let minutes = game.player_minutes(player);

        stats.games_attended += 1;
        stats.slots_attended += u32::from(swaps);
        stats.effective_games_attended += f64::from(swaps) / f64::from(SLOTS_PER_GAME);
        stats.total_minutes += minutes;
        if minutes > 0 {
            stats.games_played += 1;
        }

        if let Some(counters) = game.stats.get(player) {
            stats.steals += counters.steals;
            stats.rebounds += counters.rebounds;
            stats.attempts_1pt += counters.attempts_1pt;
            stats.made_1pt += counters.made_1pt;
            stats.attempts_2pt += counters.attempts_2pt;
            stats.made_2pt += counters.made_2pt;
            stats.attempts_3pt += counters.attempts_3pt;
            stats.made_3pt += counters.made_3pt;
        }
    }

    stats.normalized_play_time = if stats.effective_games_attended > 0.0 {
        f64::from(stats.total_minutes) / stats.effective_games_attended
    } else {
        0.0
    };

    stats.total_points = stats.made_1pt + stats.made_2pt * 2 + stats.made_3pt * 3;
    let attempts = stats.attempts_1pt + stats.attempts_2pt + stats.attempts_3pt;
    let made = stats.made_1pt + stats.made_2pt + stats.made_3pt;
    stats.field_goal_percentage = if attempts > 0 {
        f64::from(made) / f64::from(attempts) * 100.0
    } else {
        0.0
    };

    stats
}

/// Minutes credited to `player` in one game.
pub fn game_minutes(game: &Game, player: &PlayerId) -> u32 {
    game.player_minutes(player)
}

/// Rewrite each attendee's derived `play_time_minutes` from the rotation
/// history.
pub fn refresh_play_time(game: &mut Game) {
    let attendees: Vec<PlayerId> = game.attendance.iter().cloned().collect();
    for player in attendees {
        let minutes = game.player_minutes(&player);
        game.stats.entry(player).or_default().play_time_minutes = minutes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use courtside_core::model::{Slot, StatKind};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn game_with(attending: &[&str]) -> Game {
        let mut game = Game::new("Hornets", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Gym");
        game.attendance = attending.iter().map(|&s| PlayerId::from(s)).collect();
        game
    }

    fn play(game: &mut Game, number: u8, players: &[&str]) {
        game.record_rotation(
            Slot::from_number(number).unwrap(),
            players.iter().map(|&s| PlayerId::from(s)).collect(),
        )
        .unwrap();
    }

    #[test]
    fn no_games_means_zero_normalized_time() {
        let stats = season_stats(&"a".into(), std::iter::empty());
        assert_eq!(stats.total_minutes, 0);
        assert_eq!(stats.games_attended, 0);
        assert!(approx_eq(stats.normalized_play_time, 0.0));
    }

    #[test]
    fn full_attendance_normalizes_by_game_count() {
        let mut g1 = game_with(&["a", "b"]);
        play(&mut g1, 1, &["a"]);
        play(&mut g1, 2, &["a"]);
        let mut g2 = game_with(&["a", "b"]);
        play(&mut g2, 1, &["a", "b"]);

        let a = season_stats(&"a".into(), [&g1, &g2]);
        assert_eq!(a.total_minutes, 12);
        assert_eq!(a.games_attended, 2);
        assert_eq!(a.games_played, 2);
        assert_eq!(a.slots_attended, 16);
        assert!(approx_eq(a.effective_games_attended, 2.0));
        assert!(approx_eq(a.normalized_play_time, 6.0));

        let b = season_stats(&"b".into(), [&g1, &g2]);
        assert_eq!(b.games_played, 1);
        assert!(approx_eq(b.normalized_play_time, 2.0));
    }

    #[test]
    fn partial_attendance_counts_fractionally() {
        let mut game = game_with(&["a"]);
        game.set_swaps_attended(&"a".into(), 4).unwrap();
        play(&mut game, 1, &["a"]);

        let stats = season_stats(&"a".into(), [&game]);
        assert!(approx_eq(stats.effective_games_attended, 0.5));
        assert_eq!(stats.slots_attended, 4);
        assert!(approx_eq(stats.normalized_play_time, 8.0));
    }

    #[test]
    fn zero_swaps_attended_does_not_divide_by_zero() {
        let mut game = game_with(&["a"]);
        game.set_swaps_attended(&"a".into(), 0).unwrap();
        let stats = season_stats(&"a".into(), [&game]);
        assert_eq!(stats.games_attended, 1);
        assert!(approx_eq(stats.normalized_play_time, 0.0));
    }

    #[test]
    fn games_not_attended_are_ignored() {
        let mut game = game_with(&["b"]);
        // Minutes recorded for a non-attendee never reach the season totals.
        play(&mut game, 1, &["a", "b"]);
        let stats = season_stats(&"a".into(), [&game]);
        assert_eq!(stats.total_minutes, 0);
        assert_eq!(stats.games_attended, 0);
    }

    #[test]
    fn shooting_totals_and_percentage() {
        let mut game = game_with(&["a"]);
        let a = PlayerId::from("a");
        for kind in [
            StatKind::Attempt2pt,
            StatKind::Made2pt,
            StatKind::Attempt2pt,
            StatKind::Attempt3pt,
            StatKind::Made3pt,
            StatKind::Attempt1pt,
            StatKind::Rebound,
        ] {
            game.increment_stat(&a, kind);
        }

        let stats = season_stats(&a, [&game]);
        assert_eq!(stats.total_points, 5);
        assert_eq!(stats.rebounds, 1);
        assert!(approx_eq(stats.field_goal_percentage, 50.0));
    }

    #[test]
    fn refresh_play_time_writes_derived_minutes() {
        let mut game = game_with(&["a", "b"]);
        play(&mut game, 1, &["a"]);
        play(&mut game, 2, &["a", "b"]);

        refresh_play_time(&mut game);
        assert_eq!(game.stats_for(&"a".into()).play_time_minutes, 8);
        assert_eq!(game.stats_for(&"b".into()).play_time_minutes, 4);
        assert_eq!(game_minutes(&game, &"b".into()), 4);
    }
}
