// Weighted strategy: blend current-game deficit, season history, reliability
// and current-game presence into one priority score. Lower plays first.

use std::cmp::Ordering;

use courtside_core::model::SLOTS_PER_GAME;

use super::{quantize, simple, sorted_by, Candidate, PriorityLevel, RankedPlayer, RankingContext};

/// Scores closer than this are exact ties.
const SCORE_RESOLUTION: f64 = 1e-9;

/// Attendance below this share of the best attendee earns a note.
const MISSED_GAMES_SHARE: f64 = 0.7;

/// Score breakdown for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParts {
    pub current_game: f64,
    pub historical: f64,
    pub games_attended: f64,
    pub swaps_attended: f64,
}

impl ScoreParts {
    pub fn compute(c: &Candidate, ctx: &RankingContext) -> Self {
        let target = ctx.target_minutes();
        let current_game = if target > 0.0 {
            f64::from(c.current_minutes) / target
        } else {
            0.0
        };
        let historical = if ctx.avg_normalized_play_time > 0.0 {
            c.history.normalized_play_time / ctx.avg_normalized_play_time
        } else {
            0.0
        };
        let games_attended =
            f64::from(c.history.games_attended) / f64::from(ctx.max_games_attended.max(1));
        let swaps_attended = f64::from(c.current_slots) / f64::from(SLOTS_PER_GAME);

        ScoreParts {
            current_game,
            historical,
            games_attended,
            swaps_attended,
        }
    }

    pub fn score(&self, ctx: &RankingContext) -> f64 {
        let w = &ctx.weights;
        w.current_game * self.current_game
            + w.historical * self.historical
            + w.games_attended * self.games_attended
            + w.swaps_attended * self.swaps_attended
    }
}

/// The weighted priority score for `c`.
pub fn priority_score(c: &Candidate, ctx: &RankingContext) -> f64 {
    ScoreParts::compute(c, ctx).score(ctx)
}

/// Order by score; exact ties fall back to the Simple ordering.
pub(crate) fn compare(a: &Candidate, b: &Candidate, ctx: &RankingContext) -> Ordering {
    quantize(priority_score(a, ctx), SCORE_RESOLUTION)
        .cmp(&quantize(priority_score(b, ctx), SCORE_RESOLUTION))
        .then_with(|| simple::compare(a, b))
}

pub fn rank(candidates: &[Candidate], ctx: &RankingContext) -> Vec<RankedPlayer> {
    sorted_by(candidates, |a, b| compare(a, b, ctx))
        .into_iter()
        .map(|c| {
            let score = priority_score(c, ctx);
            RankedPlayer {
                player_id: c.player_id.clone(),
                score,
                priority: priority_level(score),
                reason: reason(c, ctx),
            }
        })
        .collect()
}

/// Bucket a score for display.
pub fn priority_level(score: f64) -> PriorityLevel {
    if score < 0.4 {
        PriorityLevel::High
    } else if score < 0.7 {
        PriorityLevel::Medium
    } else {
        PriorityLevel::Low
    }
}

fn reason(c: &Candidate, ctx: &RankingContext) -> String {
    let target = ctx.target_minutes();
    let current = f64::from(c.current_minutes);
    let mut reason = match PriorityLevel::from_deviation(current, target, 20.0) {
        PriorityLevel::High => format!("Needs {:.0} more minutes to reach target", target - current),
        PriorityLevel::Low => format!("Has {:.0} extra minutes above target", current - target),
        PriorityLevel::Medium => "Playing time is balanced".to_string(),
    };

    let expected = f64::from(ctx.max_games_attended) * MISSED_GAMES_SHARE;
    if c.history.games_attended > 0 && f64::from(c.history.games_attended) < expected {
        let missed = ctx.max_games_attended - c.history.games_attended;
        reason.push_str(&format!(" (missed {missed} games)"));
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn score_uses_default_weights() {
        let mut a = with_history(candidate("a", 1), 2, 32);
        a.current_minutes = 8;
        a.current_slots = 4;
        let b = with_history(candidate("b", 2), 2, 32);
        let cands = vec![a.clone(), b];
        let ctx = ctx(&cands);

        // target 16, avg normalized 16, max games 2.
        let parts = ScoreParts::compute(&a, &ctx);
        assert!(approx_eq(parts.current_game, 0.5));
        assert!(approx_eq(parts.historical, 1.0));
        assert!(approx_eq(parts.games_attended, 1.0));
        assert!(approx_eq(parts.swaps_attended, 0.5));
        let expected = 0.5 * 0.5 + 0.3 * 1.0 - 0.15 * 1.0 + 0.05 * 0.5;
        assert!(approx_eq(priority_score(&a, &ctx), expected));
    }

    #[test]
    fn current_game_deficit_dominates() {
        let mut a = candidate("a", 1);
        a.current_minutes = 8;
        let b = candidate("b", 2);
        let cands = vec![a, b];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "a"]);
    }

    #[test]
    fn reliable_attendance_lowers_score() {
        let a = with_history(candidate("a", 1), 1, 16);
        let b = with_history(candidate("b", 2), 4, 64);
        let cands = vec![a, b];
        // Same normalized time, b attended more games.
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "a"]);
    }

    #[test]
    fn exact_ties_fall_back_to_simple_ordering() {
        // Two fresh players score identically; identity decides.
        let cands = vec![candidate("x", 8), candidate("y", 3)];
        let ctx = ctx(&cands);
        assert!(approx_eq(priority_score(&cands[0], &ctx), priority_score(&cands[1], &ctx)));
        assert_eq!(ids(&rank(&cands, &ctx)), vec!["y", "x"]);
    }

    #[test]
    fn priority_buckets() {
        assert_eq!(priority_level(0.1), PriorityLevel::High);
        assert_eq!(priority_level(0.5), PriorityLevel::Medium);
        assert_eq!(priority_level(0.9), PriorityLevel::Low);
    }

    #[test]
    fn reason_mentions_missed_games() {
        let a = with_history(candidate("a", 1), 1, 8);
        let b = with_history(candidate("b", 2), 5, 40);
        let cands = vec![a.clone(), b];
        let ctx = ctx(&cands);
        let text = reason(&a, &ctx);
        assert!(text.starts_with("Needs 16 more minutes"));
        assert!(text.ends_with("(missed 4 games)"));
    }
}
