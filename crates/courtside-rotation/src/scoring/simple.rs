// Simple strategy: fewest minutes per game attended plays first.

use std::cmp::Ordering;

use super::{identity_order, quantize, sorted_by, Candidate, PriorityLevel, RankedPlayer, RankingContext};

/// Normalized times closer than this are treated as equal.
const NORMALIZED_RESOLUTION: f64 = 0.01;

/// Below this normalized time a player is flagged as under-played.
const BELOW_AVERAGE_MINUTES: f64 = 16.0;

/// Order by normalized play time, then total play time, then identity.
pub(crate) fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    quantize(a.normalized_play_time(), NORMALIZED_RESOLUTION)
        .cmp(&quantize(b.normalized_play_time(), NORMALIZED_RESOLUTION))
        .then_with(|| a.total_minutes().cmp(&b.total_minutes()))
        .then_with(|| identity_order(a, b))
}

pub fn rank(candidates: &[Candidate], ctx: &RankingContext) -> Vec<RankedPlayer> {
    let target = ctx.target_minutes();
    sorted_by(candidates, compare)
        .into_iter()
        .map(|c| {
            let normalized = c.normalized_play_time();
            RankedPlayer {
                player_id: c.player_id.clone(),
                score: normalized,
                priority: PriorityLevel::from_deviation(f64::from(c.current_minutes), target, 20.0),
                reason: reason(normalized, c.total_minutes()),
            }
        })
        .collect()
}

fn reason(normalized: f64, total_minutes: u32) -> String {
    if total_minutes == 0 {
        "Has not played yet this season".into()
    } else if normalized < BELOW_AVERAGE_MINUTES {
        format!("Below average play time ({normalized:.1} min per game)")
    } else if total_minutes < 32 {
        format!("Low total season play time ({total_minutes} min)")
    } else {
        format!("Balanced play time ({normalized:.1} min per game)")
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn lowest_normalized_time_first() {
        let cands = vec![
            with_history(candidate("a", 1), 2, 40),
            with_history(candidate("b", 2), 2, 8),
            with_history(candidate("c", 3), 4, 40),
        ];
        let ranked = rank(&cands, &ctx(&cands));
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
        assert!((ranked[0].score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn current_game_counts_toward_normalized_time() {
        let mut a = candidate("a", 1);
        let mut b = candidate("b", 2);
        a.current_minutes = 4;
        a.current_slots = 1;
        b.current_slots = 1;

        let cands = vec![a, b];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "a"]);
    }

    #[test]
    fn near_equal_normalized_times_fall_back_to_total_minutes() {
        // 10.004 and 10.0 quantize to the same bucket.
        let a = with_history(candidate("a", 1), 1, 10);
        let mut b = with_history(candidate("b", 2), 1, 10);
        b.history.total_minutes = 9;
        b.history.effective_games_attended = 0.89964;
        let cands = vec![a, b];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "a"]);
    }

    #[test]
    fn full_ties_break_on_creation_then_jersey() {
        let cands = vec![candidate("late", 9), candidate("early", 4)];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["early", "late"]);
    }

    #[test]
    fn reasons_describe_history() {
        assert_eq!(reason(0.0, 0), "Has not played yet this season");
        assert!(reason(8.0, 16).starts_with("Below average"));
        assert!(reason(20.0, 20).starts_with("Low total"));
        assert!(reason(20.0, 60).starts_with("Balanced"));
    }
}
