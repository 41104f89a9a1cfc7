// Preferred strategy: a strict lexicographic comparator that spreads minutes
// inside the current game first and uses season history only to order
// players who are level in this game.

use std::cmp::Ordering;

use super::{quantize, sorted_by, Candidate, PriorityLevel, RankedPlayer, RankingContext};

const RATE_RESOLUTION: f64 = 1e-6;

/// 1. current-game minutes asc
/// 2. minutes per slot attended in other games asc (no history sorts last)
/// 3. slots attended in other games desc
/// 4. combined minutes per slot asc
/// 5. jersey asc, then creation time and id
pub(crate) fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.current_minutes
        .cmp(&b.current_minutes)
        .then_with(|| {
            quantize(a.historical_minutes_per_slot(), RATE_RESOLUTION)
                .cmp(&quantize(b.historical_minutes_per_slot(), RATE_RESOLUTION))
        })
        .then_with(|| b.history.slots_attended.cmp(&a.history.slots_attended))
        .then_with(|| {
            quantize(a.combined_minutes_per_slot(), RATE_RESOLUTION)
                .cmp(&quantize(b.combined_minutes_per_slot(), RATE_RESOLUTION))
        })
        .then_with(|| a.jersey_number.cmp(&b.jersey_number))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

pub fn rank(candidates: &[Candidate], ctx: &RankingContext) -> Vec<RankedPlayer> {
    let target = ctx.target_minutes();
    sorted_by(candidates, compare)
        .into_iter()
        .map(|c| RankedPlayer {
            player_id: c.player_id.clone(),
            score: f64::from(c.current_minutes),
            priority: PriorityLevel::from_deviation(f64::from(c.current_minutes), target, 20.0),
            reason: reason(c),
        })
        .collect()
}

fn reason(c: &Candidate) -> String {
    let rate = c.historical_minutes_per_slot();
    if rate.is_finite() {
        format!(
            "{} min this game, {:.2} min per slot over {} prior slots",
            c.current_minutes, rate, c.history.slots_attended
        )
    } else {
        format!("{} min this game, no prior games", c.current_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn current_game_minutes_come_first() {
        let mut veteran = with_history(candidate("vet", 1), 1, 0);
        veteran.current_minutes = 4;
        let rookie = with_history(candidate("rookie", 2), 3, 96);
        let cands = vec![veteran, rookie];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["rookie", "vet"]);
    }

    #[test]
    fn lower_historical_rate_then_more_prior_slots() {
        let a = with_history(candidate("a", 1), 1, 16); // 2.0 per slot
        let b = with_history(candidate("b", 2), 2, 16); // 1.0 per slot
        let c = with_history(candidate("c", 3), 1, 8); // 1.0 per slot, fewer slots
        let cands = vec![a, b, c];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "c", "a"]);
    }

    #[test]
    fn players_without_history_sort_after_players_with_history() {
        let fresh = candidate("fresh", 1);
        let heavy = with_history(candidate("heavy", 2), 1, 32);
        let cands = vec![fresh, heavy];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["heavy", "fresh"]);
    }

    #[test]
    fn equal_players_order_by_jersey() {
        let mut cands: Vec<Candidate> = [23u16, 4, 11, 7]
            .iter()
            .map(|&j| with_history(candidate(&format!("p{j}"), j), 2, 20))
            .collect();
        // Creation order opposite to jersey order must not matter.
        for (i, c) in cands.iter_mut().enumerate() {
            c.created_at = c.created_at - chrono::Duration::days(i as i64 * 10);
        }
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["p4", "p7", "p11", "p23"]);
    }

    #[test]
    fn duplicate_jerseys_fall_back_to_creation_time() {
        let mut a = candidate("a", 5);
        let b = candidate("b", 5);
        a.created_at = b.created_at + chrono::Duration::seconds(1);
        let cands = vec![a, b];
        assert_eq!(ids(&rank(&cands, &ctx(&cands))), vec!["b", "a"]);
    }

    #[test]
    fn score_is_current_minutes() {
        let mut a = candidate("a", 1);
        a.current_minutes = 6;
        let cands = vec![a];
        let ranked = rank(&cands, &ctx(&cands));
        assert!((ranked[0].score - 6.0).abs() < 1e-9);
        assert!(ranked[0].reason.contains("no prior games"));
    }
}
