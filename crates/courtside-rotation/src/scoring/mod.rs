// Scoring strategies: rank eligible players for one rotation slot, most in
// need of minutes first.

pub mod preferred;
pub mod simple;
pub mod weighted;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use courtside_core::config::WeightedWeights;
use courtside_core::model::{Player, PlayerId, Strategy, GAME_MINUTES, SLOTS_PER_GAME};

use crate::stats::SeasonStats;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything a strategy may look at for one eligible player.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub player_id: PlayerId,
    pub jersey_number: u16,
    pub created_at: DateTime<Utc>,
    /// Season totals from every game except the one being scheduled.
    pub history: SeasonStats,
    /// Minutes credited so far in the game being scheduled, including
    /// simulated slots when called from the optimizer.
    pub current_minutes: u32,
    /// Slots of the current game the player has been present for.
    pub current_slots: u8,
}

impl Candidate {
    /// A candidate with no current-game activity yet.
    pub fn new(player: &Player, history: SeasonStats) -> Self {
        Candidate {
            player_id: player.id.clone(),
            jersey_number: player.jersey_number,
            created_at: player.created_at,
            history,
            current_minutes: 0,
            current_slots: 0,
        }
    }

    /// Historical plus current-game minutes.
    pub fn total_minutes(&self) -> u32 {
        self.history.total_minutes + self.current_minutes
    }

    /// Fraction of the current game attended so far.
    pub fn current_attendance(&self) -> f64 {
        f64::from(self.current_slots) / f64::from(SLOTS_PER_GAME)
    }

    /// Minutes per effective game, current game included. 0 when the player
    /// has no attendance at all.
    pub fn normalized_play_time(&self) -> f64 {
        let games = self.history.effective_games_attended + self.current_attendance();
        if games > 0.0 {
            f64::from(self.total_minutes()) / games
        } else {
            0.0
        }
    }

    /// Minutes per slot attended in other games; `+inf` without history.
    pub fn historical_minutes_per_slot(&self) -> f64 {
        per_slot(self.history.total_minutes, self.history.slots_attended)
    }

    /// Minutes per slot attended across other games and the current one;
    /// `+inf` when no slot has been attended anywhere.
    pub fn combined_minutes_per_slot(&self) -> f64 {
        per_slot(
            self.total_minutes(),
            self.history.slots_attended + u32::from(self.current_slots),
        )
    }
}

fn per_slot(minutes: u32, slots: u32) -> f64 {
    if slots == 0 {
        f64::INFINITY
    } else {
        f64::from(minutes) / f64::from(slots)
    }
}

/// Average normalized time assumed when no attendee has any history.
pub const DEFAULT_AVG_NORMALIZED_TIME: f64 = 16.0;

/// Roster-wide figures shared by every candidate in one ranking call.
///
/// Built from all attendees, even when some of them are excluded from the
/// candidate list (e.g. players already on court).
#[derive(Debug, Clone, PartialEq)]
pub struct RankingContext {
    pub weights: WeightedWeights,
    /// Number of players attending the game.
    pub attending: usize,
    /// Mean historical normalized time over attendees with any history.
    pub avg_normalized_play_time: f64,
    /// Most games attended by any attendee (at least 1).
    pub max_games_attended: u32,
}

impl RankingContext {
    pub fn from_attendees(attendees: &[Candidate], weights: WeightedWeights) -> Self {
        let with_history: Vec<&SeasonStats> = attendees
            .iter()
            .map(|c| &c.history)
            .filter(|h| h.total_minutes > 0 || h.games_attended > 0)
            .collect();

        let avg_normalized_play_time = if with_history.is_empty() {
            DEFAULT_AVG_NORMALIZED_TIME
        } else {
            with_history.iter().map(|h| h.normalized_play_time).sum::<f64>()
                / with_history.len() as f64
        };

        let max_games_attended = with_history
            .iter()
            .map(|h| h.games_attended)
            .max()
            .unwrap_or(0)
            .max(1);

        RankingContext {
            weights,
            attending: attendees.len(),
            avg_normalized_play_time,
            max_games_attended,
        }
    }

    /// Fair share of game minutes per attending player.
    pub fn target_minutes(&self) -> f64 {
        if self.attending == 0 {
            0.0
        } else {
            GAME_MINUTES / self.attending as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// How urgently a player needs minutes. Drives UI color coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::High => "high-priority",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low-priority",
        }
    }

    /// Classify `minutes` against `target` with a symmetric percentage band.
    pub fn from_deviation(minutes: f64, target: f64, band_percent: f64) -> Self {
        if target <= 0.0 {
            return PriorityLevel::Medium;
        }
        let deviation = (minutes - target) / target * 100.0;
        if deviation < -band_percent {
            PriorityLevel::High
        } else if deviation > band_percent {
            PriorityLevel::Low
        } else {
            PriorityLevel::Medium
        }
    }
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub player_id: PlayerId,
    /// The strategy's primary metric (normalized time, priority score, or
    /// current-game minutes).
    pub score: f64,
    pub priority: PriorityLevel,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The scoring rules. `Strategy::Manual` ranks with `Preferred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    Simple,
    Weighted,
    Preferred,
}

impl From<Strategy> for ScoringRule {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Simple => ScoringRule::Simple,
            Strategy::Weighted => ScoringRule::Weighted,
            Strategy::Preferred | Strategy::Manual => ScoringRule::Preferred,
        }
    }
}

/// Rank `candidates` under `rule`. Pure and deterministic: the output order
/// depends only on the candidates' values, never on their input order.
pub fn rank(rule: ScoringRule, candidates: &[Candidate], ctx: &RankingContext) -> Vec<RankedPlayer> {
    match rule {
        ScoringRule::Simple => simple::rank(candidates, ctx),
        ScoringRule::Weighted => weighted::rank(candidates, ctx),
        ScoringRule::Preferred => preferred::rank(candidates, ctx),
    }
}

/// Like [`rank`], returning only the ordered ids.
pub fn rank_ids(rule: ScoringRule, candidates: &[Candidate], ctx: &RankingContext) -> Vec<PlayerId> {
    rank(rule, candidates, ctx)
        .into_iter()
        .map(|r| r.player_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Shared comparison helpers
// ---------------------------------------------------------------------------

/// Snap a float to a grid so it can be compared through a total order.
/// `+inf` saturates to `i64::MAX`.
pub(crate) fn quantize(value: f64, resolution: f64) -> i64 {
    (value / resolution).round() as i64
}

/// Last-resort ordering: earlier-created player, then lower jersey, then id.
pub(crate) fn identity_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.jersey_number.cmp(&b.jersey_number))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

/// Sort candidates with `compare` and return references in ranked order.
pub(crate) fn sorted_by<'a, F>(candidates: &'a [Candidate], mut compare: F) -> Vec<&'a Candidate>
where
    F: FnMut(&Candidate, &Candidate) -> Ordering,
{
    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| compare(a, b));
    ordered
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn context_defaults_without_history() {
        let cands = vec![candidate("a", 1), candidate("b", 2)];
        let ctx = ctx(&cands);
        assert_eq!(ctx.attending, 2);
        assert!((ctx.avg_normalized_play_time - DEFAULT_AVG_NORMALIZED_TIME).abs() < 1e-9);
        assert_eq!(ctx.max_games_attended, 1);
        assert!((ctx.target_minutes() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn context_averages_only_players_with_history() {
        let cands = vec![
            with_history(candidate("a", 1), 2, 20),
            with_history(candidate("b", 2), 4, 20),
            candidate("c", 3),
        ];
        let ctx = ctx(&cands);
        assert!((ctx.avg_normalized_play_time - 7.5).abs() < 1e-9);
        assert_eq!(ctx.max_games_attended, 4);
    }

    #[test]
    fn per_slot_rates() {
        let mut c = with_history(candidate("a", 1), 1, 8);
        assert!((c.historical_minutes_per_slot() - 1.0).abs() < 1e-9);
        c.current_minutes = 4;
        c.current_slots = 4;
        assert!((c.combined_minutes_per_slot() - 1.0).abs() < 1e-9);

        let fresh = candidate("b", 2);
        assert!(fresh.historical_minutes_per_slot().is_infinite());
        assert!(fresh.combined_minutes_per_slot().is_infinite());
    }

    #[test]
    fn manual_ranks_like_preferred() {
        assert_eq!(ScoringRule::from(Strategy::Manual), ScoringRule::Preferred);
        assert_eq!(ScoringRule::from(Strategy::Simple), ScoringRule::Simple);
    }

    #[test]
    fn every_rule_is_independent_of_input_order() {
        let mut cands = vec![
            with_history(candidate("a", 7), 3, 30),
            with_history(candidate("b", 3), 1, 4),
            candidate("c", 12),
            with_history(candidate("d", 5), 2, 16),
            with_history(candidate("e", 9), 2, 16),
        ];
        cands[0].current_minutes = 4;
        cands[0].current_slots = 2;
        let ctx = ctx(&cands);

        for rule in [ScoringRule::Simple, ScoringRule::Weighted, ScoringRule::Preferred] {
            let forward = rank_ids(rule, &cands, &ctx);
            let mut reversed = cands.clone();
            reversed.reverse();
            assert_eq!(forward, rank_ids(rule, &reversed, &ctx), "{rule:?}");
            assert_eq!(forward, rank_ids(rule, &cands, &ctx), "{rule:?}");
        }
    }

    #[test]
    fn quantize_saturates_infinity() {
        assert_eq!(quantize(f64::INFINITY, 1e-6), i64::MAX);
        assert_eq!(quantize(1.004, 0.01), 100);
    }

    #[test]
    fn priority_band() {
        assert_eq!(PriorityLevel::from_deviation(2.0, 8.0, 20.0), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_deviation(8.0, 8.0, 20.0), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_deviation(12.0, 8.0, 20.0), PriorityLevel::Low);
        assert_eq!(PriorityLevel::from_deviation(5.0, 0.0, 20.0), PriorityLevel::Medium);
    }
}
