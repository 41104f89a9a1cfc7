// Game roster optimizer: plan all 8 slots of a game with one strategy.
//
// Played slots are copied verbatim from history and folded into a simulated
// running state; every remaining slot is filled by ranking attendees on that
// simulated state. The game itself is never written.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use courtside_core::config::WeightedWeights;
use courtside_core::model::{
    Game, Player, PlayerId, Slot, Strategy, PLAYERS_ON_COURT, SLOTS_PER_GAME, SLOT_MINUTES,
};
use courtside_core::RotationError;

use crate::manual;
use crate::recommend::build_candidates;
use crate::scoring::{self, Candidate, PriorityLevel, RankingContext, ScoringRule};

/// Reasoning attached to slots copied from history.
pub const ACTUAL_REASONING: &str = "actual";

/// Band around the fair share used for summary priorities, in percent.
const SUMMARY_BAND_PERCENT: f64 = 10.0;

/// Where a planned slot's lineup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotSource {
    /// Copied from the game's history.
    Actual,
    /// Chosen by the scoring strategy.
    Strategy,
    /// A stored manual lineup.
    Manual,
    /// Chosen by Preferred for a manual plan with no entry for the slot.
    Seeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRotation {
    pub slot: Slot,
    pub player_ids: Vec<PlayerId>,
    pub player_minutes: BTreeMap<PlayerId, u32>,
    pub reasoning: String,
    pub source: SlotSource,
}

impl PlannedRotation {
    pub fn minutes_for(&self, player: &PlayerId) -> u32 {
        self.player_minutes.get(player).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub total_minutes: u32,
    /// Slot numbers (1-8) in which the player is credited minutes.
    pub slots_played: Vec<u8>,
    pub priority: PriorityLevel,
    pub notes: String,
}

/// The optimizer's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationPlan {
    pub strategy: Strategy,
    /// Exactly one entry per slot, in play order.
    pub rotations: Vec<PlannedRotation>,
    pub player_summary: BTreeMap<PlayerId, PlayerSummary>,
    /// `100 - min(100, stddev / 8 * 100)` over the attendees' planned minutes.
    pub fairness_score: f64,
    /// Lineups chosen for slots a manual plan had no entry for. Callers
    /// persist these as manual entries.
    #[serde(serialize_with = "serialize_slot_keys")]
    pub seeded_overrides: BTreeMap<Slot, Vec<PlayerId>>,
}

impl RotationPlan {
    pub fn rotation(&self, slot: Slot) -> Option<&PlannedRotation> {
        self.rotations.iter().find(|r| r.slot == slot)
    }

    /// Planned minutes for `player` across the whole game.
    pub fn total_minutes(&self, player: &PlayerId) -> u32 {
        self.rotations.iter().map(|r| r.minutes_for(player)).sum()
    }
}

fn serialize_slot_keys<S: Serializer>(
    map: &BTreeMap<Slot, Vec<PlayerId>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(map.iter().map(|(slot, players)| (slot.key(), players)))
}

/// Inputs that stay fixed across one optimization.
pub struct PlanRequest<'a> {
    pub game: &'a Game,
    pub roster: &'a [Player],
    /// All known games; the planned game is skipped when building history.
    pub season_games: &'a [Game],
    pub attending: &'a [PlayerId],
    pub strategy: Strategy,
    pub weights: WeightedWeights,
}

/// Plan every slot of `req.game`.
pub fn optimize(req: &PlanRequest<'_>) -> Result<RotationPlan, RotationError> {
    let game = req.game;
    let mut sim = build_candidates(game, req.roster, req.season_games, req.attending)?;
    let ctx = RankingContext::from_attendees(&sim, req.weights);
    let rule = ScoringRule::from(req.strategy);

    let mut rotations = Vec::with_capacity(usize::from(SLOTS_PER_GAME));
    let mut seeded_overrides = BTreeMap::new();

    for slot in Slot::all() {
        let planned = if let Some(state) = game.slot_state(slot) {
            PlannedRotation {
                slot,
                player_ids: state.players_on_court.clone(),
                player_minutes: state.player_minutes.clone(),
                reasoning: ACTUAL_REASONING.to_string(),
                source: SlotSource::Actual,
            }
        } else if let Some(players) = manual_lineup(game, slot, req.strategy) {
            full_slot(slot, players.to_vec(), "manual selection".into(), SlotSource::Manual)
        } else {
            let picked = pick(rule, &sim, &ctx, slot)?;
            if req.strategy == Strategy::Manual {
                seeded_overrides.insert(slot, picked.clone());
                full_slot(slot, picked, "auto-filled (preferred)".into(), SlotSource::Seeded)
            } else {
                full_slot(slot, picked, reasoning(rule).into(), SlotSource::Strategy)
            }
        };

        fold(&mut sim, &planned);
        rotations.push(planned);
    }

    let fairness_score = fairness_score(&sim);
    let player_summary = summarize(&sim, &rotations, ctx.target_minutes());

    info!(
        game = %game.id,
        strategy = %req.strategy,
        attending = sim.len(),
        fairness = fairness_score,
        seeded = seeded_overrides.len(),
        "rotation plan computed"
    );

    Ok(RotationPlan {
        strategy: req.strategy,
        rotations,
        player_summary,
        fairness_score,
        seeded_overrides,
    })
}

fn manual_lineup(game: &Game, slot: Slot, strategy: Strategy) -> Option<&[PlayerId]> {
    if strategy != Strategy::Manual {
        return None;
    }
    manual::get(game, slot).filter(|players| !players.is_empty())
}

fn pick(
    rule: ScoringRule,
    sim: &[Candidate],
    ctx: &RankingContext,
    slot: Slot,
) -> Result<Vec<PlayerId>, RotationError> {
    if sim.is_empty() {
        return Err(RotationError::InsufficientRoster { slot });
    }
    let ranked = scoring::rank_ids(rule, sim, ctx);
    let picked: Vec<PlayerId> = ranked.into_iter().take(PLAYERS_ON_COURT).collect();
    debug!(%slot, ?rule, picked = ?picked, "slot simulated");
    Ok(picked)
}

fn full_slot(slot: Slot, players: Vec<PlayerId>, reasoning: String, source: SlotSource) -> PlannedRotation {
    let player_minutes = players.iter().map(|p| (p.clone(), SLOT_MINUTES)).collect();
    PlannedRotation {
        slot,
        player_ids: players,
        player_minutes,
        reasoning,
        source,
    }
}

fn reasoning(rule: ScoringRule) -> &'static str {
    match rule {
        ScoringRule::Simple => "lowest normalized play time",
        ScoringRule::Weighted => "lowest weighted priority score",
        ScoringRule::Preferred => "fewest minutes this game, then lowest minutes per slot",
    }
}

/// Credit a processed slot to the simulated state.
fn fold(sim: &mut [Candidate], planned: &PlannedRotation) {
    for c in sim.iter_mut() {
        c.current_minutes += planned.minutes_for(&c.player_id);
        c.current_slots = (c.current_slots + 1).min(SLOTS_PER_GAME);
    }
}

fn fairness_score(sim: &[Candidate]) -> f64 {
    if sim.is_empty() {
        return 100.0;
    }
    let n = sim.len() as f64;
    let mean = sim.iter().map(|c| f64::from(c.current_minutes)).sum::<f64>() / n;
    let variance = sim
        .iter()
        .map(|c| (f64::from(c.current_minutes) - mean).powi(2))
        .sum::<f64>()
        / n;
    100.0 - (variance.sqrt() / 8.0 * 100.0).min(100.0)
}

fn summarize(
    sim: &[Candidate],
    rotations: &[PlannedRotation],
    target: f64,
) -> BTreeMap<PlayerId, PlayerSummary> {
    sim.iter()
        .map(|c| {
            let slots_played: Vec<u8> = rotations
                .iter()
                .filter(|r| r.minutes_for(&c.player_id) > 0)
                .map(|r| r.slot.number())
                .collect();
            let total = c.current_minutes;
            let priority =
                PriorityLevel::from_deviation(f64::from(total), target, SUMMARY_BAND_PERCENT);
            let deviation = if target > 0.0 {
                (f64::from(total) - target) / target * 100.0
            } else {
                0.0
            };
            let notes = match priority {
                PriorityLevel::High => {
                    format!("Scheduled {total} min ({:.0}% below target)", deviation.abs())
                }
                PriorityLevel::Low => format!("Scheduled {total} min ({deviation:.0}% above target)"),
                PriorityLevel::Medium => format!("Scheduled {total} min (balanced)"),
            };
            let summary = PlayerSummary {
                total_minutes: total,
                slots_played,
                priority,
                notes,
            };
            (c.player_id.clone(), summary)
        })
        .collect()
}
