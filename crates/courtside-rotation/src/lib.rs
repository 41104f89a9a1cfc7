// Rotation fairness engine: season stats, scoring strategies, the 8-slot
// optimizer, manual overrides, substitutions and the service facade.

pub mod manual;
pub mod optimizer;
pub mod recommend;
pub mod scoring;
pub mod service;
pub mod stats;
pub mod substitution;

pub use optimizer::{PlanRequest, PlannedRotation, PlayerSummary, RotationPlan, SlotSource};
pub use scoring::{PriorityLevel, RankedPlayer};
pub use service::{RotationService, ServiceError, ServiceResult};
pub use stats::SeasonStats;
