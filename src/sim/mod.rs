//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by brick id)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod bonus;
pub mod collision;
pub mod level;
pub mod physics;
pub mod rect;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use autopilot::{AutopilotState, PlanContext, ShotPlan, plan_best_shot, predict_impact_x, reflect_within_walls};
pub use bonus::{ActiveBonus, ActiveBonuses, BonusKind};
pub use collision::{CollisionEvent, CollisionKind, Obstacles, find_next_collision, reflect_velocity};
pub use level::{LevelConfig, build_level};
pub use rect::Rect;
pub use state::{Ball, Brick, BrickId, Bricks, Field, GameEvent, GamePhase, GameState, Paddle, Snapshot};
pub use tick::{TickInput, tick};
pub use trajectory::{BrickImpact, ShotSimulationResult, Termination, simulate_shot};
