//! Multi-bounce shot forecasting
//!
//! Follows a hypothetical ball through the collision engine on local copies
//! of position and velocity. The live ball and bricks are never touched.

use fixedbitset::FixedBitSet;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionKind, Obstacles, find_next_collision, reflect_velocity};
use super::state::{BrickId, Bricks, Field};
use crate::consts::*;

/// Why a simulated shot stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// A normal ball touched its first brick
    BrickHit,
    /// A piercing ball went through the maximum number of bricks
    PierceLimit,
    /// The ball would fall past the paddle plane
    FloorMiss,
    /// Nothing left in the direction of travel
    NoCollision,
    /// Ran out of lookahead events
    EventBudget,
    /// Ran out of simulated time
    TimeBudget,
}

/// One brick contact in a simulated shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrickImpact {
    pub brick: BrickId,
    /// Simulated time of contact since launch
    pub time: f64,
}

/// Outcome of one simulated shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSimulationResult {
    pub hit_brick: bool,
    pub missed_by_floor: bool,
    pub total_time: f64,
    pub bounces: u32,
    /// Bricks in the order they were struck
    pub impacts: Vec<BrickImpact>,
    pub exit_velocity: DVec2,
    pub termination: Termination,
}

impl ShotSimulationResult {
    fn finish(
        termination: Termination,
        impacts: Vec<BrickImpact>,
        total_time: f64,
        bounces: u32,
        exit_velocity: DVec2,
    ) -> Self {
        let hit_brick = !impacts.is_empty() && termination != Termination::FloorMiss;
        Self {
            hit_brick,
            missed_by_floor: termination == Termination::FloorMiss,
            total_time,
            bounces,
            impacts,
            exit_velocity,
            termination,
        }
    }

    pub fn brick_count(&self) -> usize {
        self.impacts.len()
    }
}

/// Forecast a shot from `start` with `velocity`.
///
/// Stops after [`MAX_LOOKAHEAD_EVENTS`] collisions or once more than
/// [`MAX_SIMULATION_TIME`] has elapsed. A normal ball reports only its first
/// brick; a piercing ball keeps going through up to [`MAX_PIERCE_HITS`].
pub fn simulate_shot(
    field: &Field,
    bricks: &Bricks,
    start: DVec2,
    velocity: DVec2,
    radius: f64,
    piercing: bool,
) -> ShotSimulationResult {
    let mut pos = start;
    let mut vel = velocity;
    let mut elapsed = 0.0;
    let mut bounces = 0;
    let mut impacts = Vec::new();
    let mut pierced = piercing.then(|| FixedBitSet::with_capacity(bricks.id_capacity()));
    let mut termination = Termination::EventBudget;

    for _ in 0..MAX_LOOKAHEAD_EVENTS {
        let mut obstacles = Obstacles::new(field, bricks);
        if let Some(set) = pierced.as_ref() {
            obstacles = obstacles.ignoring(set);
        }
        let Some(event) = find_next_collision(&obstacles, pos, vel, radius) else {
            termination = Termination::NoCollision;
            break;
        };

        let dt = event.time.max(EPSILON);
        pos += vel * dt;
        elapsed += dt;
        if elapsed > MAX_SIMULATION_TIME {
            termination = Termination::TimeBudget;
            break;
        }

        match event.kind {
            // Forecasts carry no paddle obstacle, so coming back down always means the floor
            CollisionKind::Floor | CollisionKind::Paddle => {
                return ShotSimulationResult::finish(Termination::FloorMiss, impacts, elapsed, bounces, vel);
            }
            CollisionKind::Ceiling => {
                vel.y = -vel.y;
                pos.y = radius;
                bounces += 1;
            }
            CollisionKind::Wall => {
                vel.x = -vel.x;
                pos.x = pos.x.clamp(radius, (field.width - radius).max(radius));
                bounces += 1;
            }
            CollisionKind::Brick(id) => {
                impacts.push(BrickImpact { brick: id, time: elapsed });
                match pierced.as_mut() {
                    Some(set) => {
                        set.insert(id.index());
                        if impacts.len() >= MAX_PIERCE_HITS {
                            return ShotSimulationResult::finish(
                                Termination::PierceLimit,
                                impacts,
                                elapsed,
                                bounces,
                                vel,
                            );
                        }
                    }
                    None => {
                        vel = reflect_velocity(vel, event.normal);
                        return ShotSimulationResult::finish(Termination::BrickHit, impacts, elapsed, bounces, vel);
                    }
                }
            }
        }
    }

    log::trace!(
        "Shot ended by {:?} after {} bounces, {} bricks",
        termination,
        bounces,
        impacts.len()
    );
    ShotSimulationResult::finish(termination, impacts, elapsed, bounces, vel)
}
