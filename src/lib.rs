//! Brick Pilot - brick-breaker simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision engine, shot planner, physics, game state)
//! - `tuning`: Data-driven game balance
//! - `highscores`: In-memory run records and personal bests

pub mod highscores;
pub mod sim;
pub mod tuning;

pub use highscores::{RunEnd, ScoreBoard};
pub use tuning::{Tuning, TuningError};

/// Engine constants that are not part of game balance
pub mod consts {
    /// Threshold below which a velocity component or time is treated as zero
    pub const EPSILON: f64 = 1e-6;

    /// Paddle contact ratios tried by the shot planner (left edge to right edge)
    pub const AUTOPILOT_RATIOS: [f64; 11] = [
        0.08, 0.16, 0.24, 0.32, 0.40, 0.50, 0.60, 0.68, 0.76, 0.84, 0.92,
    ];
    /// Maximum collision events followed by one simulated shot
    pub const MAX_LOOKAHEAD_EVENTS: usize = 12;
    /// Maximum simulated time (in ticks) for one simulated shot
    pub const MAX_SIMULATION_TIME: f64 = 6.8;
    /// A piercing shot stops being followed after this many bricks
    pub const MAX_PIERCE_HITS: usize = 6;

    /// Radius used for the local brick density term
    pub const DENSITY_RADIUS: f64 = 150.0;

    /// Minimum paddle width
    pub const MIN_PADDLE_WIDTH: f64 = 40.0;
    /// Hit-position ratio clamp on the live paddle
    pub const PADDLE_HIT_MIN: f64 = 0.05;
    pub const PADDLE_HIT_MAX: f64 = 0.95;
    /// Hard cap on the autopilot per-tick paddle step multiplier
    pub const AUTOPILOT_STEP_LIMIT: f64 = 1.6;

    /// Gap left between the ball and a surface it was pushed out of
    pub const SEPARATION: f64 = 0.5;
    /// Height of the resting ball above the paddle
    pub const SERVE_GAP: f64 = 4.0;

    /// Run history size
    pub const SCORE_HISTORY_LIMIT: usize = 5;
}

/// Clamp `value` into `[min, max]`, mapping non-finite input to the midpoint.
///
/// Bounds given in the wrong order are swapped.
#[inline]
pub fn clamp_or_mid(value: f64, min: f64, max: f64) -> f64 {
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    if !value.is_finite() {
        return (min + max) / 2.0;
    }
    value.max(min).min(max)
}

/// Linear interpolation with the factor clamped to `[0, 1]`
#[inline]
pub fn lerp(start: f64, end: f64, alpha: f64) -> f64 {
    let alpha = clamp_or_mid(alpha, 0.0, 1.0);
    start + (end - start) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_or_mid() {
        assert_eq!(clamp_or_mid(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_or_mid(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_or_mid(12.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp_or_mid(f64::NAN, 0.0, 10.0), 5.0);
        assert_eq!(clamp_or_mid(f64::INFINITY, 0.0, 10.0), 5.0);
        // Swapped bounds
        assert_eq!(clamp_or_mid(12.0, 10.0, 0.0), 10.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
        assert_eq!(lerp(4.0, 8.0, -1.0), 4.0);
    }
}
