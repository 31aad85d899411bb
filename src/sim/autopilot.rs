//! Shot planner and autopilot controller
//!
//! Each tick the planner forecasts one shot per candidate paddle contact
//! ratio, scores the outcomes with a brick-value heuristic and steers the
//! paddle toward the best one. When nothing useful can be planned it falls
//! back to the priority brick, then to the remembered aim, then to the
//! projected impact point.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::physics::launch_velocity;
use super::state::{Ball, Brick, Bricks, Field, GamePhase, GameState};
use super::trajectory::{ShotSimulationResult, simulate_shot};
use crate::consts::*;
use crate::{clamp_or_mid, lerp};

/// Autopilot toggle plus the sticky aim kept across ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutopilotState {
    pub enabled: bool,
    /// Last chosen paddle center
    pub aim_x: f64,
    pub aim_valid: bool,
}

impl AutopilotState {
    pub fn new(field: &Field) -> Self {
        Self {
            enabled: false,
            aim_x: field.center_x(),
            aim_valid: false,
        }
    }

    /// Forget the remembered aim
    pub fn invalidate(&mut self, field: &Field) {
        self.aim_x = field.center_x();
        self.aim_valid = false;
    }

    /// Store an aim point, clamped so the paddle stays inside the field
    pub fn remember(&mut self, aim: f64, paddle_width: f64, field_width: f64) -> f64 {
        let half = paddle_width / 2.0;
        self.aim_x = clamp_or_mid(aim, half, field_width - half);
        self.aim_valid = true;
        self.aim_x
    }

    pub fn sticky_aim(&self) -> Option<f64> {
        self.aim_valid.then_some(self.aim_x)
    }
}

/// One evaluated candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotPlan {
    /// Contact point across the paddle width (0 = left edge)
    pub ratio: f64,
    /// Paddle center that produces this contact
    pub target_center: f64,
    pub score: f64,
}

/// Read-only inputs for planning and scoring
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub field: &'a Field,
    pub bricks: &'a Bricks,
    pub ball_radius: f64,
    /// Paddle top edge
    pub paddle_y: f64,
    pub paddle_width: f64,
    pub paddle_center: f64,
    /// Speed the ball would leave the paddle with
    pub launch_speed: f64,
    /// Maximum deflection from vertical, radians
    pub max_deflection: f64,
    pub piercing: bool,
}

impl<'a> PlanContext<'a> {
    pub fn from_state(state: &'a GameState) -> Self {
        Self {
            field: &state.field,
            bricks: &state.bricks,
            ball_radius: state.ball.radius(),
            paddle_y: state.paddle.y,
            paddle_width: state.paddle.width,
            paddle_center: state.paddle.center_x(),
            launch_speed: state.paddle_launch_speed(),
            max_deflection: state.tuning.max_deflection(),
            piercing: state.is_piercing(),
        }
    }
}

/// Desirability of a brick as a target. Higher is better.
///
/// Favors bricks near the top, in dense clusters, with an open lane below
/// them, near a side wall, and with extra hit points.
pub fn brick_value(brick: &Brick, bricks: &Bricks, field: &Field, paddle_width: f64) -> f64 {
    let rect = &brick.rect;
    let height = 1.0 - clamp_or_mid(rect.y / (field.height * 0.9), 0.0, 1.0);
    let center_x = rect.center_x();
    let half_width = field.width / 2.0;
    let center = 1.0 - clamp_or_mid((center_x - half_width).abs() / half_width, 0.0, 1.0);
    let density = local_density(bricks, rect.center(), DENSITY_RADIUS);
    let lane = lane_clear_value(bricks, center_x, rect.y, paddle_width);
    let edge = edge_clear_value(brick, field);
    let toughness = if brick.hp > 1 { brick.hp as f64 * 0.45 } else { 0.0 };

    height * 4.4 + density * 1.8 + lane * 1.3 + center * 0.5 + edge * 1.1 + toughness
}

/// Gaussian-weighted count of live bricks within `radius` of `center`
fn local_density(bricks: &Bricks, center: DVec2, radius: f64) -> f64 {
    let radius_sq = radius * radius;
    bricks
        .live()
        .map(|b| b.rect.center().distance_squared(center))
        .filter(|&d2| d2 <= radius_sq)
        .map(|d2| (-d2 / (radius_sq * 0.6)).exp())
        .sum()
}

/// Drops for every live brick sitting above this one in its lane
fn lane_clear_value(bricks: &Bricks, center_x: f64, top_y: f64, paddle_width: f64) -> f64 {
    let lane_half = (paddle_width * 0.25).max(50.0);
    let blockers = bricks
        .live()
        .filter(|b| (b.rect.center_x() - center_x).abs() <= lane_half)
        .filter(|b| b.rect.bottom() <= top_y - EPSILON)
        .count();
    (1.5 - blockers as f64 * 0.28).max(0.0)
}

fn edge_clear_value(brick: &Brick, field: &Field) -> f64 {
    let left = brick.rect.x.max(0.0);
    let right = (field.width - brick.rect.right()).max(0.0);
    1.0 - clamp_or_mid(left.min(right) / (field.width * 0.45), 0.0, 1.0)
}

/// Best brick to aim at, weighing value against distance from `reference_x`
pub fn select_priority_brick<'a>(
    bricks: &'a Bricks,
    field: &Field,
    paddle_width: f64,
    reference_x: f64,
) -> Option<&'a Brick> {
    let mut best: Option<(&Brick, f64)> = None;
    for brick in bricks.live() {
        let offset = (brick.rect.center_x() - reference_x).abs();
        let alignment = 1.0 - clamp_or_mid(offset / (field.width * 0.5), 0.0, 1.0);
        let score = brick_value(brick, bricks, field, paddle_width) * 5.0 + alignment * 2.2;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((brick, score));
        }
    }
    best.map(|(brick, _)| brick)
}

/// Score a simulated shot that needs the paddle centered at `target_center`
pub fn evaluate_shot(ctx: &PlanContext, result: &ShotSimulationResult, target_center: f64) -> f64 {
    let travel = (target_center - ctx.paddle_center).abs();
    if !result.hit_brick {
        let base = if result.missed_by_floor { 260.0 } else { 120.0 };
        return -base - result.total_time * 9.0 - travel * 0.02;
    }

    let mut value_score = 0.0;
    let mut primary_x = None;
    for impact in &result.impacts {
        let Some(brick) = ctx.bricks.get(impact.brick) else {
            continue;
        };
        primary_x.get_or_insert(brick.rect.center_x());
        let weight = 1.0 / (1.0 + impact.time * 0.55);
        value_score += brick_value(brick, ctx.bricks, ctx.field, ctx.paddle_width) * weight;
    }
    let Some(primary_x) = primary_x else {
        return -100.0;
    };

    let exit_h = result.exit_velocity.x.abs();
    let exit_v = result.exit_velocity.y.abs();
    let horizontal_bias = exit_h / exit_v.max(0.4);
    let low_horizontal = (1.4 - exit_h).max(0.0);

    let mut score = value_score * 8.4;
    score += exit_h * 4.2;
    score += horizontal_bias * 6.0;
    score -= low_horizontal * 9.0;
    score += exit_v * 0.6;
    score -= result.exit_velocity.y.max(0.0) * 3.4;
    score -= result.total_time * 1.6;
    score -= result.bounces as f64 * 1.3;
    score -= (primary_x - target_center).abs() * 0.012;
    score -= travel * 0.016;

    let count = result.brick_count();
    if count > 1 {
        score += (count - 1) as f64 * 6.0;
    }
    if count >= 3 {
        score += 5.5;
    }
    score
}

/// Try every candidate contact ratio from `intercept_x` and keep the best one.
///
/// Candidates with a non-finite score are skipped; `None` when none remain.
pub fn plan_best_shot(ctx: &PlanContext, intercept_x: f64) -> Option<ShotPlan> {
    let strike_y = ctx.paddle_y - ctx.ball_radius - 0.5;
    let start = DVec2::new(intercept_x, strike_y);
    let mut best: Option<ShotPlan> = None;

    for &candidate in AUTOPILOT_RATIOS.iter() {
        let ratio = candidate.clamp(0.08, 0.92);
        let velocity = launch_velocity(ratio, ctx.launch_speed, ctx.max_deflection);
        let result = simulate_shot(ctx.field, ctx.bricks, start, velocity, ctx.ball_radius, ctx.piercing);
        let target_center = intercept_x + (0.5 - ratio) * ctx.paddle_width;
        let score = evaluate_shot(ctx, &result, target_center);
        if !score.is_finite() {
            continue;
        }
        if best.is_none_or(|b| score > b.score) {
            best = Some(ShotPlan {
                ratio,
                target_center,
                score,
            });
        }
    }
    best
}

/// Fold an unbounded x back between the side walls, as if the ball had
/// bounced off them (triangle wave of period `2 * (width - 2 * radius)`)
pub fn reflect_within_walls(x: f64, radius: f64, field_width: f64) -> f64 {
    let min = radius;
    let max = field_width - radius;
    let span = max - min;
    if !(span > 0.0) || !span.is_finite() || !x.is_finite() {
        return field_width / 2.0;
    }
    let wrapped = (x - min).rem_euclid(span * 2.0);
    let folded = if wrapped <= span {
        min + wrapped
    } else {
        max - (wrapped - span)
    };
    folded.clamp(min, max)
}

/// Where the ball center will cross the paddle strike line.
///
/// A rising ball is assumed to come straight back off the ceiling; bricks
/// are ignored.
pub fn predict_impact_x(ball: &Ball, paddle_y: f64, field_width: f64) -> f64 {
    let radius = ball.radius();
    let target_y = paddle_y - radius;
    let DVec2 { x, y } = ball.pos;
    let DVec2 { x: vx, y: vy } = ball.vel;

    let projected = if vx.abs() < EPSILON && vy.abs() < EPSILON {
        x
    } else if vy > 0.01 {
        let time = (target_y - y).max(0.0) / vy;
        x + vx * time
    } else if vy < -0.01 {
        let up = (y - radius).max(0.0);
        let down = (target_y - radius).max(0.0);
        x + vx * (up + down) / vy.abs()
    } else {
        x
    };
    reflect_within_walls(projected, radius, field_width)
}

/// Aim at the priority brick, else the sticky aim, else `fallback_x`
fn aim_for_brick(state: &mut GameState, reference_x: f64, fallback_x: f64) -> f64 {
    let priority = select_priority_brick(&state.bricks, &state.field, state.paddle.width, reference_x)
        .map(|brick| brick.rect.center_x());
    if let Some(aim) = priority {
        return state.autopilot.remember(aim, state.paddle.width, state.field.width);
    }
    state.autopilot.sticky_aim().unwrap_or(fallback_x)
}

/// Paddle center the autopilot wants this tick
pub fn plan_target_center(state: &mut GameState) -> f64 {
    let intercept_x = predict_impact_x(&state.ball, state.paddle.y, state.field.width);
    let ball_x = state.ball.pos.x;
    if state.phase != GamePhase::Running || state.ball.speed() <= 0.01 {
        return aim_for_brick(state, ball_x, intercept_x);
    }

    let plan = plan_best_shot(&PlanContext::from_state(state), intercept_x);
    match plan {
        Some(plan) => {
            log::trace!("Planned ratio {:.2} score {:.1}", plan.ratio, plan.score);
            state
                .autopilot
                .remember(plan.target_center, state.paddle.width, state.field.width)
        }
        None => aim_for_brick(state, ball_x, intercept_x),
    }
}

/// Move the paddle one tick toward the planned center, returns that center.
///
/// Snaps when within tolerance, otherwise steps at most `speed * limit`
/// where the limit is the autopilot speed multiplier capped at
/// [`AUTOPILOT_STEP_LIMIT`].
pub fn drive_paddle(state: &mut GameState) -> f64 {
    let field = state.field;
    let half = state.paddle.width / 2.0;
    let mut desired = plan_target_center(state);
    if !desired.is_finite() {
        desired = field.center_x();
    }
    let target = clamp_or_mid(desired, half, field.width - half);

    let paddle_speed = state.paddle.speed;
    if paddle_speed <= 1e-3 {
        state.paddle.set_center(target);
        state.ensure_valid_paddle_position();
        return target;
    }

    let delta = target - state.paddle.center_x();
    let tolerance = (state.paddle.width * 0.015).max(1.2);
    if delta.abs() <= tolerance {
        state.paddle.set_center(target);
        state.ensure_valid_paddle_position();
        return target;
    }

    let limit = if state.autopilot.enabled {
        state.speed_multiplier().min(AUTOPILOT_STEP_LIMIT)
    } else {
        1.0
    };
    let step = delta.abs().min(paddle_speed * limit);
    let mut direction = delta.signum() * (step / paddle_speed);
    if !direction.is_finite() {
        direction = 0.0;
    }
    state.paddle.move_by(direction.clamp(-limit, limit), field.width);

    if (target - state.paddle.center_x()).abs() <= tolerance {
        state.paddle.set_center(target);
    }
    state.ensure_valid_paddle_position();
    target
}

/// Bend a rising ball toward the priority brick
pub fn apply_guidance(state: &mut GameState) {
    if !state.autopilot.enabled || !state.tuning.autopilot_guidance || !state.bricks.has_live() {
        return;
    }
    let speed = state.ball.speed();
    if speed <= EPSILON || state.ball.vel.y >= 0.0 {
        return;
    }

    let reference_x = state.autopilot.sticky_aim().unwrap_or(state.ball.pos.x);
    let Some(target) = select_priority_brick(&state.bricks, &state.field, state.paddle.width, reference_x)
        .map(|brick| brick.rect.center())
    else {
        return;
    };
    let offset = target - state.ball.pos;
    let distance = offset.length();
    if distance < EPSILON {
        return;
    }

    let min_speed = state.minimum_ball_speed() * state.speed_multiplier();
    let max_speed = state.effective_max_speed();
    let mut desired_speed = clamp_or_mid(speed, min_speed, max_speed);
    if desired_speed <= EPSILON {
        desired_speed = min_speed;
    }
    let mut desired = offset / distance * desired_speed;
    if desired.y >= -EPSILON {
        desired.y = -desired.y.abs() - 0.5;
    }

    let strength = state.tuning.autopilot_guidance_strength;
    let vel = state.ball.vel;
    let blended = DVec2::new(lerp(vel.x, desired.x, strength), lerp(vel.y, desired.y, strength));
    let blended_speed = blended.length();
    if blended_speed < EPSILON {
        return;
    }
    let final_speed = clamp_or_mid(blended_speed, min_speed, max_speed);
    state.ball.vel = blended * (final_speed / blended_speed);
}
