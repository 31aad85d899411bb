//! Authoritative per-tick ball physics
//!
//! Discrete overlap tests on the real ball, one resolution step per tick.
//! The swept engine in [`super::collision`] is only used for forecasting.

use glam::DVec2;

use super::rect::Rect;
use super::state::{Ball, BrickId, Bricks, Field, Paddle};
use crate::consts::*;

/// Outgoing velocity for a paddle contact at `ratio` across its width.
///
/// `0.5` is straight up; the edges map to `±max_deflection` from vertical.
pub fn launch_velocity(ratio: f64, speed: f64, max_deflection: f64) -> DVec2 {
    let angle = (ratio - 0.5) * 2.0 * max_deflection;
    DVec2::new(speed * angle.sin(), -(speed * angle.cos()).abs())
}

/// Bounce off the side walls and ceiling. Returns true once the ball has
/// dropped entirely past the floor.
pub fn constrain_ball_to_field(ball: &mut Ball, field: &Field) -> bool {
    let radius = ball.radius();
    let left = ball.pos.x - radius;
    let top = ball.pos.y - radius;

    if left <= 0.0 && ball.vel.x < 0.0 {
        ball.pos.x = radius;
        ball.bounce_horizontally();
    } else if left + ball.diameter >= field.width && ball.vel.x > 0.0 {
        ball.pos.x = field.width - radius;
        ball.bounce_horizontally();
    }

    if top <= 0.0 && ball.vel.y < 0.0 {
        ball.pos.y = radius;
        ball.bounce_vertically();
        false
    } else {
        top >= field.height
    }
}

/// Send a descending ball back up from the paddle. The contact point picks
/// the angle; `speed` is the level's paddle launch speed.
pub fn handle_paddle_collision(ball: &mut Ball, paddle: &Paddle, speed: f64, max_deflection: f64) -> bool {
    if ball.vel.y < 0.0 || !ball.bounds().intersects(&paddle.bounds()) {
        return false;
    }
    ball.pos.y = paddle.y - ball.radius() - SEPARATION;

    let ratio = ((ball.pos.x - paddle.x) / paddle.width).clamp(PADDLE_HIT_MIN, PADDLE_HIT_MAX);
    let ratio = if ratio.is_finite() { ratio } else { 0.5 };
    ball.vel = launch_velocity(ratio, speed, max_deflection);
    true
}

/// A brick the ball touched this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrickContact {
    pub id: BrickId,
    pub bounds: Rect,
    pub destroyed: bool,
    pub remaining_hp: u32,
}

/// Apply this tick's brick contacts.
///
/// A piercing ball shatters every brick it overlaps and keeps its course. A
/// normal ball bounces off the first overlapping brick (collection order)
/// and takes one hit point from it. Destroyed bricks are only flagged; the
/// caller compacts the arena.
pub fn handle_brick_collisions(ball: &mut Ball, bricks: &mut Bricks, piercing: bool) -> Vec<BrickContact> {
    let ball_bounds = ball.bounds();
    let mut contacts = Vec::new();

    for brick in bricks.iter_mut() {
        if brick.is_destroyed() || !ball_bounds.intersects(&brick.rect) {
            continue;
        }
        if piercing {
            brick.shatter();
        } else {
            resolve_ball_brick_collision(ball, &brick.rect);
            brick.apply_hit();
        }
        contacts.push(BrickContact {
            id: brick.id,
            bounds: brick.rect,
            destroyed: brick.is_destroyed(),
            remaining_hp: brick.hp,
        });
        if !piercing {
            break;
        }
    }
    contacts
}

/// Push the ball out along the axis of least overlap and reflect that axis
pub fn resolve_ball_brick_collision(ball: &mut Ball, rect: &Rect) {
    let bounds = ball.bounds();
    let radius = ball.radius();

    let overlap_left = bounds.right() - rect.x;
    let overlap_right = rect.right() - bounds.x;
    let overlap_top = bounds.bottom() - rect.y;
    let overlap_bottom = rect.bottom() - bounds.y;

    if overlap_left.min(overlap_right) < overlap_top.min(overlap_bottom) {
        ball.pos.x = if overlap_left < overlap_right {
            rect.x - radius - SEPARATION
        } else {
            rect.right() + radius + SEPARATION
        };
        ball.bounce_horizontally();
    } else {
        ball.pos.y = if overlap_top < overlap_bottom {
            rect.y - radius - SEPARATION
        } else {
            rect.bottom() + radius + SEPARATION
        };
        ball.bounce_vertically();
    }
}

/// Speed up after a brick hit: lift a slow ball to `min_speed`, otherwise
/// add `increment` up to `max_speed`
pub fn accelerate_ball(ball: &mut Ball, min_speed: f64, increment: f64, max_speed: f64) {
    let speed = ball.speed();
    if speed < min_speed {
        ball.normalize_speed(min_speed);
    } else {
        ball.normalize_speed(max_speed.min(speed + increment));
    }
}
