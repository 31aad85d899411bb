//! Swept collision detection
//!
//! The ball is treated as a point moving at constant velocity. Every
//! rectangular obstacle is grown by the ball radius, so hitting the grown
//! rectangle is the same as the ball's bounding square touching the original.
//! Times are in ticks, measured from the given position.

use fixedbitset::FixedBitSet;
use glam::DVec2;

use super::rect::Rect;
use super::state::{BrickId, Bricks, Field};
use crate::consts::EPSILON;

/// What the ball runs into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// Side wall (left or right, see the normal)
    Wall,
    Ceiling,
    /// The floor plane at the bottom of the field
    Floor,
    Brick(BrickId),
    /// Only reported when the query includes a paddle
    Paddle,
}

/// Earliest predicted contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    /// Time to impact, never negative
    pub time: f64,
    /// Axis normal of the struck surface. Both components are set for an
    /// exact corner hit.
    pub normal: DVec2,
}

/// The obstacle set one query runs against
#[derive(Debug, Clone, Copy)]
pub struct Obstacles<'a> {
    pub field: &'a Field,
    pub bricks: &'a Bricks,
    /// Paddle rectangle, when the caller wants it treated as an obstacle
    pub paddle: Option<Rect>,
    /// Brick ids to skip (indexed by `BrickId::index`)
    pub ignored: Option<&'a FixedBitSet>,
}

impl<'a> Obstacles<'a> {
    /// Field boundaries plus every live brick
    pub fn new(field: &'a Field, bricks: &'a Bricks) -> Self {
        Self {
            field,
            bricks,
            paddle: None,
            ignored: None,
        }
    }

    pub fn with_paddle(mut self, paddle: Rect) -> Self {
        self.paddle = Some(paddle);
        self
    }

    pub fn ignoring(mut self, ignored: &'a FixedBitSet) -> Self {
        self.ignored = Some(ignored);
        self
    }

    fn is_ignored(&self, id: BrickId) -> bool {
        self.ignored.is_some_and(|set| set.contains(id.index()))
    }
}

/// Entry/exit times of a moving coordinate through `[min, max]`.
///
/// A (near) stationary coordinate must already lie strictly inside the slab.
fn slab_times(pos: f64, vel: f64, min: f64, max: f64) -> Option<(f64, f64)> {
    if vel.abs() < EPSILON {
        if pos <= min || pos >= max {
            return None;
        }
        return Some((f64::NEG_INFINITY, f64::INFINITY));
    }
    let t1 = (min - pos) / vel;
    let t2 = (max - pos) / vel;
    Some((t1.min(t2), t1.max(t2)))
}

/// Sweep the ball against one rectangle with the slab method.
///
/// Returns the entry time (clamped to 0 when already overlapping) and the
/// collision normal. The axis that enters last is the one that was hit.
pub fn sweep_rect(rect: &Rect, pos: DVec2, vel: DVec2, radius: f64) -> Option<(f64, DVec2)> {
    if vel.x.abs() < EPSILON && vel.y.abs() < EPSILON {
        return None;
    }
    let grown = rect.expand(radius);
    let (enter_x, exit_x) = slab_times(pos.x, vel.x, grown.x, grown.right())?;
    let (enter_y, exit_y) = slab_times(pos.y, vel.y, grown.y, grown.bottom())?;

    let entry = enter_x.max(enter_y).max(0.0);
    let exit = exit_x.min(exit_y);
    if exit < entry || exit < EPSILON {
        return None;
    }

    let face_x = if vel.x > 0.0 { -1.0 } else { 1.0 };
    let face_y = if vel.y > 0.0 { -1.0 } else { 1.0 };
    let normal = if enter_x > enter_y {
        DVec2::new(face_x, 0.0)
    } else if enter_y > enter_x {
        DVec2::new(0.0, face_y)
    } else {
        // Exact corner: both axes arrive together and both get reflected
        DVec2::new(face_x, face_y)
    };
    Some((entry, normal))
}

/// Find the earliest collision along a straight path.
///
/// Checks run floor, ceiling, left wall, right wall, bricks in collection
/// order, then the paddle; on equal times the first one checked wins.
pub fn find_next_collision(obstacles: &Obstacles, pos: DVec2, vel: DVec2, radius: f64) -> Option<CollisionEvent> {
    if vel.x.abs() < EPSILON && vel.y.abs() < EPSILON {
        return None;
    }
    let field = obstacles.field;
    let mut best: Option<CollisionEvent> = None;
    let mut consider = |kind: CollisionKind, time: f64, normal: DVec2| {
        if best.is_none_or(|b| time < b.time) {
            best = Some(CollisionEvent { kind, time, normal });
        }
    };

    // Boundaries are half-planes: only the crossing of one threshold matters
    if vel.y > EPSILON {
        let time = (field.height - radius - pos.y) / vel.y;
        if time >= EPSILON {
            consider(CollisionKind::Floor, time, DVec2::NEG_Y);
        }
    }
    if vel.y < -EPSILON {
        let time = (radius - pos.y) / vel.y;
        if time >= EPSILON {
            consider(CollisionKind::Ceiling, time, DVec2::Y);
        }
    }
    if vel.x < -EPSILON {
        let time = (radius - pos.x) / vel.x;
        if time >= EPSILON {
            consider(CollisionKind::Wall, time, DVec2::X);
        }
    }
    if vel.x > EPSILON {
        let time = (field.width - radius - pos.x) / vel.x;
        if time >= EPSILON {
            consider(CollisionKind::Wall, time, DVec2::NEG_X);
        }
    }

    for brick in obstacles.bricks.live() {
        if obstacles.is_ignored(brick.id) {
            continue;
        }
        if let Some((time, normal)) = sweep_rect(&brick.rect, pos, vel, radius) {
            consider(CollisionKind::Brick(brick.id), time, normal);
        }
    }

    if let Some(paddle) = obstacles.paddle
        && let Some((time, normal)) = sweep_rect(&paddle, pos, vel, radius)
    {
        consider(CollisionKind::Paddle, time, normal);
    }

    best
}

/// Reflect velocity about an axis normal: every axis the normal touches is flipped.
///
/// A corner normal flips both components.
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2) -> DVec2 {
    DVec2::new(
        if normal.x != 0.0 { -velocity.x } else { velocity.x },
        if normal.y != 0.0 { -velocity.y } else { velocity.y },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field::new(800.0, 600.0)
    }

    #[test]
    fn test_brick_straight_below() {
        let field = field();
        let mut bricks = Bricks::new();
        let id = bricks.push(Rect::new(90.0, 150.0, 40.0, 24.0), 1, 0);

        let event = find_next_collision(
            &Obstacles::new(&field, &bricks),
            DVec2::new(100.0, 100.0),
            DVec2::new(0.0, 5.0),
            9.0,
        )
        .expect("brick should be hit");

        assert_eq!(event.kind, CollisionKind::Brick(id));
        assert!((event.time - (150.0 - 9.0 - 100.0) / 5.0).abs() < 1e-9);
        assert_eq!(event.normal, DVec2::new(0.0, -1.0));
    }

    #[test]
    fn test_zero_velocity_never_collides() {
        let field = field();
        let mut bricks = Bricks::new();
        bricks.push(Rect::new(90.0, 95.0, 40.0, 24.0), 1, 0);
        let obstacles = Obstacles::new(&field, &bricks);
        assert!(find_next_collision(&obstacles, DVec2::new(100.0, 100.0), DVec2::ZERO, 9.0).is_none());
        assert!(sweep_rect(&Rect::new(90.0, 95.0, 40.0, 24.0), DVec2::new(100.0, 100.0), DVec2::ZERO, 9.0).is_none());
    }

    #[test]
    fn test_brick_behind_motion_is_ignored() {
        let rect = Rect::new(90.0, 150.0, 40.0, 24.0);
        // Moving away (up) from a brick below
        assert!(sweep_rect(&rect, DVec2::new(100.0, 100.0), DVec2::new(0.0, -5.0), 9.0).is_none());
        // Moving sideways past it, outside its x slab
        assert!(sweep_rect(&rect, DVec2::new(20.0, 100.0), DVec2::new(0.0, 5.0), 9.0).is_none());
    }

    #[test]
    fn test_side_hit_normal() {
        let rect = Rect::new(200.0, 100.0, 40.0, 24.0);
        let (time, normal) = sweep_rect(&rect, DVec2::new(150.0, 112.0), DVec2::new(4.0, 0.0), 9.0).unwrap();
        assert!((time - (191.0 - 150.0) / 4.0).abs() < 1e-9);
        assert_eq!(normal, DVec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_exact_corner_sets_both_normals() {
        // Grown rect starts at (91, 91); from (81, 81) at (1, 1) both axes enter at t = 10
        let rect = Rect::new(100.0, 100.0, 20.0, 20.0);
        let (time, normal) = sweep_rect(&rect, DVec2::new(81.0, 81.0), DVec2::new(1.0, 1.0), 9.0).unwrap();
        assert!((time - 10.0).abs() < 1e-9);
        assert_eq!(normal, DVec2::new(-1.0, -1.0));
        assert_eq!(reflect_velocity(DVec2::new(1.0, 1.0), normal), DVec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_boundaries() {
        let field = field();
        let bricks = Bricks::new();
        let obstacles = Obstacles::new(&field, &bricks);

        let floor = find_next_collision(&obstacles, DVec2::new(400.0, 500.0), DVec2::new(0.0, 10.0), 9.0).unwrap();
        assert_eq!(floor.kind, CollisionKind::Floor);
        assert!((floor.time - 9.1).abs() < 1e-9);

        let ceiling = find_next_collision(&obstacles, DVec2::new(400.0, 109.0), DVec2::new(0.0, -10.0), 9.0).unwrap();
        assert_eq!(ceiling.kind, CollisionKind::Ceiling);
        assert_eq!(ceiling.normal, DVec2::Y);

        let right = find_next_collision(&obstacles, DVec2::new(700.0, 300.0), DVec2::new(10.0, -1.0), 9.0).unwrap();
        assert_eq!(right.kind, CollisionKind::Wall);
        assert_eq!(right.normal, DVec2::NEG_X);
        assert!((right.time - 9.1).abs() < 1e-9);
    }

    #[test]
    fn test_floor_wins_ties_over_wall() {
        let field = Field::new(200.0, 200.0);
        let bricks = Bricks::new();
        // Equidistant from floor and right wall
        let event = find_next_collision(
            &Obstacles::new(&field, &bricks),
            DVec2::new(100.0, 100.0),
            DVec2::new(1.0, 1.0),
            10.0,
        )
        .unwrap();
        assert_eq!(event.kind, CollisionKind::Floor);
    }

    #[test]
    fn test_ignored_and_dead_bricks_skipped() {
        let field = field();
        let mut bricks = Bricks::new();
        let near = bricks.push(Rect::new(90.0, 150.0, 40.0, 24.0), 1, 0);
        let far = bricks.push(Rect::new(90.0, 250.0, 40.0, 24.0), 1, 0);
        let pos = DVec2::new(100.0, 100.0);
        let vel = DVec2::new(0.0, 5.0);

        let mut ignored = FixedBitSet::with_capacity(bricks.id_capacity());
        ignored.insert(near.index());
        let event = find_next_collision(&Obstacles::new(&field, &bricks).ignoring(&ignored), pos, vel, 9.0).unwrap();
        assert_eq!(event.kind, CollisionKind::Brick(far));

        bricks.get_mut(far).unwrap().shatter();
        bricks.get_mut(near).unwrap().shatter();
        let event = find_next_collision(&Obstacles::new(&field, &bricks), pos, vel, 9.0).unwrap();
        assert_eq!(event.kind, CollisionKind::Floor);
    }

    #[test]
    fn test_paddle_obstacle() {
        let field = field();
        let bricks = Bricks::new();
        let paddle = Rect::new(340.0, 530.0, 120.0, 16.0);
        let event = find_next_collision(
            &Obstacles::new(&field, &bricks).with_paddle(paddle),
            DVec2::new(400.0, 400.0),
            DVec2::new(0.0, 10.0),
            9.0,
        )
        .unwrap();
        assert_eq!(event.kind, CollisionKind::Paddle);
        assert!((event.time - 12.1).abs() < 1e-9);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// A rectangle strictly behind the direction of travel is never reported
            #[test]
            fn prop_obstacle_behind_is_never_hit(
                x in 0.0f64..800.0,
                y in 200.0f64..600.0,
                vx in -10.0f64..10.0,
                vy in 0.1f64..10.0,
            ) {
                // Brick sits entirely above the ball while it moves down
                let rect = Rect::new(x - 20.0, y - 100.0, 40.0, 24.0);
                prop_assert!(sweep_rect(&rect, DVec2::new(x, y), DVec2::new(vx, vy), 9.0).is_none());
            }

            /// Reported times are never negative
            #[test]
            fn prop_event_time_non_negative(
                px in 10.0f64..790.0,
                py in 10.0f64..590.0,
                vx in -12.0f64..12.0,
                vy in -12.0f64..12.0,
            ) {
                let field = Field::new(800.0, 600.0);
                let mut bricks = Bricks::new();
                bricks.push(Rect::new(300.0, 200.0, 60.0, 24.0), 1, 0);
                bricks.push(Rect::new(100.0, 80.0, 60.0, 24.0), 2, 0);
                if let Some(event) = find_next_collision(&Obstacles::new(&field, &bricks), DVec2::new(px, py), DVec2::new(vx, vy), 9.0) {
                    prop_assert!(event.time >= 0.0);
                    prop_assert!(event.time.is_finite());
                }
            }
        }
    }
}
