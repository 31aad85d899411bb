//! Game state and core simulation types
//!
//! Everything one tick reads or writes lives in [`GameState`], so the
//! simulation runs without any rendering surface attached.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::autopilot::AutopilotState;
use super::bonus::{ActiveBonus, ActiveBonuses, BonusKind};
use super::rect::Rect;
use crate::clamp_or_mid;
use crate::consts::*;
use crate::highscores::ScoreBoard;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball resting on the paddle, waiting for launch
    Ready,
    /// Active gameplay
    Running,
    /// Pause menu open
    Paused,
    /// All bricks cleared, waiting for the next level
    LevelComplete,
    /// Run ended
    GameOver,
}

/// Playfield bounds. Walls at `x = 0` and `x = width`, ceiling at `y = 0`, floor at `y = height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center_x(&self) -> f64 {
        self.width / 2.0
    }
}

/// The ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Center position
    pub pos: DVec2,
    /// Units per tick
    pub vel: DVec2,
    pub diameter: f64,
}

impl Ball {
    pub fn new(center: DVec2, diameter: f64) -> Self {
        Self {
            pos: center,
            vel: DVec2::ZERO,
            diameter,
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.vel.length()
    }

    /// Bounding square of the ball
    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius())
    }

    /// Integrate one tick
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn bounce_horizontally(&mut self) {
        self.vel.x = -self.vel.x;
    }

    pub fn bounce_vertically(&mut self) {
        self.vel.y = -self.vel.y;
    }

    /// Rescale velocity to `target` speed, keeping direction. A resting ball stays at rest.
    pub fn normalize_speed(&mut self, target: f64) {
        let speed = self.speed();
        if speed == 0.0 {
            return;
        }
        self.vel *= target / speed;
    }
}

/// The player's paddle. `x` is the left edge, `y` the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Units per tick at full input
    pub speed: f64,
}

impl Paddle {
    pub fn new(x: f64, y: f64, width: f64, height: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(MIN_PADDLE_WIDTH),
            height,
            speed: speed.max(0.0),
        }
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Move by `direction * speed`, staying inside the field
    pub fn move_by(&mut self, direction: f64, field_width: f64) {
        self.x += direction * self.speed;
        self.clamp_to_field(field_width);
    }

    pub fn set_center(&mut self, center_x: f64) {
        self.x = center_x - self.width / 2.0;
    }

    /// Resize around the current center (never below the minimum width)
    pub fn set_width(&mut self, width: f64, field_width: f64) {
        let center = self.center_x();
        self.width = width.max(MIN_PADDLE_WIDTH);
        self.set_center(center);
        self.clamp_to_field(field_width);
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(0.0);
    }

    /// Restore the horizontal invariant, recentering on garbage input.
    /// A paddle wider than the field is narrowed to the field width.
    pub fn clamp_to_field(&mut self, field_width: f64) {
        if !self.width.is_finite() || self.width <= 0.0 {
            self.width = MIN_PADDLE_WIDTH;
        }
        if field_width > 0.0 && self.width > field_width {
            self.width = field_width;
        }
        if !self.x.is_finite() {
            self.set_center(field_width / 2.0);
        }
        let max_x = (field_width - self.width).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
    }
}

/// Stable brick identity for the duration of a level (assigned in build order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrickId(pub u32);

impl BrickId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A brick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub id: BrickId,
    pub rect: Rect,
    /// Remaining hit points, destroyed at 0
    pub hp: u32,
    pub max_hp: u32,
    /// 0xRRGGBB tier color
    pub color: u32,
}

impl Brick {
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.hp == 0
    }

    /// Remove one hit point, returns true if this destroyed the brick
    pub fn apply_hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.hp == 0
    }

    /// Destroy regardless of remaining hit points
    pub fn shatter(&mut self) {
        self.hp = 0;
    }
}

/// Brick arena, ordered by id.
///
/// Dead bricks stay in place (hp = 0) until [`Bricks::compact`] runs at the
/// end of a tick, so ids handed out during a tick never dangle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bricks {
    bricks: Vec<Brick>,
    next_id: u32,
}

impl Bricks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every brick and restart id allocation
    pub fn clear(&mut self) {
        self.bricks.clear();
        self.next_id = 0;
    }

    pub fn push(&mut self, rect: Rect, hp: u32, color: u32) -> BrickId {
        let id = BrickId(self.next_id);
        self.next_id += 1;
        let hp = hp.max(1);
        self.bricks.push(Brick {
            id,
            rect,
            hp,
            max_hp: hp,
            color,
        });
        id
    }

    pub fn get(&self, id: BrickId) -> Option<&Brick> {
        self.bricks
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bricks[i])
    }

    pub fn get_mut(&mut self, id: BrickId) -> Option<&mut Brick> {
        match self.bricks.binary_search_by_key(&id, |b| b.id) {
            Ok(i) => Some(&mut self.bricks[i]),
            Err(_) => None,
        }
    }

    /// Bricks that still have hit points, in collection order
    pub fn live(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter().filter(|b| !b.is_destroyed())
    }

    /// All stored bricks, including ones flagged dead this tick
    pub fn iter(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Brick> {
        self.bricks.iter_mut()
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn has_live(&self) -> bool {
        self.bricks.iter().any(|b| !b.is_destroyed())
    }

    /// Drop dead bricks, returns how many were removed
    pub fn compact(&mut self) -> usize {
        let before = self.bricks.len();
        self.bricks.retain(|b| !b.is_destroyed());
        before - self.bricks.len()
    }

    /// Upper bound on id indices handed out this level
    pub fn id_capacity(&self) -> usize {
        self.next_id as usize
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }
}

/// Round and scoring signals for UI/effects collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BrickDestroyed { id: BrickId, bounds: Rect },
    BrickDamaged { id: BrickId, remaining_hp: u32 },
    LifeLost { lives_left: u32 },
    LevelCleared { level: u32 },
    GameOver { score: u64, level: u32 },
    BonusPurchased(BonusKind),
    PurchaseRejected { kind: BonusKind, credits: u32 },
    BonusExpired(BonusKind),
}

/// Read-only view for rendering
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub field: Field,
    pub ball: Ball,
    pub paddle: Paddle,
    pub bricks: Vec<Brick>,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub credits: u32,
    pub piercing: bool,
    pub cheat_mode: bool,
    pub autopilot: bool,
    pub shop_open: bool,
    /// (bonus, whole seconds left)
    pub bonuses: Vec<(BonusKind, u32)>,
}

/// Complete game context threaded through every tick
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub field: Field,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    /// Phase restored when the pause menu closes
    pub phase_before_pause: GamePhase,
    pub ball: Ball,
    pub paddle: Paddle,
    pub bricks: Bricks,
    pub score: u64,
    pub lives: u32,
    /// Current level (1-based)
    pub level: u32,
    pub credits: u32,
    /// Piercing ball plus a bigger, faster paddle
    pub cheat_mode: bool,
    pub autopilot: AutopilotState,
    pub bonuses: ActiveBonuses,
    pub shop_open: bool,
    pub scoreboard: ScoreBoard,
    pub(crate) run_recorded: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game and build level 1
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let field = Field::new(tuning.field_width, tuning.field_height);
        let mut paddle = Paddle::new(
            (field.width - tuning.paddle_width) / 2.0,
            tuning.paddle_y(),
            tuning.paddle_width,
            tuning.paddle_height,
            tuning.paddle_speed,
        );
        paddle.clamp_to_field(field.width);
        let ball = Ball::new(
            DVec2::new(paddle.center_x(), paddle.y - tuning.ball_diameter),
            tuning.ball_diameter,
        );
        let mut state = Self {
            field,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Ready,
            phase_before_pause: GamePhase::Ready,
            ball,
            paddle,
            bricks: Bricks::new(),
            score: 0,
            lives: tuning.starting_lives,
            level: 1,
            credits: 0,
            cheat_mode: false,
            autopilot: AutopilotState::new(&field),
            bonuses: ActiveBonuses::default(),
            shop_open: false,
            scoreboard: ScoreBoard::new(),
            run_recorded: false,
            time_ticks: 0,
            events: Vec::new(),
            tuning,
        };
        state.start_new_game();
        state
    }

    /// Ball and paddle speed multiplier (raised while the autopilot flies)
    pub fn speed_multiplier(&self) -> f64 {
        if self.autopilot.enabled {
            self.tuning.autopilot_speed_multiplier
        } else {
            1.0
        }
    }

    /// Minimum ball speed for the current level, before the autopilot multiplier
    pub fn minimum_ball_speed(&self) -> f64 {
        self.tuning.base_ball_speed + self.level.saturating_sub(1) as f64 * self.tuning.speed_increment
    }

    pub fn effective_max_speed(&self) -> f64 {
        self.tuning.max_ball_speed * self.speed_multiplier()
    }

    /// Speed the ball leaves the paddle with
    pub fn paddle_launch_speed(&self) -> f64 {
        let base = (self.minimum_ball_speed() + self.level as f64 * 0.5) * self.speed_multiplier();
        self.effective_max_speed().min(base)
    }

    pub fn is_piercing(&self) -> bool {
        self.cheat_mode || self.bonuses.is_active(BonusKind::PierceBall)
    }

    pub fn score_multiplier(&self) -> f64 {
        if self.bonuses.is_active(BonusKind::ScoreBoost) {
            2.0
        } else {
            1.0
        }
    }

    /// Seconds left on a bonus, 0 when inactive
    pub fn bonus_remaining_seconds(&self, kind: BonusKind) -> u32 {
        self.bonuses.remaining_seconds(kind, self.tuning.ticks_per_second)
    }

    pub fn add_score(&mut self, base_points: u32) {
        let awarded = (base_points as f64 * self.score_multiplier()).round();
        self.score += awarded.max(0.0) as u64;
        self.update_progress();
    }

    pub fn award_credit(&mut self) {
        self.credits += 1;
        self.update_progress();
    }

    pub(crate) fn update_progress(&mut self) {
        self.scoreboard.update_progress(self.score, self.level, self.credits);
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put the ball at rest just above the paddle center
    pub fn park_ball(&mut self) {
        let radius = self.ball.radius();
        self.ball.pos = DVec2::new(self.paddle.center_x(), self.paddle.y - radius - SERVE_GAP);
        self.ball.vel = DVec2::ZERO;
    }

    /// Keep the ball riding on the paddle without touching its velocity
    pub fn follow_paddle(&mut self) {
        let radius = self.ball.radius();
        self.ball.pos = DVec2::new(self.paddle.center_x(), self.paddle.y - radius - SERVE_GAP);
    }

    pub fn ensure_valid_paddle_position(&mut self) {
        self.paddle.clamp_to_field(self.field.width);
    }

    /// Replace a non-finite ball with a resting one above the paddle
    pub fn ensure_valid_ball_position(&mut self) {
        if !self.ball.vel.is_finite() {
            self.ball.vel = DVec2::ZERO;
        }
        if self.ball.pos.is_finite() {
            return;
        }
        let radius = self.ball.radius();
        let center_x = if self.paddle.x.is_finite() {
            clamp_or_mid(self.paddle.center_x(), radius, self.field.width - radius)
        } else {
            self.field.center_x()
        };
        self.ball.pos = DVec2::new(center_x, self.paddle.y - radius - SERVE_GAP);
        self.ball.vel = DVec2::ZERO;
        log::warn!("Ball position was not finite, reset above paddle");
    }

    /// Re-derive paddle size and speed from cheat mode and bonuses
    pub fn refresh_modifiers(&mut self) {
        let tuning = &self.tuning;
        let mut width_factor = 1.0;
        let mut paddle_speed = tuning.paddle_speed;

        if self.cheat_mode {
            width_factor = (tuning.paddle_width * tuning.cheat_width_factor).round() / tuning.paddle_width;
            paddle_speed *= tuning.cheat_speed_factor;
        }
        if self.bonuses.is_active(BonusKind::PaddleGrow) {
            width_factor *= super::bonus::PADDLE_GROW_WIDTH_FACTOR;
            paddle_speed *= super::bonus::PADDLE_GROW_SPEED_FACTOR;
        }

        let target_width = (tuning.paddle_width * width_factor).round();
        self.paddle.set_speed(paddle_speed);
        self.paddle.set_width(target_width, self.field.width);
        self.ensure_valid_paddle_position();
        self.ensure_valid_ball_position();
    }

    pub fn snapshot(&self) -> Snapshot {
        let tps = self.tuning.ticks_per_second;
        Snapshot {
            phase: self.phase,
            field: self.field,
            ball: self.ball,
            paddle: self.paddle,
            bricks: self.bricks.live().copied().collect(),
            score: self.score,
            lives: self.lives,
            level: self.level,
            credits: self.credits,
            piercing: self.is_piercing(),
            cheat_mode: self.cheat_mode,
            autopilot: self.autopilot.enabled,
            shop_open: self.shop_open,
            bonuses: self
                .bonuses
                .iter()
                .map(|b: &ActiveBonus| (b.kind, b.remaining_seconds(tps)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paddle_stays_in_field() {
        let mut paddle = Paddle::new(10.0, 530.0, 120.0, 16.0, 6.5);
        paddle.move_by(-5.0, 800.0);
        assert_eq!(paddle.x, 0.0);
        paddle.set_center(790.0);
        paddle.clamp_to_field(800.0);
        assert_eq!(paddle.x, 680.0);
        paddle.x = f64::NAN;
        paddle.clamp_to_field(800.0);
        assert_eq!(paddle.center_x(), 400.0);
    }

    #[test]
    fn test_paddle_never_wider_than_field() {
        let mut paddle = Paddle::new(0.0, 530.0, 120.0, 16.0, 6.5);
        paddle.set_width(204.0, 150.0);
        assert_eq!(paddle.width, 150.0);
        assert_eq!(paddle.x, 0.0);

        let mut paddle = Paddle::new(-300.0, 530.0, 900.0, 16.0, 6.5);
        paddle.clamp_to_field(800.0);
        assert_eq!(paddle.width, 800.0);
        assert_eq!(paddle.x, 0.0);
    }

    #[test]
    fn test_paddle_min_width() {
        let mut paddle = Paddle::new(300.0, 530.0, 120.0, 16.0, 6.5);
        paddle.set_width(10.0, 800.0);
        assert_eq!(paddle.width, MIN_PADDLE_WIDTH);
        // Keeps its center
        assert_eq!(paddle.center_x(), 360.0);
    }

    #[test]
    fn test_brick_arena_soft_delete() {
        let mut bricks = Bricks::new();
        let a = bricks.push(Rect::new(0.0, 0.0, 10.0, 10.0), 1, 0);
        let b = bricks.push(Rect::new(20.0, 0.0, 10.0, 10.0), 2, 0);
        assert_eq!(bricks.id_capacity(), 2);

        assert!(bricks.get_mut(a).unwrap().apply_hit());
        assert!(!bricks.get_mut(b).unwrap().apply_hit());
        // Flagged dead but still addressable until compaction
        assert!(bricks.get(a).unwrap().is_destroyed());
        assert_eq!(bricks.live_count(), 1);

        assert_eq!(bricks.compact(), 1);
        assert!(bricks.get(a).is_none());
        assert_eq!(bricks.get(b).unwrap().hp, 1);
        // Ids are not reused within a level
        let c = bricks.push(Rect::new(40.0, 0.0, 10.0, 10.0), 1, 0);
        assert_eq!(c, BrickId(2));
    }

    #[test]
    fn test_ball_normalize_speed() {
        let mut ball = Ball::new(DVec2::new(100.0, 100.0), 18.0);
        ball.normalize_speed(5.0);
        assert_eq!(ball.vel, DVec2::ZERO);
        ball.vel = DVec2::new(3.0, 4.0);
        ball.normalize_speed(10.0);
        assert!((ball.vel - DVec2::new(6.0, 8.0)).length() < 1e-9);
    }

    #[test]
    fn test_speed_rules() {
        let mut state = GameState::new(Tuning::default(), 7);
        assert_eq!(state.minimum_ball_speed(), 5.0);
        assert_eq!(state.paddle_launch_speed(), 5.5);
        state.level = 3;
        assert!((state.minimum_ball_speed() - 5.8).abs() < 1e-9);
        state.autopilot.enabled = true;
        assert_eq!(state.effective_max_speed(), 22.0);
        assert!((state.paddle_launch_speed() - (5.8 + 1.5) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_ball_is_reset() {
        let mut state = GameState::new(Tuning::default(), 7);
        state.ball.pos = DVec2::new(f64::NAN, 10.0);
        state.ball.vel = DVec2::new(3.0, -3.0);
        state.ensure_valid_ball_position();
        assert!(state.ball.pos.is_finite());
        assert_eq!(state.ball.vel, DVec2::ZERO);
    }

    #[test]
    fn test_snapshot_shows_live_state() {
        let mut state = GameState::new(Tuning::default(), 7);
        let total = state.bricks.live_count();
        let gone = state.bricks.live().map(|b| b.id).next().unwrap();
        state.bricks.get_mut(gone).unwrap().shatter();
        state.bonuses.activate(BonusKind::PaddleGrow, state.tuning.ticks_per_second);
        state.cheat_mode = true;
        state.credits = 4;

        let snapshot = state.snapshot();
        // Flagged bricks are hidden before compaction
        assert_eq!(snapshot.bricks.len(), total - 1);
        assert!(snapshot.bricks.iter().all(|b| b.id != gone && !b.is_destroyed()));
        assert_eq!(snapshot.bonuses, vec![(BonusKind::PaddleGrow, 15)]);
        assert!(snapshot.piercing);
        assert!(snapshot.cheat_mode);
        assert!(!snapshot.autopilot);
        assert!(!snapshot.shop_open);
        assert_eq!(snapshot.phase, GamePhase::Ready);
        assert_eq!(snapshot.credits, 4);
        assert_eq!(snapshot.lives, 3);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("PaddleGrow"));
    }

    #[test]
    fn test_score_multiplier() {
        let mut state = GameState::new(Tuning::default(), 7);
        state.add_score(100);
        state.bonuses.activate(BonusKind::ScoreBoost, 60);
        state.add_score(30);
        assert_eq!(state.score, 160);
        assert_eq!(state.scoreboard.best_score, 160);
    }
}
