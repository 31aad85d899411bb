//! Fixed timestep simulation tick
//!
//! One call advances the game by one frame. Input arrives as an intent
//! struct so the core never touches a keyboard or event loop.

use glam::DVec2;
use rand::Rng;

use super::autopilot::{apply_guidance, drive_paddle};
use super::bonus::BonusKind;
use super::level::build_level;
use super::physics::{accelerate_ball, constrain_ball_to_field, handle_brick_collisions, handle_paddle_collision};
use super::state::{GameEvent, GamePhase, GameState};
use crate::highscores::{RunEnd, ScoreBoard};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move left (held)
    pub left: bool,
    /// Move right (held)
    pub right: bool,
    /// Launch / resume / next level / new game, depending on phase
    pub action: bool,
    pub toggle_pause: bool,
    pub toggle_autopilot: bool,
    /// Piercing ball plus a bigger, faster paddle
    pub toggle_cheat: bool,
    pub toggle_shop: bool,
    /// Buy a bonus (only while the shop is open)
    pub purchase: Option<BonusKind>,
    /// Pause menu: restart the current round
    pub restart_round: bool,
    /// Pause menu: abandon the run and start over
    pub quit_to_new_game: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;
    apply_edges(state, input);

    state.ensure_valid_paddle_position();
    state.ensure_valid_ball_position();
    if state.shop_open {
        return;
    }

    if state.autopilot.enabled && state.phase == GamePhase::Ready && state.ball.speed() == 0.0 {
        state.launch_ball();
    }

    update_paddle(state, input);

    match state.phase {
        GamePhase::Ready => state.follow_paddle(),
        GamePhase::Running => step_ball(state),
        GamePhase::Paused | GamePhase::LevelComplete | GamePhase::GameOver => {}
    }

    state.update_bonuses();
}

/// One-shot edges, routed the way the open overlay would route key presses
fn apply_edges(state: &mut GameState, input: &TickInput) {
    if state.shop_open {
        if let Some(kind) = input.purchase {
            state.purchase(kind);
        }
        if input.toggle_shop {
            state.toggle_shop();
        }
        return;
    }

    if state.phase == GamePhase::Paused {
        if input.restart_round {
            state.reset_round();
        } else if input.quit_to_new_game {
            state.start_new_game();
        } else if input.action || input.toggle_pause {
            state.resume();
        }
        return;
    }

    if input.action {
        state.on_action();
    }
    if input.toggle_pause {
        state.open_pause();
    }
    if input.toggle_cheat {
        state.toggle_cheat();
    }
    if input.toggle_autopilot {
        state.toggle_autopilot();
    }
    if input.toggle_shop {
        state.toggle_shop();
    }
}

fn update_paddle(state: &mut GameState, input: &TickInput) {
    if matches!(
        state.phase,
        GamePhase::GameOver | GamePhase::LevelComplete | GamePhase::Paused
    ) {
        return;
    }
    if state.autopilot.enabled {
        drive_paddle(state);
        return;
    }
    let width = state.field.width;
    if input.left && !input.right {
        state.paddle.move_by(-1.0, width);
    } else if input.right && !input.left {
        state.paddle.move_by(1.0, width);
    }
    state.ensure_valid_paddle_position();
}

/// Running phase: integrate, collide, score, check for a cleared level
fn step_ball(state: &mut GameState) {
    if state.autopilot.enabled {
        apply_guidance(state);
    }
    state.ball.advance();
    if constrain_ball_to_field(&mut state.ball, &state.field) {
        state.lose_life();
        return;
    }

    let launch_speed = state.paddle_launch_speed();
    let max_deflection = state.tuning.max_deflection();
    handle_paddle_collision(&mut state.ball, &state.paddle, launch_speed, max_deflection);

    let piercing = state.is_piercing();
    let contacts = handle_brick_collisions(&mut state.ball, &mut state.bricks, piercing);
    for contact in &contacts {
        if contact.destroyed {
            state.award_credit();
            state.add_score(100);
            state.push_event(GameEvent::BrickDestroyed {
                id: contact.id,
                bounds: contact.bounds,
            });
        } else {
            state.add_score(30);
            state.push_event(GameEvent::BrickDamaged {
                id: contact.id,
                remaining_hp: contact.remaining_hp,
            });
        }
    }
    if !contacts.is_empty() {
        let multiplier = state.speed_multiplier();
        let min_speed = state.minimum_ball_speed() * multiplier;
        let increment = state.tuning.speed_increment * multiplier;
        let max_speed = state.effective_max_speed();
        accelerate_ball(&mut state.ball, min_speed, increment, max_speed);
    }
    state.bricks.compact();

    if !state.bricks.has_live() {
        state.add_score(500 + 200 * state.level);
        state.phase = GamePhase::LevelComplete;
        state.push_event(GameEvent::LevelCleared { level: state.level });
        log::info!("Level {} cleared, score {}", state.level, state.score);
    }
}

impl GameState {
    /// Reset the run and build level 1. An unfinished run with progress is
    /// recorded as abandoned first.
    pub fn start_new_game(&mut self) {
        if !self.run_recorded && ScoreBoard::is_worth_recording(self.score, self.level, self.credits) {
            self.record_run(RunEnd::Abandoned);
        }
        self.score = 0;
        self.lives = self.tuning.starting_lives;
        self.level = 1;
        self.credits = 0;
        self.cheat_mode = false;
        self.autopilot.enabled = false;
        self.autopilot.invalidate(&self.field);
        self.shop_open = false;
        self.bonuses.clear();
        self.phase_before_pause = GamePhase::Ready;
        self.refresh_modifiers();
        build_level(&mut self.bricks, &self.field, self.level, &mut self.rng);
        self.reset_round();
        self.run_recorded = false;
        log::info!("New game started (seed {})", self.seed);
    }

    pub fn start_next_level(&mut self) {
        self.level += 1;
        self.update_progress();
        build_level(&mut self.bricks, &self.field, self.level, &mut self.rng);
        self.autopilot.invalidate(&self.field);
        self.reset_round();
    }

    /// Center the paddle and park the ball on it
    pub fn reset_round(&mut self) {
        self.phase_before_pause = GamePhase::Ready;
        self.paddle.set_center(self.field.center_x());
        self.refresh_modifiers();
        self.park_ball();
        self.phase = GamePhase::Ready;
    }

    /// Serve at 40 to 60 degrees from vertical, to a random side
    pub fn launch_ball(&mut self) {
        let speed = (self.minimum_ball_speed().max(self.tuning.base_ball_speed) * self.speed_multiplier())
            .min(self.effective_max_speed());
        let angle = (self.rng.random_range(40..=60) as f64).to_radians();
        let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.ball.vel = DVec2::new(direction * speed * angle.sin(), -speed * angle.cos());
        self.phase = GamePhase::Running;
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.push_event(GameEvent::LifeLost { lives_left: self.lives });
        if self.lives == 0 {
            self.record_run(RunEnd::GameOver);
            self.phase = GamePhase::GameOver;
            self.push_event(GameEvent::GameOver {
                score: self.score,
                level: self.level,
            });
            log::info!("Game over at level {} with score {}", self.level, self.score);
        } else {
            log::debug!("Life lost, {} left", self.lives);
            self.reset_round();
        }
    }

    /// Store the current run once per game
    fn record_run(&mut self, end: RunEnd) {
        if self.run_recorded || !ScoreBoard::is_worth_recording(self.score, self.level, self.credits) {
            return;
        }
        self.update_progress();
        self.scoreboard.record_run(self.score, self.level, self.credits, end);
        self.run_recorded = true;
    }

    /// Primary button: what it does depends on the phase
    pub fn on_action(&mut self) {
        match self.phase {
            GamePhase::Ready => self.launch_ball(),
            GamePhase::Paused => self.resume(),
            GamePhase::LevelComplete => self.start_next_level(),
            GamePhase::GameOver => self.start_new_game(),
            GamePhase::Running => {}
        }
    }

    pub fn open_pause(&mut self) {
        if self.phase != GamePhase::Paused {
            self.phase_before_pause = self.phase;
        }
        self.phase = GamePhase::Paused;
    }

    /// Leave the pause menu, restoring the phase it was opened from
    pub fn resume(&mut self) {
        if self.phase != GamePhase::Paused {
            return;
        }
        self.phase = match self.phase_before_pause {
            GamePhase::Paused => GamePhase::Ready,
            phase => phase,
        };
        self.ensure_valid_paddle_position();
        self.ensure_valid_ball_position();
    }

    pub fn toggle_cheat(&mut self) {
        self.cheat_mode = !self.cheat_mode;
        self.refresh_modifiers();
        if self.phase == GamePhase::Ready {
            self.follow_paddle();
        }
        log::info!("Cheat mode {}", if self.cheat_mode { "on" } else { "off" });
    }

    /// Switch the autopilot. Turning it on doubles the pace and serves a
    /// resting ball; turning it off brings the ball back to normal speed.
    pub fn toggle_autopilot(&mut self) {
        self.autopilot.enabled = !self.autopilot.enabled;
        self.autopilot.invalidate(&self.field);
        self.refresh_modifiers();
        if self.autopilot.enabled {
            self.apply_autopilot_speed_boost();
        } else {
            self.clamp_ball_to_normal_speed();
        }
        if self.autopilot.enabled && self.phase == GamePhase::Ready && self.ball.speed() == 0.0 {
            self.launch_ball();
        }
        log::info!("Autopilot {}", if self.autopilot.enabled { "on" } else { "off" });
    }

    fn apply_autopilot_speed_boost(&mut self) {
        let speed = self.ball.speed();
        if speed <= 0.01 {
            return;
        }
        let multiplier = self.tuning.autopilot_speed_multiplier;
        let target = self
            .effective_max_speed()
            .min(speed * multiplier)
            .max(self.minimum_ball_speed() * multiplier);
        if target > speed + 0.01 {
            self.ball.normalize_speed(target);
        }
    }

    fn clamp_ball_to_normal_speed(&mut self) {
        if self.ball.speed() > self.tuning.max_ball_speed {
            self.ball.normalize_speed(self.tuning.max_ball_speed);
        }
    }

    /// Open or close the shop (not between levels or after game over)
    pub fn toggle_shop(&mut self) {
        if matches!(self.phase, GamePhase::GameOver | GamePhase::LevelComplete) {
            return;
        }
        self.shop_open = !self.shop_open;
    }

    /// Spend credits on a bonus. Returns false when the player can't afford it.
    pub fn purchase(&mut self, kind: BonusKind) -> bool {
        if self.credits < kind.cost() {
            self.push_event(GameEvent::PurchaseRejected {
                kind,
                credits: self.credits,
            });
            return false;
        }
        self.credits -= kind.cost();
        self.bonuses.activate(kind, self.tuning.ticks_per_second);
        self.refresh_modifiers();
        self.push_event(GameEvent::BonusPurchased(kind));
        log::info!("Bought {} ({} credits left)", kind.label(), self.credits);
        true
    }

    /// Count bonuses down (only while a round is in play)
    pub fn update_bonuses(&mut self) {
        if self.bonuses.is_empty() || !matches!(self.phase, GamePhase::Ready | GamePhase::Running) {
            return;
        }
        let expired = self.bonuses.tick();
        if expired.is_empty() {
            return;
        }
        for kind in expired {
            log::debug!("{} expired", kind.label());
            self.push_event(GameEvent::BonusExpired(kind));
        }
        self.refresh_modifiers();
    }
}
