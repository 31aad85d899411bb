//! Game balance and configuration
//!
//! Loaded from JSON, every field falls back to its default when missing.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upper bound on the tick rate (bonus durations are counted in ticks)
pub const MAX_TICKS_PER_SECOND: u32 = 10_000;

/// Errors that can occur when loading tuning data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    /// Failed to read the tuning file from disk
    #[error("failed to read tuning file: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse JSON content
    #[error("failed to parse tuning: {0}")]
    Parse(#[source] serde_json::Error),

    /// Parsed values are out of range
    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    /// Playfield width
    pub field_width: f64,
    /// Playfield height
    pub field_height: f64,
    /// Simulation ticks per second (bonus timers are counted in ticks)
    pub ticks_per_second: u32,

    // === Ball ===
    pub ball_diameter: f64,
    /// Minimum speed on level 1 (units per tick)
    pub base_ball_speed: f64,
    /// Minimum speed gained per level, also the per-hit acceleration
    pub speed_increment: f64,
    pub max_ball_speed: f64,

    // === Paddle ===
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Distance from the field bottom to the paddle top
    pub paddle_floor_offset: f64,
    /// Paddle speed (units per tick at full input)
    pub paddle_speed: f64,
    /// Maximum launch deflection from vertical (degrees)
    pub max_paddle_deflection_deg: f64,

    // === Cheat mode ===
    pub cheat_width_factor: f64,
    pub cheat_speed_factor: f64,

    // === Autopilot ===
    /// Ball and paddle speed multiplier while the autopilot flies
    pub autopilot_speed_multiplier: f64,
    /// Steer the live ball toward the priority brick
    pub autopilot_guidance: bool,
    /// Blend factor used by ball guidance (0-1)
    pub autopilot_guidance_strength: f64,

    // === Run ===
    pub starting_lives: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            ticks_per_second: 60,

            ball_diameter: 18.0,
            base_ball_speed: 5.0,
            speed_increment: 0.4,
            max_ball_speed: 11.0,

            paddle_width: 120.0,
            paddle_height: 16.0,
            paddle_floor_offset: 70.0,
            paddle_speed: 6.5,
            max_paddle_deflection_deg: 70.0,

            cheat_width_factor: 1.7,
            cheat_speed_factor: 1.75,

            autopilot_speed_multiplier: 2.0,
            autopilot_guidance: true,
            autopilot_guidance_strength: 0.65,

            starting_lives: 3,
        }
    }
}

impl Tuning {
    /// Parse tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(TuningError::Parse)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(TuningError::Read)?;
        Self::from_json(&json)
    }

    /// Load tuning from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("{e}; using default tuning");
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("ball_diameter", self.ball_diameter),
            ("base_ball_speed", self.base_ball_speed),
            ("max_ball_speed", self.max_ball_speed),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("autopilot_speed_multiplier", self.autopilot_speed_multiplier),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TuningError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.ticks_per_second == 0 {
            return Err(TuningError::Invalid("ticks_per_second must be positive".into()));
        }
        if self.ball_diameter >= self.field_width {
            return Err(TuningError::Invalid("ball does not fit in the field".into()));
        }
        if self.paddle_width > self.field_width {
            return Err(TuningError::Invalid(format!(
                "paddle_width {} is wider than the field ({})",
                self.paddle_width, self.field_width
            )));
        }
        if self.ticks_per_second > MAX_TICKS_PER_SECOND {
            return Err(TuningError::Invalid(format!(
                "ticks_per_second above {MAX_TICKS_PER_SECOND}: {}",
                self.ticks_per_second
            )));
        }
        if self.paddle_floor_offset <= 0.0 || self.paddle_floor_offset >= self.field_height {
            return Err(TuningError::Invalid(format!(
                "paddle_floor_offset out of range: {}",
                self.paddle_floor_offset
            )));
        }
        Ok(())
    }

    /// Maximum launch deflection in radians
    pub fn max_deflection(&self) -> f64 {
        self.max_paddle_deflection_deg.to_radians()
    }

    /// Paddle top y coordinate
    pub fn paddle_y(&self) -> f64 {
        self.field_height - self.paddle_floor_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.paddle_y(), 530.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_ball_speed": 14.0 }"#).unwrap();
        assert_eq!(tuning.max_ball_speed, 14.0);
        assert_eq!(tuning.field_width, 800.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "field_width": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json(r#"{ "paddle_width": 900.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json(r#"{ "ticks_per_second": 300000000 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json("not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tuning = Tuning::load_or_default("/definitely/not/here.json");
        assert_eq!(tuning, Tuning::default());
    }
}
