//! Timed bonuses bought with credits

use serde::{Deserialize, Serialize};

/// Paddle width multiplier while PaddleGrow runs
pub const PADDLE_GROW_WIDTH_FACTOR: f64 = 1.35;
/// Paddle speed multiplier while PaddleGrow runs
pub const PADDLE_GROW_SPEED_FACTOR: f64 = 1.2;

/// Bonus types sold in the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKind {
    /// Wider, faster paddle
    PaddleGrow,
    /// Ball passes through bricks
    PierceBall,
    /// Double score
    ScoreBoost,
}

impl BonusKind {
    /// Price in credits
    pub fn cost(self) -> u32 {
        match self {
            BonusKind::PaddleGrow => 5,
            BonusKind::PierceBall => 6,
            BonusKind::ScoreBoost => 4,
        }
    }

    pub fn duration_seconds(self) -> u32 {
        match self {
            BonusKind::PaddleGrow => 15,
            BonusKind::PierceBall => 10,
            BonusKind::ScoreBoost => 20,
        }
    }

    pub fn duration_ticks(self, ticks_per_second: u32) -> u32 {
        self.duration_seconds().saturating_mul(ticks_per_second)
    }

    pub fn label(self) -> &'static str {
        match self {
            BonusKind::PaddleGrow => "Paddle XL",
            BonusKind::PierceBall => "Piercing ball",
            BonusKind::ScoreBoost => "Score x2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBonus {
    pub kind: BonusKind,
    pub remaining_ticks: u32,
}

impl ActiveBonus {
    /// Whole seconds left, rounded up
    pub fn remaining_seconds(&self, ticks_per_second: u32) -> u32 {
        self.remaining_ticks.div_ceil(ticks_per_second.max(1))
    }
}

/// Currently running bonuses, at most one per kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveBonuses {
    bonuses: Vec<ActiveBonus>,
}

impl ActiveBonuses {
    pub fn is_active(&self, kind: BonusKind) -> bool {
        self.bonuses.iter().any(|b| b.kind == kind)
    }

    /// Start a bonus, or refresh its duration if already running
    pub fn activate(&mut self, kind: BonusKind, ticks_per_second: u32) {
        let duration = kind.duration_ticks(ticks_per_second);
        match self.bonuses.iter_mut().find(|b| b.kind == kind) {
            Some(bonus) => bonus.remaining_ticks = duration,
            None => self.bonuses.push(ActiveBonus {
                kind,
                remaining_ticks: duration,
            }),
        }
    }

    /// Count every bonus down by one tick, returns the kinds that ran out
    pub fn tick(&mut self) -> Vec<BonusKind> {
        let mut expired = Vec::new();
        for bonus in &mut self.bonuses {
            bonus.remaining_ticks = bonus.remaining_ticks.saturating_sub(1);
            if bonus.remaining_ticks == 0 {
                expired.push(bonus.kind);
            }
        }
        self.bonuses.retain(|b| b.remaining_ticks > 0);
        expired
    }

    /// Seconds left for a bonus (0 when inactive)
    pub fn remaining_seconds(&self, kind: BonusKind, ticks_per_second: u32) -> u32 {
        self.bonuses
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.remaining_seconds(ticks_per_second))
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveBonus> {
        self.bonuses.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    pub fn clear(&mut self) {
        self.bonuses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_and_refresh() {
        let mut bonuses = ActiveBonuses::default();
        bonuses.activate(BonusKind::ScoreBoost, 60);
        assert!(bonuses.is_active(BonusKind::ScoreBoost));
        assert_eq!(bonuses.remaining_seconds(BonusKind::ScoreBoost, 60), 20);

        for _ in 0..600 {
            bonuses.tick();
        }
        assert_eq!(bonuses.remaining_seconds(BonusKind::ScoreBoost, 60), 10);

        // Buying again refreshes instead of stacking
        bonuses.activate(BonusKind::ScoreBoost, 60);
        assert_eq!(bonuses.iter().count(), 1);
        assert_eq!(bonuses.remaining_seconds(BonusKind::ScoreBoost, 60), 20);
    }

    #[test]
    fn test_duration_saturates_at_extreme_tick_rates() {
        assert_eq!(BonusKind::PaddleGrow.duration_ticks(60), 900);
        assert_eq!(BonusKind::ScoreBoost.duration_ticks(300_000_000), u32::MAX);
    }

    #[test]
    fn test_expiry() {
        let mut bonuses = ActiveBonuses::default();
        bonuses.activate(BonusKind::PierceBall, 1);
        for _ in 0..9 {
            assert!(bonuses.tick().is_empty());
        }
        assert_eq!(bonuses.tick(), vec![BonusKind::PierceBall]);
        assert!(bonuses.is_empty());
        assert_eq!(bonuses.remaining_seconds(BonusKind::PierceBall, 1), 0);
    }

    #[test]
    fn test_remaining_seconds_rounds_up() {
        let bonus = ActiveBonus {
            kind: BonusKind::PaddleGrow,
            remaining_ticks: 61,
        };
        assert_eq!(bonus.remaining_seconds(60), 2);
    }
}
