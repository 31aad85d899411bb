//! Level generation
//!
//! Layouts get wider, taller, denser and tougher with each level. Every
//! random draw comes from the game's seeded RNG, so a run replays exactly.

use rand::Rng;

use super::rect::Rect;
use super::state::{Bricks, Field};
use crate::clamp_or_mid;

/// Tier colors (0xRRGGBB), indexed by row and level
pub const BRICK_COLORS: [u32; 9] = [
    0xF94144, 0xF3722C, 0xF8961E, 0xF9844A, 0xF9C74F, 0x90BE6D, 0x43AA8B, 0x577590, 0x9D4EDD,
];

pub const BRICK_HEIGHT: f64 = 24.0;
const H_GAP: f64 = 6.0;
const V_GAP: f64 = 10.0;
const TOP_OFFSET: f64 = 70.0;
const SIDE_PADDING: f64 = 36.0;

/// Generation parameters for one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    pub columns: usize,
    pub rows: usize,
    /// Base chance of a slot being filled
    pub fill_rate: f64,
    /// Extra fill chance per row index
    pub row_fill_growth: f64,
    /// Extra fill chance next to an existing brick
    pub cluster_bias: f64,
    pub tough_chance: f64,
    pub max_hits: u32,
    /// Chance to skip a whole row (never the first)
    pub gap_chance: f64,
    pub min_density: f64,
}

impl LevelConfig {
    pub fn for_level(level: u32) -> Self {
        let stage = level.saturating_sub(1);
        let s = stage as f64;
        Self {
            columns: (8 + stage as usize / 2).min(12),
            rows: (4 + (s / 1.5).floor() as usize).min(9),
            fill_rate: clamp_or_mid(0.55 + s * 0.045, 0.55, 0.92),
            row_fill_growth: clamp_or_mid(0.02 + s * 0.004, 0.02, 0.06),
            cluster_bias: clamp_or_mid(0.18 + s * 0.015, 0.18, 0.45),
            tough_chance: clamp_or_mid(0.18 + s * 0.05, 0.18, 0.65),
            max_hits: (1 + stage / 2).clamp(1, 4),
            gap_chance: clamp_or_mid(0.22 - s * 0.03, 0.04, 0.22),
            min_density: clamp_or_mid(0.18 + s * 0.02, 0.18, 0.50),
        }
    }

    /// Fewest bricks a row may hold (always at least one)
    pub fn min_bricks_for_row(&self, row: usize) -> usize {
        let density = clamp_or_mid(self.min_density + row as f64 * 0.04, self.min_density, 0.75);
        ((self.columns as f64 * density).round() as usize).max(1)
    }
}

/// Clear `bricks` and lay out `level`. Returns true when the fixed fallback
/// grid had to be used.
pub fn build_level(bricks: &mut Bricks, field: &Field, level: u32, rng: &mut impl Rng) -> bool {
    bricks.clear();
    let config = LevelConfig::for_level(level);

    let available = field.width - SIDE_PADDING * 2.0 - H_GAP * (config.columns as f64 - 1.0);
    if available <= 0.0 {
        build_fallback_level(bricks, field, level);
        log::warn!("Field too narrow for level {}, using fallback grid", level);
        return true;
    }
    let brick_width = available / config.columns as f64;

    for row in 0..config.rows {
        if row > 0 && rng.random::<f64>() < config.gap_chance {
            continue;
        }
        let pattern = row_pattern(&config, row, rng);
        let y = TOP_OFFSET + row as f64 * (BRICK_HEIGHT + V_GAP);
        for (col, _) in pattern.iter().enumerate().filter(|(_, filled)| **filled) {
            let x = SIDE_PADDING + col as f64 * (brick_width + H_GAP);
            let hits = brick_hits(&config, row, rng);
            let color = brick_color(level, hits, row, rng);
            bricks.push(Rect::new(x, y, brick_width, BRICK_HEIGHT), hits, color);
        }
    }

    if bricks.is_empty() {
        build_fallback_level(bricks, field, level);
        log::warn!("Level {} generated no bricks, using fallback grid", level);
        return true;
    }
    log::info!(
        "Level {} built: {} bricks ({}x{} grid)",
        level,
        bricks.len(),
        config.columns,
        config.rows
    );
    false
}

/// Clustered random fill for one row, topped up to the row minimum
fn row_pattern(config: &LevelConfig, row: usize, rng: &mut impl Rng) -> Vec<bool> {
    let columns = config.columns;
    let mut pattern = vec![false; columns];
    let row_fill = clamp_or_mid(config.fill_rate + config.row_fill_growth * row as f64, 0.20, 0.95);
    let min_bricks = config.min_bricks_for_row(row);
    let mut placed = 0;
    let mut previous = false;

    for col in 0..columns {
        let mut chance = row_fill;
        if previous {
            chance += config.cluster_bias;
        } else if col > 0 && rng.random::<f64>() < 0.35 {
            chance += config.cluster_bias * 0.5;
        }
        chance += (rng.random::<f64>() - 0.5) * 0.08;
        let chance = clamp_or_mid(chance, 0.05, 0.98);

        let mut place = rng.random::<f64>() < chance;
        if !place && placed < min_bricks {
            let remaining = (columns - col) as f64;
            let needed = (min_bricks - placed) as f64;
            if remaining <= needed || rng.random::<f64>() < needed / remaining.max(1.0) {
                place = true;
            }
        }

        pattern[col] = place;
        if place {
            placed += 1;
        }
        previous = place;
    }

    if placed == 0 {
        pattern[rng.random_range(0..columns)] = true;
    } else if placed < min_bricks {
        let mut empties: Vec<usize> = (0..columns).filter(|&c| !pattern[c]).collect();
        while placed < min_bricks && !empties.is_empty() {
            let col = empties.swap_remove(rng.random_range(0..empties.len()));
            pattern[col] = true;
            placed += 1;
        }
    }
    pattern
}

/// Lower rows are more likely to be tough
fn brick_hits(config: &LevelConfig, row: usize, rng: &mut impl Rng) -> u32 {
    if config.max_hits <= 1 {
        return 1;
    }
    let progress = if config.rows <= 1 {
        1.0
    } else {
        row as f64 / (config.rows - 1) as f64
    };
    let chance = config.tough_chance * (0.6 + progress * 0.6);
    let mut hits = 1;
    if rng.random::<f64>() < chance {
        hits += 1;
        while hits < config.max_hits && rng.random_bool(0.45) {
            hits += 1;
        }
    }
    hits.min(config.max_hits)
}

fn brick_color(level: u32, hits: u32, row: usize, rng: &mut impl Rng) -> u32 {
    let base = BRICK_COLORS[(row + level as usize) % BRICK_COLORS.len()];
    let jittered = adjust_brightness(base, 0.9 + rng.random::<f64>() * 0.2);
    match hits {
        0 | 1 => jittered,
        2 => adjust_brightness(jittered, 0.9),
        3 => adjust_brightness(jittered, 0.82),
        _ => adjust_brightness(jittered, 0.75),
    }
}

/// Scale each channel of a 0xRRGGBB color, saturating at 255
pub fn adjust_brightness(color: u32, factor: f64) -> u32 {
    let scale = |shift: u32| -> u32 {
        let channel = ((color >> shift) & 0xFF) as f64;
        ((channel * factor).round().clamp(0.0, 255.0) as u32) << shift
    };
    scale(16) | scale(8) | scale(0)
}

/// Deterministic 10-column grid, or one centered brick if even that won't fit
fn build_fallback_level(bricks: &mut Bricks, field: &Field, level: u32) {
    bricks.clear();
    let columns = 10;
    let rows = (3 + level as usize).min(6);
    let gap = 8.0;
    let top = 80.0;
    let side = 30.0;

    let available = field.width - side * 2.0 - gap * (columns as f64 - 1.0);
    if available > 0.0 {
        let brick_width = available / columns as f64;
        for row in 0..rows {
            for col in 0..columns {
                let x = side + col as f64 * (brick_width + gap);
                let y = top + row as f64 * (BRICK_HEIGHT + gap);
                let hits = (1 + level / 3).min(1 + row as u32 / 2);
                let color = BRICK_COLORS[(row + col) % BRICK_COLORS.len()];
                bricks.push(Rect::new(x, y, brick_width, BRICK_HEIGHT), hits, color);
            }
        }
    }

    if bricks.is_empty() {
        let width = 70.0;
        bricks.push(
            Rect::new((field.width - width) / 2.0, top, width, BRICK_HEIGHT),
            1,
            BRICK_COLORS[0],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::BrickId;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_config_progression() {
        let first = LevelConfig::for_level(1);
        assert_eq!(first.columns, 8);
        assert_eq!(first.rows, 4);
        assert_eq!(first.max_hits, 1);
        assert!((first.fill_rate - 0.55).abs() < 1e-12);
        assert!((first.gap_chance - 0.22).abs() < 1e-12);

        let late = LevelConfig::for_level(9);
        assert_eq!(late.columns, 12);
        assert_eq!(late.rows, 9);
        assert_eq!(late.max_hits, 4);
        assert!((late.fill_rate - 0.91).abs() < 1e-9);
        assert!((late.gap_chance - 0.04).abs() < 1e-12);

        // Level 0 is treated like level 1
        assert_eq!(LevelConfig::for_level(0), first);
    }

    #[test]
    fn test_build_level_layout() {
        let field = Field::new(800.0, 600.0);
        let mut bricks = Bricks::new();
        let mut rng = Pcg32::seed_from_u64(42);
        assert!(!build_level(&mut bricks, &field, 1, &mut rng));
        assert!(!bricks.is_empty());

        for (i, brick) in bricks.iter().enumerate() {
            assert_eq!(brick.id, BrickId(i as u32));
            assert_eq!(brick.hp, 1);
            assert!(brick.rect.x >= 36.0 - 1e-9);
            assert!(brick.rect.right() <= 800.0 - 36.0 + 1e-9);
            assert!(brick.rect.y >= 70.0);
        }
        // First row is never skipped
        assert!(bricks.iter().any(|b| b.rect.y == 70.0));
    }

    #[test]
    fn test_rows_meet_minimum_density() {
        let field = Field::new(800.0, 600.0);
        let config = LevelConfig::for_level(5);
        let mut bricks = Bricks::new();
        let mut rng = Pcg32::seed_from_u64(7);
        build_level(&mut bricks, &field, 5, &mut rng);

        for row in 0..config.rows {
            let y = 70.0 + row as f64 * 34.0;
            let count = bricks.iter().filter(|b| (b.rect.y - y).abs() < 1e-9).count();
            assert!(count == 0 || count >= config.min_bricks_for_row(row));
        }
        assert!(bricks.iter().all(|b| b.hp >= 1 && b.hp <= config.max_hits));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let field = Field::new(800.0, 600.0);
        let mut a = Bricks::new();
        let mut b = Bricks::new();
        build_level(&mut a, &field, 4, &mut Pcg32::seed_from_u64(9));
        build_level(&mut b, &field, 4, &mut Pcg32::seed_from_u64(9));
        let a: Vec<_> = a.iter().copied().collect();
        let b: Vec<_> = b.iter().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_narrow_field_falls_back() {
        let field = Field::new(50.0, 600.0);
        let mut bricks = Bricks::new();
        assert!(build_level(&mut bricks, &field, 1, &mut Pcg32::seed_from_u64(1)));
        assert_eq!(bricks.len(), 1);
        let only = bricks.get(BrickId(0)).unwrap();
        assert_eq!(only.rect.center_x(), 25.0);
    }

    #[test]
    fn test_fallback_grid() {
        let field = Field::new(800.0, 600.0);
        let mut bricks = Bricks::new();
        build_fallback_level(&mut bricks, &field, 2);
        assert_eq!(bricks.len(), 50);
        // Level 2: hits capped at 1 + 2/3 = 1
        assert!(bricks.iter().all(|b| b.hp == 1));
    }

    #[test]
    fn test_adjust_brightness() {
        assert_eq!(adjust_brightness(0x102030, 0.5), 0x081018);
        assert_eq!(adjust_brightness(0xF0F0F0, 2.0), 0xFFFFFF);
        assert_eq!(adjust_brightness(0x123456, 1.0), 0x123456);
    }
}
