//! Run records and personal bests
//!
//! In-memory only, tracks the top 5 finished runs.

use serde::{Deserialize, Serialize};

use crate::consts::SCORE_HISTORY_LIMIT;

/// How a recorded run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEnd {
    GameOver,
    /// A new game was started before the run finished
    Abandoned,
}

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u64,
    /// Level reached (1-based)
    pub level: u32,
    pub end: RunEnd,
}

/// Run history plus personal bests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBoard {
    /// Sorted by score, descending
    pub records: Vec<RunRecord>,
    pub best_score: u64,
    pub best_level: u32,
    pub best_credits: u32,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            best_score: 0,
            best_level: 1,
            best_credits: 0,
        }
    }

    /// Fold live progress into the personal bests
    pub fn update_progress(&mut self, score: u64, level: u32, credits: u32) {
        self.best_score = self.best_score.max(score);
        self.best_level = self.best_level.max(level);
        self.best_credits = self.best_credits.max(credits);
    }

    /// Whether a run has anything worth recording
    pub fn is_worth_recording(score: u64, level: u32, credits: u32) -> bool {
        score > 0 || level > 1 || credits > 0
    }

    /// Record a finished run, returns its rank (1-indexed) if it stayed in the history
    pub fn record_run(&mut self, score: u64, level: u32, credits: u32, end: RunEnd) -> Option<usize> {
        if !Self::is_worth_recording(score, level, credits) {
            return None;
        }
        let level = level.max(1);
        self.update_progress(score, level, credits);

        // Ties keep the older run ahead
        let pos = self
            .records
            .iter()
            .position(|r| score > r.score)
            .unwrap_or(self.records.len());
        self.records.insert(pos, RunRecord { score, level, end });
        self.records.truncate(SCORE_HISTORY_LIMIT);

        log::info!("Run recorded: score={score} level={level} end={end:?}");
        (pos < self.records.len()).then_some(pos + 1)
    }

    /// Get the top recorded score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.records.first().map(|r| r.score)
    }
}
