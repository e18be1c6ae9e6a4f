use log::debug;

use crate::game::judgment::{self, Judgment, Rank};

/// Counters for a single run. Reset on restart; the session keeps the best score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub score: f64,
    pub combo: u32,
    pub max_combo: u32,
    pub accurate_jumps: u32,
    pub total_jumps: u32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one judged jump: score, combo, high-water mark and accuracy together.
    pub fn record_jump(&mut self, j: &Judgment) {
        self.total_jumps = self.total_jumps.saturating_add(1);
        if j.counts_as_accurate {
            self.accurate_jumps = self.accurate_jumps.saturating_add(1);
        }
        self.combo = if j.breaks_combo { 0 } else { j.combo };
        self.max_combo = self.max_combo.max(self.combo);
        self.score += j.score_delta as f64;

        debug!(
            "{} offset {:.3}s +{} combo {} score {:.1}",
            j.grade, j.phase_offset, j.score_delta, self.combo, self.score
        );
    }

    /// Passive score for staying alive `dt` seconds.
    pub fn add_survival(&mut self, dt: f64, rate: f64) {
        self.score += dt * rate;
    }

    /// Collision ends the combo; the rest of the run is kept for the summary.
    pub fn on_collision(&mut self) {
        self.combo = 0;
    }

    pub fn accuracy_percent(&self) -> u32 {
        judgment::accuracy_percent(self.accurate_jumps, self.total_jumps)
    }

    pub fn rank(&self) -> Rank {
        judgment::rank_for(self.accuracy_percent())
    }

    /// Score as shown on the HUD.
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0) as u64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
