use chrono::Local;
use log::info;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::game::gameplay::Session;
use crate::game::judgment::Rank;

/// Key used for runs played without music.
pub const NO_TRACK_KEY: &str = "<no track>";

// --- End-of-run summary ---

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub track: Option<String>,
    pub bpm: f64,
    pub clock_mode: &'static str,
    pub score: u64,
    pub best_score: u64,
    pub max_combo: u32,
    pub accuracy: u32,
    pub rank: Rank,
    pub accurate_jumps: u32,
    pub total_jumps: u32,
    pub beats: u64,
    pub seconds: f64,
    pub game_over: bool,
    pub finished_at: String,
}

impl RunSummary {
    pub fn from_session(session: &Session) -> Self {
        let run = session.run();
        let clock = session.clock();
        let best = session.best_score().max(run.score);
        Self {
            track: session.track().map(|t| t.label()),
            bpm: clock.bpm(),
            clock_mode: clock.mode().name(),
            score: run.display_score(),
            best_score: best.max(0.0) as u64,
            max_combo: run.max_combo,
            accuracy: run.accuracy_percent(),
            rank: run.rank(),
            accurate_jumps: run.accurate_jumps,
            total_jumps: run.total_jumps,
            beats: clock.beat_count(),
            seconds: session.elapsed(),
            game_over: session.is_over(),
            finished_at: Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
        }
    }
}

/// Every run of a headless simulation, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub seed: Option<u64>,
    pub runs: Vec<RunSummary>,
    pub best_score: u64,
    /// Sorted so seeded reports serialize identically.
    pub best_by_track: BTreeMap<String, u64>,
}

impl SimulationReport {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn push(&mut self, summary: RunSummary) {
        self.best_score = self.best_score.max(summary.best_score);
        let key = summary.track.clone().unwrap_or_else(|| NO_TRACK_KEY.to_string());
        record_track_best(&key, summary.score);
        self.best_by_track.insert(key.clone(), get_track_best(&key).unwrap_or(summary.score));
        self.runs.push(summary);
    }
}

// --- Per-track best scores ---

static TRACK_BESTS: Lazy<Mutex<HashMap<String, u64>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub fn get_track_best(track: &str) -> Option<u64> {
    TRACK_BESTS.lock().unwrap().get(track).copied()
}

/// Keeps the higher of the stored and the new score. Returns true on a new best.
pub fn record_track_best(track: &str, score: u64) -> bool {
    let mut bests = TRACK_BESTS.lock().unwrap();
    match bests.get(track) {
        Some(&prev) if prev >= score => false,
        _ => {
            info!("New best for '{}': {}", track, score);
            bests.insert(track.to_string(), score);
            true
        }
    }
}
