use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::game::song::Track;

/// Source of the latency-adjusted playback position, in seconds since the
/// current track started. `None` while nothing is playing.
pub trait PlaybackClock {
    fn position(&self) -> Option<f64>;

    fn is_playing(&self) -> bool {
        self.position().is_some()
    }
}

/// Applies the output-latency calibration. Positions before the music starts
/// are clamped to zero.
#[inline(always)]
fn adjusted(elapsed: f64, latency: f64) -> f64 {
    (elapsed - latency).max(0.0)
}

/// Playback position measured against the system clock from the moment the
/// music was started.
#[derive(Debug, Clone)]
pub struct WallClock {
    latency: f64,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl WallClock {
    pub fn new(latency: f64) -> Self {
        Self {
            latency,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.paused_at = None;
    }

    pub fn pause(&mut self) {
        if self.started_at.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += at.elapsed();
        }
    }
}

impl PlaybackClock for WallClock {
    fn position(&self) -> Option<f64> {
        let started = self.started_at?;
        let now = self.paused_at.unwrap_or_else(Instant::now);
        let elapsed = now
            .saturating_duration_since(started)
            .saturating_sub(self.paused_total);
        Some(adjusted(elapsed.as_secs_f64(), self.latency))
    }
}

/// Playback position advanced explicitly by the caller. Used for headless
/// simulation, where frames are not paced by real time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    latency: f64,
    elapsed: Option<f64>,
    paused: bool,
}

impl ManualClock {
    pub fn new(latency: f64) -> Self {
        Self {
            latency,
            elapsed: None,
            paused: false,
        }
    }

    pub fn start(&mut self) {
        self.elapsed = Some(0.0);
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.elapsed = None;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advances playback by `dt` seconds. Ignored while paused or stopped.
    pub fn advance(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        if let Some(e) = self.elapsed.as_mut() {
            *e += dt;
        }
    }
}

impl PlaybackClock for ManualClock {
    fn position(&self) -> Option<f64> {
        self.elapsed.map(|e| adjusted(e, self.latency))
    }
}

/// Resolves a track's music file. A missing file means the run has to go on
/// without a playback clock.
pub fn locate_music(music_dir: &Path, track: &Track) -> Result<PathBuf, String> {
    let path = track.path_in(music_dir);
    if path.is_file() {
        info!("Found music for '{}': {:?}", track.display_name, path);
        Ok(path)
    } else {
        warn!("Failed to load music: {:?}", path);
        Err(format!("music file {:?} not found", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_applies_latency() {
        let mut clock = ManualClock::new(-0.35);
        assert_eq!(clock.position(), None);
        clock.start();
        assert_eq!(clock.position(), Some(0.35));
        clock.advance(1.0);
        assert!((clock.position().unwrap() - 1.35).abs() < 1e-12);
    }

    #[test]
    fn positive_latency_clamps_to_zero() {
        let mut clock = ManualClock::new(0.2);
        clock.start();
        clock.advance(0.1);
        assert_eq!(clock.position(), Some(0.0));
        clock.advance(0.2);
        assert!((clock.position().unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn manual_clock_pause_freezes_position() {
        let mut clock = ManualClock::new(0.0);
        clock.start();
        clock.advance(0.5);
        clock.pause();
        clock.advance(3.0);
        assert_eq!(clock.position(), Some(0.5));
        clock.resume();
        clock.advance(0.5);
        assert_eq!(clock.position(), Some(1.0));
        clock.stop();
        assert!(!clock.is_playing());
    }

    #[test]
    fn wall_clock_reports_only_while_playing() {
        let mut clock = WallClock::new(-0.35);
        assert!(!clock.is_playing());
        clock.start();
        let pos = clock.position().expect("started clock has a position");
        assert!(pos >= 0.35);
        clock.pause();
        let frozen = clock.position().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.position().unwrap(), frozen);
        clock.resume();
        clock.stop();
        assert_eq!(clock.position(), None);
    }

    #[test]
    fn missing_music_is_an_error() {
        let track = Track::new("definitely_missing.ogg", "Nobody", 120.0);
        assert!(locate_music(Path::new("no_such_dir"), &track).is_err());
    }
}
