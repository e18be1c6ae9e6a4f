use log::{info, warn};

use crate::game::judgment::Tolerances;

/// How a [`BeatClock`] derives its phase. Chosen once when the clock is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Phase comes from the latency-adjusted playback position of the music.
    Absolute {
        /// Last position seen, used to extrapolate when a sample is missing.
        last_position: f64,
    },
    /// No playback clock; phase is the running sum of frame deltas.
    Accumulated { acc: f64 },
}

impl ClockMode {
    pub const fn name(&self) -> &'static str {
        match self {
            ClockMode::Absolute { .. } => "absolute",
            ClockMode::Accumulated { .. } => "accumulated",
        }
    }
}

/// Beat grid for one track.
///
/// A clock is never retargeted: a new track (or a fallback BPM) gets a new
/// instance, so beat counts from a previous grid can't leak into the next one.
///
/// Known limitation: in absolute mode a backward jump of the playback position
/// (device glitch, seek) looks exactly like a wraparound and is reported as a
/// crossing.
#[derive(Debug, Clone)]
pub struct BeatClock {
    interval: f64,
    phase_offset: f64,
    beat_count: u64,
    mode: ClockMode,
}

impl BeatClock {
    /// Clock following an external playback position.
    pub fn absolute(bpm: f64) -> Self {
        Self::with_mode(bpm, ClockMode::Absolute { last_position: 0.0 })
    }

    /// Self-timed clock for when no playback position is available.
    pub fn accumulated(bpm: f64) -> Self {
        Self::with_mode(bpm, ClockMode::Accumulated { acc: 0.0 })
    }

    fn with_mode(bpm: f64, mode: ClockMode) -> Self {
        let interval = interval_for_bpm(bpm);
        info!(
            "BeatClock: {:.2} BPM, interval {:.4}s, {} mode",
            bpm,
            interval,
            mode.name()
        );
        Self {
            interval,
            phase_offset: 0.0,
            beat_count: 0,
            mode,
        }
    }

    /// Advances the clock by one frame. Returns true if at least one beat
    /// boundary was crossed.
    ///
    /// In absolute mode `absolute_time` is the latency-adjusted playback
    /// position; a missing sample is extrapolated from the last one by `dt`.
    /// Accumulated mode ignores `absolute_time` and may cross several
    /// boundaries in one call after a stall.
    pub fn update(&mut self, dt: f64, absolute_time: Option<f64>) -> bool {
        let interval = self.interval;
        match &mut self.mode {
            ClockMode::Absolute { last_position } => {
                let t = absolute_time.unwrap_or(*last_position + dt);
                *last_position = t;

                let phase = t.rem_euclid(interval);
                let prev_phase = (t - dt).rem_euclid(interval);
                self.phase_offset = phase;

                if prev_phase > phase {
                    self.beat_count += 1;
                    true
                } else {
                    false
                }
            }
            ClockMode::Accumulated { acc } => {
                *acc += dt;
                let mut crossed = false;
                while *acc >= interval {
                    *acc -= interval;
                    self.beat_count += 1;
                    crossed = true;
                }
                self.phase_offset = *acc;
                crossed
            }
        }
    }

    /// Seconds per beat.
    #[inline(always)]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    #[inline(always)]
    pub fn bpm(&self) -> f64 {
        60.0 / self.interval
    }

    /// Seconds since the most recent beat boundary.
    #[inline(always)]
    pub fn phase_offset(&self) -> f64 {
        self.phase_offset
    }

    #[inline(always)]
    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }

    #[inline(always)]
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.mode, ClockMode::Absolute { .. })
    }

    /// Progress through the current beat in `[0, 1]`, for the beat bar.
    pub fn normalised_phase(&self) -> f64 {
        (self.phase_offset / self.interval).min(1.0)
    }

    /// Distance in seconds to the nearest beat boundary.
    pub fn distance_to_beat(&self) -> f64 {
        self.phase_offset.min(self.interval - self.phase_offset).abs()
    }

    pub fn is_on_beat(&self, tolerance: f64) -> bool {
        self.distance_to_beat() <= tolerance
    }

    /// Warns when the windows leave no room for Early/Late at this tempo.
    pub fn check_tolerances(&self, tolerances: &Tolerances) {
        if tolerances.is_degenerate(self.interval) {
            warn!(
                "Good window {:.3}s covers half a beat ({:.3}s) at {:.1} BPM; Early/Late are unreachable.",
                tolerances.good,
                self.interval / 2.0,
                self.bpm()
            );
        }
    }
}

/// `60 / bpm`. Non-positive or non-finite BPM is treated as the default tempo.
pub fn interval_for_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() && bpm > 0.0 {
        60.0 / bpm
    } else {
        warn!("Invalid BPM {}, using {}", bpm, crate::config::DEFAULT_BPM);
        60.0 / crate::config::DEFAULT_BPM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_absolute(bpm: f64, dts: &[f64]) -> (BeatClock, u64) {
        let mut clock = BeatClock::absolute(bpm);
        let mut t = 0.0;
        let mut crossings = 0;
        for &dt in dts {
            t += dt;
            if clock.update(dt, Some(t)) {
                crossings += 1;
            }
        }
        (clock, crossings)
    }

    #[test]
    fn absolute_crossings_match_elapsed_beats() {
        for &bpm in &[60.0, 90.0, 120.0, 123.0, 174.0, 200.0] {
            // Uneven frame pacing: 60 Hz with periodic hitches.
            let dts: Vec<f64> = (0..5000)
                .map(|i| match i % 97 {
                    0 => 0.045,
                    13 => 0.008,
                    _ => 1.0 / 60.0,
                })
                .collect();
            let total: f64 = dts.iter().sum();
            let (clock, crossings) = run_absolute(bpm, &dts);
            let expected = (total / (60.0 / bpm)).floor() as i64;
            let diff = (crossings as i64 - expected).abs();
            assert!(
                diff <= 1,
                "bpm={bpm}: crossings={crossings} expected={expected}"
            );
            assert_eq!(clock.beat_count(), crossings);
        }
    }

    #[test]
    fn absolute_phase_is_position_mod_interval() {
        let mut clock = BeatClock::absolute(120.0);
        clock.update(0.016, Some(1.30));
        assert!((clock.phase_offset() - 0.30).abs() < 1e-9);
        assert!((clock.normalised_phase() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn absolute_missing_sample_extrapolates() {
        let mut clock = BeatClock::absolute(120.0);
        assert!(!clock.update(0.1, Some(0.45)));
        assert!(clock.update(0.1, None), "0.45 -> 0.55 crosses the 0.5 boundary");
        assert!((clock.phase_offset() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn absolute_backward_jump_reports_a_crossing() {
        let mut clock = BeatClock::absolute(120.0);
        clock.update(0.016, Some(2.40));
        // Position jumps back while dt stays small: looks like a wrap.
        assert!(clock.update(0.016, Some(2.00)));
        assert_eq!(clock.beat_count(), 1);
    }

    #[test]
    fn accumulated_catches_up_after_stall() {
        let mut single = BeatClock::accumulated(120.0);
        assert!(single.update(1.5, None));
        assert_eq!(single.beat_count(), 3);

        let mut stepped = BeatClock::accumulated(120.0);
        for _ in 0..3 {
            assert!(stepped.update(0.5, None));
        }
        assert_eq!(stepped.beat_count(), 3);
        assert!((single.phase_offset() - stepped.phase_offset()).abs() < 1e-12);
    }

    #[test]
    fn accumulated_ignores_absolute_time() {
        let mut clock = BeatClock::accumulated(120.0);
        assert!(!clock.update(0.2, Some(10.0)));
        assert!((clock.phase_offset() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn phase_stays_within_interval() {
        let mut clock = BeatClock::accumulated(123.0);
        for i in 0..10_000 {
            let dt = if i % 50 == 0 { 0.7 } else { 1.0 / 144.0 };
            clock.update(dt, None);
            assert!(clock.phase_offset() >= 0.0);
            assert!(clock.phase_offset() < clock.interval());
            assert!(clock.normalised_phase() <= 1.0);
        }
    }

    #[test]
    fn fresh_clock_starts_at_zero() {
        let mut old = BeatClock::accumulated(120.0);
        old.update(3.3, None);
        let fresh = BeatClock::absolute(125.0);
        assert_eq!(fresh.beat_count(), 0);
        assert_eq!(fresh.phase_offset(), 0.0);
        assert!((fresh.interval() - 0.48).abs() < 1e-12);
    }

    #[test]
    fn invalid_bpm_falls_back_to_default() {
        assert_eq!(interval_for_bpm(0.0), 0.5);
        assert_eq!(interval_for_bpm(f64::NAN), 0.5);
        assert_eq!(interval_for_bpm(-30.0), 0.5);
    }

    #[test]
    fn on_beat_checks_both_sides() {
        let mut clock = BeatClock::absolute(120.0);
        clock.update(0.016, Some(0.48));
        assert!(clock.is_on_beat(0.05));
        clock.update(0.016, Some(0.75));
        assert!(!clock.is_on_beat(0.1));
    }
}
