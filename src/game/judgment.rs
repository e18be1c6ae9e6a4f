use serde::Serialize;
use std::fmt;

use crate::config;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum JudgeGrade {
    Perfect,
    Good,
    Early,
    Late,
}

impl JudgeGrade {
    /// Base reward before the combo bonus. Misses earn nothing.
    pub const fn base_points(self) -> u32 {
        match self {
            JudgeGrade::Perfect => 15,
            JudgeGrade::Good => 8,
            JudgeGrade::Early | JudgeGrade::Late => 0,
        }
    }

    #[inline(always)]
    pub const fn is_hit(self) -> bool {
        matches!(self, JudgeGrade::Perfect | JudgeGrade::Good)
    }

    pub const fn label(self) -> &'static str {
        match self {
            JudgeGrade::Perfect => "Perfect!",
            JudgeGrade::Good => "Good!",
            JudgeGrade::Early => "Early!",
            JudgeGrade::Late => "Late!",
        }
    }
}

impl fmt::Display for JudgeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Judgement windows, in seconds from the nearest beat.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tolerances {
    pub perfect: f64,
    pub good: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            perfect: config::BEAT_TOLERANCE_PERFECT,
            good: config::BEAT_TOLERANCE_GOOD,
        }
    }
}

impl Tolerances {
    /// True when the Good window reaches half a beat, leaving Early/Late unreachable.
    pub fn is_degenerate(&self, interval: f64) -> bool {
        self.good >= interval / 2.0
    }
}

/// Outcome of one jump.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Judgment {
    pub grade: JudgeGrade,
    /// Seconds since the last beat when the jump happened.
    pub phase_offset: f64,
    pub score_delta: u32,
    /// Combo after this jump is applied.
    pub combo: u32,
    pub breaks_combo: bool,
    pub counts_as_accurate: bool,
}

/// Picks the tier for a jump `phase_offset` seconds after the last beat.
pub fn classify(phase_offset: f64, interval: f64, tolerances: &Tolerances) -> JudgeGrade {
    let dist = phase_offset.abs().min((interval - phase_offset).abs());

    if dist <= tolerances.perfect {
        JudgeGrade::Perfect
    } else if dist <= tolerances.good {
        JudgeGrade::Good
    } else if phase_offset < interval / 2.0 {
        JudgeGrade::Early
    } else {
        JudgeGrade::Late
    }
}

/// Classifies a jump and computes its reward given the combo before it.
///
/// Hits bump the combo first and then score `base + combo`, so consecutive
/// hits are worth more each time.
pub fn judge(phase_offset: f64, interval: f64, tolerances: &Tolerances, combo_before: u32) -> Judgment {
    let grade = classify(phase_offset, interval, tolerances);
    let (combo, score_delta) = if grade.is_hit() {
        let combo = combo_before.saturating_add(1);
        (combo, grade.base_points().saturating_add(combo))
    } else {
        (0, 0)
    };

    Judgment {
        grade,
        phase_offset,
        score_delta,
        combo,
        breaks_combo: !grade.is_hit(),
        counts_as_accurate: grade.is_hit(),
    }
}

/// Whole-percent accuracy, rounded down. Zero jumps is 0%.
pub fn accuracy_percent(accurate_jumps: u32, total_jumps: u32) -> u32 {
    if total_jumps == 0 {
        return 0;
    }
    ((accurate_jumps as u64 * 100) / total_jumps as u64) as u32
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
        };
        f.write_str(s)
    }
}

pub fn rank_for(accuracy: u32) -> Rank {
    if accuracy >= 95 {
        Rank::S
    } else if accuracy >= 85 {
        Rank::A
    } else if accuracy >= 70 {
        Rank::B
    } else {
        Rank::C
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: f64 = 0.5;

    fn tol() -> Tolerances {
        Tolerances { perfect: 0.05, good: 0.10 }
    }

    #[test]
    fn scenario_at_120_bpm() {
        assert_eq!(classify(0.02, INTERVAL, &tol()), JudgeGrade::Perfect);
        assert_eq!(classify(0.30, INTERVAL, &tol()), JudgeGrade::Late);
        assert_eq!(classify(0.48, INTERVAL, &tol()), JudgeGrade::Perfect);
        assert_eq!(classify(0.08, INTERVAL, &tol()), JudgeGrade::Good);
        assert_eq!(classify(0.20, INTERVAL, &tol()), JudgeGrade::Early);
    }

    #[test]
    fn clock_phase_feeds_judgement_at_120_bpm() {
        use crate::game::timing::BeatClock;

        let mut clock = BeatClock::absolute(120.0);
        clock.update(0.02, Some(0.02));
        let first = judge(clock.phase_offset(), clock.interval(), &tol(), 0);
        assert_eq!(first.grade, JudgeGrade::Perfect);
        assert_eq!(first.score_delta, 16);

        clock.update(0.28, Some(0.30));
        let second = judge(clock.phase_offset(), clock.interval(), &tol(), first.combo);
        assert_eq!(second.grade, JudgeGrade::Late);
        assert!(second.breaks_combo);
        assert_eq!(clock.beat_count(), 0);
    }

    #[test]
    fn tiers_are_monotonic_in_distance() {
        fn rank(g: JudgeGrade) -> u8 {
            match g {
                JudgeGrade::Perfect => 0,
                JudgeGrade::Good => 1,
                JudgeGrade::Early | JudgeGrade::Late => 2,
            }
        }
        for side_late in [false, true] {
            let mut last = 0;
            for i in 0..=250 {
                let d = INTERVAL / 2.0 * i as f64 / 250.0;
                let offset = if side_late { INTERVAL - d } else { d };
                let grade = classify(offset, INTERVAL, &tol());
                let r = rank(grade);
                assert!(r >= last, "tier went backwards at d={d}: {grade:?}");
                last = r;
                if r == 2 {
                    let expected = if offset < INTERVAL / 2.0 {
                        JudgeGrade::Early
                    } else {
                        JudgeGrade::Late
                    };
                    assert_eq!(grade, expected, "offset={offset}");
                }
            }
            assert_eq!(last, 2, "half a beat away must be a miss");
        }
    }

    #[test]
    fn window_edges_are_inclusive() {
        assert_eq!(classify(0.05, INTERVAL, &tol()), JudgeGrade::Perfect);
        assert_eq!(classify(0.10, INTERVAL, &tol()), JudgeGrade::Good);
        assert_eq!(classify(0.25, INTERVAL, &tol()), JudgeGrade::Late);
    }

    #[test]
    fn degenerate_windows_make_every_jump_a_hit() {
        // 400 BPM: half a beat is 0.075s, inside the Good window.
        let interval = 60.0 / 400.0;
        assert!(tol().is_degenerate(interval));
        for i in 0..100 {
            let offset = interval * i as f64 / 100.0;
            assert!(classify(offset, interval, &tol()).is_hit(), "offset={offset}");
        }
    }

    #[test]
    fn consecutive_perfects_grow_superlinearly() {
        let mut combo = 0;
        let mut total = 0u64;
        for _ in 0..20 {
            let j = judge(0.0, INTERVAL, &tol(), combo);
            combo = j.combo;
            total += j.score_delta as u64;
        }
        let expected: u64 = (1..=20).map(|i| 15 + i).sum();
        assert_eq!(total, expected);
        assert_eq!(combo, 20);
    }

    #[test]
    fn good_adds_combo_after_increment() {
        let j = judge(0.09, INTERVAL, &tol(), 4);
        assert_eq!(j.grade, JudgeGrade::Good);
        assert_eq!(j.combo, 5);
        assert_eq!(j.score_delta, 13);
        assert!(j.counts_as_accurate && !j.breaks_combo);
    }

    #[test]
    fn misses_reset_combo_and_score_nothing() {
        for offset in [0.2, 0.3] {
            let j = judge(offset, INTERVAL, &tol(), 12);
            assert!(j.breaks_combo);
            assert!(!j.counts_as_accurate);
            assert_eq!(j.combo, 0);
            assert_eq!(j.score_delta, 0);
        }
    }

    #[test]
    fn accuracy_floors_and_handles_zero() {
        assert_eq!(accuracy_percent(0, 0), 0);
        assert_eq!(accuracy_percent(2, 3), 66);
        assert_eq!(accuracy_percent(5, 5), 100);
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(rank_for(100), Rank::S);
        assert_eq!(rank_for(95), Rank::S);
        assert_eq!(rank_for(94), Rank::A);
        assert_eq!(rank_for(85), Rank::A);
        assert_eq!(rank_for(70), Rank::B);
        assert_eq!(rank_for(69), Rank::C);
        assert_eq!(rank_for(0), Rank::C);
    }
}
