use log::{debug, warn};
use rand::Rng;
use std::str::FromStr;

use crate::config;

/// Inclusive range of beats between two obstacle spawns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpawnSpacing {
    min: i32,
    max: i32,
}

impl SpawnSpacing {
    /// Spacing is at least one beat; bounds given in the wrong order are swapped.
    pub fn new(min: i32, max: i32) -> Self {
        let (mut min, mut max) = (min, max);
        if min > max {
            warn!("Spawn spacing {}..={} is inverted; swapping.", min, max);
            std::mem::swap(&mut min, &mut max);
        }
        if min < 1 {
            warn!("Spawn spacing minimum {} raised to 1 beat.", min);
            min = 1;
            max = max.max(1);
        }
        Self { min, max }
    }

    #[inline(always)]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[inline(always)]
    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, beats: i32) -> bool {
        (self.min..=self.max).contains(&beats)
    }
}

impl Default for SpawnSpacing {
    fn default() -> Self {
        Self::new(config::OBSTACLE_SPACING_MIN, config::OBSTACLE_SPACING_MAX)
    }
}

impl FromStr for SpawnSpacing {
    type Err = String;

    /// Parses `"3-5"`, `"3:5"` or a single `"4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| format!("Spawn spacing '{}' is not a valid beat count", s))
        };
        match s.split_once(['-', ':']) {
            Some((lo, hi)) => Ok(Self::new(parse(lo)?, parse(hi)?)),
            None => {
                let v = parse(s)?;
                Ok(Self::new(v, v))
            }
        }
    }
}

/// Decides on which beats a new obstacle enters.
///
/// Only beat crossings drive the countdown, so every obstacle is beat-aligned
/// when it is created.
#[derive(Debug, Clone)]
pub struct SpawnScheduler<R: Rng> {
    spacing: SpawnSpacing,
    beats_until_next_spawn: i32,
    rng: R,
}

impl<R: Rng> SpawnScheduler<R> {
    pub fn new(spacing: SpawnSpacing, mut rng: R) -> Self {
        let beats_until_next_spawn = roll(&spacing, &mut rng);
        Self {
            spacing,
            beats_until_next_spawn,
            rng,
        }
    }

    /// Call once per beat crossing. Returns true if an obstacle should spawn now.
    pub fn on_beat_crossed(&mut self) -> bool {
        self.beats_until_next_spawn -= 1;
        if self.beats_until_next_spawn > 0 {
            return false;
        }
        self.beats_until_next_spawn = roll(&self.spacing, &mut self.rng);
        debug!("Spawn; next in {} beats", self.beats_until_next_spawn);
        true
    }

    #[inline(always)]
    pub fn beats_until_next_spawn(&self) -> i32 {
        self.beats_until_next_spawn
    }

    pub fn spacing(&self) -> SpawnSpacing {
        self.spacing
    }
}

fn roll<R: Rng>(spacing: &SpawnSpacing, rng: &mut R) -> i32 {
    rng.random_range(spacing.min..=spacing.max)
}
