use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config;
use crate::game::timing::interval_for_bpm;

/// Playable music track. Only `bpm` matters to the beat engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub filename: String,
    pub display_name: String,
    pub bpm: f64,
}

impl Track {
    pub fn new(filename: impl Into<String>, display_name: impl Into<String>, bpm: f64) -> Self {
        Self {
            filename: filename.into(),
            display_name: display_name.into(),
            bpm,
        }
    }

    #[inline(always)]
    pub fn interval(&self) -> f64 {
        interval_for_bpm(self.bpm)
    }

    pub fn path_in(&self, music_dir: impl AsRef<Path>) -> PathBuf {
        music_dir.as_ref().join(&self.filename)
    }

    /// Formats the BPM like the HUD does: "120" rather than "120.000".
    pub fn formatted_bpm(&self) -> String {
        if (self.bpm - self.bpm.round()).abs() < 1e-6 {
            format!("{}", self.bpm.round() as i64)
        } else {
            format!("{:.2}", self.bpm)
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({} BPM)", self.display_name, self.formatted_bpm())
    }
}

impl FromStr for Track {
    type Err = String;

    /// Parses `filename|display name|bpm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        let [filename, display_name, bpm] = parts.as_slice() else {
            return Err(format!("Track '{}' must be 'file|name|bpm'", s.trim()));
        };
        if filename.is_empty() {
            return Err(format!("Track '{}' has no filename", s.trim()));
        }
        let bpm: f64 = bpm
            .parse()
            .map_err(|_| format!("Track '{}' has an invalid BPM", s.trim()))?;
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(format!("Track '{}' BPM must be greater than zero", s.trim()));
        }
        Ok(Track::new(*filename, *display_name, bpm))
    }
}

/// The built-in catalogue.
pub fn default_tracks() -> Vec<Track> {
    config::TRACKS
        .iter()
        .map(|(file, name, bpm)| Track::new(*file, *name, *bpm))
        .collect()
}

pub fn choose_track<'a, R: Rng + ?Sized>(tracks: &'a [Track], rng: &mut R) -> Option<&'a Track> {
    tracks.choose(rng)
}
