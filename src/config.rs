use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;

// Window
pub const WINDOW_TITLE: &str = "Campfire Flagship Rhythm Dodger";
pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 720.0;
pub const FPS: u32 = 60;

// Layout (derived from the reference resolution)
pub const GROUND_FRACTION: f32 = 0.82;
pub const GROUND_Y: f32 = (WINDOW_HEIGHT * GROUND_FRACTION) as i32 as f32;

// Pixel-art native frame sizes, scaled by an integer factor to stay crisp.
pub const NATIVE_PLAYER: f32 = 24.0;
pub const NATIVE_OBS: f32 = 24.0;
pub const SPRITE_SCALE: f32 = {
    let s = (WINDOW_HEIGHT / 240.0) as i32;
    if s < 1 { 1.0 } else { s as f32 }
};
pub const PLAYER_W: f32 = NATIVE_PLAYER * SPRITE_SCALE;
pub const PLAYER_H: f32 = NATIVE_PLAYER * SPRITE_SCALE;
pub const OBS_W: f32 = NATIVE_OBS * SPRITE_SCALE;
pub const OBS_H: f32 = NATIVE_OBS * SPRITE_SCALE;
pub const PLAYER_X: f32 = (WINDOW_WIDTH * 0.12) as i32 as f32;

// Physics (pixels, seconds)
pub const GRAVITY: f32 = 2000.0 * SPRITE_SCALE;
pub const JUMP_VELOCITY: f32 = -700.0 * SPRITE_SCALE;
pub const OBSTACLE_SPEED: f32 = 400.0 * SPRITE_SCALE;
pub const OBSTACLE_SPAWN_MARGIN: f32 = 40.0;
pub const OBSTACLE_FLOAT_CHANCE: f64 = 0.25;
pub const OBSTACLE_FLOAT_OFFSETS: [f32; 2] = [24.0 * SPRITE_SCALE, 40.0 * SPRITE_SCALE];
// Four land frames at 8 fps.
pub const LAND_DURATION: f32 = 4.0 / 8.0;

// Timing / beat
pub const DEFAULT_BPM: f64 = 120.0;
pub const BEAT_TOLERANCE_PERFECT: f64 = 0.05;
pub const BEAT_TOLERANCE_GOOD: f64 = 0.10;
pub const MUSIC_LATENCY: f64 = -0.35;
pub const OBSTACLE_SPACING_MIN: i32 = 3;
pub const OBSTACLE_SPACING_MAX: i32 = 5;
pub const SURVIVAL_SCORE_RATE: f64 = 2.0;
pub const JUDGMENT_DISPLAY_DURATION: f32 = 0.6;

// Misc
pub const MAX_DELTA_TIME: f64 = 0.1;

// Tracks: (filename, display name, bpm)
pub const TRACKS: [(&str, &str, f64); 5] = [
    ("BackToBlack.ogg", "Amy Winehouse - Back to Black", 123.0),
    ("DJGotUsFallinInLove.ogg", "Usher - DJ Got Us Fallin' In Love", 120.0),
    ("GimmeGimmeGimme.ogg", "ABBA - Gimme Gimme Gimme!", 120.0),
    ("OnlySoMuchOilInTheGround.ogg", "Stefanie Heinzmann - Only So Much Oil In The Ground", 121.0),
    ("ShizumeruMachi.ogg", "YOEKO - Sinking Town", 125.0),
];

// --- Runtime settings ---
const CONFIG_PATH: &str = "rhythm_dodger.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub music_latency: f64,
    pub master_volume: f32,
    pub beat_sound: bool,
    pub debug: bool,

    pub tolerance_perfect: f64,
    pub tolerance_good: f64,
    pub default_bpm: f64,
    pub spacing_min: i32,
    pub spacing_max: i32,
    pub survival_rate: f64,

    pub sim_seconds: f64,
    pub sim_fps: u32,
    pub seed: Option<u64>,
    pub music_dir: String,

    /// Extra `file|name|bpm` entries from `[Tracks]`, in key order.
    pub tracks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_latency: MUSIC_LATENCY,
            master_volume: 0.7,
            beat_sound: false,
            debug: false,
            tolerance_perfect: BEAT_TOLERANCE_PERFECT,
            tolerance_good: BEAT_TOLERANCE_GOOD,
            default_bpm: DEFAULT_BPM,
            spacing_min: OBSTACLE_SPACING_MIN,
            spacing_max: OBSTACLE_SPACING_MAX,
            survival_rate: SURVIVAL_SCORE_RATE,
            sim_seconds: 60.0,
            sim_fps: FPS,
            seed: None,
            music_dir: "music".to_string(),
            tracks: Vec::new(),
        }
    }
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn bool_flag(value: bool) -> Option<String> {
    Some(if value { "1" } else { "0" }.to_string())
}

impl Config {
    fn to_ini(&self) -> Ini {
        let mut conf = Ini::new_cs();
        conf.set("Options", "MusicLatency", Some(self.music_latency.to_string()));
        conf.set("Options", "MasterVolume", Some(self.master_volume.to_string()));
        conf.set("Options", "BeatSound", bool_flag(self.beat_sound));
        conf.set("Options", "Debug", bool_flag(self.debug));
        conf.set("Gameplay", "TolerancePerfect", Some(self.tolerance_perfect.to_string()));
        conf.set("Gameplay", "ToleranceGood", Some(self.tolerance_good.to_string()));
        conf.set("Gameplay", "DefaultBpm", Some(self.default_bpm.to_string()));
        conf.set("Gameplay", "SpacingMin", Some(self.spacing_min.to_string()));
        conf.set("Gameplay", "SpacingMax", Some(self.spacing_max.to_string()));
        conf.set("Gameplay", "SurvivalRate", Some(self.survival_rate.to_string()));
        conf.set("Simulation", "Seconds", Some(self.sim_seconds.to_string()));
        conf.set("Simulation", "Fps", Some(self.sim_fps.to_string()));
        conf.set("Simulation", "Seed", Some(self.seed.map(|s| s.to_string()).unwrap_or_default()));
        conf.set("Simulation", "MusicDir", Some(self.music_dir.clone()));
        for (i, entry) in self.tracks.iter().enumerate() {
            conf.set("Tracks", &format!("Track{}", i + 1), Some(entry.clone()));
        }
        conf
    }

    /// Builds a config from parsed INI contents. Unknown or malformed values keep their defaults.
    pub fn from_ini(conf: &Ini) -> Self {
        let d = Config::default();

        fn parsed<T: std::str::FromStr>(conf: &Ini, section: &str, key: &str) -> Option<T> {
            let raw = conf.get(section, key)?;
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring malformed value '{}' for [{}] {}", raw, section, key);
                    None
                }
            }
        }
        let flag = |section: &str, key: &str, default: bool| {
            parsed::<u8>(conf, section, key).map_or(default, |v| v != 0)
        };

        let mut cfg = Config {
            music_latency: parsed(conf, "Options", "MusicLatency").unwrap_or(d.music_latency),
            master_volume: parsed::<f32>(conf, "Options", "MasterVolume")
                .map_or(d.master_volume, |v| v.clamp(0.0, 1.0)),
            beat_sound: flag("Options", "BeatSound", d.beat_sound),
            debug: flag("Options", "Debug", d.debug),
            tolerance_perfect: parsed(conf, "Gameplay", "TolerancePerfect")
                .unwrap_or(d.tolerance_perfect),
            tolerance_good: parsed(conf, "Gameplay", "ToleranceGood").unwrap_or(d.tolerance_good),
            default_bpm: parsed::<f64>(conf, "Gameplay", "DefaultBpm")
                .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
                .unwrap_or(d.default_bpm),
            spacing_min: parsed(conf, "Gameplay", "SpacingMin").unwrap_or(d.spacing_min),
            spacing_max: parsed(conf, "Gameplay", "SpacingMax").unwrap_or(d.spacing_max),
            survival_rate: parsed(conf, "Gameplay", "SurvivalRate").unwrap_or(d.survival_rate),
            sim_seconds: parsed::<f64>(conf, "Simulation", "Seconds")
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .unwrap_or(d.sim_seconds),
            sim_fps: parsed::<u32>(conf, "Simulation", "Fps")
                .filter(|fps| *fps > 0)
                .unwrap_or(d.sim_fps),
            seed: parsed(conf, "Simulation", "Seed"),
            music_dir: conf
                .get("Simulation", "MusicDir")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.music_dir),
            tracks: extra_tracks(conf),
        };

        if cfg.tolerance_perfect > cfg.tolerance_good {
            warn!(
                "TolerancePerfect ({}) exceeds ToleranceGood ({}); swapping.",
                cfg.tolerance_perfect, cfg.tolerance_good
            );
            std::mem::swap(&mut cfg.tolerance_perfect, &mut cfg.tolerance_good);
        }
        cfg
    }
}

fn extra_tracks(conf: &Ini) -> Vec<String> {
    let Some(section) = conf.get_map_ref().get("Tracks") else {
        return Vec::new();
    };
    let mut entries: Vec<(&String, &String)> = section
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter().map(|(_, v)| v.trim().to_string()).collect()
}

fn create_default_file() -> Result<(), std::io::Error> {
    info!("Config file not found, writing defaults to '{}'.", CONFIG_PATH);
    Config::default().to_ini().write(CONFIG_PATH)
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists() {
        if let Err(e) = create_default_file() {
            warn!("Failed to create default config file: {}", e);
            return;
        }
    }

    let mut conf = Ini::new_cs();
    match conf.load(CONFIG_PATH) {
        Ok(_) => {
            let loaded = Config::from_ini(&conf);
            info!("Loaded config from '{}'.", CONFIG_PATH);
            *CONFIG.lock().unwrap() = loaded;
        }
        Err(e) => warn!("Failed to load '{}', using defaults: {}", CONFIG_PATH, e),
    }
}

/// Returns a copy of the currently loaded configuration.
pub fn get() -> Config {
    CONFIG.lock().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ini_from(text: &str) -> Ini {
        let mut conf = Ini::new_cs();
        conf.read(text.to_string()).expect("test ini should parse");
        conf
    }

    #[test]
    fn empty_ini_yields_defaults() {
        let cfg = Config::from_ini(&Ini::new_cs());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let cfg = Config::from_ini(&ini_from(
            "[Options]\nMusicLatency=-0.2\nBeatSound=1\nMasterVolume=3\n\
             [Gameplay]\nToleranceGood=abc\nSpacingMin=2\n\
             [Simulation]\nSeed=42\nFps=0\n",
        ));
        assert!((cfg.music_latency + 0.2).abs() < 1e-12);
        assert!(cfg.beat_sound);
        assert_eq!(cfg.master_volume, 1.0, "volume should clamp to 1.0");
        assert_eq!(cfg.tolerance_good, BEAT_TOLERANCE_GOOD);
        assert_eq!(cfg.spacing_min, 2);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.sim_fps, FPS, "zero fps must fall back to the default");
    }

    #[test]
    fn reads_extra_tracks_in_key_order() {
        let cfg = Config::from_ini(&ini_from(
            "[Tracks]\nTrack2=b.ogg|B|130\nTrack1=a.ogg|A|100\nTrack3=\n",
        ));
        assert_eq!(cfg.tracks, vec!["a.ogg|A|100".to_string(), "b.ogg|B|130".to_string()]);
    }

    #[test]
    fn non_finite_sim_seconds_fall_back() {
        for bad in ["inf", "NaN", "-5"] {
            let cfg = Config::from_ini(&ini_from(&format!("[Simulation]\nSeconds={bad}\n")));
            assert_eq!(cfg.sim_seconds, Config::default().sim_seconds, "Seconds={bad}");
        }
        let cfg = Config::from_ini(&ini_from("[Simulation]\nSeconds=12.5\n"));
        assert_eq!(cfg.sim_seconds, 12.5);
    }

    #[test]
    fn inverted_tolerances_are_swapped() {
        let cfg = Config::from_ini(&ini_from(
            "[Gameplay]\nTolerancePerfect=0.2\nToleranceGood=0.04\n",
        ));
        assert!(cfg.tolerance_perfect < cfg.tolerance_good);
    }

    #[test]
    fn defaults_survive_an_ini_round_trip() {
        let text = Config::default().to_ini().writes();
        assert_eq!(Config::from_ini(&ini_from(&text)), Config::default());
    }

    #[test]
    fn derived_layout_constants() {
        assert_eq!(SPRITE_SCALE, 3.0);
        assert_eq!(PLAYER_W, 72.0);
        assert_eq!(GROUND_Y, 590.0);
        assert_eq!(PLAYER_X, 153.0);
    }
}
