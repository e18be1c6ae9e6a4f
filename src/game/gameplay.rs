use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::core::audio::locate_music;
use crate::game::judgment::{self, Judgment, Tolerances};
use crate::game::run_state::RunState;
use crate::game::song::{Track, choose_track};
use crate::game::spawn::{SpawnScheduler, SpawnSpacing};
use crate::game::timing::BeatClock;
use crate::game::world::{Obstacle, Player, first_collision};

/// Tunables a session is built with. Usually taken from the loaded config.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub tolerances: Tolerances,
    pub spacing: SpawnSpacing,
    pub default_bpm: f64,
    pub survival_rate: f64,
    pub beat_sound: bool,
    pub music_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            tolerances: Tolerances {
                perfect: cfg.tolerance_perfect,
                good: cfg.tolerance_good,
            },
            spacing: SpawnSpacing::new(cfg.spacing_min, cfg.spacing_max),
            default_bpm: cfg.default_bpm,
            survival_rate: cfg.survival_rate,
            beat_sound: cfg.beat_sound,
            music_dir: PathBuf::from(&cfg.music_dir),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Playing,
    Paused,
    GameOver,
}

/// What the frame driver hands the session each tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct TickInput {
    pub dt: f64,
    /// Latency-adjusted playback position, when a playback clock is running.
    pub absolute_time: Option<f64>,
    pub jump: bool,
}

/// Everything that happened during one tick, for audio and presentation.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub beat_crossed: bool,
    pub spawned: bool,
    pub judgment: Option<Judgment>,
    /// True only on the tick that ended the run.
    pub game_over: bool,
    /// Play the metronome click this tick.
    pub click: bool,
}

#[derive(Clone, Debug)]
pub struct JudgmentRenderInfo {
    pub judgment: Judgment,
    pub remaining: f32,
}

pub struct Session {
    settings: SessionSettings,
    tracks: Vec<Track>,
    current_track: Option<Track>,
    music_path: Option<PathBuf>,

    clock: BeatClock,
    scheduler: SpawnScheduler<StdRng>,
    rng: StdRng,

    run: RunState,
    best_score: f64,
    phase: RunPhase,

    player: Player,
    obstacles: Vec<Obstacle>,

    last_judgment: Option<JudgmentRenderInfo>,
    elapsed: f64,
    log_timer: f64,
}

impl Session {
    pub fn new(settings: SessionSettings, tracks: Vec<Track>, mut rng: StdRng) -> Self {
        info!("Initializing session with {} tracks...", tracks.len());
        let scheduler = SpawnScheduler::new(settings.spacing, StdRng::from_rng(&mut rng));
        let clock = BeatClock::accumulated(settings.default_bpm);
        let mut session = Self {
            settings,
            tracks,
            current_track: None,
            music_path: None,
            clock,
            scheduler,
            rng,
            run: RunState::new(),
            best_score: 0.0,
            phase: RunPhase::Playing,
            player: Player::new(),
            obstacles: Vec::new(),
            last_judgment: None,
            elapsed: 0.0,
            log_timer: 0.0,
        };
        session.start_random_track();
        session
    }

    /// Picks a track and builds a fresh clock for it. Without its music file
    /// the run continues with no track on a self-timed clock at the default BPM.
    pub fn start_random_track(&mut self) {
        let picked = choose_track(&self.tracks, &mut self.rng).cloned();

        let (track, music, clock) = match picked {
            Some(track) => match locate_music(&self.settings.music_dir, &track) {
                Ok(path) => {
                    info!("Starting track: {}", track.label());
                    let clock = BeatClock::absolute(track.bpm);
                    (Some(track), Some(path), clock)
                }
                Err(e) => {
                    warn!("{}; falling back to {} BPM without music.", e, self.settings.default_bpm);
                    (None, None, BeatClock::accumulated(self.settings.default_bpm))
                }
            },
            None => {
                warn!("No tracks available; running at {} BPM.", self.settings.default_bpm);
                (None, None, BeatClock::accumulated(self.settings.default_bpm))
            }
        };

        clock.check_tolerances(&self.settings.tolerances);
        self.current_track = track;
        self.music_path = music;
        self.clock = clock;
    }

    /// Advances the session by one frame.
    ///
    /// Order: beat clock, spawn countdown, jump judgement, physics, collision,
    /// survival score. Nothing moves while paused or after the run ended.
    pub fn step(&mut self, input: TickInput) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != RunPhase::Playing {
            return report;
        }

        let dt = input.dt.max(0.0);
        let physics_dt = dt.min(config::MAX_DELTA_TIME) as f32;
        self.elapsed += dt;

        if self.clock.update(dt, input.absolute_time) {
            report.beat_crossed = true;
            report.click = self.settings.beat_sound;
            if self.scheduler.on_beat_crossed() {
                self.obstacles.push(Obstacle::spawn(&mut self.rng));
                report.spawned = true;
            }
        }

        if input.jump {
            self.player.try_jump();
            let j = judgment::judge(
                self.clock.phase_offset(),
                self.clock.interval(),
                &self.settings.tolerances,
                self.run.combo,
            );
            self.run.record_jump(&j);
            self.last_judgment = Some(JudgmentRenderInfo {
                judgment: j.clone(),
                remaining: config::JUDGMENT_DISPLAY_DURATION,
            });
            report.judgment = Some(j);
        }

        self.player.update(physics_dt);
        for obs in &mut self.obstacles {
            obs.update(physics_dt);
        }
        self.obstacles.retain(|o| !o.is_offscreen());

        if first_collision(&self.player, &self.obstacles).is_some() {
            self.end_run();
            report.game_over = true;
        } else {
            self.run.add_survival(dt, self.settings.survival_rate);
        }

        if let Some(info) = self.last_judgment.as_mut() {
            info.remaining -= dt as f32;
            if info.remaining <= 0.0 {
                self.last_judgment = None;
            }
        }

        self.log_timer += dt;
        if self.log_timer >= 1.0 {
            debug!(
                "Beat: {}, Phase: {:.3}, Combo: {}, Score: {:.1}, Obstacles: {}",
                self.clock.beat_count(),
                self.clock.phase_offset(),
                self.run.combo,
                self.run.score,
                self.obstacles.len()
            );
            self.log_timer -= 1.0;
        }

        report
    }

    fn end_run(&mut self) {
        self.phase = RunPhase::GameOver;
        self.run.on_collision();
        info!(
            "Game over: score {}, accuracy {}%, rank {}",
            self.run.display_score(),
            self.run.accuracy_percent(),
            self.run.rank()
        );
        if self.run.score > self.best_score {
            self.best_score = self.run.score;
            info!("New best score: {}", self.run.display_score());
        }
    }

    pub fn pause(&mut self) {
        if self.phase == RunPhase::Playing {
            self.phase = RunPhase::Paused;
            info!("Paused.");
        }
    }

    pub fn resume(&mut self) {
        if self.phase == RunPhase::Paused {
            self.phase = RunPhase::Playing;
            info!("Resumed.");
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            RunPhase::Playing => self.pause(),
            RunPhase::Paused => self.resume(),
            RunPhase::GameOver => {}
        }
    }

    /// Starts a new run. The best score survives; everything else starts over,
    /// including the track choice.
    pub fn reset(&mut self) {
        self.best_score = self.best_score.max(self.run.score);
        self.run.reset();
        self.player.reset();
        self.obstacles.clear();
        self.last_judgment = None;
        self.elapsed = 0.0;
        self.log_timer = 0.0;
        self.scheduler = SpawnScheduler::new(self.settings.spacing, StdRng::from_rng(&mut self.rng));
        self.start_random_track();
        self.phase = RunPhase::Playing;
        info!("Run restarted.");
    }

    #[inline(always)]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &SpawnScheduler<StdRng> {
        &self.scheduler
    }

    pub fn track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Music file for the current track. `None` means the driver has no
    /// playback clock to start and should pass no absolute time.
    pub fn music_path(&self) -> Option<&PathBuf> {
        self.music_path.as_ref()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn last_judgment(&self) -> Option<&JudgmentRenderInfo> {
        self.last_judgment.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Seconds of play in the current run, excluding pauses.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
