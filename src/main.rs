use log::{LevelFilter, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;

use rhythm_dodger::config;
use rhythm_dodger::core::audio::{ManualClock, PlaybackClock};
use rhythm_dodger::core::input::{InputSource, JumpInput};
use rhythm_dodger::game::autoplay::Autoplay;
use rhythm_dodger::game::gameplay::{Session, SessionSettings, TickInput};
use rhythm_dodger::game::scores::{RunSummary, SimulationReport};
use rhythm_dodger::game::song::{Track, default_tracks};

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("rhythm_dodger::game", LevelFilter::Debug)
        .filter_module("rhythm_dodger::core::audio", LevelFilter::Info)
        .init();

    info!("{} starting...", config::WINDOW_TITLE);

    config::load();
    let cfg = config::get();
    // Per-tick detail only when asked for, either here or through RUST_LOG.
    if !cfg.debug && std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    let mut tracks = default_tracks();
    for entry in &cfg.tracks {
        match entry.parse::<Track>() {
            Ok(track) => tracks.push(track),
            Err(e) => warn!("Skipping configured track: {}", e),
        }
    }

    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let mut session = Session::new(SessionSettings::from_config(&cfg), tracks, rng);
    let mut playback = ManualClock::new(cfg.music_latency);
    if session.music_path().is_some() {
        playback.start();
    }

    let bot = Autoplay::default();
    let mut input = JumpInput::new();
    let dt = 1.0 / cfg.sim_fps as f64;
    let frames = (cfg.sim_seconds.max(0.0) * cfg.sim_fps as f64).ceil() as u64;
    let mut report = SimulationReport::new(cfg.seed);
    let mut clicks = 0u64;

    info!(
        "Simulating {:.1}s at {} fps ({} frames).",
        cfg.sim_seconds, cfg.sim_fps, frames
    );

    for _ in 0..frames {
        if bot.wants_jump(&session) {
            input.press(InputSource::Autoplay);
        } else if input.is_held() {
            input.release(InputSource::Autoplay);
        }

        playback.advance(dt);
        let tick = session.step(TickInput {
            dt,
            absolute_time: playback.position(),
            jump: input.take_jump(),
        });
        if tick.click {
            clicks += 1;
        }

        if tick.game_over {
            report.push(RunSummary::from_session(&session));
            session.reset();
            input.clear();
            if session.music_path().is_some() {
                playback.start();
            } else {
                playback.stop();
            }
        }
    }
    report.push(RunSummary::from_session(&session));

    if cfg.beat_sound {
        info!("Beat clicks: {} at volume {:.2}", clicks, cfg.master_volume);
    }
    info!(
        "Simulation finished: {} runs, best score {}.",
        report.runs.len(),
        report.best_score
    );

    let json = serde_json::to_string_pretty(&report)?;
    match std::env::args().nth(1) {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &json) {
                error!("Failed to write run summary to '{}': {}", path, e);
                return Err(e.into());
            }
            info!("Run summary written to '{}'.", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
