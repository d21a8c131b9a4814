//! Tank Siege headless runner
//!
//! Plays a scripted demo match through the fixed-step scheduler at a
//! simulated 60 Hz display rate, then prints the final render snapshot as
//! JSON. Usage: `tank-siege [settings.json]`.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tank_siege::consts::SIM_DT;
use tank_siege::sim::{GamePhase, GameState, TickInput, builtin_levels, load_levels, tick};
use tank_siege::{FixedStep, HighScoreEntry, HighScores, Key, Settings};

/// Simulated display frame length
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Every this many frames the demo fakes a long stall
const STALL_EVERY: u64 = 900;
const STALL_MS: f64 = 1000.0;

/// Frame at which the build-mode excursion starts
const BUILD_FRAME: u64 = 1200;

/// Patrol pattern: each heading is held for this many frames
const PATROL_FRAMES: u64 = 90;
const PATROL: [Key; 5] = [Key::Up, Key::Left, Key::Up, Key::Right, Key::Down];

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Tank Siege (headless) starting...");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tank_siege.json"));
    let settings = Settings::load(&settings_path);

    let levels = match &settings.levels_path {
        Some(path) => load_levels(path).unwrap_or_else(|err| {
            log::warn!("Could not load stages from {}: {}", path.display(), err);
            builtin_levels()
        }),
        None => builtin_levels(),
    };

    let seed = settings.seed.unwrap_or_else(rand::random);
    let mut state = GameState::with_rules(seed, settings.rules(), levels);
    let mut clock = FixedStep::new();
    let mut highscores = HighScores::load(&settings.highscores_path);
    let mut recorded = false;
    let mut event_count = 0usize;

    let total_frames = (settings.demo_seconds.max(0.0) * 1000.0 / FRAME_MS) as u64;
    for frame in 0..total_frames {
        let input = demo_input(&state, frame);
        let raw_ms = if frame % STALL_EVERY == STALL_EVERY - 1 {
            STALL_MS
        } else {
            FRAME_MS
        };
        let frame_ms = raw_ms.min(settings.max_frame_ms);

        let _interpolation = clock.advance(frame_ms, || tick(&mut state, &input, SIM_DT));

        event_count += state.drain_events().len();
        if let Some(score) = state.take_final_score() {
            let entry = HighScoreEntry {
                score,
                stage: state.stage_number(),
                stage_name: state.stage_name().to_string(),
                timestamp: unix_time(),
            };
            if let Some(rank) = highscores.record(entry) {
                log::info!("New high score {} (rank {})", score, rank);
                recorded = true;
            }
        }
    }

    log::info!(
        "Demo finished after {} ticks in {:?}: stage {}, score {}, lives {}, {} events",
        clock.ticks(),
        state.phase,
        state.stage_number(),
        state.score,
        state.lives,
        event_count
    );

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(err) => log::warn!("Could not encode snapshot: {}", err),
    }

    if recorded {
        highscores.save(&settings.highscores_path);
    }
}

/// Scripted keys for one display frame
fn demo_input(state: &GameState, frame: u64) -> TickInput {
    // Alternate press/release so edge-triggered keys fire repeatedly
    let pulse = frame % 20 < 10;

    match state.phase {
        GamePhase::Menu | GamePhase::Victory | GamePhase::GameOver => {
            if pulse {
                TickInput::of(&[Key::Confirm])
            } else {
                TickInput::default()
            }
        }
        GamePhase::Playing => {
            if (BUILD_FRAME..BUILD_FRAME + 90).contains(&frame) {
                return build_excursion(frame - BUILD_FRAME);
            }
            if state.build.active {
                // Leave build mode if the excursion got out of step
                return if pulse {
                    TickInput::of(&[Key::Build])
                } else {
                    TickInput::default()
                };
            }
            let heading = PATROL[((frame / PATROL_FRAMES) as usize) % PATROL.len()];
            TickInput::of(&[heading, Key::Fire])
        }
        GamePhase::StageIntro | GamePhase::Paused => TickInput::default(),
    }
}

/// Enter build mode, walk the cursor, place steel, leave
fn build_excursion(offset: u64) -> TickInput {
    match offset {
        0 => TickInput::of(&[Key::Build]),
        10..30 => TickInput::of(&[Key::Up]),
        40 => TickInput::of(&[Key::Material(2)]),
        50..60 => TickInput::of(&[Key::Fire]),
        80 => TickInput::of(&[Key::Build]),
        _ => TickInput::default(),
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
