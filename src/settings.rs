//! Runtime settings
//!
//! Read from a JSON file at startup. Every field has a default, so a
//! partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{BUILD_INITIAL_POINTS, MAX_ENEMIES_ON_SCREEN, PLAYER_LIVES};
use crate::sim::MatchRules;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed RNG seed; None draws one from the OS each run
    pub seed: Option<u64>,
    /// Longest frame the runner feeds the scheduler (stall clamp)
    pub max_frame_ms: f64,

    // === Match rules ===
    pub starting_lives: u8,
    pub build_starting_points: u32,
    pub max_enemies_on_screen: usize,

    // === Files ===
    /// JSON array of stages replacing the built-in ones
    pub levels_path: Option<PathBuf>,
    pub highscores_path: PathBuf,

    /// Simulated length of the headless demo run
    pub demo_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            max_frame_ms: 250.0,
            starting_lives: PLAYER_LIVES,
            build_starting_points: BUILD_INITIAL_POINTS,
            max_enemies_on_screen: MAX_ENEMIES_ON_SCREEN,
            levels_path: None,
            highscores_path: PathBuf::from("tank_siege_highscores.json"),
            demo_seconds: 60.0,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Invalid settings file {}: {}; using defaults", path.display(), err);
                Self::default()
            }
        }
    }

    /// Match rules derived from these settings
    pub fn rules(&self) -> MatchRules {
        MatchRules {
            starting_lives: self.starting_lives.max(1),
            build_starting_points: self.build_starting_points,
            max_enemies_on_screen: self.max_enemies_on_screen,
        }
    }
}
