//! Tank Siege - A top-down tank defence arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, AI, build economy, game state)
//! - `clock`: Fixed-step scheduler decoupling wall time from simulation ticks
//! - `input`: Key vocabulary and the pressed-key snapshot fed into each tick
//! - `settings`: Runtime configuration
//! - `highscores`: Leaderboard recorded at game over

pub mod clock;
pub mod highscores;
pub mod input;
pub mod settings;
pub mod sim;

pub use clock::FixedStep;
pub use highscores::{HighScoreEntry, HighScores};
pub use input::{Key, KeySet};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed tick length in milliseconds of simulated time
    pub const TICK_MS: f64 = 16.0;
    /// Simulation step in seconds (16 / 1000)
    pub const SIM_DT: f32 = 16.0 / 1000.0;

    /// Playfield grid
    pub const TILE_SIZE: f32 = 32.0;
    pub const HALF_TILE: f32 = 16.0;
    pub const GRID_COLS: usize = 13;
    pub const GRID_ROWS: usize = 13;
    pub const GAME_WIDTH: f32 = GRID_COLS as f32 * TILE_SIZE; // 416
    pub const GAME_HEIGHT: f32 = GRID_ROWS as f32 * TILE_SIZE; // 416

    /// All tanks share one footprint
    pub const TANK_SIZE: f32 = 32.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 100.0;
    pub const PLAYER_SPAWN_X: f32 = 128.0;
    pub const PLAYER_SPAWN_Y: f32 = 352.0;
    pub const PLAYER_SHOOT_COOLDOWN: f32 = 0.4;
    pub const PLAYER_INVINCIBLE_TIME: f32 = 2.0;
    pub const PLAYER_LIVES: u8 = 3;

    /// Bullets
    pub const BULLET_SPEED: f32 = 300.0;
    pub const BULLET_SIZE: f32 = 6.0;
    /// Star power-up bullet speed multiplier
    pub const STAR_BULLET_BOOST: f32 = 1.5;

    /// Enemy AI timing (seconds)
    pub const ENEMY_SHOOT_COOLDOWN: f32 = 0.8;
    pub const ENEMY_SPAWN_SHIELD: f32 = 1.0;
    /// Chance a timed direction change heads for the base
    pub const ENEMY_DOWN_BIAS: f64 = 0.4;

    /// Spawning
    pub const SPAWN_POINTS_X: [f32; 3] = [32.0, 192.0, 352.0];
    pub const MAX_ENEMIES_ON_SCREEN: usize = 4;
    pub const SPAWN_INTERVAL: f32 = 3.0;

    /// Base (eagle) sits in the bottom row, centre column
    pub const BASE_X: f32 = 192.0;
    pub const BASE_Y: f32 = 384.0;

    /// Power-ups
    pub const POWERUP_DURATION: f32 = 10.0;
    pub const POWERUP_SIZE: f32 = 28.0;
    pub const POWERUP_DROP_CHANCE: f64 = 0.2;
    /// How long shovel fortification lasts
    pub const FORTIFY_DURATION: f32 = 10.0;

    /// Terrain
    pub const RIVER_PUSHBACK: f32 = 3.0;
    pub const ICE_FRICTION: f32 = 0.9;
    pub const ICE_MIN_SPEED: f32 = 5.0;

    /// Building economy
    pub const BUILD_INITIAL_POINTS: u32 = 10;
    pub const BUILD_RECYCLE_RATE: f32 = 0.5;
    pub const BUILD_CURSOR_REPEAT: f32 = 0.12;
    pub const BUILD_ACTION_REPEAT: f32 = 0.2;
    pub const BUILD_CURSOR_START: (usize, usize) = (6, 6);

    /// Phase timing
    pub const STAGE_INTRO_TIME: f32 = 2.0;
}

/// Pixel origin (top-left) of a grid cell
#[inline]
pub fn cell_origin(row: usize, col: usize) -> Vec2 {
    Vec2::new(col as f32 * consts::TILE_SIZE, row as f32 * consts::TILE_SIZE)
}

/// Grid cell containing a pixel position, if it lies on the playfield
#[inline]
pub fn cell_at(point: Vec2) -> Option<(usize, usize)> {
    if point.x < 0.0 || point.y < 0.0 {
        return None;
    }
    let col = (point.x / consts::TILE_SIZE).floor() as usize;
    let row = (point.y / consts::TILE_SIZE).floor() as usize;
    (row < consts::GRID_ROWS && col < consts::GRID_COLS).then_some((row, col))
}
