//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Fixed timestep only
//! - Randomness only from the state's seeded generator
//! - No rendering, platform or file dependencies

pub mod build;
pub mod collision;
pub mod enemy;
pub mod entity;
pub mod grid;
pub mod level;
pub mod spawner;
pub mod state;
pub mod tank;
pub mod tick;

pub use build::{BuildMode, Material, PlacedBlock};
pub use collision::{collides_with, resolve_tank_wall_collision};
pub use enemy::{EnemyKind, EnemyTank};
pub use entity::{Body, Direction};
pub use grid::{Terrain, TileKind, Wall};
pub use level::{EnemyCount, LevelDescriptor, LevelError, Theme, builtin_levels, load_levels};
pub use spawner::EnemySpawner;
pub use state::{
    Base, Bullet, BulletOwner, GameEvent, GamePhase, GameState, MatchRules, PowerUp, PowerUpKind,
    Snapshot,
};
pub use tank::Tank;
pub use tick::{TickInput, tick};
