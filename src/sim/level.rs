//! Stage descriptors and themes
//!
//! A stage is a 13x13 map in single-character notation, a theme id, an
//! ordered enemy table and a spawn interval. Built-in stages ship with the
//! crate; a JSON file with the same shape can replace them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::grid::{Terrain, TileKind};
use crate::consts::{GRID_COLS, GRID_ROWS, SPAWN_INTERVAL};

/// Cell the base always occupies
pub const BASE_CELL: (usize, usize) = (GRID_ROWS - 1, GRID_COLS / 2);

/// One row of a stage's enemy table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyCount {
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub count: u32,
}

/// Ambient particle style for a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ambient {
    None,
    Leaves,
    Snow,
    Dust,
}

/// Visual theme token handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    City,
    Forest,
    Snow,
}

impl Theme {
    /// Look up a theme id, falling back to City
    pub fn from_id(id: &str) -> Self {
        match id.to_lowercase().as_str() {
            "city" => Theme::City,
            "forest" => Theme::Forest,
            "snow" => Theme::Snow,
            other => {
                log::warn!("Unknown theme '{}', using city", other);
                Theme::City
            }
        }
    }

    pub fn ambient(self) -> Ambient {
        match self {
            Theme::City => Ambient::Dust,
            Theme::Forest => Ambient::Leaves,
            Theme::Snow => Ambient::Snow,
        }
    }

    pub fn ambient_color(self) -> u32 {
        match self {
            Theme::City => 0x888888,
            Theme::Forest => 0x8b6a30,
            Theme::Snow => 0xffffff,
        }
    }

    pub fn brick_color(self) -> u32 {
        match self {
            Theme::City => 0x8b4513,
            Theme::Forest => 0x6b3a10,
            Theme::Snow => 0x7a6a5a,
        }
    }
}

/// Problems found while loading a stage
#[derive(Debug)]
pub enum LevelError {
    Io(std::io::Error),
    Json(serde_json::Error),
    WrongSize { rows: usize },
    RaggedRow { row: usize, len: usize },
    UnknownTile { row: usize, col: usize, tile: char },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(e) => write!(f, "failed to read level file: {}", e),
            LevelError::Json(e) => write!(f, "invalid level json: {}", e),
            LevelError::WrongSize { rows } => {
                write!(f, "map has {} rows, expected {}", rows, GRID_ROWS)
            }
            LevelError::RaggedRow { row, len } => {
                write!(f, "map row {} has {} cells, expected {}", row, len, GRID_COLS)
            }
            LevelError::UnknownTile { row, col, tile } => {
                write!(f, "unknown tile '{}' at row {}, col {}", tile, row, col)
            }
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Io(e) => Some(e),
            LevelError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Json(e)
    }
}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::Io(e)
    }
}

fn default_spawn_interval() -> f32 {
    SPAWN_INTERVAL
}

/// External stage data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub theme: String,
    /// 13 rows of 13 characters (see `TileKind::from_char`)
    pub map: Vec<String>,
    pub enemies: Vec<EnemyCount>,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f32,
}

impl LevelDescriptor {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.tiles()?;
        Ok(level)
    }

    /// Parse the map notation into a tile layout
    pub fn tiles(&self) -> Result<[[TileKind; GRID_COLS]; GRID_ROWS], LevelError> {
        if self.map.len() != GRID_ROWS {
            return Err(LevelError::WrongSize {
                rows: self.map.len(),
            });
        }
        let mut tiles = [[TileKind::Empty; GRID_COLS]; GRID_ROWS];
        for (row, line) in self.map.iter().enumerate() {
            let len = line.chars().count();
            if len != GRID_COLS {
                return Err(LevelError::RaggedRow { row, len });
            }
            for (col, tile) in line.chars().enumerate() {
                tiles[row][col] =
                    TileKind::from_char(tile).ok_or(LevelError::UnknownTile { row, col, tile })?;
            }
        }
        Ok(tiles)
    }

    /// Build the stage terrain. The base cell is always Base.
    pub fn terrain(&self) -> Result<Terrain, LevelError> {
        let mut terrain = Terrain::from_tiles(&self.tiles()?);
        terrain.set(BASE_CELL.0, BASE_CELL.1, TileKind::Base);
        Ok(terrain)
    }

    pub fn theme(&self) -> Theme {
        Theme::from_id(&self.theme)
    }

    pub fn total_enemies(&self) -> u32 {
        self.enemies.iter().map(|e| e.count).sum()
    }
}

/// Terrain used when a stage map cannot be parsed: open ground and the base
pub fn fallback_terrain() -> Terrain {
    let mut terrain = Terrain::empty();
    terrain.set(BASE_CELL.0, BASE_CELL.1, TileKind::Base);
    terrain
}

/// Parse a JSON array of stages, validating every map
pub fn levels_from_json(json: &str) -> Result<Vec<LevelDescriptor>, LevelError> {
    let levels: Vec<LevelDescriptor> = serde_json::from_str(json)?;
    for level in &levels {
        level.tiles()?;
    }
    Ok(levels)
}

/// Load stages from a JSON file
pub fn load_levels(path: &Path) -> Result<Vec<LevelDescriptor>, LevelError> {
    let json = std::fs::read_to_string(path)?;
    levels_from_json(&json)
}

fn level(
    name: &str,
    theme: &str,
    map: [&str; GRID_ROWS],
    table: &[(EnemyKind, u32)],
    spawn_interval: f32,
) -> LevelDescriptor {
    LevelDescriptor {
        name: name.to_string(),
        theme: theme.to_string(),
        map: map.iter().map(|row| row.to_string()).collect(),
        enemies: table
            .iter()
            .map(|&(kind, count)| EnemyCount { kind, count })
            .collect(),
        spawn_interval,
    }
}

/// Stages shipped with the game
pub fn builtin_levels() -> Vec<LevelDescriptor> {
    vec![
        level(
            "Outskirts",
            "city",
            [
                ".............",
                ".B.B.B.B.B.B.",
                ".B.B.B.B.B.B.",
                ".B.B.BSB.B.B.",
                ".B.B.....B.B.",
                ".....B.B.....",
                "S.BB.....BB.S",
                ".....B.B.....",
                ".B.B.BBB.B.B.",
                ".B.B.B.B.B.B.",
                ".B.B.....B.B.",
                ".....BBB.....",
                ".....BEB.....",
            ],
            &[
                (EnemyKind::Normal, 12),
                (EnemyKind::Fast, 4),
                (EnemyKind::Armor, 2),
            ],
            3.0,
        ),
        level(
            "Riverwood",
            "forest",
            [
                ".............",
                ".B.TTT.TTT.B.",
                ".B.T.B.B.T.B.",
                "...T.....T...",
                "WW.WW.S.WW.WW",
                "...B.....B...",
                ".TTB.BBB.BTT.",
                "...B..T..B...",
                "WW.WW...WW.WW",
                ".T...B.B...T.",
                ".T.B.B.B.B.T.",
                ".....BBB.....",
                "..T..BEB..T..",
            ],
            &[
                (EnemyKind::Normal, 8),
                (EnemyKind::Fast, 6),
                (EnemyKind::Armor, 4),
            ],
            2.8,
        ),
        level(
            "Frostline",
            "snow",
            [
                ".............",
                ".S.B.III.B.S.",
                ".B.B.III.B.B.",
                ".B...S.S...B.",
                "IIII.....IIII",
                ".B.BB.S.BB.B.",
                ".B.........B.",
                ".SS.BBBBB.SS.",
                ".....I.I.....",
                ".B.B.III.B.B.",
                ".B.B.....B.B.",
                "...B.BBB.B...",
                ".....BEB.....",
            ],
            &[
                (EnemyKind::Normal, 6),
                (EnemyKind::Fast, 6),
                (EnemyKind::Armor, 8),
            ],
            2.5,
        ),
    ]
}
