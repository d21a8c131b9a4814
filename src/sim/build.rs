//! Build mode: spend earned points to edit terrain mid-match
//!
//! Legality is always evaluated from current state (terrain, live bodies,
//! balance). Illegal actions are rejected without touching anything. Only
//! blocks the player placed this stage can be removed, for a half refund.

use serde::{Deserialize, Serialize};

use super::entity::Body;
use super::grid::{Terrain, TileKind};
use super::level::BASE_CELL;
use crate::cell_origin;
use crate::consts::*;
use crate::input::{Key, KeySet};

/// Placeable materials, selected with keys 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Brick,
    Steel,
    River,
    Tree,
    Ice,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Brick,
        Material::Steel,
        Material::River,
        Material::Tree,
        Material::Ice,
    ];

    /// Material for a number key (1-based)
    pub fn from_slot(slot: u8) -> Option<Self> {
        Self::ALL.get(usize::from(slot).checked_sub(1)?).copied()
    }

    pub fn tile(self) -> TileKind {
        match self {
            Material::Brick => TileKind::Brick,
            Material::Steel => TileKind::Steel,
            Material::River => TileKind::River,
            Material::Tree => TileKind::Tree,
            Material::Ice => TileKind::Ice,
        }
    }

    pub fn cost(self) -> u32 {
        match self {
            Material::Brick => 1,
            Material::Steel => 3,
            Material::River => 2,
            Material::Tree => 1,
            Material::Ice => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Material::Brick => "BRICK",
            Material::Steel => "STEEL",
            Material::River => "RIVER",
            Material::Tree => "TREE",
            Material::Ice => "ICE",
        }
    }
}

/// A block the player placed (the only removable terrain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBlock {
    pub row: usize,
    pub col: usize,
    pub tile: TileKind,
    pub cost: u32,
}

/// Cursor, balance and placement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMode {
    pub active: bool,
    pub cursor: (usize, usize),
    pub selected: Material,
    points: u32,
    placed: Vec<PlacedBlock>,
    input_cooldown: f32,
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::new(BUILD_INITIAL_POINTS)
    }
}

/// Spawn cells in the top row that must stay open
fn is_spawn_cell(row: usize, col: usize) -> bool {
    row == 0
        && SPAWN_POINTS_X
            .iter()
            .any(|sx| (sx / TILE_SIZE).floor() as usize == col)
}

impl BuildMode {
    pub fn new(points: u32) -> Self {
        Self {
            active: false,
            cursor: BUILD_CURSOR_START,
            selected: Material::Brick,
            points,
            placed: Vec::new(),
            input_cooldown: 0.0,
        }
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
        log::debug!("Build mode {}", if self.active { "on" } else { "off" });
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn add_points(&mut self, amount: u32) {
        self.points = self.points.saturating_add(amount);
    }

    pub fn placed(&self) -> &[PlacedBlock] {
        &self.placed
    }

    pub fn is_placed(&self, row: usize, col: usize) -> bool {
        self.placed.iter().any(|b| b.row == row && b.col == col)
    }

    /// Drop a placement record whose block was destroyed in combat
    pub fn forget(&mut self, row: usize, col: usize) {
        self.placed.retain(|b| !(b.row == row && b.col == col));
    }

    /// New stage: the map is rebuilt, so old placements are meaningless
    pub fn reset_stage(&mut self) {
        self.active = false;
        self.cursor = BUILD_CURSOR_START;
        self.placed.clear();
        self.input_cooldown = 0.0;
    }

    /// Whether the selected material may go on a cell right now
    pub fn can_place_at(
        &self,
        row: usize,
        col: usize,
        terrain: &Terrain,
        occupied: &[Body],
    ) -> bool {
        if !Terrain::in_bounds(row, col) || terrain.tile(row, col) != TileKind::Empty {
            return false;
        }
        if is_spawn_cell(row, col) || (row, col) == BASE_CELL {
            return false;
        }
        let cell = Body::square(cell_origin(row, col), TILE_SIZE);
        if occupied.iter().any(|body| body.collides_with(&cell)) {
            return false;
        }
        self.selected.cost() <= self.points
    }

    pub fn can_place(&self, terrain: &Terrain, occupied: &[Body]) -> bool {
        self.can_place_at(self.cursor.0, self.cursor.1, terrain, occupied)
    }

    /// Place the selected material at the cursor. Returns false if illegal.
    pub fn try_place(&mut self, terrain: &mut Terrain, occupied: &[Body]) -> bool {
        if !self.can_place(terrain, occupied) {
            return false;
        }
        let (row, col) = self.cursor;
        let material = self.selected;
        self.points -= material.cost();
        terrain.set(row, col, material.tile());
        self.placed.push(PlacedBlock {
            row,
            col,
            tile: material.tile(),
            cost: material.cost(),
        });
        log::debug!(
            "Placed {} at ({}, {}), {} points left",
            material.name(),
            row,
            col,
            self.points
        );
        true
    }

    /// Remove a player-placed block at the cursor for a half refund.
    /// Level terrain is immutable; returns false when nothing was removed.
    pub fn try_remove(&mut self, terrain: &mut Terrain) -> bool {
        let (row, col) = self.cursor;
        let Some(idx) = self.placed.iter().position(|b| b.row == row && b.col == col) else {
            return false;
        };
        let block = self.placed.remove(idx);
        terrain.clear(row, col);
        let refund = (block.cost as f32 * BUILD_RECYCLE_RATE).floor() as u32;
        self.points += refund;
        log::debug!("Removed block at ({}, {}), refunded {}", row, col, refund);
        true
    }

    /// Per-tick build controls: cursor, material, place, remove
    pub fn update(&mut self, dt: f32, keys: &KeySet, terrain: &mut Terrain, occupied: &[Body]) {
        if !self.active {
            return;
        }

        self.input_cooldown -= dt;
        if self.input_cooldown > 0.0 {
            return;
        }

        let (row, col) = self.cursor;
        if keys.is_pressed(Key::Up) {
            self.cursor.0 = row.saturating_sub(1);
            self.input_cooldown = BUILD_CURSOR_REPEAT;
        } else if keys.is_pressed(Key::Down) {
            self.cursor.0 = (row + 1).min(GRID_ROWS - 1);
            self.input_cooldown = BUILD_CURSOR_REPEAT;
        } else if keys.is_pressed(Key::Left) {
            self.cursor.1 = col.saturating_sub(1);
            self.input_cooldown = BUILD_CURSOR_REPEAT;
        } else if keys.is_pressed(Key::Right) {
            self.cursor.1 = (col + 1).min(GRID_COLS - 1);
            self.input_cooldown = BUILD_CURSOR_REPEAT;
        }

        for slot in 1..=Material::ALL.len() as u8 {
            if keys.is_pressed(Key::Material(slot)) {
                if let Some(material) = Material::from_slot(slot) {
                    self.selected = material;
                    self.input_cooldown = BUILD_CURSOR_REPEAT;
                }
            }
        }

        if keys.is_pressed(Key::Fire) {
            self.try_place(terrain, occupied);
            self.input_cooldown = BUILD_ACTION_REPEAT;
        }

        if keys.is_pressed(Key::Remove) {
            self.try_remove(terrain);
            self.input_cooldown = BUILD_ACTION_REPEAT;
        }
    }
}
