//! Tile grid and the derived wall set
//!
//! `Terrain` owns the authoritative tile grid together with the `Wall`
//! bodies derived from its Brick and Steel cells. The only way to change a
//! tile is `Terrain::set`, which patches the wall list in the same call, so
//! every solid tile has exactly one wall at its origin and every wall sits
//! on a solid tile.

use serde::{Deserialize, Serialize};

use super::entity::Body;
use crate::cell_origin;
use crate::consts::{GRID_COLS, GRID_ROWS, TILE_SIZE};

/// Terrain kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Brick,
    Steel,
    Base,
    River,
    Tree,
    Ice,
}

impl TileKind {
    /// Brick and Steel produce a collidable wall
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Brick | TileKind::Steel)
    }

    /// Single-character map notation used by level files
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '.' => TileKind::Empty,
            'B' => TileKind::Brick,
            'S' => TileKind::Steel,
            'E' => TileKind::Base,
            'W' => TileKind::River,
            'T' => TileKind::Tree,
            'I' => TileKind::Ice,
            _ => return None,
        })
    }

    pub fn to_char(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Brick => 'B',
            TileKind::Steel => 'S',
            TileKind::Base => 'E',
            TileKind::River => 'W',
            TileKind::Tree => 'T',
            TileKind::Ice => 'I',
        }
    }
}

/// A collidable wall derived from a Brick/Steel cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub row: usize,
    pub col: usize,
    pub kind: TileKind,
    pub body: Body,
}

impl Wall {
    fn at(row: usize, col: usize, kind: TileKind) -> Self {
        Self {
            row,
            col,
            kind,
            body: Body::square(cell_origin(row, col), TILE_SIZE),
        }
    }

    pub fn is_destructible(&self) -> bool {
        self.kind == TileKind::Brick
    }
}

/// Tile grid plus its wall view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    tiles: Vec<[TileKind; GRID_COLS]>,
    walls: Vec<Wall>,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::empty()
    }
}

impl Terrain {
    /// All-empty grid
    pub fn empty() -> Self {
        Self {
            tiles: vec![[TileKind::Empty; GRID_COLS]; GRID_ROWS],
            walls: Vec::new(),
        }
    }

    /// Build from a full tile layout, deriving the walls
    pub fn from_tiles(tiles: &[[TileKind; GRID_COLS]; GRID_ROWS]) -> Self {
        let mut terrain = Self::empty();
        for (row, line) in tiles.iter().enumerate() {
            for (col, &kind) in line.iter().enumerate() {
                terrain.set(row, col, kind);
            }
        }
        terrain
    }

    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < GRID_ROWS && col < GRID_COLS
    }

    /// Tile at a cell; off-grid reads as Empty
    pub fn tile(&self, row: usize, col: usize) -> TileKind {
        self.tiles
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[[TileKind; GRID_COLS]] {
        &self.tiles
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall_at(&self, row: usize, col: usize) -> Option<&Wall> {
        self.walls.iter().find(|w| w.row == row && w.col == col)
    }

    /// Write a tile and patch the wall view to match.
    /// Off-grid writes are ignored. Returns the previous kind.
    pub fn set(&mut self, row: usize, col: usize, kind: TileKind) -> TileKind {
        if !Self::in_bounds(row, col) {
            return TileKind::Empty;
        }
        let previous = std::mem::replace(&mut self.tiles[row][col], kind);

        if let Some(idx) = self.walls.iter().position(|w| w.row == row && w.col == col) {
            if kind.is_solid() {
                self.walls[idx].kind = kind;
            } else {
                self.walls.remove(idx);
            }
        } else if kind.is_solid() {
            self.walls.push(Wall::at(row, col, kind));
        }

        previous
    }

    /// Clear a cell back to Empty (wall removed with it)
    pub fn clear(&mut self, row: usize, col: usize) -> TileKind {
        self.set(row, col, TileKind::Empty)
    }

    /// Index of the first wall overlapping a body, in wall order
    pub fn first_wall_hit(&self, body: &Body) -> Option<usize> {
        self.walls.iter().position(|w| w.body.collides_with(body))
    }

    /// Wall by index (as returned by `first_wall_hit`)
    pub fn wall(&self, idx: usize) -> Option<&Wall> {
        self.walls.get(idx)
    }

    /// Check that the wall view matches the grid exactly
    pub fn is_consistent(&self) -> bool {
        let solid_cells = self
            .tiles
            .iter()
            .flatten()
            .filter(|k| k.is_solid())
            .count();
        if solid_cells != self.walls.len() {
            return false;
        }
        self.walls.iter().all(|w| {
            self.tile(w.row, w.col) == w.kind
                && w.kind.is_solid()
                && w.body.pos == cell_origin(w.row, w.col)
                && self
                    .walls
                    .iter()
                    .filter(|o| o.row == w.row && o.col == w.col)
                    .count()
                    == 1
        })
    }
}
