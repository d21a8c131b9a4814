//! Movable rectangle shared by every simulated object
//!
//! Position is the top-left corner. Behaviour lives in the owning types
//! (`Tank`, `EnemyTank`, `Bullet`, ...), which embed a `Body`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Cardinal facing for tanks and bullets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector in screen space (y grows downward)
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Axis-aligned moving rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub visible: bool,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        debug_assert!(width > 0.0 && height > 0.0, "bodies need a positive size");
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
            vel: Vec2::ZERO,
            visible: true,
        }
    }

    /// Square body at a position
    pub fn square(pos: Vec2, side: f32) -> Self {
        Self::new(pos.x, pos.y, side, side)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Integrate velocity over one step
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Strict overlap test; rectangles sharing only an edge do not collide
    pub fn collides_with(&self, other: &Body) -> bool {
        self.pos.x < other.right()
            && self.right() > other.pos.x
            && self.pos.y < other.bottom()
            && self.bottom() > other.pos.y
    }

    /// Keep the body inside `[0, width] x [0, height]`.
    /// Returns true if any edge had to be corrected.
    pub fn clamp_to(&mut self, width: f32, height: f32) -> bool {
        let before = self.pos;
        self.pos.x = self.pos.x.clamp(0.0, width - self.size.x);
        self.pos.y = self.pos.y.clamp(0.0, height - self.size.y);
        before != self.pos
    }

    /// True once the origin has left the playfield rectangle
    pub fn is_out_of_bounds(&self, width: f32, height: f32) -> bool {
        self.pos.x < 0.0 || self.pos.x > width || self.pos.y < 0.0 || self.pos.y > height
    }
}
