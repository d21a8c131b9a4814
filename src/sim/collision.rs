//! Collision detection and response for axis-aligned rectangles
//!
//! Everything on the playfield is a rectangle, so detection is a strict AABB
//! overlap test. Response is corrective: the mover is pushed out along the
//! axis needing the least displacement, the obstacle never moves.

use glam::Vec2;

use super::entity::Body;
use super::grid::{Terrain, TileKind};
use crate::cell_at;
use crate::consts::RIVER_PUSHBACK;

/// Strict AABB overlap (shared edges do not count)
#[inline]
pub fn collides_with(a: &Body, b: &Body) -> bool {
    a.collides_with(b)
}

/// Signed displacement that separates `mover` from `obstacle` on one axis.
/// Sign follows which side the mover's origin is on.
fn axis_push(mover_min: f32, mover_len: f32, obstacle_min: f32, obstacle_len: f32) -> f32 {
    if mover_min < obstacle_min {
        obstacle_min - (mover_min + mover_len)
    } else {
        (obstacle_min + obstacle_len) - mover_min
    }
}

/// Push `mover` out of `obstacle` along the axis of least overlap.
///
/// The axis is picked by penetration depth (the distance to the nearest
/// clear edge), not by the width of the intersection. The two measures
/// agree for tank-sized bodies against tiles; they only differ when one
/// rectangle contains the other on an axis, where depth still separates.
/// Only the mover is corrected. Calling again on a separated pair is a
/// no-op. Returns true if the mover was displaced.
pub fn resolve_tank_wall_collision(mover: &mut Body, obstacle: &Body) -> bool {
    let overlap_x = mover.right().min(obstacle.right()) - mover.pos.x.max(obstacle.pos.x);
    let overlap_y = mover.bottom().min(obstacle.bottom()) - mover.pos.y.max(obstacle.pos.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return false;
    }

    let push_x = axis_push(mover.pos.x, mover.size.x, obstacle.pos.x, obstacle.size.x);
    let push_y = axis_push(mover.pos.y, mover.size.y, obstacle.pos.y, obstacle.size.y);

    // Snap to the obstacle edge rather than adding the delta so the result
    // lands exactly on the boundary.
    if push_x.abs() < push_y.abs() {
        mover.pos.x = if push_x < 0.0 {
            obstacle.pos.x - mover.size.x
        } else {
            obstacle.right()
        };
    } else {
        mover.pos.y = if push_y < 0.0 {
            obstacle.pos.y - mover.size.y
        } else {
            obstacle.bottom()
        };
    }
    true
}

/// Resolve a mover against a set of obstacles in order.
/// Returns true if any of them displaced it.
pub fn resolve_against<'a>(mover: &mut Body, obstacles: impl IntoIterator<Item = &'a Body>) -> bool {
    let mut hit = false;
    for obstacle in obstacles {
        if mover.collides_with(obstacle) {
            hit |= resolve_tank_wall_collision(mover, obstacle);
        }
    }
    hit
}

/// Grid cell under a body's centre point
#[inline]
pub fn center_cell(body: &Body) -> Option<(usize, usize)> {
    cell_at(body.center())
}

/// Terrain kind under a body's centre point (None off the playfield)
pub fn terrain_under(body: &Body, terrain: &Terrain) -> Option<TileKind> {
    center_cell(body).map(|(row, col)| terrain.tile(row, col))
}

/// Soft river deflection.
///
/// A mover whose centre sits on a River tile is nudged back against the
/// sign of its current velocity on each axis by a fixed amount. Applied
/// after integration, every tick, using the velocity that produced the
/// step.
pub fn apply_river_pushback(body: &mut Body, terrain: &Terrain) -> bool {
    if terrain_under(body, terrain) != Some(TileKind::River) {
        return false;
    }
    let push = Vec2::new(
        pushback_component(body.vel.x),
        pushback_component(body.vel.y),
    );
    body.pos -= push;
    push != Vec2::ZERO
}

fn pushback_component(v: f32) -> f32 {
    if v > 0.0 {
        RIVER_PUSHBACK
    } else if v < 0.0 {
        -RIVER_PUSHBACK
    } else {
        0.0
    }
}
