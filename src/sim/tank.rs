//! The player's tank

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Direction};
use super::state::{Bullet, BulletOwner};
use crate::consts::*;
use crate::input::{Key, KeySet};

/// Player-controlled tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub body: Body,
    pub direction: Direction,
    pub speed: f32,
    /// Seconds until the next shot is allowed
    pub shoot_cooldown: f32,
    /// Seconds of remaining invincibility
    pub invincible_timer: f32,
    /// Bullet speed, raised by the star power-up
    pub bullet_speed: f32,
}

impl Default for Tank {
    fn default() -> Self {
        Self::spawn()
    }
}

impl Tank {
    /// Fresh tank at the fixed spawn point with a spawn invincibility window
    pub fn spawn() -> Self {
        Self {
            body: Body::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y, TANK_SIZE, TANK_SIZE),
            direction: Direction::Up,
            speed: PLAYER_SPEED,
            shoot_cooldown: 0.0,
            invincible_timer: PLAYER_INVINCIBLE_TIME,
            bullet_speed: BULLET_SPEED,
        }
    }

    /// Move back to the spawn point after losing a life.
    /// Upgrades survive the respawn.
    pub fn respawn(&mut self) {
        self.body.pos = Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y);
        self.body.vel = Vec2::ZERO;
        self.direction = Direction::Up;
        self.invincible_timer = PLAYER_INVINCIBLE_TIME;
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0.0
    }

    /// Resolve held movement keys to one direction.
    /// Priority: up, down, left, right.
    pub fn steer(keys: &KeySet) -> Option<Direction> {
        [
            (Key::Up, Direction::Up),
            (Key::Down, Direction::Down),
            (Key::Left, Direction::Left),
            (Key::Right, Direction::Right),
        ]
        .into_iter()
        .find(|(key, _)| keys.is_pressed(*key))
        .map(|(_, dir)| dir)
    }

    /// Advance one tick: timers, input, integration, half-tile snap, bounds.
    ///
    /// `on_ice` lets an idle tank keep sliding on its previous velocity.
    pub fn update(&mut self, keys: &KeySet, on_ice: bool, dt: f32) {
        if self.invincible_timer > 0.0 {
            self.invincible_timer -= dt;
        }
        if self.shoot_cooldown > 0.0 {
            self.shoot_cooldown -= dt;
        }

        match Self::steer(keys) {
            Some(dir) => {
                self.direction = dir;
                self.body.vel = dir.unit() * self.speed;
            }
            None if on_ice => {
                self.body.vel *= ICE_FRICTION;
                if self.body.vel.length() < ICE_MIN_SPEED {
                    self.body.vel = Vec2::ZERO;
                }
            }
            None => self.body.vel = Vec2::ZERO,
        }

        self.body.integrate(dt);
        self.snap_to_half_grid();
        self.body.clamp_to(GAME_WIDTH, GAME_HEIGHT);
    }

    /// Align the axis perpendicular to motion with the nearest half tile
    fn snap_to_half_grid(&mut self) {
        if self.body.vel.x != 0.0 {
            self.body.pos.y = (self.body.pos.y / HALF_TILE).round() * HALF_TILE;
        } else if self.body.vel.y != 0.0 {
            self.body.pos.x = (self.body.pos.x / HALF_TILE).round() * HALF_TILE;
        }
    }

    /// Stop in place (build mode freezes the tank)
    pub fn freeze(&mut self) {
        self.body.vel = Vec2::ZERO;
    }

    pub fn can_fire(&self) -> bool {
        self.shoot_cooldown <= 0.0
    }

    /// Fire a bullet along the current facing and start the cooldown.
    /// The caller enforces the one-bullet-in-flight rule.
    pub fn fire(&mut self) -> Bullet {
        self.shoot_cooldown = PLAYER_SHOOT_COOLDOWN;
        Bullet::fired_from(self.body.pos, self.direction, BulletOwner::Player, self.bullet_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steer_priority() {
        let keys = KeySet::of(&[Key::Right, Key::Down, Key::Left]);
        assert_eq!(Tank::steer(&keys), Some(Direction::Down));
        let keys = KeySet::of(&[Key::Right, Key::Up]);
        assert_eq!(Tank::steer(&keys), Some(Direction::Up));
        assert_eq!(Tank::steer(&KeySet::new()), None);
    }

    #[test]
    fn test_no_input_zeroes_velocity() {
        let mut tank = Tank::spawn();
        tank.update(&KeySet::of(&[Key::Left]), false, SIM_DT);
        assert!(tank.body.vel.x < 0.0);
        tank.update(&KeySet::new(), false, SIM_DT);
        assert_eq!(tank.body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_horizontal_motion_snaps_y_to_half_tile() {
        let mut tank = Tank::spawn();
        tank.body.pos = Vec2::new(100.0, 203.0);
        tank.update(&KeySet::of(&[Key::Right]), false, SIM_DT);
        assert_eq!(tank.body.pos.y, 208.0);
        assert!((tank.body.pos.x - (100.0 + PLAYER_SPEED * SIM_DT)).abs() < 1e-4);
    }

    #[test]
    fn test_clamped_to_playfield() {
        let mut tank = Tank::spawn();
        tank.body.pos = Vec2::new(0.0, 0.0);
        tank.update(&KeySet::of(&[Key::Up]), false, SIM_DT);
        assert_eq!(tank.body.pos, Vec2::ZERO);
    }

    #[test]
    fn test_ice_keeps_sliding() {
        let mut tank = Tank::spawn();
        tank.update(&KeySet::of(&[Key::Up]), true, SIM_DT);
        tank.update(&KeySet::new(), true, SIM_DT);
        assert!(tank.body.vel.y < 0.0);
        assert!((tank.body.vel.y + PLAYER_SPEED * ICE_FRICTION).abs() < 1e-3);
    }

    #[test]
    fn test_fire_starts_cooldown() {
        let mut tank = Tank::spawn();
        assert!(tank.can_fire());
        let bullet = tank.fire();
        assert_eq!(bullet.owner, BulletOwner::Player);
        assert!(bullet.body.vel.y < 0.0);
        assert!(!tank.can_fire());
    }

    #[test]
    fn test_spawn_is_invincible() {
        let mut tank = Tank::spawn();
        assert!(tank.is_invincible());
        for _ in 0..((PLAYER_INVINCIBLE_TIME / SIM_DT) as usize + 3) {
            tank.update(&KeySet::new(), false, SIM_DT);
        }
        assert!(!tank.is_invincible());
    }
}
