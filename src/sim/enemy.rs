//! Enemy tanks and their wandering AI
//!
//! The AI is timer driven: a direction timer re-picks a heading (biased
//! toward the base), a shoot timer fires along the current heading, and any
//! boundary or wall contact forces an immediate unbiased re-pick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Direction};
use super::state::{Bullet, BulletOwner};
use crate::consts::*;

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Normal,
    Fast,
    Armor,
}

impl EnemyKind {
    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Normal => 80.0,
            EnemyKind::Fast => 130.0,
            EnemyKind::Armor => 60.0,
        }
    }

    pub fn hit_points(self) -> u8 {
        match self {
            EnemyKind::Normal | EnemyKind::Fast => 1,
            EnemyKind::Armor => 3,
        }
    }

    pub fn score(self) -> u64 {
        match self {
            EnemyKind::Normal => 100,
            EnemyKind::Fast => 200,
            EnemyKind::Armor => 300,
        }
    }

    /// Build points awarded for a kill
    pub fn build_reward(self) -> u32 {
        match self {
            EnemyKind::Normal => 1,
            EnemyKind::Fast => 2,
            EnemyKind::Armor => 3,
        }
    }

    /// Body colour used for hit particles
    pub fn color(self) -> u32 {
        match self {
            EnemyKind::Normal => 0x888888,
            EnemyKind::Fast => 0xdc143c,
            EnemyKind::Armor => 0xc0c0c0,
        }
    }
}

/// Seconds until the next timed direction change (1-3s)
fn direction_delay(rng: &mut impl Rng) -> f32 {
    1.0 + rng.random::<f32>() * 2.0
}

/// Seconds until the next shot (1.5-3.5s)
fn shoot_delay(rng: &mut impl Rng) -> f32 {
    1.5 + rng.random::<f32>() * 2.0
}

fn uniform_direction(rng: &mut impl Rng) -> Direction {
    Direction::ALL[rng.random_range(0..Direction::ALL.len())]
}

/// An AI-driven tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTank {
    pub id: u32,
    pub kind: EnemyKind,
    pub body: Body,
    pub direction: Direction,
    pub hp: u8,
    pub(crate) direction_timer: f32,
    shoot_timer: f32,
    shoot_cooldown: f32,
    /// Post-spawn marker, serialized for the renderer
    spawn_shield: f32,
    #[serde(skip)]
    pending_bullet: Option<Bullet>,
}

impl EnemyTank {
    pub fn new(id: u32, x: f32, y: f32, kind: EnemyKind, rng: &mut impl Rng) -> Self {
        Self {
            id,
            kind,
            body: Body::new(x, y, TANK_SIZE, TANK_SIZE),
            direction: Direction::Down,
            hp: kind.hit_points(),
            direction_timer: direction_delay(rng),
            shoot_timer: shoot_delay(rng),
            shoot_cooldown: 0.0,
            spawn_shield: ENEMY_SPAWN_SHIELD,
            pending_bullet: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.kind.speed()
    }

    /// Advance AI, movement and boundary handling by one tick.
    /// Clears last tick's pending bullet first.
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) {
        self.pending_bullet = None;

        if self.spawn_shield > 0.0 {
            self.spawn_shield -= dt;
        }

        self.update_ai(dt, rng);
        self.body.integrate(dt);
        if self.body.clamp_to(GAME_WIDTH, GAME_HEIGHT) {
            self.on_wall_collision(rng);
        }

        if self.shoot_cooldown > 0.0 {
            self.shoot_cooldown -= dt;
        }
    }

    fn update_ai(&mut self, dt: f32, rng: &mut impl Rng) {
        self.direction_timer -= dt;
        self.shoot_timer -= dt;

        if self.direction_timer <= 0.0 {
            self.direction = if rng.random_bool(ENEMY_DOWN_BIAS) {
                Direction::Down
            } else {
                uniform_direction(rng)
            };
            self.direction_timer = direction_delay(rng);
        }

        self.body.vel = self.direction.unit() * self.speed();

        if self.shoot_timer <= 0.0 && self.shoot_cooldown <= 0.0 {
            self.shoot_cooldown = ENEMY_SHOOT_COOLDOWN;
            self.pending_bullet = Some(Bullet::fired_from(
                self.body.pos,
                self.direction,
                BulletOwner::Enemy,
                BULLET_SPEED,
            ));
            self.shoot_timer = shoot_delay(rng);
        }
    }

    /// Hand over the bullet fired this tick, if any
    pub fn take_pending_bullet(&mut self) -> Option<Bullet> {
        self.pending_bullet.take()
    }

    /// Forced re-pick after touching a wall or boundary (no bias)
    pub fn on_wall_collision(&mut self, rng: &mut impl Rng) {
        self.direction = uniform_direction(rng);
        self.direction_timer = direction_delay(rng);
    }

    /// Apply one hit. Returns true if the tank is destroyed.
    pub fn take_damage(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.hp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_kind_table() {
        assert_eq!(EnemyKind::Armor.hit_points(), 3);
        assert_eq!(EnemyKind::Fast.speed(), 130.0);
        assert_eq!(EnemyKind::Normal.score(), 100);
        assert_eq!(EnemyKind::Armor.build_reward(), 3);
    }

    #[test]
    fn test_armor_takes_three_hits() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = EnemyTank::new(1, 0.0, 0.0, EnemyKind::Armor, &mut rng);
        assert!(!enemy.take_damage());
        assert!(!enemy.take_damage());
        assert!(enemy.take_damage());
    }

    #[test]
    fn test_timers_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for id in 0..200 {
            let enemy = EnemyTank::new(id, 0.0, 0.0, EnemyKind::Normal, &mut rng);
            assert!((1.0..=3.0).contains(&enemy.direction_timer));
            assert!((1.5..=3.5).contains(&enemy.shoot_timer));
        }
    }

    #[test]
    fn test_fires_once_shoot_timer_expires() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemy = EnemyTank::new(1, 192.0, 100.0, EnemyKind::Normal, &mut rng);
        let mut shots = 0;
        // 3.5s is the longest possible initial shoot delay
        for _ in 0..((3.6 / SIM_DT) as usize) {
            enemy.update(SIM_DT, &mut rng);
            if let Some(bullet) = enemy.take_pending_bullet() {
                assert_eq!(bullet.owner, BulletOwner::Enemy);
                shots += 1;
            }
            assert!(enemy.take_pending_bullet().is_none(), "pending slot drains");
        }
        assert!(shots >= 1);
    }

    #[test]
    fn test_boundary_contact_keeps_tank_inside() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut enemy = EnemyTank::new(1, 0.0, GAME_HEIGHT - TANK_SIZE, EnemyKind::Fast, &mut rng);
        for _ in 0..500 {
            enemy.update(SIM_DT, &mut rng);
            assert!(enemy.body.pos.x >= 0.0 && enemy.body.right() <= GAME_WIDTH);
            assert!(enemy.body.pos.y >= 0.0 && enemy.body.bottom() <= GAME_HEIGHT);
        }
    }

    #[test]
    fn test_spawn_shield_wears_off() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut enemy = EnemyTank::new(1, 192.0, 0.0, EnemyKind::Normal, &mut rng);
        assert!(enemy.spawn_shield > 0.0);
        for _ in 0..((ENEMY_SPAWN_SHIELD / SIM_DT) as usize + 3) {
            enemy.update(SIM_DT, &mut rng);
        }
        assert!(enemy.spawn_shield <= 0.0);
    }

    #[test]
    fn test_boundary_contact_forces_repick() {
        let mut rng = Pcg32::seed_from_u64(13);
        for seed_round in 0..50 {
            let mut enemy = EnemyTank::new(seed_round, 0.0, 200.0, EnemyKind::Normal, &mut rng);
            enemy.direction = Direction::Left;
            enemy.direction_timer = 100.0;
            enemy.update(SIM_DT, &mut rng);
            assert_eq!(enemy.body.pos.x, 0.0);
            assert!((1.0..=3.0).contains(&enemy.direction_timer));
        }
    }

    /// Share of Down among many re-picks made by `pick`
    fn down_share(mut pick: impl FnMut(&mut EnemyTank, &mut Pcg32)) -> f64 {
        const ROUNDS: usize = 8000;
        let mut rng = Pcg32::seed_from_u64(21);
        let mut enemy = EnemyTank::new(1, 192.0, 192.0, EnemyKind::Normal, &mut rng);
        let mut downs = 0;
        for _ in 0..ROUNDS {
            enemy.direction = Direction::Up;
            pick(&mut enemy, &mut rng);
            if enemy.direction == Direction::Down {
                downs += 1;
            }
        }
        downs as f64 / ROUNDS as f64
    }

    #[test]
    fn test_timed_repick_leans_toward_base() {
        let share = down_share(|enemy, rng| {
            enemy.direction_timer = 0.0;
            enemy.update_ai(SIM_DT, rng);
        });
        let expected = ENEMY_DOWN_BIAS + (1.0 - ENEMY_DOWN_BIAS) / 4.0;
        assert!((share - expected).abs() < 0.03, "down share {}", share);
    }

    #[test]
    fn test_collision_repick_is_uniform() {
        let share = down_share(|enemy, rng| enemy.on_wall_collision(rng));
        assert!((share - 0.25).abs() < 0.03, "down share {}", share);
    }
}
