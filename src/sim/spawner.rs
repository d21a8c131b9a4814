//! Wave spawning
//!
//! The spawner owns the enemy list. It is the only code that adds enemies
//! (on spawn) or removes them (on a confirmed kill), and it decides when the
//! wave is cleared.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemyKind, EnemyTank};
use super::level::EnemyCount;
use super::state::Bullet;
use crate::consts::{MAX_ENEMIES_ON_SCREEN, SPAWN_INTERVAL, SPAWN_POINTS_X};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpawner {
    /// Shuffled spawn order for the whole wave
    queue: Vec<EnemyKind>,
    spawned: usize,
    destroyed: usize,
    enemies: Vec<EnemyTank>,
    spawn_timer: f32,
    spawn_interval: f32,
    max_on_screen: usize,
    next_id: u32,
}

impl Default for EnemySpawner {
    fn default() -> Self {
        Self::new(MAX_ENEMIES_ON_SCREEN)
    }
}

impl EnemySpawner {
    pub fn new(max_on_screen: usize) -> Self {
        Self {
            queue: Vec::new(),
            spawned: 0,
            destroyed: 0,
            enemies: Vec::new(),
            spawn_timer: 0.0,
            spawn_interval: SPAWN_INTERVAL,
            max_on_screen,
            next_id: 1,
        }
    }

    /// Reset for a new stage: expand the enemy table and shuffle it
    pub fn configure(&mut self, table: &[EnemyCount], spawn_interval: f32, rng: &mut impl Rng) {
        self.queue = table
            .iter()
            .flat_map(|entry| std::iter::repeat_n(entry.kind, entry.count as usize))
            .collect();
        self.queue.shuffle(rng);
        self.spawn_interval = spawn_interval;
        self.spawned = 0;
        self.destroyed = 0;
        self.enemies.clear();
        self.spawn_timer = 0.0;
        log::info!(
            "Wave configured: {} enemies, spawn every {:.1}s",
            self.queue.len(),
            spawn_interval
        );
    }

    /// Spawn if the window, queue and cap allow, then run every enemy's AI
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) {
        self.spawn_timer -= dt;

        if self.spawned < self.queue.len()
            && self.enemies.len() < self.max_on_screen
            && self.spawn_timer <= 0.0
        {
            let x = SPAWN_POINTS_X[rng.random_range(0..SPAWN_POINTS_X.len())];
            let kind = self.queue[self.spawned];
            let id = self.next_id;
            self.next_id += 1;
            self.enemies.push(EnemyTank::new(id, x, 0.0, kind, rng));
            self.spawned += 1;
            self.spawn_timer = self.spawn_interval;
            log::debug!("Spawned {:?} #{} at x={}", kind, id, x);
        }

        for enemy in &mut self.enemies {
            enemy.update(dt, rng);
        }
    }

    /// Collect the bullets enemies fired this tick
    pub fn drain_bullets(&mut self) -> Vec<Bullet> {
        self.enemies
            .iter_mut()
            .filter_map(EnemyTank::take_pending_bullet)
            .collect()
    }

    pub fn enemies(&self) -> &[EnemyTank] {
        &self.enemies
    }

    /// Field access for collision handling; membership stays with the spawner
    pub fn enemies_mut(&mut self) -> &mut [EnemyTank] {
        &mut self.enemies
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut EnemyTank> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    /// Remove a destroyed enemy and count it. Unknown ids are a no-op.
    pub fn remove(&mut self, id: u32) -> Option<EnemyTank> {
        let idx = self.enemies.iter().position(|e| e.id == id)?;
        self.destroyed += 1;
        Some(self.enemies.remove(idx))
    }

    pub fn queue(&self) -> &[EnemyKind] {
        &self.queue
    }

    pub fn total(&self) -> usize {
        self.queue.len()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Enemies still to be beaten: queued plus on screen
    pub fn remaining_count(&self) -> usize {
        self.queue.len() - self.spawned + self.enemies.len()
    }

    /// Cleared once every queued enemy has been destroyed
    pub fn is_victory(&self) -> bool {
        self.destroyed >= self.queue.len()
    }

    /// Test hook: place an enemy directly, counting it as spawned
    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, enemy: EnemyTank) {
        self.spawned += 1;
        self.enemies.push(enemy);
    }
}
