//! Fixed timestep simulation tick
//!
//! `tick` runs the phase state machine. While playing it advances the match
//! in a fixed order: player, spawner and enemy AI, tank collisions,
//! shooting, bullets, power-ups and finally the victory check. Later steps
//! see the results of earlier ones, so the order matters.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    apply_river_pushback, resolve_against, resolve_tank_wall_collision, terrain_under,
};
use super::entity::Body;
use super::grid::TileKind;
use super::level::BASE_CELL;
use super::state::{
    Bullet, BulletOwner, Fortification, GameEvent, GamePhase, GameState, PowerUp, PowerUpKind,
};
use crate::cell_origin;
use crate::consts::*;
use crate::input::{Key, KeySet};

/// Input for a single tick: a snapshot of the held keys
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub keys: KeySet,
}

impl TickInput {
    pub fn of(keys: &[Key]) -> Self {
        Self {
            keys: KeySet::of(keys),
        }
    }
}

/// Cells the shovel turns to steel: the ring around the base
const FORTIFY_CELLS: [(usize, usize); 5] = [
    (BASE_CELL.0 - 1, BASE_CELL.1 - 1),
    (BASE_CELL.0 - 1, BASE_CELL.1),
    (BASE_CELL.0 - 1, BASE_CELL.1 + 1),
    (BASE_CELL.0, BASE_CELL.1 - 1),
    (BASE_CELL.0, BASE_CELL.1 + 1),
];

/// How a bullet fared in the collision pass
enum BulletHit {
    /// Touched nothing, keeps flying
    Miss,
    /// Consumed by its first collision
    Consumed,
    /// The match ended; the rest of the pass is skipped
    MatchOver,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let keys = &input.keys;
    let confirm = keys.just_pressed(Key::Confirm, &state.prev_keys);
    let pause = keys.just_pressed(Key::Pause, &state.prev_keys);
    let build = keys.just_pressed(Key::Build, &state.prev_keys);
    state.prev_keys = keys.clone();

    match state.phase {
        GamePhase::Menu => {
            if confirm {
                state.new_match();
                state.enter_stage_intro();
            }
        }
        GamePhase::StageIntro => {
            state.phase_timer -= dt;
            if state.phase_timer <= 0.0 {
                state.start_stage(state.stage_index);
            }
        }
        GamePhase::Paused => {
            if pause {
                state.phase = GamePhase::Playing;
                log::debug!("Resumed");
            }
        }
        GamePhase::GameOver => {
            state.phase_timer += dt;
            if confirm {
                state.phase = GamePhase::Menu;
            }
        }
        GamePhase::Victory => {
            if confirm {
                state.advance_stage();
            }
        }
        GamePhase::Playing => {
            if pause {
                state.phase = GamePhase::Paused;
                log::debug!("Paused");
                return;
            }
            if build {
                state.build.toggle();
                if state.build.active {
                    state.player.freeze();
                }
            }
            if state.build.active {
                // Everything but the build controller is suspended
                let occupied = state.occupied_bodies();
                state.build.update(dt, keys, &mut state.terrain, &occupied);
                return;
            }
            update_playing(state, keys, dt);
        }
    }
}

fn update_playing(state: &mut GameState, keys: &KeySet, dt: f32) {
    state.time_ticks += 1;

    // Player movement
    let on_ice = terrain_under(&state.player.body, &state.terrain) == Some(TileKind::Ice);
    state.player.update(keys, on_ice, dt);

    // Spawning and enemy AI
    state.spawner.update(dt, &mut state.rng);

    resolve_tank_collisions(state);

    // Shooting: one player bullet in flight at a time
    let player_bullet_live = state.bullets.iter().any(|b| b.owner == BulletOwner::Player);
    if keys.is_pressed(Key::Fire) && state.player.can_fire() && !player_bullet_live {
        let bullet = state.player.fire();
        state.bullets.push(bullet);
    }
    state.bullets.extend(state.spawner.drain_bullets());

    for bullet in &mut state.bullets {
        bullet.update(dt);
    }

    if !resolve_bullets(state) {
        return;
    }

    update_power_ups(state, dt);
    update_fortification(state, dt);

    if state.spawner.is_victory() {
        state.phase = GamePhase::Victory;
        state.events.push(GameEvent::StageCleared {
            stage: state.stage_number(),
        });
        log::info!("Stage {} cleared, score {}", state.stage_number(), state.score);
    }
}

/// Push tanks out of walls, the base, each other and rivers.
///
/// Enemies yield to the player: an enemy driving into the player is pushed
/// back and re-picks its heading. Terrain goes last for the player so no
/// tank contact can leave it inside a wall.
fn resolve_tank_collisions(state: &mut GameState) {
    let mut player = state.player.body;
    resolve_against(&mut player, state.terrain.walls().iter().map(|w| &w.body));
    resolve_tank_wall_collision(&mut player, &state.base.body);
    apply_river_pushback(&mut player, &state.terrain);
    player.clamp_to(GAME_WIDTH, GAME_HEIGHT);

    for enemy in state.spawner.enemies_mut() {
        let mut blocked =
            resolve_against(&mut enemy.body, state.terrain.walls().iter().map(|w| &w.body));
        blocked |= resolve_tank_wall_collision(&mut enemy.body, &state.base.body);
        blocked |= resolve_tank_wall_collision(&mut enemy.body, &player);
        blocked |= apply_river_pushback(&mut enemy.body, &state.terrain);
        enemy.body.clamp_to(GAME_WIDTH, GAME_HEIGHT);
        if blocked {
            enemy.on_wall_collision(&mut state.rng);
        }
    }

    // An enemy pinned against terrain may still overlap the player
    if resolve_against(&mut player, state.spawner.enemies().iter().map(|e| &e.body)) {
        resolve_against(&mut player, state.terrain.walls().iter().map(|w| &w.body));
        resolve_tank_wall_collision(&mut player, &state.base.body);
        player.clamp_to(GAME_WIDTH, GAME_HEIGHT);
    }
    state.player.body = player;
}

/// Run every bullet through walls, base, enemies and player, in that order.
/// Returns false if the match ended during the pass.
fn resolve_bullets(state: &mut GameState) -> bool {
    let bullets = std::mem::take(&mut state.bullets);
    for (i, bullet) in bullets.iter().enumerate() {
        match bullet_hit(state, bullet) {
            BulletHit::Miss => {
                if !bullet.is_out_of_bounds() {
                    state.bullets.push(*bullet);
                }
            }
            BulletHit::Consumed => {}
            BulletHit::MatchOver => {
                state.bullets.extend_from_slice(&bullets[i + 1..]);
                return false;
            }
        }
    }
    true
}

fn bullet_hit(state: &mut GameState, bullet: &Bullet) -> BulletHit {
    let center = bullet.body.center();

    // Walls: brick breaks, steel stops the shell
    if let Some(idx) = state.terrain.first_wall_hit(&bullet.body) {
        let wall = state
            .terrain
            .wall(idx)
            .map(|w| (w.row, w.col, w.is_destructible(), w.body.center()));
        if let Some((row, col, destructible, wall_center)) = wall {
            if destructible {
                state.terrain.clear(row, col);
                state.build.forget(row, col);
                state.events.push(GameEvent::Particles {
                    pos: wall_center,
                    color: state.theme.brick_color(),
                });
            }
            state.events.push(GameEvent::Explosion {
                pos: center,
                big: false,
            });
        }
        return BulletHit::Consumed;
    }

    // Base: any owner, instant loss
    if !state.base.destroyed && bullet.body.collides_with(&state.base.body) {
        state.base.destroyed = true;
        state.events.push(GameEvent::BaseDestroyed);
        state.events.push(GameEvent::Explosion {
            pos: state.base.body.center(),
            big: true,
        });
        state.events.push(GameEvent::ScreenShake);
        log::info!("Base destroyed by {:?} bullet", bullet.owner);
        state.game_over();
        return BulletHit::MatchOver;
    }

    match bullet.owner {
        BulletOwner::Player => {
            let target = state
                .spawner
                .enemies_mut()
                .iter_mut()
                .find(|e| e.body.collides_with(&bullet.body));
            if let Some(enemy) = target {
                let (id, color) = (enemy.id, enemy.kind.color());
                let destroyed = enemy.take_damage();
                state.events.push(GameEvent::Particles { pos: center, color });
                if destroyed {
                    kill_enemy(state, id, true);
                }
                return BulletHit::Consumed;
            }
        }
        BulletOwner::Enemy => {
            if !state.player.is_invincible() && bullet.body.collides_with(&state.player.body) {
                return if player_hit(state) {
                    BulletHit::MatchOver
                } else {
                    BulletHit::Consumed
                };
            }
        }
    }

    BulletHit::Miss
}

/// Remove an enemy and pay out score and build points.
/// `allow_drop` rolls for a power-up drop.
fn kill_enemy(state: &mut GameState, id: u32, allow_drop: bool) {
    let Some(enemy) = state.spawner.remove(id) else {
        return;
    };
    state.score += enemy.kind.score();
    state.build.add_points(enemy.kind.build_reward());
    state.events.push(GameEvent::Explosion {
        pos: enemy.body.center(),
        big: true,
    });
    state.events.push(GameEvent::EnemyDestroyed { kind: enemy.kind });
    log::debug!("{:?} #{} destroyed, score {}", enemy.kind, id, state.score);

    if allow_drop && state.rng.random_bool(POWERUP_DROP_CHANCE) {
        let kind = PowerUpKind::random(&mut state.rng);
        let power_up_id = state.next_entity_id();
        let power_up = PowerUp::random(power_up_id, kind, &mut state.rng);
        log::debug!("{:?} power-up dropped at {:?}", kind, power_up.body.pos);
        state.power_ups.push(power_up);
    }
}

/// Apply an enemy hit to the player. Returns true if that ended the match.
fn player_hit(state: &mut GameState) -> bool {
    state.lives = state.lives.saturating_sub(1);
    state.events.push(GameEvent::PlayerHit);
    state.events.push(GameEvent::Explosion {
        pos: state.player.body.center(),
        big: true,
    });
    state.events.push(GameEvent::ScreenShake);

    if state.lives == 0 {
        state.game_over();
        return true;
    }
    state.player.respawn();
    log::debug!("Player hit, {} lives left", state.lives);
    false
}

fn update_power_ups(state: &mut GameState, dt: f32) {
    let player = state.player.body;
    let mut claimed = Vec::new();
    state.power_ups.retain_mut(|power_up| {
        power_up.update(dt);
        if power_up.is_expired() {
            return false;
        }
        if power_up.body.collides_with(&player) {
            claimed.push((power_up.kind, power_up.body.center()));
            return false;
        }
        true
    });

    for (kind, pos) in claimed {
        apply_power_up(state, kind, pos);
    }
}

fn apply_power_up(state: &mut GameState, kind: PowerUpKind, pos: Vec2) {
    log::debug!("{:?} power-up claimed", kind);
    state.events.push(GameEvent::PowerUpClaimed { kind });
    state.events.push(GameEvent::Particles {
        pos,
        color: kind.color(),
    });

    match kind {
        PowerUpKind::Star => {
            state.player.bullet_speed = BULLET_SPEED * STAR_BULLET_BOOST;
        }
        PowerUpKind::Bomb => {
            let ids: Vec<u32> = state.spawner.enemies().iter().map(|e| e.id).collect();
            for id in ids {
                kill_enemy(state, id, false);
            }
            state.events.push(GameEvent::ScreenShake);
        }
        PowerUpKind::Shovel => fortify_base(state),
        PowerUpKind::Tank => {
            state.lives = state.lives.saturating_add(1);
        }
    }
}

/// Turn the cells around the base to steel for a while
fn fortify_base(state: &mut GameState) {
    if let Some(fortification) = &mut state.fortification {
        fortification.timer = FORTIFY_DURATION;
        return;
    }

    let tanks = state.tank_bodies();
    let mut cells = Vec::new();
    for (row, col) in FORTIFY_CELLS {
        let previous = state.terrain.tile(row, col);
        if !matches!(previous, TileKind::Empty | TileKind::Brick) || state.build.is_placed(row, col) {
            continue;
        }
        let cell = Body::square(cell_origin(row, col), TILE_SIZE);
        if tanks.iter().any(|t| t.collides_with(&cell)) {
            continue;
        }
        state.terrain.set(row, col, TileKind::Steel);
        cells.push((row, col, previous));
    }
    log::debug!("Base fortified ({} cells)", cells.len());
    state.fortification = Some(Fortification {
        timer: FORTIFY_DURATION,
        cells,
    });
}

fn update_fortification(state: &mut GameState, dt: f32) {
    let Some(fortification) = &mut state.fortification else {
        return;
    };
    fortification.timer -= dt;
    if fortification.timer > 0.0 {
        return;
    }

    if let Some(fortification) = state.fortification.take() {
        for (row, col, previous) in fortification.cells {
            if state.terrain.tile(row, col) == TileKind::Steel {
                state.terrain.set(row, col, previous);
            }
        }
        log::debug!("Base fortification expired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{EnemyKind, EnemyTank};
    use crate::sim::entity::Direction;
    use crate::sim::level::{EnemyCount, fallback_terrain};
    use crate::sim::spawner::EnemySpawner;

    /// A state in the Playing phase on an open map. The spawner has a
    /// one-enemy wave but a zero cap, so only inserted enemies appear.
    fn open_field(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start_stage(0);
        state.terrain = fallback_terrain();
        state.player.invincible_timer = 0.0;
        state.spawner = EnemySpawner::new(0);
        let table = [EnemyCount {
            kind: EnemyKind::Normal,
            count: 1,
        }];
        state.spawner.configure(&table, SPAWN_INTERVAL, &mut state.rng);
        state
    }

    fn enemy_at(state: &mut GameState, x: f32, y: f32, kind: EnemyKind) -> u32 {
        let id = 900 + state.spawner.enemies().len() as u32;
        let mut enemy = EnemyTank::new(id, x, y, kind, &mut state.rng);
        enemy.body.vel = Vec2::ZERO;
        state.spawner.insert_for_test(enemy);
        id
    }

    fn player_bullets(state: &GameState) -> usize {
        state
            .bullets
            .iter()
            .filter(|b| b.owner == BulletOwner::Player)
            .count()
    }

    #[test]
    fn test_menu_to_intro_to_playing() {
        let mut state = GameState::new(42);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Menu);

        tick(&mut state, &TickInput::of(&[Key::Confirm]), SIM_DT);
        assert_eq!(state.phase, GamePhase::StageIntro);

        // Holding confirm does not re-trigger anything
        for _ in 0..((STAGE_INTRO_TIME / SIM_DT) as usize + 2) {
            tick(&mut state, &TickInput::of(&[Key::Confirm]), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.stage_index, 0);
    }

    #[test]
    fn test_pause_toggles_on_key_edge() {
        let mut state = open_field(1);
        tick(&mut state, &TickInput::of(&[Key::Pause]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);

        let frozen = state.player.body;
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::of(&[Key::Pause, Key::Left]), SIM_DT);
        tick(&mut state, &TickInput::of(&[Key::Left]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.player.body, frozen);
        assert_eq!(state.time_ticks, ticks);

        tick(&mut state, &TickInput::of(&[Key::Pause]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_player_bullet_exclusivity() {
        let mut state = open_field(2);
        tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
        assert_eq!(player_bullets(&state), 1);

        // Cooldown elapses long before the bullet leaves the field
        state.player.shoot_cooldown = 0.0;
        tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
        assert_eq!(player_bullets(&state), 1);
    }

    #[test]
    fn test_armor_needs_three_hits() {
        let mut state = open_field(3);
        // Player at (128, 352) facing up; armor tank directly above
        let id = enemy_at(&mut state, 128.0, 160.0, EnemyKind::Armor);
        let points = state.build.points();

        let mut hits = 0;
        for _ in 0..600 {
            // Pin the enemy in place so only bullets matter
            if let Some(enemy) = state.spawner.enemy_mut(id) {
                enemy.body.pos = Vec2::new(128.0, 160.0);
                enemy.direction = Direction::Up;
            } else {
                break;
            }
            let hp_before = state.spawner.enemies()[0].hp;
            tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
            // enemy bullets are irrelevant here
            state.bullets.retain(|b| b.owner == BulletOwner::Player);
            state.player.invincible_timer = 10.0;

            match state.spawner.enemy_mut(id) {
                Some(enemy) if enemy.hp < hp_before => {
                    hits += 1;
                    assert_eq!(state.score, 0, "no score before the kill");
                }
                Some(_) => {}
                None => hits += 1,
            }
        }

        assert_eq!(hits, 3);
        assert!(state.spawner.enemy_mut(id).is_none());
        assert_eq!(state.score, EnemyKind::Armor.score());
        assert_eq!(state.build.points(), points + EnemyKind::Armor.build_reward());
        assert_eq!(state.spawner.destroyed_count(), 1);
    }

    #[test]
    fn test_enemy_bullet_on_base_ends_match_same_tick() {
        let mut state = open_field(4);
        // Also put a player bullet on an enemy in the same pass
        let id = enemy_at(&mut state, 300.0, 100.0, EnemyKind::Normal);
        let mut to_base = Bullet::fired_from(
            Vec2::new(BASE_X, BASE_Y - 64.0),
            Direction::Down,
            BulletOwner::Enemy,
            BULLET_SPEED,
        );
        to_base.body.pos = Vec2::new(BASE_X + 13.0, BASE_Y + 2.0);
        let mut to_enemy =
            Bullet::fired_from(Vec2::new(300.0, 100.0), Direction::Up, BulletOwner::Player, 0.0);
        to_enemy.body.pos = Vec2::new(310.0, 110.0);
        state.bullets = vec![to_base, to_enemy];

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.base.destroyed);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.spawner.enemy_mut(id).is_some(), "pass stops at the base hit");
        assert_eq!(state.take_final_score(), Some(0));
    }

    #[test]
    fn test_player_bullet_breaks_brick() {
        let mut state = open_field(5);
        state.build.cursor = (8, 4);
        assert!(state.build.try_place(&mut state.terrain, &[]));
        // Player at (128, 352) fires up into column 4
        for _ in 0..60 {
            tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
            if state.terrain.tile(8, 4) == TileKind::Empty {
                break;
            }
        }
        assert_eq!(state.terrain.tile(8, 4), TileKind::Empty);
        assert!(state.terrain.wall_at(8, 4).is_none());
        assert!(!state.build.is_placed(8, 4));
        assert!(state.terrain.is_consistent());
    }

    #[test]
    fn test_steel_stops_bullet() {
        let mut state = open_field(6);
        state.terrain.set(8, 4, TileKind::Steel);
        for _ in 0..60 {
            tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
        }
        assert_eq!(state.terrain.tile(8, 4), TileKind::Steel);
        assert!(state.bullets.iter().all(|b| b.body.pos.y > 8.0 * TILE_SIZE));
    }

    #[test]
    fn test_enemy_bullet_costs_a_life() {
        let mut state = open_field(7);
        let mut bullet = Bullet::fired_from(Vec2::ZERO, Direction::Down, BulletOwner::Enemy, 0.0);
        bullet.body.pos = state.player.body.pos + Vec2::splat(10.0);
        state.bullets.push(bullet);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.lives, PLAYER_LIVES - 1);
        assert!(state.player.is_invincible());
        assert!(state.bullets.is_empty());

        // Invincible: the next shell passes through
        bullet.body.pos = state.player.body.pos + Vec2::splat(10.0);
        state.bullets.push(bullet);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.lives, PLAYER_LIVES - 1);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_last_life_ends_match() {
        let mut state = open_field(8);
        state.lives = 1;
        let mut bullet = Bullet::fired_from(Vec2::ZERO, Direction::Down, BulletOwner::Enemy, 0.0);
        bullet.body.pos = state.player.body.pos + Vec2::splat(10.0);
        state.bullets.push(bullet);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);

        tick(&mut state, &TickInput::of(&[Key::Confirm]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_build_mode_freezes_simulation() {
        let mut state = open_field(9);
        enemy_at(&mut state, 300.0, 100.0, EnemyKind::Fast);
        tick(&mut state, &TickInput::of(&[Key::Build]), SIM_DT);
        assert!(state.build.active);

        let enemies: Vec<_> = state.spawner.enemies().iter().map(|e| e.body).collect();
        let player = state.player.body;
        let ticks = state.time_ticks;
        for _ in 0..30 {
            tick(&mut state, &TickInput::of(&[Key::Left]), SIM_DT);
        }
        let after: Vec<_> = state.spawner.enemies().iter().map(|e| e.body).collect();
        assert_eq!(enemies, after);
        assert_eq!(state.player.body, player);
        assert_eq!(state.time_ticks, ticks);
        assert_ne!(state.build.cursor, BUILD_CURSOR_START);
        // let the cursor repeat delay run out
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        // Fire places at the cursor instead of shooting
        tick(&mut state, &TickInput::of(&[Key::Fire]), SIM_DT);
        assert!(state.bullets.is_empty());
        assert_eq!(state.build.placed().len(), 1);

        tick(&mut state, &TickInput::of(&[Key::Build]), SIM_DT);
        assert!(!state.build.active);
    }

    #[test]
    fn test_player_blocked_by_wall() {
        let mut state = open_field(10);
        state.terrain.set(10, 4, TileKind::Steel);
        for _ in 0..60 {
            tick(&mut state, &TickInput::of(&[Key::Up]), SIM_DT);
        }
        // Wall bottom edge is y = 352; the tank started touching it
        assert_eq!(state.player.body.pos.y, 352.0);
    }

    #[test]
    fn test_river_blocks_player() {
        let mut state = open_field(11);
        for col in 0..GRID_COLS {
            state.terrain.set(9, col, TileKind::River);
        }
        for _ in 0..200 {
            tick(&mut state, &TickInput::of(&[Key::Up]), SIM_DT);
        }
        // Centre never gets past the river row
        assert!(state.player.body.center().y > 9.0 * TILE_SIZE);
    }

    #[test]
    fn test_enemy_cannot_shove_player_into_steel() {
        let mut state = open_field(13);
        // Steel spans x 96..128; the player sits flush against its right side
        state.terrain.set(5, 3, TileKind::Steel);
        state.player.body.pos = cell_origin(5, 4);
        let id = enemy_at(&mut state, 160.0, 160.0, EnemyKind::Normal);
        if let Some(enemy) = state.spawner.enemy_mut(id) {
            enemy.direction_timer = 100.0;
        }

        for i in 0..60 {
            if let Some(enemy) = state.spawner.enemy_mut(id) {
                enemy.direction = Direction::Left;
            }
            state.player.invincible_timer = 10.0;
            tick(&mut state, &TickInput::default(), SIM_DT);

            let player = state.player.body;
            assert!(
                state.terrain.walls().iter().all(|w| !player.collides_with(&w.body)),
                "player inside a wall after tick {}",
                i
            );
            assert!(player.pos.x >= 128.0);
            if i == 0 {
                let enemy = &state.spawner.enemies()[0];
                assert!(enemy.direction_timer <= 3.0, "blocked enemy re-picks");
                assert!(!enemy.body.collides_with(&player));
            }
        }
    }

    #[test]
    fn test_enemy_blocked_by_wall_repicks() {
        let mut state = open_field(14);
        state.terrain.set(5, 6, TileKind::Steel);
        let id = enemy_at(&mut state, 160.0, 160.0, EnemyKind::Normal);
        if let Some(enemy) = state.spawner.enemy_mut(id) {
            enemy.direction = Direction::Right;
            enemy.direction_timer = 100.0;
        }
        tick(&mut state, &TickInput::default(), SIM_DT);

        let enemy = &state.spawner.enemies()[0];
        assert_eq!(enemy.body.pos.x, 160.0);
        assert!((1.0..=3.0).contains(&enemy.direction_timer));
    }

    #[test]
    fn test_enemy_river_pushback_repicks() {
        let mut state = open_field(15);
        state.terrain.set(5, 5, TileKind::River);
        let id = enemy_at(&mut state, 160.0, 160.0, EnemyKind::Normal);
        if let Some(enemy) = state.spawner.enemy_mut(id) {
            enemy.direction = Direction::Down;
            enemy.direction_timer = 100.0;
        }
        tick(&mut state, &TickInput::default(), SIM_DT);

        let enemy = &state.spawner.enemies()[0];
        assert!(enemy.body.pos.y < 160.0, "pushed back against its heading");
        assert!((1.0..=3.0).contains(&enemy.direction_timer));
    }

    #[test]
    fn test_victory_and_next_stage() {
        let mut state = open_field(12);
        let id = enemy_at(&mut state, 300.0, 100.0, EnemyKind::Normal);
        kill_enemy(&mut state, id, false);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.events.contains(&GameEvent::StageCleared { stage: 1 }));

        tick(&mut state, &TickInput::of(&[Key::Confirm]), SIM_DT);
        assert_eq!(state.phase, GamePhase::StageIntro);
        assert_eq!(state.stage_index, 1);
        for _ in 0..((STAGE_INTRO_TIME / SIM_DT) as usize + 2) {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, EnemyKind::Normal.score());
    }

    #[test]
    fn test_stages_wrap_after_last() {
        let mut state = open_field(13);
        state.stage_index = state.levels.len() - 1;
        state.phase = GamePhase::Victory;
        tick(&mut state, &TickInput::of(&[Key::Confirm]), SIM_DT);
        assert_eq!(state.stage_index, 0);
    }

    #[test]
    fn test_bomb_clears_screen_without_drops() {
        let mut state = open_field(14);
        let table = [EnemyCount {
            kind: EnemyKind::Normal,
            count: 3,
        }];
        state.spawner.configure(&table, 1000.0, &mut state.rng);
        enemy_at(&mut state, 0.0, 0.0, EnemyKind::Normal);
        enemy_at(&mut state, 200.0, 0.0, EnemyKind::Fast);
        apply_power_up(&mut state, PowerUpKind::Bomb, Vec2::ZERO);
        assert!(state.spawner.enemies().is_empty());
        assert_eq!(state.spawner.destroyed_count(), 2);
        assert_eq!(state.score, 300);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_star_and_tank_power_ups() {
        let mut state = open_field(15);
        apply_power_up(&mut state, PowerUpKind::Star, Vec2::ZERO);
        assert_eq!(state.player.bullet_speed, BULLET_SPEED * STAR_BULLET_BOOST);
        apply_power_up(&mut state, PowerUpKind::Tank, Vec2::ZERO);
        assert_eq!(state.lives, PLAYER_LIVES + 1);
    }

    #[test]
    fn test_power_up_claimed_on_contact() {
        let mut state = open_field(16);
        let mut power_up = PowerUp::random(77, PowerUpKind::Tank, &mut state.rng);
        power_up.body.pos = state.player.body.pos;
        state.power_ups.push(power_up);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.power_ups.is_empty());
        assert_eq!(state.lives, PLAYER_LIVES + 1);
        assert!(state
            .events
            .contains(&GameEvent::PowerUpClaimed { kind: PowerUpKind::Tank }));
    }

    #[test]
    fn test_shovel_fortifies_then_reverts() {
        let mut state = open_field(17);
        state.terrain.set(11, 5, TileKind::Brick);
        state.terrain.set(11, 7, TileKind::Tree);
        state.build.cursor = (12, 7);
        assert!(state.build.try_place(&mut state.terrain, &[]));

        apply_power_up(&mut state, PowerUpKind::Shovel, Vec2::ZERO);
        assert_eq!(state.terrain.tile(11, 5), TileKind::Steel);
        assert_eq!(state.terrain.tile(11, 6), TileKind::Steel);
        assert_eq!(state.terrain.tile(12, 5), TileKind::Steel);
        assert_eq!(state.terrain.tile(11, 7), TileKind::Tree);
        assert_eq!(state.terrain.tile(12, 7), TileKind::Brick, "placed blocks untouched");
        assert!(state.terrain.is_consistent());

        for _ in 0..((FORTIFY_DURATION / SIM_DT) as usize + 2) {
            update_fortification(&mut state, SIM_DT);
        }
        assert!(state.fortification.is_none());
        assert_eq!(state.terrain.tile(11, 5), TileKind::Brick);
        assert_eq!(state.terrain.tile(11, 6), TileKind::Empty);
        assert_eq!(state.terrain.tile(12, 5), TileKind::Empty);
        assert!(state.terrain.is_consistent());
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let mut state = GameState::new(seed);
            state.start_stage(0);
            let script = [
                TickInput::of(&[Key::Up, Key::Fire]),
                TickInput::of(&[Key::Left]),
                TickInput::of(&[Key::Right, Key::Fire]),
            ];
            for i in 0..1500 {
                tick(&mut state, &script[(i / 50) % script.len()], SIM_DT);
            }
            serde_json::to_string(&state.snapshot()).expect("snapshot serializes")
        };
        assert_eq!(run(99), run(99));
    }
}
