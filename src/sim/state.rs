//! Game state and core simulation types
//!
//! Everything one match needs lives in `GameState`, including its random
//! source, so several simulations can run side by side and a seed fully
//! determines a run given the same inputs.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::build::{BuildMode, Material};
use super::enemy::{EnemyKind, EnemyTank};
use super::entity::{Body, Direction};
use super::grid::{Terrain, TileKind};
use super::level::{Ambient, LevelDescriptor, Theme, builtin_levels, fallback_terrain};
use super::spawner::EnemySpawner;
use super::tank::Tank;
use crate::consts::*;
use crate::input::KeySet;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for confirm
    Menu,
    /// Stage banner before play starts
    StageIntro,
    /// Active gameplay (build mode is a sub-mode of this)
    Playing,
    Paused,
    /// Base destroyed or lives exhausted
    GameOver,
    /// Wave cleared, waiting for confirm
    Victory,
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

/// A shell in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub owner: BulletOwner,
}

impl Bullet {
    /// Spawn a bullet at the muzzle of a tank whose origin is `origin`
    pub fn fired_from(origin: Vec2, direction: Direction, owner: BulletOwner, speed: f32) -> Self {
        let mut pos = origin + Vec2::splat(13.0);
        match direction {
            Direction::Up => pos.y -= 16.0,
            Direction::Down => pos.y += 32.0,
            Direction::Left => pos.x -= 16.0,
            Direction::Right => pos.x += 32.0,
        }
        let mut body = Body::square(pos, BULLET_SIZE);
        body.vel = direction.unit() * speed;
        Self { body, owner }
    }

    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.body.is_out_of_bounds(GAME_WIDTH, GAME_HEIGHT)
    }
}

/// The eagle the player defends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub body: Body,
    pub destroyed: bool,
}

impl Default for Base {
    fn default() -> Self {
        Self {
            body: Body::new(BASE_X, BASE_Y, TILE_SIZE, TILE_SIZE),
            destroyed: false,
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// Faster player bullets
    Star,
    /// Destroy every enemy on screen
    Bomb,
    /// Temporary steel around the base
    Shovel,
    /// Extra life
    Tank,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Star,
        PowerUpKind::Bomb,
        PowerUpKind::Shovel,
        PowerUpKind::Tank,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::Star => 0xffd700,
            PowerUpKind::Bomb => 0xff4500,
            PowerUpKind::Shovel => 0x8b4513,
            PowerUpKind::Tank => 0x32cd32,
        }
    }
}

/// A dropped power-up waiting to be claimed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub body: Body,
    /// Seconds left before it disappears
    pub timer: f32,
}

impl PowerUp {
    /// Drop at a random spot kept one tile away from the edges
    pub fn random(id: u32, kind: PowerUpKind, rng: &mut impl Rng) -> Self {
        let span = GAME_WIDTH - TILE_SIZE * 3.0;
        let x = TILE_SIZE + (rng.random::<f32>() * span).floor();
        let y = TILE_SIZE + (rng.random::<f32>() * span).floor();
        Self {
            id,
            kind,
            body: Body::new(x, y, POWERUP_SIZE, POWERUP_SIZE),
            timer: POWERUP_DURATION,
        }
    }

    /// Count down; hides itself once expired
    pub fn update(&mut self, dt: f32) {
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.body.visible = false;
        }
    }

    pub fn is_expired(&self) -> bool {
        !self.body.visible
    }
}

/// One-way cosmetic and feedback events for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Explosion { pos: Vec2, big: bool },
    Particles { pos: Vec2, color: u32 },
    ScreenShake,
    Environment { ambient: Ambient, color: u32 },
    PlayerHit,
    EnemyDestroyed { kind: EnemyKind },
    BaseDestroyed,
    PowerUpClaimed { kind: PowerUpKind },
    StageCleared { stage: usize },
}

/// Temporary steel ring from the shovel power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fortification {
    pub timer: f32,
    /// Cells turned to steel and the kind each held before
    pub cells: Vec<(usize, usize, TileKind)>,
}

/// Per-match tunables taken from settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchRules {
    pub starting_lives: u8,
    pub build_starting_points: u32,
    pub max_enemies_on_screen: usize,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            starting_lives: PLAYER_LIVES,
            build_starting_points: BUILD_INITIAL_POINTS,
            max_enemies_on_screen: MAX_ENEMIES_ON_SCREEN,
        }
    }
}

/// Read-only view handed to a renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    /// 1-based stage number
    pub stage: usize,
    pub stage_name: String,
    pub theme: Theme,
    /// Map rows in level notation
    pub tiles: Vec<String>,
    pub player: Tank,
    pub enemies: Vec<EnemyTank>,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub base: Base,
    pub build_active: bool,
    pub cursor: (usize, usize),
    pub material: Material,
    pub points: u32,
    pub score: u64,
    pub lives: u8,
    pub enemies_remaining: usize,
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Countdown for the stage intro, time since game over otherwise
    pub phase_timer: f32,
    /// Current stage (0-based index into `levels`)
    pub stage_index: usize,
    pub levels: Vec<LevelDescriptor>,
    pub theme: Theme,
    pub lives: u8,
    pub score: u64,
    /// Simulation ticks run while playing
    pub time_ticks: u64,
    pub terrain: Terrain,
    pub player: Tank,
    pub spawner: EnemySpawner,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub base: Base,
    pub build: BuildMode,
    pub fortification: Option<Fortification>,
    /// Pending presentation events (see `drain_events`)
    pub events: Vec<GameEvent>,
    /// Key snapshot from the previous tick, for edge-triggered keys
    pub prev_keys: KeySet,
    pub rules: MatchRules,
    final_score: Option<u64>,
    next_id: u32,
}

impl GameState {
    /// New state on the menu, using the built-in stages
    pub fn new(seed: u64) -> Self {
        Self::with_rules(seed, MatchRules::default(), builtin_levels())
    }

    /// New state with custom rules and stages. An empty stage list falls
    /// back to the built-in stages.
    pub fn with_rules(seed: u64, rules: MatchRules, levels: Vec<LevelDescriptor>) -> Self {
        let levels = if levels.is_empty() {
            log::warn!("No stages supplied, using built-in stages");
            builtin_levels()
        } else {
            levels
        };
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            phase_timer: 0.0,
            stage_index: 0,
            levels,
            theme: Theme::default(),
            lives: rules.starting_lives,
            score: 0,
            time_ticks: 0,
            terrain: fallback_terrain(),
            player: Tank::spawn(),
            spawner: EnemySpawner::new(rules.max_enemies_on_screen),
            bullets: Vec::new(),
            power_ups: Vec::new(),
            base: Base::default(),
            build: BuildMode::new(rules.build_starting_points),
            fortification: None,
            events: Vec::new(),
            prev_keys: KeySet::new(),
            rules,
            final_score: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset lives, score and the build balance for a fresh run
    pub fn new_match(&mut self) {
        self.stage_index = 0;
        self.lives = self.rules.starting_lives;
        self.score = 0;
        self.build = BuildMode::new(self.rules.build_starting_points);
        self.final_score = None;
        log::info!("New match (seed {})", self.seed);
    }

    /// Show the banner for the current stage
    pub fn enter_stage_intro(&mut self) {
        self.phase = GamePhase::StageIntro;
        self.phase_timer = STAGE_INTRO_TIME;
    }

    /// Load a stage and start playing it. Out-of-range indices wrap.
    pub fn start_stage(&mut self, index: usize) {
        let index = index % self.levels.len();
        self.stage_index = index;
        let level = self.levels[index].clone();

        self.terrain = level.terrain().unwrap_or_else(|err| {
            log::warn!("Stage '{}' has a bad map ({}), using open ground", level.name, err);
            fallback_terrain()
        });
        self.theme = level.theme();
        self.spawner
            .configure(&level.enemies, level.spawn_interval, &mut self.rng);

        self.player = Tank::spawn();
        self.bullets.clear();
        self.power_ups.clear();
        self.base = Base::default();
        self.build.reset_stage();
        self.fortification = None;

        self.events.push(GameEvent::Environment {
            ambient: self.theme.ambient(),
            color: self.theme.ambient_color(),
        });
        self.phase = GamePhase::Playing;
        self.phase_timer = 0.0;
        log::info!(
            "Stage {} '{}' started ({:?}, {} enemies)",
            index + 1,
            level.name,
            self.theme,
            level.total_enemies()
        );
    }

    /// Move to the next stage's intro, wrapping after the last one
    pub fn advance_stage(&mut self) {
        self.stage_index = (self.stage_index + 1) % self.levels.len();
        self.enter_stage_intro();
    }

    /// End the match; the score is held until the runner collects it
    pub fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.phase_timer = 0.0;
        self.final_score = Some(self.score);
        log::info!("Game over on stage {} with score {}", self.stage_number(), self.score);
    }

    /// Final score of a finished match, handed out once
    pub fn take_final_score(&mut self) -> Option<u64> {
        self.final_score.take()
    }

    /// 1-based stage number for display
    pub fn stage_number(&self) -> usize {
        self.stage_index + 1
    }

    pub fn stage_name(&self) -> &str {
        self.levels
            .get(self.stage_index)
            .map(|level| level.name.as_str())
            .unwrap_or_default()
    }

    /// Bodies of every live tank
    pub fn tank_bodies(&self) -> Vec<Body> {
        std::iter::once(self.player.body)
            .chain(self.spawner.enemies().iter().map(|e| e.body))
            .collect()
    }

    /// Bodies that block build placement: tanks, bullets and power-ups
    pub fn occupied_bodies(&self) -> Vec<Body> {
        let mut bodies = self.tank_bodies();
        bodies.extend(self.bullets.iter().map(|b| b.body));
        bodies.extend(
            self.power_ups
                .iter()
                .filter(|p| !p.is_expired())
                .map(|p| p.body),
        );
        bodies
    }

    /// Hand pending events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            stage: self.stage_number(),
            stage_name: self.stage_name().to_string(),
            theme: self.theme,
            tiles: self
                .terrain
                .rows()
                .iter()
                .map(|row| row.iter().map(|k| k.to_char()).collect())
                .collect(),
            player: self.player.clone(),
            enemies: self.spawner.enemies().to_vec(),
            bullets: self.bullets.clone(),
            power_ups: self.power_ups.clone(),
            base: self.base,
            build_active: self.build.active,
            cursor: self.build.cursor,
            material: self.build.selected,
            points: self.build.points(),
            score: self.score,
            lives: self.lives,
            enemies_remaining: self.spawner.remaining_count(),
        }
    }
}
