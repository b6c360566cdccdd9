//! World state and game flow
//!
//! `World` owns every entity of a running game plus the phase state machine.
//! Frame stepping lives in `tick`; this module holds the data and the
//! operations that only touch a handful of fields.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Ball, Projectile, push_capped};
use super::enemy::{Enemy, spawn_position};
use super::geometry::{Arena, Stage};
use super::placement::PlacementEffect;
use super::player::Player;
use super::portal::{PortalId, PortalPair};
use super::projectile::fire_portal_shot;
use crate::consts::*;
use crate::settings::Tuning;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to pick a mode
    StartMenu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Player died (Battle only)
    GameOver,
}

/// Game mode chosen from the start menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Enemies spawn and the player can die
    #[default]
    Battle,
    /// Free roaming with portals and balls only
    Explore,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Battle => "battle",
            GameMode::Explore => "explore",
        }
    }
}

/// Menu and flow actions driving phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuAction {
    Start(GameMode),
    Pause,
    Resume,
    Restart,
    ExitToMenu,
    PlayerDied,
}

impl GamePhase {
    /// Phase reached by applying `action`, or `None` when the action does
    /// not apply in this phase
    pub fn apply(self, action: MenuAction) -> Option<GamePhase> {
        use GamePhase::*;
        use MenuAction::*;
        match (self, action) {
            (StartMenu | GameOver, Start(_)) => Some(Playing),
            (Playing, Pause) => Some(Paused),
            (Paused, Resume) => Some(Playing),
            (Paused | GameOver, Restart) => Some(Playing),
            (Paused | GameOver, ExitToMenu) => Some(StartMenu),
            (Playing, PlayerDied) => Some(GameOver),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::StartMenu => "start_menu",
            GamePhase::Playing => "playing",
            GamePhase::Paused => "paused",
            GamePhase::GameOver => "game_over",
        }
    }
}

/// Active weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weapon {
    #[default]
    Ball,
    Portal,
}

impl Weapon {
    pub fn toggled(self) -> Weapon {
        match self {
            Weapon::Ball => Weapon::Portal,
            Weapon::Portal => Weapon::Ball,
        }
    }
}

/// Events emitted during a frame (for audio, HUD and effects)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    BallFired { ball: u32 },
    /// Fire pressed with an empty reserve
    ReserveEmpty,
    PortalShotFired { portal: PortalId },
    PlacementStarted { portal: PortalId },
    PortalMounted { portal: PortalId },
    PlayerTeleported { portal: PortalId },
    BallTeleported { ball: u32, portal: PortalId },
    EnemySpawned { enemy: u32, position: Vec3 },
    EnemyDamaged { enemy: u32, amount: f32 },
    EnemyKilled { enemy: u32 },
    EnemyFired { enemy: u32 },
    PlayerHit { damage: f32 },
    PlayerDied,
    WeaponSwitched { weapon: Weapon },
}

/// Complete game world
#[derive(Debug, Clone)]
pub struct World {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub weapon: Weapon,
    pub arena: Arena,
    pub portals: PortalPair,
    pub player: Player,
    /// Live balls, oldest first
    pub balls: Vec<Ball>,
    pub portal_shots: Vec<Projectile>,
    pub enemy_bolts: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    /// Pending portal placement effects (at most one per portal)
    pub effects: Vec<PlacementEffect>,
    /// Balls ready to fire
    pub ball_reserve: u32,
    /// Progress toward the next reserve ball (seconds)
    pub regen_timer: f32,
    /// Time since the last enemy spawn
    pub spawn_timer: f32,
    pub kill_count: u32,
    /// Seconds of `Playing` time since the last reset
    pub elapsed: f32,
    pub tuning: Tuning,
    /// Events from the most recent `update`
    pub events: Vec<GameEvent>,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    next_id: u32,
}

impl World {
    /// Create a world sitting in the start menu
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            phase: GamePhase::StartMenu,
            mode: GameMode::default(),
            weapon: Weapon::default(),
            arena: Arena::default(),
            portals: PortalPair::default(),
            player: Player::default(),
            balls: Vec::new(),
            portal_shots: Vec::new(),
            enemy_bolts: Vec::new(),
            enemies: Vec::new(),
            effects: Vec::new(),
            ball_reserve: BALL_RESERVE_MAX,
            regen_timer: BALL_RESERVE_REGEN_SECONDS,
            spawn_timer: 0.0,
            kill_count: 0,
            elapsed: 0.0,
            tuning,
            events: Vec::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Borrow the world query view (arena + current portal holes)
    pub fn stage(&self) -> Stage<'_> {
        Stage::new(&self.arena, &self.portals)
    }

    /// Regeneration progress in [0, 1] (1 when the reserve is full)
    pub fn regen_fraction(&self) -> f32 {
        if self.ball_reserve >= BALL_RESERVE_MAX {
            1.0
        } else {
            (self.regen_timer / BALL_RESERVE_REGEN_SECONDS).clamp(0.0, 1.0)
        }
    }

    /// Enemies still alive
    pub fn active_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    /// Apply a flow action. Returns whether the phase changed.
    pub fn apply_action(&mut self, action: MenuAction) -> bool {
        let Some(next) = self.phase.apply(action) else {
            log::debug!("ignoring {:?} in phase {}", action, self.phase.as_str());
            return false;
        };
        match action {
            MenuAction::Start(mode) => self.reset(mode),
            MenuAction::Restart => self.reset(self.mode),
            MenuAction::PlayerDied => {
                log::info!("player died after {:.1}s with {} kills", self.elapsed, self.kill_count);
                self.events.push(GameEvent::PlayerDied);
            }
            _ => {}
        }
        let from = self.phase;
        self.phase = next;
        self.events.push(GameEvent::PhaseChanged { from, to: next });
        true
    }

    /// Put everything back to the start of a fresh game in `mode`
    pub fn reset(&mut self, mode: GameMode) {
        log::info!("starting {} game (seed {})", mode.as_str(), self.seed);
        self.mode = mode;
        self.weapon = Weapon::default();
        self.portals.reset();
        self.player = Player::default();
        self.balls.clear();
        self.portal_shots.clear();
        self.enemy_bolts.clear();
        self.enemies.clear();
        self.effects.clear();
        self.ball_reserve = BALL_RESERVE_MAX;
        self.regen_timer = BALL_RESERVE_REGEN_SECONDS;
        self.spawn_timer = 0.0;
        self.kill_count = 0;
        self.elapsed = 0.0;
        if mode == GameMode::Battle {
            self.add_enemy(Vec3::from(ENEMY_FIRST_SPAWN));
        }
    }

    pub fn switch_weapon(&mut self) {
        self.weapon = self.weapon.toggled();
        self.events.push(GameEvent::WeaponSwitched { weapon: self.weapon });
    }

    /// Primary trigger: a ball, or a shot for portal A
    pub fn fire_primary(&mut self) {
        match self.weapon {
            Weapon::Ball => {
                self.fire_ball();
            }
            Weapon::Portal => self.fire_portal(PortalId::A),
        }
    }

    /// Secondary trigger: a shot for portal B (portal weapon only)
    pub fn fire_secondary(&mut self) {
        if self.weapon == Weapon::Portal {
            self.fire_portal(PortalId::B);
        }
    }

    /// Fire a ball from the reserve. Returns false when the reserve is empty.
    pub fn fire_ball(&mut self) -> bool {
        if self.ball_reserve == 0 {
            self.events.push(GameEvent::ReserveEmpty);
            return false;
        }
        let Some(look) = self.player.look().try_normalize() else {
            return false;
        };
        self.ball_reserve -= 1;
        self.regen_timer = 0.0;
        let id = self.next_entity_id();
        let origin = self.player.position + look * BALL_SPAWN_OFFSET;
        push_capped(&mut self.balls, Ball::new(id, origin, look * BALL_SHOOT_SPEED), BALL_MAX_COUNT);
        self.events.push(GameEvent::BallFired { ball: id });
        true
    }

    /// Fire a portal gun shot that will place `portal` where it lands
    pub fn fire_portal(&mut self, portal: PortalId) {
        let id = self.next_entity_id();
        let eye = self.player.position;
        let look = self.player.look();
        fire_portal_shot(&mut self.portal_shots, id, portal, eye, look);
        self.events.push(GameEvent::PortalShotFired { portal });
    }

    /// Refill the reserve one ball per regen period while below max
    pub fn regen_reserve(&mut self, dt: f32) {
        if self.ball_reserve >= BALL_RESERVE_MAX {
            self.regen_timer = BALL_RESERVE_REGEN_SECONDS;
            return;
        }
        self.regen_timer += dt;
        while self.regen_timer >= BALL_RESERVE_REGEN_SECONDS && self.ball_reserve < BALL_RESERVE_MAX {
            self.regen_timer -= BALL_RESERVE_REGEN_SECONDS;
            self.ball_reserve += 1;
        }
    }

    /// Spawn an enemy at a random free spot. Returns its id, or `None` when
    /// the cap is reached or no spot was found.
    pub fn spawn_enemy(&mut self) -> Option<u32> {
        if self.active_enemy_count() >= ENEMY_MAX_ACTIVE_COUNT {
            return None;
        }
        let position = spawn_position(&mut self.rng, &self.arena, self.player.position, &self.enemies)?;
        Some(self.add_enemy(position))
    }

    fn add_enemy(&mut self, position: Vec3) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, position));
        self.events.push(GameEvent::EnemySpawned { enemy: id, position });
        log::debug!("enemy {} spawned at {:?}", id, position);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(mode: GameMode) -> World {
        let mut world = World::new(7, Tuning::default());
        assert!(world.apply_action(MenuAction::Start(mode)));
        world
    }

    #[test]
    fn test_transition_table() {
        use GamePhase::*;
        use MenuAction::*;
        assert_eq!(StartMenu.apply(Start(GameMode::Battle)), Some(Playing));
        assert_eq!(StartMenu.apply(Pause), None);
        assert_eq!(StartMenu.apply(Restart), None);
        assert_eq!(Playing.apply(Pause), Some(Paused));
        assert_eq!(Playing.apply(Resume), None);
        assert_eq!(Playing.apply(Start(GameMode::Explore)), None);
        assert_eq!(Playing.apply(PlayerDied), Some(GameOver));
        assert_eq!(Paused.apply(Resume), Some(Playing));
        assert_eq!(Paused.apply(Restart), Some(Playing));
        assert_eq!(Paused.apply(ExitToMenu), Some(StartMenu));
        assert_eq!(Paused.apply(PlayerDied), None);
        assert_eq!(GameOver.apply(Restart), Some(Playing));
        assert_eq!(GameOver.apply(ExitToMenu), Some(StartMenu));
        assert_eq!(GameOver.apply(Start(GameMode::Battle)), Some(Playing));
        assert_eq!(GameOver.apply(Pause), None);
    }

    #[test]
    fn test_start_battle_spawns_first_enemy() {
        let world = playing(GameMode::Battle);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.enemies[0].position, Vec3::from(ENEMY_FIRST_SPAWN));
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX);
        assert_eq!(world.player.position, Vec3::from(PLAYER_START));
    }

    #[test]
    fn test_start_explore_has_no_enemies() {
        let world = playing(GameMode::Explore);
        assert!(world.enemies.is_empty());
        assert_eq!(world.mode, GameMode::Explore);
    }

    #[test]
    fn test_invalid_action_is_ignored() {
        let mut world = World::new(1, Tuning::default());
        assert!(!world.apply_action(MenuAction::Resume));
        assert_eq!(world.phase, GamePhase::StartMenu);
        assert!(world.events.is_empty());
    }

    #[test]
    fn test_restart_resets_world() {
        let mut world = playing(GameMode::Battle);
        world.fire_ball();
        world.player.health = 30.0;
        world.kill_count = 4;
        let wall = world.portals.get(PortalId::A).wall.expect("home wall");
        let moved = crate::sim::portal::Pose::from_yaw(Vec3::new(-5.0, 2.0, -8.9), 0.0);
        world.portals.mount(PortalId::A, moved, wall);
        assert!(world.apply_action(MenuAction::Pause));
        assert!(world.apply_action(MenuAction::Restart));

        let home = PortalPair::default();
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.mode, GameMode::Battle);
        assert!(world.balls.is_empty());
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX);
        assert_eq!(world.kill_count, 0);
        assert_eq!(world.player.health, PLAYER_MAX_HEALTH);
        assert_eq!(world.portals.get(PortalId::A).pose, home.get(PortalId::A).pose);
        assert_eq!(world.enemies.len(), 1);
    }

    #[test]
    fn test_fire_ball_consumes_reserve() {
        let mut world = playing(GameMode::Explore);
        for _ in 0..BALL_RESERVE_MAX {
            assert!(world.fire_ball());
        }
        assert!(!world.fire_ball());
        assert_eq!(world.balls.len(), BALL_RESERVE_MAX as usize);
        assert_eq!(world.ball_reserve, 0);
        assert!(world.events.contains(&GameEvent::ReserveEmpty));

        let ball = &world.balls[0];
        let look = world.player.look();
        assert!((ball.body.position - (world.player.position + look * BALL_SPAWN_OFFSET)).length() < 1e-5);
        assert!((ball.body.velocity.length() - BALL_SHOOT_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_reserve_regenerates_one_per_period() {
        let mut world = playing(GameMode::Explore);
        world.fire_ball();
        world.fire_ball();
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX - 2);
        world.regen_reserve(0.6);
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX - 2);
        assert!((world.regen_fraction() - 0.6).abs() < 1e-5);
        world.regen_reserve(0.6);
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX - 1);
        world.regen_reserve(5.0);
        assert_eq!(world.ball_reserve, BALL_RESERVE_MAX);
        world.regen_reserve(0.1);
        assert_eq!(world.regen_fraction(), 1.0);
    }

    #[test]
    fn test_weapon_routing() {
        let mut world = playing(GameMode::Explore);
        world.fire_secondary();
        assert!(world.portal_shots.is_empty());
        world.switch_weapon();
        assert_eq!(world.weapon, Weapon::Portal);
        world.fire_primary();
        world.fire_secondary();
        assert!(world.balls.is_empty());
        assert_eq!(world.portal_shots.len(), 2);
        assert!(world.events.contains(&GameEvent::PortalShotFired { portal: PortalId::A }));
        assert!(world.events.contains(&GameEvent::PortalShotFired { portal: PortalId::B }));
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut world = playing(GameMode::Battle);
        let mut spawned = 0;
        for _ in 0..20 {
            if world.spawn_enemy().is_some() {
                spawned += 1;
            }
        }
        assert!(spawned <= ENEMY_MAX_ACTIVE_COUNT - 1);
        assert!(world.active_enemy_count() <= ENEMY_MAX_ACTIVE_COUNT);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = playing(GameMode::Battle);
        let mut b = playing(GameMode::Battle);
        a.spawn_enemy();
        b.spawn_enemy();
        let pa: Vec<Vec3> = a.enemies.iter().map(|e| e.position).collect();
        let pb: Vec<Vec3> = b.enemies.iter().map(|e| e.position).collect();
        assert_eq!(pa, pb);
    }
}
