//! Enemies
//!
//! One record type covers every enemy. Pathfinding lives behind the
//! `EnemyDirector` collaborator; this module only follows the waypoints it
//! hands back, fires bolts and keeps enemies inside the arena.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Arena, Axis, FaceSide, Stage};
use crate::consts::*;
use crate::settings::Tuning;

/// AI collaborator: plans paths and hears about damage
pub trait EnemyDirector {
    /// Waypoints from `from` to `to`; empty when no route exists (the enemy holds position)
    fn request_path(&mut self, from: Vec3, to: Vec3) -> Vec<Vec3>;
    fn notify_damage(&mut self, _enemy: u32, _amount: f32) {}
    fn notify_death(&mut self, _enemy: u32) {}
}

/// Straight-line director: walks directly at the goal when the dividing wall
/// leaves a clear line, otherwise holds position
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPath {
    pub arena: Arena,
}

impl EnemyDirector for DirectPath {
    fn request_path(&mut self, from: Vec3, to: Vec3) -> Vec<Vec3> {
        if self.arena.line_of_sight(from, to, ENEMY_CORE_RADIUS) {
            vec![to]
        } else {
            Vec::new()
        }
    }
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Hurt,
    Killed,
}

/// A hovering enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: f32,
    pub alive: bool,
    /// Remaining hit flash
    pub damage_timer: f32,
    /// Time since death
    pub death_timer: f32,
    /// Time until the next bolt may be fired
    pub shoot_cooldown: f32,
    pub path: Vec<Vec3>,
    pub path_index: usize,
    /// Time since the path was last requested
    pub since_replan: f32,
}

impl Enemy {
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            health: ENEMY_MAX_HEALTH,
            alive: true,
            damage_timer: 0.0,
            death_timer: 0.0,
            shoot_cooldown: ENEMY_PROJECTILE_COOLDOWN,
            path: Vec::new(),
            path_index: 0,
            since_replan: 0.0,
        }
    }

    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount).max(0.0);
        self.damage_timer = ENEMY_DAMAGE_DURATION;
        if self.health > 0.0 {
            return DamageOutcome::Hurt;
        }
        self.alive = false;
        self.death_timer = 0.0;
        self.velocity = Vec3::ZERO;
        log::info!("enemy {} destroyed", self.id);
        DamageOutcome::Killed
    }

    /// Dead and done with the fall and fade
    pub fn is_finished(&self) -> bool {
        !self.alive && self.death_timer >= ENEMY_DEATH_FALL_TIME + ENEMY_DEATH_FADE_TIME
    }

    /// Opacity during the death fade (1 while alive)
    pub fn opacity(&self) -> f32 {
        if self.alive {
            return 1.0;
        }
        let fade = (self.death_timer - ENEMY_DEATH_FALL_TIME).max(0.0) / ENEMY_DEATH_FADE_TIME;
        1.0 - fade.min(1.0)
    }
}

/// Whether two enemy boxes at `a` and `b` overlap
pub fn boxes_overlap(a: Vec3, b: Vec3) -> bool {
    let extent = ENEMY_CORE_RADIUS * 2.0;
    (a - b).abs().cmplt(Vec3::splat(extent)).all()
}

/// A bolt an enemy wants to fire this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltShot {
    pub shooter: u32,
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Advance every enemy one step. Returns the bolts fired.
pub fn step_enemies(
    enemies: &mut [Enemy],
    player: Vec3,
    stage: &Stage<'_>,
    tuning: &Tuning,
    director: &mut dyn EnemyDirector,
    dt: f32,
) -> Vec<BoltShot> {
    let mut shots = Vec::new();
    for i in 0..enemies.len() {
        if !enemies[i].alive {
            let enemy = &mut enemies[i];
            enemy.death_timer += dt;
            let fall = (enemy.death_timer / ENEMY_DEATH_FALL_TIME).min(1.0);
            enemy.position.y = ENEMY_BASE_Y + (ENEMY_CORE_RADIUS - ENEMY_BASE_Y) * fall;
            continue;
        }

        let (before, rest) = enemies.split_at_mut(i);
        let Some((enemy, after)) = rest.split_first_mut() else {
            continue;
        };
        enemy.damage_timer = (enemy.damage_timer - dt).max(0.0);

        enemy.shoot_cooldown = (enemy.shoot_cooldown - dt).max(0.0);
        if enemy.shoot_cooldown <= 0.0 && stage.arena.line_of_sight(enemy.position, player, ENEMY_CORE_RADIUS) {
            if let Some(shot) = aim_bolt(enemy, player) {
                shots.push(shot);
            }
            enemy.shoot_cooldown = ENEMY_PROJECTILE_COOLDOWN;
        }

        enemy.since_replan += dt;
        if enemy.path.is_empty() || enemy.since_replan >= ENEMY_PATH_REPLAN_INTERVAL {
            enemy.path = director.request_path(enemy.position, player);
            enemy.path_index = 0;
            enemy.since_replan = 0.0;
        }

        let mut follow_dir = Vec3::ZERO;
        if enemy.position.distance(player) > ENEMY_FOLLOW_DISTANCE && !enemy.path.is_empty() {
            let target = next_waypoint(enemy);
            let mut to_target = target - enemy.position;
            to_target.y = 0.0;
            if let Some(dir) = to_target.try_normalize() {
                follow_dir = dir;
                enemy.velocity += dir * tuning.enemy_follow_accel * dt;
            }
        }

        let mut next = enemy.position + enemy.velocity * dt;
        next.y += (ENEMY_BASE_Y - next.y) * (dt * 8.0).min(1.0);
        let blocked = before
            .iter()
            .chain(after.iter())
            .any(|other| other.alive && boxes_overlap(next, other.position));
        if blocked {
            enemy.velocity *= 0.75;
        } else {
            enemy.position = next;
            enemy.velocity *= 0.9;
        }
        enemy.velocity.y = 0.0;
        resolve_enemy_walls(enemy, follow_dir, stage, tuning, dt);
    }
    shots
}

fn next_waypoint(enemy: &mut Enemy) -> Vec3 {
    let last = enemy.path.len() - 1;
    let mut target = enemy.path[enemy.path_index.min(last)];
    target.y = ENEMY_BASE_Y;
    if enemy.path_index < last && enemy.position.distance(target) < ENEMY_GRID_SIZE * 0.75 {
        enemy.path_index += 1;
        target = enemy.path[enemy.path_index.min(last)];
        target.y = ENEMY_BASE_Y;
    }
    target
}

fn aim_bolt(enemy: &Enemy, player: Vec3) -> Option<BoltShot> {
    let mut muzzle = enemy.position;
    muzzle.y = ENEMY_BASE_Y + ENEMY_CORE_RADIUS * 0.35;
    let direction = (player - muzzle).try_normalize()?;
    Some(BoltShot {
        shooter: enemy.id,
        origin: muzzle + direction * (ENEMY_CORE_RADIUS + ENEMY_PROJECTILE_RADIUS + 0.06),
        direction,
    })
}

/// Keep an enemy inside the rooms, sliding along walls toward `desired`
fn resolve_enemy_walls(enemy: &mut Enemy, desired: Vec3, stage: &Stage<'_>, tuning: &Tuning, dt: f32) {
    let arena = stage.arena;
    let half = ENEMY_CORE_RADIUS;
    let slide = tuning.enemy_follow_accel * dt;
    let pos = &mut enemy.position;
    let vel = &mut enemy.velocity;

    for (coord, sign) in [(-arena.half_x, 1.0), (arena.half_x, -1.0)] {
        let limit = coord + sign * half;
        let outside = if sign > 0.0 { pos.x < limit } else { pos.x > limit };
        if outside && !stage.in_wall_hole(*pos, half, FaceSide::new(Axis::X, coord, sign)) {
            pos.x = limit;
            vel.x = 0.0;
            if desired.z.abs() > 0.01 {
                vel.z += desired.z * slide * 0.7;
            }
            break;
        }
    }
    for (coord, sign) in [(-arena.half_z, 1.0), (arena.half_z, -1.0)] {
        let limit = coord + sign * half;
        let outside = if sign > 0.0 { pos.z < limit } else { pos.z > limit };
        if outside && !stage.in_wall_hole(*pos, half, FaceSide::new(Axis::Z, coord, sign)) {
            pos.z = limit;
            vel.z = 0.0;
            if desired.x.abs() > 0.01 {
                vel.x += desired.x * slide * 0.7;
            }
            break;
        }
    }
    if arena.middle_wall_blocks(*pos, half) {
        let side = if pos.x >= 0.0 { 1.0 } else { -1.0 };
        let face = FaceSide::new(Axis::X, arena.middle_face_coord(pos.x), side);
        if !stage.in_wall_hole(*pos, half, face) {
            pos.x = side * (arena.middle_half_thickness + half);
            vel.x = 0.0;
            if desired.z.abs() > 0.01 {
                vel.z += desired.z * slide * 0.9;
            }
        }
    }
}

/// Random spawn point in either room, away from the player and other enemies
pub fn spawn_position<R: Rng>(rng: &mut R, arena: &Arena, player: Vec3, enemies: &[Enemy]) -> Option<Vec3> {
    let margin = ENEMY_CORE_RADIUS + 0.45;
    let (left_min, left_max) = (-arena.half_x + margin, -arena.middle_half_thickness - margin);
    let (right_min, right_max) = (arena.middle_half_thickness + margin, arena.half_x - margin);
    let (z_min, z_max) = (-arena.half_z + margin, arena.half_z - margin);

    for _ in 0..ENEMY_SPAWN_ATTEMPTS {
        let (x_min, x_max) = if rng.random_bool(0.5) {
            (left_min, left_max)
        } else {
            (right_min, right_max)
        };
        let x = x_min + (x_max - x_min) * rng.random::<f32>();
        let z = z_min + (z_max - z_min) * rng.random::<f32>();
        let candidate = Vec3::new(x, ENEMY_BASE_Y, z);
        if candidate.distance(player) < 4.5 {
            continue;
        }
        if enemies.iter().any(|e| candidate.distance(e.position) < 2.2) {
            continue;
        }
        return Some(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::portal::PortalPair;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Recorder {
        requests: usize,
    }

    impl EnemyDirector for Recorder {
        fn request_path(&mut self, _from: Vec3, to: Vec3) -> Vec<Vec3> {
            self.requests += 1;
            vec![to]
        }
    }

    #[test]
    fn test_damage_then_death() {
        let mut enemy = Enemy::new(1, Vec3::new(0.0, ENEMY_BASE_Y, 0.0));
        for _ in 0..4 {
            assert_eq!(enemy.take_damage(ENEMY_BALL_DAMAGE), DamageOutcome::Hurt);
        }
        assert_eq!(enemy.take_damage(ENEMY_BALL_DAMAGE), DamageOutcome::Killed);
        assert!(!enemy.alive);
        assert_eq!(enemy.take_damage(ENEMY_BALL_DAMAGE), DamageOutcome::Ignored);
    }

    #[test]
    fn test_dead_enemy_finishes_after_fall_and_fade() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut director = DirectPath::default();
        let mut enemies = vec![Enemy::new(1, Vec3::new(-9.0, ENEMY_BASE_Y, 0.0))];
        enemies[0].take_damage(ENEMY_MAX_HEALTH);
        for _ in 0..130 {
            step_enemies(&mut enemies, Vec3::ZERO, &stage, &Tuning::default(), &mut director, 1.0 / 60.0);
        }
        assert!(enemies[0].is_finished());
        assert_eq!(enemies[0].opacity(), 0.0);
    }

    #[test]
    fn test_enemy_walks_toward_player() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut director = Recorder { requests: 0 };
        let mut enemies = vec![Enemy::new(1, Vec3::new(-14.0, ENEMY_BASE_Y, 0.0))];
        let player = Vec3::new(-4.0, EYE_HEIGHT, 0.0);
        for _ in 0..60 {
            step_enemies(&mut enemies, player, &stage, &Tuning::default(), &mut director, 1.0 / 60.0);
        }
        assert!(enemies[0].position.x > -14.0);
        assert_eq!(director.requests, 1);
    }

    #[test]
    fn test_enemy_fires_when_cooldown_expires() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut director = DirectPath::default();
        let mut enemies = vec![Enemy::new(7, Vec3::new(-9.0, ENEMY_BASE_Y, 0.0))];
        enemies[0].shoot_cooldown = 0.0;
        let shots = step_enemies(
            &mut enemies,
            Vec3::new(-9.0, EYE_HEIGHT, 6.0),
            &stage,
            &Tuning::default(),
            &mut director,
            1.0 / 60.0,
        );
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].shooter, 7);
        assert!(shots[0].direction.z > 0.9);
        assert_eq!(enemies[0].shoot_cooldown, ENEMY_PROJECTILE_COOLDOWN);
    }

    #[test]
    fn test_head_on_enemies_hold_apart() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut director = DirectPath::default();
        let mut enemies = vec![
            Enemy::new(1, Vec3::new(-10.0, ENEMY_BASE_Y, 0.0)),
            Enemy::new(2, Vec3::new(-8.5, ENEMY_BASE_Y, 0.0)),
        ];
        enemies[0].velocity = Vec3::new(8.0, 0.0, 0.0);
        enemies[1].velocity = Vec3::new(-8.0, 0.0, 0.0);
        let player = Vec3::new(-9.0, EYE_HEIGHT, 8.0);

        step_enemies(&mut enemies, player, &stage, &Tuning::default(), &mut director, 1.0 / 60.0);
        assert_eq!(enemies[0].position.x, -10.0);
        assert_eq!(enemies[1].position.x, -8.5);
        assert!(enemies[0].velocity.x < 8.0 && enemies[1].velocity.x > -8.0);
        assert!(!boxes_overlap(enemies[0].position, enemies[1].position));
    }

    #[test]
    fn test_dead_enemy_does_not_block() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut director = DirectPath::default();
        let mut enemies = vec![
            Enemy::new(1, Vec3::new(-10.0, ENEMY_BASE_Y, 0.0)),
            Enemy::new(2, Vec3::new(-8.5, ENEMY_BASE_Y, 0.0)),
        ];
        enemies[0].velocity = Vec3::new(8.0, 0.0, 0.0);
        enemies[1].take_damage(ENEMY_MAX_HEALTH);
        step_enemies(&mut enemies, Vec3::new(-9.0, EYE_HEIGHT, 8.0), &stage, &Tuning::default(), &mut director, 1.0 / 60.0);
        assert!(enemies[0].position.x > -10.0);
    }

    #[test]
    fn test_enemy_stays_out_of_middle_wall() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        let mut enemy = Enemy::new(1, Vec3::new(-0.2, ENEMY_BASE_Y, 5.0));
        resolve_enemy_walls(&mut enemy, Vec3::X, &stage, &Tuning::default(), 1.0 / 60.0);
        assert!((enemy.position.x + (MIDDLE_WALL_HALF_THICKNESS + ENEMY_CORE_RADIUS)).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_respects_distances() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let player = Vec3::new(-11.0, EYE_HEIGHT, 5.8);
        let existing = vec![Enemy::new(1, Vec3::new(-9.0, ENEMY_BASE_Y, 0.0))];
        for _ in 0..50 {
            let pos = spawn_position(&mut rng, &arena, player, &existing).expect("spawn");
            assert!(pos.distance(player) >= 4.5);
            assert!(pos.distance(existing[0].position) >= 2.2);
            assert!(!arena.is_blocked(pos, ENEMY_CORE_RADIUS));
        }
    }

    proptest! {
        #[test]
        fn prop_enemies_never_move_into_each_other(
            ax in -15.0f32..-3.0,
            az in -6.0f32..6.0,
            dx in -3.0f32..3.0,
            dz in -3.0f32..3.0,
            va in prop::array::uniform2(-12.0f32..12.0),
            vb in prop::array::uniform2(-12.0f32..12.0),
        ) {
            let a = Vec3::new(ax, ENEMY_BASE_Y, az);
            let b = a + Vec3::new(dx, 0.0, dz);
            prop_assume!(!boxes_overlap(a, b));
            prop_assume!(b.x > -15.5 && b.x < -2.5 && b.z.abs() < 6.5);

            let arena = Arena::default();
            let portals = PortalPair::default();
            let stage = Stage::new(&arena, &portals);
            let mut director = DirectPath::default();
            let mut enemies = vec![Enemy::new(1, a), Enemy::new(2, b)];
            enemies[0].velocity = Vec3::new(va[0], 0.0, va[1]);
            enemies[1].velocity = Vec3::new(vb[0], 0.0, vb[1]);
            let player = Vec3::new(-9.0, EYE_HEIGHT, 0.0);
            for _ in 0..5 {
                step_enemies(&mut enemies, player, &stage, &Tuning::default(), &mut director, 1.0 / 60.0);
                prop_assert!(!boxes_overlap(enemies[0].position, enemies[1].position));
            }
        }
    }
}
