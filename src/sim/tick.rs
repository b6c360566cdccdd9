//! Per-frame simulation step
//!
//! Advances a `World` by one variable-length frame. Deltas are clamped, so
//! a long hitch slows the game down instead of tunnelling bodies.

use glam::Vec2;

use super::collision::{integrate_ball, resolve_ball_enemies, resolve_ball_pairs, resolve_ball_walls};
use super::enemy::{DamageOutcome, EnemyDirector, step_enemies};
use super::geometry::Stage;
use super::placement::update_effects;
use super::projectile::{fire_enemy_bolt, update_enemy_bolts, update_portal_shots};
use super::state::{GameEvent, GameMode, GamePhase, MenuAction, World};
use super::transform::advance_ball_transit;
use crate::consts::*;

/// Input gathered for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// (strafe right, move backward), each in [-1, 1]
    pub move_axis: Vec2,
    /// (yaw, pitch) change in radians
    pub look_delta: Vec2,
    pub jump: bool,
    /// Left button: fire a ball, or a shot for portal A
    pub fire_primary: bool,
    /// Right button: a shot for portal B
    pub fire_secondary: bool,
    /// Wheel: toggle between ball and portal weapon
    pub switch_weapon: bool,
    /// Menu / flow action for this frame
    pub action: Option<MenuAction>,
}

/// Advance the world by one frame. Events of the frame are left in `world.events`.
pub fn update(world: &mut World, input: &FrameInput, dt: f32, director: &mut dyn EnemyDirector) {
    world.events.clear();
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

    if let Some(action) = input.action {
        world.apply_action(action);
    }
    if world.phase != GamePhase::Playing {
        return;
    }
    world.elapsed += dt;

    // Input
    if input.look_delta != Vec2::ZERO {
        world.player.look_by(input.look_delta.x, input.look_delta.y);
    }
    if input.jump {
        world.player.jump();
    }
    if input.switch_weapon {
        world.switch_weapon();
    }
    if input.fire_primary {
        world.fire_primary();
    }
    if input.fire_secondary {
        world.fire_secondary();
    }

    // Player
    let stage = Stage::new(&world.arena, &world.portals);
    if let Some(portal) = world.player.step(input.move_axis, &stage, &world.tuning, dt) {
        world.events.push(GameEvent::PlayerTeleported { portal });
    }

    update_balls(world, dt);

    // Portal shots
    let stage = Stage::new(&world.arena, &world.portals);
    for portal in update_portal_shots(&mut world.portal_shots, &mut world.effects, &stage, world.player.yaw, dt) {
        world.events.push(GameEvent::PlacementStarted { portal });
    }

    if world.mode == GameMode::Battle {
        let hits = update_enemy_bolts(&mut world.enemy_bolts, &stage, &mut world.player, dt);
        for _ in 0..hits {
            world.events.push(GameEvent::PlayerHit {
                damage: ENEMY_PROJECTILE_DAMAGE,
            });
        }
        if !world.player.is_alive() {
            world.apply_action(MenuAction::PlayerDied);
            notify_director(world, director);
            return;
        }

        world.spawn_timer += dt;
        while world.spawn_timer >= ENEMY_SPAWN_INTERVAL {
            world.spawn_timer -= ENEMY_SPAWN_INTERVAL;
            world.spawn_enemy();
        }
    }

    for portal in update_effects(&mut world.effects, &mut world.portals, dt) {
        world.events.push(GameEvent::PortalMounted { portal });
    }

    world.regen_reserve(dt);

    if world.mode == GameMode::Battle {
        update_enemies(world, director, dt);
    }

    notify_director(world, director);
}

/// Balls: flight, enemy hits, portal transit and walls, then ball pairs
fn update_balls(world: &mut World, dt: f32) {
    let stage = Stage::new(&world.arena, &world.portals);
    for ball in world.balls.iter_mut() {
        let prev = integrate_ball(ball, &world.tuning, dt);

        if let Some((enemy, outcome)) = resolve_ball_enemies(&mut ball.body, &mut world.enemies, &world.tuning) {
            match outcome {
                DamageOutcome::Hurt => world.events.push(GameEvent::EnemyDamaged {
                    enemy,
                    amount: ENEMY_BALL_DAMAGE,
                }),
                DamageOutcome::Killed => {
                    world.events.push(GameEvent::EnemyDamaged {
                        enemy,
                        amount: ENEMY_BALL_DAMAGE,
                    });
                    world.events.push(GameEvent::EnemyKilled { enemy });
                    world.kill_count += 1;
                }
                DamageOutcome::Ignored => {}
            }
        }

        if let Some(portal) = advance_ball_transit(ball, prev, dt, &world.portals) {
            world.events.push(GameEvent::BallTeleported { ball: ball.id, portal });
        }
        if !ball.in_transit() {
            resolve_ball_walls(&mut ball.body, &stage, &world.tuning);
        }
    }
    world.balls.retain(|ball| ball.body.is_finite());
    resolve_ball_pairs(&mut world.balls, &world.tuning);
}

/// Enemy locomotion and firing; finished corpses are removed
fn update_enemies(world: &mut World, director: &mut dyn EnemyDirector, dt: f32) {
    let stage = Stage::new(&world.arena, &world.portals);
    let shots = step_enemies(
        &mut world.enemies,
        world.player.position,
        &stage,
        &world.tuning,
        director,
        dt,
    );
    for shot in &shots {
        let id = world.next_entity_id();
        fire_enemy_bolt(&mut world.enemy_bolts, id, shot);
        world.events.push(GameEvent::EnemyFired { enemy: shot.shooter });
    }
    world.enemies.retain(|enemy| !enemy.is_finished());
}

fn notify_director(world: &World, director: &mut dyn EnemyDirector) {
    for event in &world.events {
        match *event {
            GameEvent::EnemyDamaged { enemy, amount } => director.notify_damage(enemy, amount),
            GameEvent::EnemyKilled { enemy } => director.notify_death(enemy),
            _ => {}
        }
    }
}
