//! Collision response for balls
//!
//! Balls are spheres bouncing off axis-aligned faces, hover enemies and each
//! other. Wall faces give way wherever a portal cuts a hole into them.

use glam::Vec3;

use super::body::{Ball, Body};
use super::enemy::{DamageOutcome, Enemy};
use super::geometry::{Axis, FaceSide, Stage};
use crate::consts::*;
use crate::settings::Tuning;

/// Scale the component of `velocity` tangential to `normal` by `friction`
#[inline]
pub fn apply_surface_friction(velocity: Vec3, normal: Vec3, friction: f32) -> Vec3 {
    let normal_part = normal * velocity.dot(normal);
    normal_part + (velocity - normal_part) * friction
}

/// Gravity, drag and free flight for one step. Returns the previous position.
pub fn integrate_ball(ball: &mut Ball, tuning: &Tuning, dt: f32) -> Vec3 {
    if ball.teleport_cooldown > 0.0 {
        ball.teleport_cooldown -= dt;
    }
    let body = &mut ball.body;
    body.velocity.y += tuning.ball_gravity * dt;
    body.velocity *= tuning.ball_air_drag;
    body.advance(dt)
}

/// Bounce a ball off the first live enemy it overlaps and knock that enemy back.
/// Returns the enemy hit and what the hit did to it.
pub fn resolve_ball_enemies(body: &mut Body, enemies: &mut [Enemy], tuning: &Tuning) -> Option<(u32, DamageOutcome)> {
    let hit_dist = body.radius + ENEMY_CORE_RADIUS;
    for enemy in enemies.iter_mut().filter(|e| e.alive) {
        let delta = body.position - enemy.position;
        let dist_sq = delta.length_squared();
        if dist_sq <= 1e-8 || dist_sq >= hit_dist * hit_dist {
            continue;
        }
        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        body.position += normal * (hit_dist - dist + 0.001);

        let speed_along = body.velocity.dot(normal);
        if speed_along < 0.0 {
            body.velocity -= normal * (tuning.enemy_ball_bounce * speed_along);
        }
        let strength = (-speed_along).max(0.0);
        enemy.position -= normal * tuning.enemy_immediate_push;
        enemy.velocity -= normal * (strength * tuning.enemy_knockback_scale);
        let outcome = enemy.take_damage(ENEMY_BALL_DAMAGE);
        return Some((enemy.id, outcome));
    }
    None
}

/// Clamp a ball inside the floor, ceiling, outer walls and dividing wall,
/// bouncing off each face it touches. Portal holes in a wall let the ball through.
pub fn resolve_ball_walls(body: &mut Body, stage: &Stage<'_>, tuning: &Tuning) {
    let arena = stage.arena;
    let r = body.radius;

    if body.position.y < r {
        body.position.y = r;
        bounce(body, Vec3::Y, tuning);
    } else if body.position.y > arena.height - r {
        body.position.y = arena.height - r;
        bounce(body, Vec3::NEG_Y, tuning);
    }

    if body.position.x < -arena.half_x + r {
        if !stage.in_wall_hole(body.position, r, FaceSide::new(Axis::X, -arena.half_x, 1.0)) {
            body.position.x = -arena.half_x + r;
            bounce(body, Vec3::X, tuning);
        }
    } else if body.position.x > arena.half_x - r
        && !stage.in_wall_hole(body.position, r, FaceSide::new(Axis::X, arena.half_x, -1.0))
    {
        body.position.x = arena.half_x - r;
        bounce(body, Vec3::NEG_X, tuning);
    }

    if body.position.z < -arena.half_z + r {
        if !stage.in_wall_hole(body.position, r, FaceSide::new(Axis::Z, -arena.half_z, 1.0)) {
            body.position.z = -arena.half_z + r;
            bounce(body, Vec3::Z, tuning);
        }
    } else if body.position.z > arena.half_z - r
        && !stage.in_wall_hole(body.position, r, FaceSide::new(Axis::Z, arena.half_z, -1.0))
    {
        body.position.z = arena.half_z - r;
        bounce(body, Vec3::NEG_Z, tuning);
    }

    if arena.middle_wall_blocks(body.position, r) {
        let side = if body.position.x >= 0.0 { 1.0 } else { -1.0 };
        let face = FaceSide::new(Axis::X, arena.middle_face_coord(body.position.x), side);
        if !stage.in_wall_hole(body.position, r, face) {
            body.position.x = side * (arena.middle_half_thickness + r);
            bounce(body, Vec3::X * side, tuning);
        }
    }
}

/// Reflect the velocity component heading into a face with outward `normal`
fn bounce(body: &mut Body, normal: Vec3, tuning: &Tuning) {
    let into = body.velocity.dot(normal);
    if into < 0.0 {
        body.velocity -= normal * (into * (1.0 + tuning.ball_bounce));
    }
    body.velocity = apply_surface_friction(body.velocity, normal, tuning.ball_friction);
}

/// Equal-mass sphere collision: split the overlap, then exchange impulse
/// along the contact normal unless the balls are already separating
pub fn resolve_ball_pair(a: &mut Body, b: &mut Body, tuning: &Tuning) -> bool {
    let delta = b.position - a.position;
    let dist_sq = delta.length_squared();
    let min_dist = a.radius + b.radius;
    if dist_sq <= 1e-8 || dist_sq > min_dist * min_dist {
        return false;
    }
    let dist = dist_sq.sqrt();
    let normal = delta / dist;
    let overlap = min_dist - dist;
    a.position -= normal * (overlap * 0.5);
    b.position += normal * (overlap * 0.5);

    let rel_along = (b.velocity - a.velocity).dot(normal);
    if rel_along > 0.0 {
        return true;
    }
    let j = -(1.0 + tuning.ball_restitution) * rel_along * 0.5;
    a.velocity -= normal * j;
    b.velocity += normal * j;
    a.velocity = apply_surface_friction(a.velocity, normal, tuning.ball_friction);
    b.velocity = apply_surface_friction(b.velocity, normal, tuning.ball_friction);
    true
}

/// Resolve every ball pair once, in list order
pub fn resolve_ball_pairs(balls: &mut [Ball], tuning: &Tuning) {
    for i in 0..balls.len() {
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            resolve_ball_pair(&mut a.body, &mut b.body, tuning);
        }
    }
}
