//! Straight-line projectiles: portal gun shots and enemy bolts

use glam::Vec3;

use super::body::{Projectile, ProjectileKind, push_capped};
use super::enemy::BoltShot;
use super::geometry::{Stage, WorldQuery};
use super::placement::{PlacementEffect, compute_placement, start_effect};
use super::player::Player;
use super::portal::PortalId;
use crate::consts::*;

/// Launch a portal shot from the eye along `look`
pub fn fire_portal_shot(shots: &mut Vec<Projectile>, id: u32, portal: PortalId, eye: Vec3, look: Vec3) {
    let Some(dir) = look.try_normalize() else {
        return;
    };
    let origin = eye + dir * PORTAL_PROJECTILE_SPAWN_OFFSET;
    push_capped(shots, Projectile::portal_shot(id, portal, origin, dir), PORTAL_PROJECTILE_MAX);
}

/// Launch an enemy bolt
pub fn fire_enemy_bolt(bolts: &mut Vec<Projectile>, id: u32, shot: &BoltShot) {
    push_capped(
        bolts,
        Projectile::enemy_bolt(id, shot.origin, shot.direction),
        ENEMY_PROJECTILE_MAX,
    );
}

/// Advance portal shots. A shot that strikes an existing portal opening is
/// consumed; one that hits a wall feeds the placement solver and is
/// consumed. Returns the portals whose placement effect started.
pub fn update_portal_shots(
    shots: &mut Vec<Projectile>,
    effects: &mut Vec<PlacementEffect>,
    stage: &Stage<'_>,
    viewer_yaw: f32,
    dt: f32,
) -> Vec<PortalId> {
    let mut started = Vec::new();
    shots.retain_mut(|shot| {
        let ProjectileKind::PortalShot(portal) = shot.kind else {
            return false;
        };
        shot.life -= dt;
        if shot.life <= 0.0 {
            return false;
        }
        let prev = shot.body.advance(dt);
        let cur = shot.body.position;
        if !shot.body.is_finite() || stage.strikes_portal(prev, cur, shot.body.radius) {
            return false;
        }
        if let Some(hit) = stage.wall_hit(prev, cur, shot.body.radius) {
            let candidate = compute_placement(portal, &hit, stage.portals, stage.arena, viewer_yaw);
            if candidate.is_some_and(|candidate| start_effect(effects, portal, candidate)) {
                started.push(portal);
            }
            return false;
        }
        !stage.is_blocked(cur, shot.body.radius)
    });
    started
}

/// Advance enemy bolts, damaging the player on contact. A bolt is spent on
/// any wall its step sweeps through. Returns the number of hits.
pub fn update_enemy_bolts(bolts: &mut Vec<Projectile>, stage: &Stage<'_>, player: &mut Player, dt: f32) -> u32 {
    let mut hits = 0;
    let hit_dist = ENEMY_PROJECTILE_RADIUS + PLAYER_RADIUS;
    bolts.retain_mut(|bolt| {
        bolt.life -= dt;
        if bolt.life <= 0.0 {
            return false;
        }
        let prev = bolt.body.advance(dt);
        let cur = bolt.body.position;
        if !bolt.body.is_finite()
            || stage.wall_hit(prev, cur, bolt.body.radius).is_some()
            || stage.is_blocked(cur, bolt.body.radius)
        {
            return false;
        }
        if bolt.body.position.distance_squared(player.position) <= hit_dist * hit_dist {
            player.take_hit(ENEMY_PROJECTILE_DAMAGE);
            hits += 1;
            return false;
        }
        true
    });
    hits
}
