//! Portal Arena - a first-person arena game built around two linked portals
//!
//! Core modules:
//! - `sim`: Simulation (world query, portals, crossing, sphere physics, placement)
//! - `renderer`: Recursive portal render orchestration over a scene backend
//! - `settings`: Quality preset and tuning loaded from JSON
//! - `hud`: Read-only per-frame snapshot for the HUD collaborator

pub mod hud;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use hud::{HudSink, HudSnapshot};
pub use settings::{QualityPreset, Settings, SettingsError, Tuning};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    use std::f32::consts::PI;

    /// Longest simulated step per frame; hitches are not caught up
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Portal opening size (local XY, normal along local +Z)
    pub const PORTAL_WIDTH: f32 = 2.8;
    pub const PORTAL_HEIGHT: f32 = 4.0;
    pub const PORTAL_HALF_WIDTH: f32 = PORTAL_WIDTH * 0.5;
    pub const PORTAL_HALF_HEIGHT: f32 = PORTAL_HEIGHT * 0.5;

    /// Render target side length bounds
    pub const PORTAL_RT_MIN: u32 = 128;
    pub const PORTAL_RT_MAX: u32 = 4096;
    /// Near/far distance bands for the resolution falloff, per recursion level
    pub const PORTAL_RT_BANDS: [(f32, f32); 3] = [(2.0, 28.0), (4.0, 56.0), (8.0, 72.0)];
    /// Far plane of every portal camera
    pub const PORTAL_CAMERA_FAR: f32 = 1000.0;
    /// Smallest near plane of an off-axis portal camera
    pub const PORTAL_CAMERA_MIN_NEAR: f32 = 0.02;

    /// Arena dimensions (inner collision extents)
    pub const WORLD_HALF_X: f32 = 17.7;
    pub const WORLD_HALF_Z: f32 = 8.7;
    pub const ROOM_HEIGHT: f32 = 10.0;
    /// Visible outer wall faces (portals mount flush with these)
    pub const VISUAL_OUTER_WALL_HALF_X: f32 = 17.9;
    pub const VISUAL_OUTER_WALL_HALF_Z: f32 = 8.9;
    /// Dividing wall at x = 0 with a door cut out around z = 0
    pub const MIDDLE_WALL_HALF_THICKNESS: f32 = 0.1;
    pub const DOOR_WIDTH: f32 = 3.2;
    pub const DOOR_HEIGHT: f32 = 4.2;

    /// Default portal poses (position, yaw)
    pub const PORTAL_A_HOME: ([f32; 3], f32) = ([-9.0, 2.0, -8.5], 0.0);
    pub const PORTAL_B_HOME: ([f32; 3], f32) = ([17.5, 2.0, 0.0], -PI / 2.0);

    /// Player
    pub const EYE_HEIGHT: f32 = 1.7;
    pub const PLAYER_START: [f32; 3] = [-11.0, EYE_HEIGHT, 5.8];
    pub const PLAYER_RADIUS: f32 = 0.35;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const GRAVITY: f32 = -24.0;
    pub const MOVE_SPEED: f32 = 6.0;
    pub const MAX_PLAYER_HORIZONTAL_SPEED: f32 = MOVE_SPEED * 4.0;
    pub const MAX_PLAYER_VERTICAL_SPEED: f32 = MOVE_SPEED * 4.0;
    pub const JUMP_SPEED: f32 = 8.5;
    /// Carry velocity is multiplied by this on every grounded step
    pub const LANDING_CARRY_DECAY: f32 = 0.85;
    pub const MAX_PITCH: f32 = PI / 2.0 - 0.01;
    /// Roll re-levels at this angular rate (rad/s)
    pub const CAMERA_AUTO_LEVEL_SPEED: f32 = 300.0 * PI / 180.0;
    /// Camera near plane, doubles as the player's crossing sphere
    pub const CAMERA_NEAR: f32 = 0.1;
    pub const CAMERA_FOV_Y: f32 = 75.0 * PI / 180.0;
    pub const PLAYER_PORTAL_PLANE_EPS: f32 = 0.02;
    pub const PLAYER_TELEPORT_COOLDOWN: f32 = 0.2;
    pub const PLAYER_HIT_FLASH_DURATION: f32 = 0.18;
    pub const PLAYER_SHAKE_DURATION: f32 = 0.24;

    /// Balls
    pub const BALL_RADIUS: f32 = 0.23;
    pub const BALL_SHOOT_SPEED: f32 = 18.0;
    pub const BALL_SPAWN_OFFSET: f32 = 0.8;
    pub const BALL_MAX_COUNT: usize = 20;
    pub const BALL_BOUNCE: f32 = 0.62;
    pub const BALL_FRICTION: f32 = 0.84;
    pub const BALL_AIR_DRAG: f32 = 0.995;
    pub const BALL_RESTITUTION: f32 = 0.86;
    pub const BALL_GRAVITY: f32 = -18.0;
    pub const BALL_PORTAL_COOLDOWN: f32 = 0.08;
    pub const BALL_PORTAL_CONTACT_DISTANCE: f32 = BALL_RADIUS * 1.01;
    pub const BALL_PORTAL_TRANSIT_MAX_TIME: f32 = 0.3;
    pub const BALL_PORTAL_EXIT_PUSH: f32 = 0.02;
    pub const BALL_RESERVE_MAX: u32 = 5;
    pub const BALL_RESERVE_REGEN_SECONDS: f32 = 1.0;

    /// Portal gun shots
    pub const PORTAL_PROJECTILE_RADIUS: f32 = 0.08;
    pub const PORTAL_PROJECTILE_SPEED: f32 = 36.0;
    pub const PORTAL_PROJECTILE_MAX: usize = 40;
    pub const PORTAL_PROJECTILE_LIFETIME: f32 = 2.5;
    pub const PORTAL_PROJECTILE_SPAWN_OFFSET: f32 = 0.55;

    /// Placement
    pub const PORTAL_OVERLAP_PADDING: f32 = 0.06;
    /// Gap kept between a wall portal's rectangle and the edges of its face
    pub const PORTAL_EDGE_PADDING: f32 = 0.06;
    pub const PORTAL_SAME_WALL_BUFFER: f32 = 0.08;
    pub const PORTAL_PLACE_EFFECT_DURATION: f32 = 0.16;
    pub const PORTAL_PLACE_EFFECT_START_SCALE: f32 = 0.18;
    pub const PORTAL_PLACE_EFFECT_OPACITY: f32 = 0.85;
    /// Gap between a floor/ceiling portal and its surface
    pub const PORTAL_SURFACE_LIFT: f32 = PORTAL_PROJECTILE_RADIUS + 0.003;

    /// Enemies
    pub const ENEMY_BASE_Y: f32 = 2.2;
    pub const ENEMY_CORE_RADIUS: f32 = 0.7;
    pub const ENEMY_FIRST_SPAWN: [f32; 3] = [-9.0, ENEMY_BASE_Y, 0.0];
    pub const ENEMY_MAX_HEALTH: f32 = 100.0;
    pub const ENEMY_BALL_DAMAGE: f32 = 20.0;
    pub const ENEMY_DAMAGE_DURATION: f32 = 0.14;
    pub const ENEMY_KNOCKBACK_SCALE: f32 = 0.48;
    pub const ENEMY_IMMEDIATE_PUSH: f32 = 0.48;
    pub const ENEMY_BALL_BOUNCE: f32 = 1.25;
    pub const ENEMY_FOLLOW_DISTANCE: f32 = 4.0;
    pub const ENEMY_FOLLOW_ACCEL: f32 = 8.0;
    pub const ENEMY_DOOR_EPS: f32 = 0.024;
    pub const ENEMY_GRID_SIZE: f32 = 0.4;
    pub const ENEMY_PATH_REPLAN_INTERVAL: f32 = 2.0;
    pub const ENEMY_DEATH_FALL_TIME: f32 = 1.0;
    pub const ENEMY_DEATH_FADE_TIME: f32 = 1.0;
    pub const ENEMY_MAX_ACTIVE_COUNT: usize = 5;
    pub const ENEMY_SPAWN_INTERVAL: f32 = 10.0;
    pub const ENEMY_SPAWN_ATTEMPTS: usize = 24;

    /// Enemy bolts
    pub const ENEMY_PROJECTILE_RADIUS: f32 = 0.12;
    pub const ENEMY_PROJECTILE_SPEED: f32 = 12.0;
    pub const ENEMY_PROJECTILE_DAMAGE: f32 = 10.0;
    pub const ENEMY_PROJECTILE_COOLDOWN: f32 = 5.0;
    pub const ENEMY_PROJECTILE_LIFETIME: f32 = 6.0;
    pub const ENEMY_PROJECTILE_MAX: usize = 48;
}

/// Remove the component of `v` along the unit vector `normal`
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Signed angle from `from` to `to` around `axis` (all assumed orthogonal to `axis`)
#[inline]
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    axis.dot(from.cross(to)).atan2(from.dot(to).clamp(-1.0, 1.0))
}

/// Step `value` toward zero by at most `step`
#[inline]
pub fn approach_zero(value: f32, step: f32) -> f32 {
    if value.abs() <= step {
        0.0
    } else {
        value - value.signum() * step
    }
}

/// Interpolation parameter where a segment with signed plane distances
/// `prev` and `cur` crosses the plane, clamped to [0, 1]
#[inline]
pub fn plane_crossing_t(prev: f32, cur: f32, degenerate: f32) -> f32 {
    let denom = prev - cur;
    let t = if denom.abs() < 1e-8 { degenerate } else { prev / denom };
    t.clamp(0.0, 1.0)
}
