//! First-person player controller

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::{Axis, FaceSide, Stage};
use super::portal::PortalId;
use super::transform::{PortalTransform, ViewAngles, detect_any_crossing};
use crate::approach_zero;
use crate::consts::*;
use crate::renderer::Camera;
use crate::settings::Tuning;

/// The player: an eye-height pivot with yaw, pitch and a transient roll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Eye position (the camera sits on the pivot)
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Non-zero only after teleporting between portals with mismatched up vectors
    pub roll: f32,
    /// Horizontal momentum kept through teleports, separate from input movement
    pub carry_velocity: Vec3,
    pub vertical_velocity: f32,
    pub on_ground: bool,
    pub teleport_cooldown: f32,
    pub health: f32,
    /// Remaining red flash after a hit
    pub hit_flash: f32,
    /// Remaining camera shake after a hit
    pub shake: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Vec3::from_array(PLAYER_START))
    }
}

impl Player {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            carry_velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            on_ground: true,
            teleport_cooldown: 0.0,
            health: PLAYER_MAX_HEALTH,
            hit_flash: 0.0,
            shake: 0.0,
        }
    }

    pub fn angles(&self) -> ViewAngles {
        ViewAngles {
            yaw: self.yaw,
            pitch: self.pitch,
            roll: self.roll,
        }
    }

    pub fn orientation(&self) -> Quat {
        self.angles().orientation()
    }

    /// Unit look direction
    pub fn look(&self) -> Vec3 {
        self.angles().look()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Viewer camera for a screen of the given aspect ratio
    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::perspective(self.position, self.orientation(), aspect)
    }

    /// Mouse look; pitch stops just short of straight up/down
    pub fn look_by(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn jump(&mut self) {
        if self.on_ground {
            self.vertical_velocity = JUMP_SPEED;
            self.on_ground = false;
        }
    }

    pub fn take_hit(&mut self, damage: f32) {
        self.health = (self.health - damage).max(0.0);
        self.hit_flash = PLAYER_HIT_FLASH_DURATION;
        self.shake = PLAYER_SHAKE_DURATION;
    }

    /// Advance one step. `move_axis` is (strafe right, move backward) in the
    /// player's yaw frame. Returns the portal entered, if the player teleported.
    pub fn step(&mut self, move_axis: Vec2, stage: &Stage<'_>, tuning: &Tuning, dt: f32) -> Option<PortalId> {
        let prev = self.position;

        if move_axis != Vec2::ZERO {
            let mut dir = Vec3::new(move_axis.x, 0.0, move_axis.y);
            if dir.length_squared() > 1.0 {
                dir = dir.normalize();
            }
            self.position += Quat::from_rotation_y(self.yaw) * dir * (MOVE_SPEED * dt);
        }

        let carry_speed = Vec2::new(self.carry_velocity.x, self.carry_velocity.z).length();
        if carry_speed > tuning.max_horizontal_speed {
            let scale = tuning.max_horizontal_speed / carry_speed;
            self.carry_velocity.x *= scale;
            self.carry_velocity.z *= scale;
        }
        self.position.x += self.carry_velocity.x * dt;
        self.position.z += self.carry_velocity.z * dt;

        self.vertical_velocity = (self.vertical_velocity + tuning.player_gravity * dt)
            .clamp(-tuning.max_vertical_speed, tuning.max_vertical_speed);
        self.position.y += self.vertical_velocity * dt;

        let over_hole = stage.over_floor_hole(self.position) || stage.passes_through_floor_hole(prev, self.position);
        if self.position.y <= EYE_HEIGHT && !over_hole {
            self.position.y = EYE_HEIGHT;
            self.vertical_velocity = 0.0;
            self.on_ground = true;
            self.carry_velocity *= tuning.landing_carry_decay;
        } else {
            self.on_ground = false;
        }

        self.clamp_to_outer_walls(prev, stage);
        self.clamp_to_middle_wall(prev, stage);

        let mut entered = None;
        if self.teleport_cooldown <= 0.0 {
            if let Some(crossing) =
                detect_any_crossing(stage.portals, prev, self.position, CAMERA_NEAR, PLAYER_PORTAL_PLANE_EPS)
            {
                let transform = stage.portals.transform(crossing.portal);
                self.apply_teleport(&transform, prev, tuning, dt);
                log::debug!(
                    "player teleported {} -> {}",
                    crossing.portal.as_str(),
                    crossing.portal.other().as_str()
                );
                entered = Some(crossing.portal);
            }
        }
        if self.teleport_cooldown > 0.0 {
            self.teleport_cooldown -= dt;
        }

        self.roll = approach_zero(self.roll, CAMERA_AUTO_LEVEL_SPEED * dt);
        self.hit_flash = (self.hit_flash - dt).max(0.0);
        self.shake = (self.shake - dt).max(0.0);
        entered
    }

    /// Carry the player through `transform`: position, view frame with roll,
    /// and this step's movement as momentum.
    fn apply_teleport(&mut self, transform: &PortalTransform, prev: Vec3, tuning: &Tuning, dt: f32) {
        let moved = self.position - prev;
        let angles = self.angles();
        self.position = transform.point(self.position);

        let view = ViewAngles::from_look_up(transform.direction(angles.look()), transform.direction(angles.up()));
        self.yaw = view.yaw;
        self.pitch = view.pitch;
        self.roll = view.roll;

        let move_len = moved.length();
        if move_len > 1e-6 && dt > 1e-6 {
            let velocity = transform.direction(moved / move_len) * (move_len / dt);
            self.carry_velocity = Vec3::new(velocity.x, 0.0, velocity.z);
            self.vertical_velocity = velocity.y.clamp(-tuning.max_vertical_speed, tuning.max_vertical_speed);
        }
        self.teleport_cooldown = PLAYER_TELEPORT_COOLDOWN;
    }

    fn clamp_to_outer_walls(&mut self, prev: Vec3, stage: &Stage<'_>) {
        let arena = stage.arena;
        let open = |pos: Vec3, face: FaceSide| {
            stage.in_wall_hole(pos, PLAYER_RADIUS, face) || stage.passes_through_wall_hole(prev, pos, PLAYER_RADIUS, face)
        };

        if self.position.x < -arena.half_x && !open(self.position, FaceSide::new(Axis::X, -arena.half_x, 1.0)) {
            self.position.x = -arena.half_x;
            self.carry_velocity.x = 0.0;
        } else if self.position.x > arena.half_x && !open(self.position, FaceSide::new(Axis::X, arena.half_x, -1.0)) {
            self.position.x = arena.half_x;
            self.carry_velocity.x = 0.0;
        }

        if self.position.z < -arena.half_z && !open(self.position, FaceSide::new(Axis::Z, -arena.half_z, 1.0)) {
            self.position.z = -arena.half_z;
            self.carry_velocity.z = 0.0;
        } else if self.position.z > arena.half_z && !open(self.position, FaceSide::new(Axis::Z, arena.half_z, -1.0)) {
            self.position.z = arena.half_z;
            self.carry_velocity.z = 0.0;
        }
    }

    /// The side of the dividing wall is the one the step started on, unless
    /// the step started inside the wall's thickness
    fn clamp_to_middle_wall(&mut self, prev: Vec3, stage: &Stage<'_>) {
        let arena = stage.arena;
        if !arena.middle_wall_blocks(self.position, PLAYER_RADIUS) {
            return;
        }
        let from = if prev.x.abs() >= arena.middle_half_thickness { prev.x } else { self.position.x };
        let side = if from >= 0.0 { 1.0 } else { -1.0 };
        let face = FaceSide::new(Axis::X, arena.middle_face_coord(from), side);
        if stage.in_wall_hole(self.position, PLAYER_RADIUS, face)
            || stage.passes_through_wall_hole(prev, self.position, PLAYER_RADIUS, face)
        {
            return;
        }
        self.position.x = side * (arena.middle_half_thickness + PLAYER_RADIUS);
        self.carry_velocity.x = 0.0;
    }
}
