//! Portal transform and crossing detection
//!
//! T = destination * Ry(pi) * inverse(source). The half turn makes a body that
//! walks into the front of the source leave through the front of the
//! destination instead of backing out of it.

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec3};

use super::body::{Ball, Transit};
use super::portal::{Portal, PortalId, PortalPair, Pose};
use crate::consts::*;
use crate::{plane_crossing_t, project_on_plane, signed_angle};

/// Rigid map from the space in front of one portal to the space in front of its destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalTransform {
    matrix: Mat4,
    rotation: Quat,
}

impl PortalTransform {
    pub fn between(source: &Pose, destination: &Pose) -> Self {
        let flip = Quat::from_rotation_y(PI);
        Self {
            matrix: destination.matrix() * Mat4::from_quat(flip) * source.matrix().inverse(),
            rotation: (destination.rotation * flip * source.rotation.inverse()).normalize(),
        }
    }

    pub fn identity() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Rotate a direction or velocity; length is preserved
    pub fn direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    pub fn pose(&self, pose: &Pose) -> Pose {
        Pose::new(self.point(pose.position), (self.rotation * pose.rotation).normalize())
    }

    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.matrix.inverse(),
            rotation: self.rotation.inverse(),
        }
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &PortalTransform) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
            rotation: (next.rotation * self.rotation).normalize(),
        }
    }
}

/// A swept body touching a portal opening from the front
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub portal: PortalId,
    /// Interpolation parameter of the center-plane intersection
    pub t: f32,
    pub point: Vec3,
}

/// Swept crossing test of a sphere moving `prev -> cur` against one portal.
///
/// The plane counts as crossed once the center comes within `radius + plane_eps`
/// of it from either side; the movement must point in the entering direction
/// and the center-plane intersection must lie inside the opening inflated by
/// `radius`. Crossing the infinite plane beside the opening never counts.
pub fn detect_crossing(
    portal: &Portal,
    prev: Vec3,
    cur: Vec3,
    radius: f32,
    plane_eps: f32,
) -> Option<Crossing> {
    let pose = &portal.pose;
    let prev_side = pose.signed_distance(prev);
    let cur_side = pose.signed_distance(cur);
    let threshold = radius + plane_eps;
    let crossed = (prev_side > threshold && cur_side <= threshold)
        || (prev_side < -threshold && cur_side >= -threshold);
    let entering = (cur - prev).dot(pose.normal()) * portal.entry_sign < 0.0;
    if !crossed || !entering {
        return None;
    }
    let t = plane_crossing_t(prev_side, cur_side, 0.5);
    let point = prev.lerp(cur, t);
    pose.opening_contains(point, radius).then_some(Crossing {
        portal: portal.id,
        t,
        point,
    })
}

/// First portal of the pair crossed by the swept sphere
pub fn detect_any_crossing(
    portals: &PortalPair,
    prev: Vec3,
    cur: Vec3,
    radius: f32,
    plane_eps: f32,
) -> Option<Crossing> {
    portals
        .iter()
        .find_map(|portal| detect_crossing(portal, prev, cur, radius, plane_eps))
}

/// Yaw, pitch and roll of a camera whose look and up vectors are given in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl ViewAngles {
    /// Camera orientation: yaw about world Y, pitch about local X, roll about local Z
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch) * Quat::from_rotation_z(self.roll)
    }

    /// Recover angles from a (possibly tilted) look/up frame.
    ///
    /// Yaw and pitch come from the look vector alone; the roll is the signed
    /// angle between the up vector implied by yaw/pitch and the given up
    /// vector, both projected orthogonal to the look vector.
    pub fn from_look_up(look: Vec3, up: Vec3) -> Self {
        let look = look.try_normalize().unwrap_or(Vec3::NEG_Z);
        let yaw = (-look.x).atan2(-look.z);
        let pitch = look.y.clamp(-0.999, 0.999).asin();
        let base_up = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch) * Vec3::Y;
        let projected_base = project_on_plane(base_up, look);
        let projected_up = project_on_plane(up, look);
        let roll = if projected_base.length_squared() > 1e-8 && projected_up.length_squared() > 1e-8 {
            signed_angle(projected_up.normalize(), projected_base.normalize(), look)
        } else {
            0.0
        };
        Self { yaw, pitch, roll }
    }

    pub fn look(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }
}

/// Resolve a ball's portal throat state for this step.
///
/// A ball within contact distance of a portal face, moving toward it, with the
/// contact point inside the opening, enters transit. A ball in transit
/// teleports when its center crosses the portal plane inside the opening,
/// and drops out of transit when it drifts away or lingers too long.
/// Returns the portal passed through, if any.
pub fn advance_ball_transit(ball: &mut Ball, prev: Vec3, dt: f32, portals: &PortalPair) -> Option<PortalId> {
    if ball.teleport_cooldown > 0.0 {
        return None;
    }
    if ball.body.velocity.length() < 1e-4 {
        return None;
    }

    if let Some(transit) = ball.transit {
        if pass_through(ball, prev, transit.portal, portals) {
            return Some(transit.portal);
        }
        let source = portals.get(transit.portal);
        let elapsed = transit.elapsed + dt;
        let cur_side = source.pose.signed_distance(ball.body.position);
        let still_near = cur_side.abs() <= BALL_PORTAL_CONTACT_DISTANCE * 2.0
            && source.contains(ball.body.position, BALL_PORTAL_CONTACT_DISTANCE * 1.4);
        ball.transit = (still_near && elapsed <= BALL_PORTAL_TRANSIT_MAX_TIME).then_some(Transit {
            portal: transit.portal,
            elapsed,
        });
        return None;
    }

    let pos = ball.body.position;
    let move_delta = pos - prev;
    for portal in portals.iter() {
        let prev_side = portal.pose.signed_distance(prev);
        let cur_side = portal.pose.signed_distance(pos);
        let toward_face = move_delta.dot(portal.normal()) * portal.entry_sign < 0.0;
        let closest = prev_side.abs().min(cur_side.abs());
        if !toward_face || closest > BALL_PORTAL_CONTACT_DISTANCE {
            continue;
        }
        let t = ((prev_side.abs() + 1e-8) / (prev_side.abs() + cur_side.abs() + 1e-8)).clamp(0.0, 1.0);
        if !portal.contains(prev + move_delta * t, BALL_PORTAL_CONTACT_DISTANCE) {
            continue;
        }
        ball.transit = Some(Transit {
            portal: portal.id,
            elapsed: 0.0,
        });
        // Fast balls can reach the center plane on the step they make contact.
        if pass_through(ball, prev, portal.id, portals) {
            return Some(portal.id);
        }
        break;
    }
    None
}

/// Teleport `ball` if its center crossed `source`'s plane inside the opening
fn pass_through(ball: &mut Ball, prev: Vec3, source: PortalId, portals: &PortalPair) -> bool {
    let pose = &portals.get(source).pose;
    let pos = ball.body.position;
    let prev_side = pose.signed_distance(prev);
    let cur_side = pose.signed_distance(pos);
    let crossed_center = prev_side * cur_side <= 0.0 || cur_side.abs() <= 0.001;
    if !crossed_center || !pose.opening_contains(pos, 0.0) {
        return false;
    }

    let move_delta = pos - prev;
    let t = plane_crossing_t(prev_side, cur_side, 0.0);
    let transform = portals.transform(source);
    let hit = transform.point(prev + move_delta * t);
    let remaining = transform.direction(move_delta * (1.0 - t));
    let velocity = transform.direction(ball.body.velocity);
    let direction = velocity.try_normalize().unwrap_or(Vec3::ZERO);

    ball.body.position = hit + remaining + direction * BALL_PORTAL_EXIT_PUSH;
    ball.body.velocity = velocity;
    ball.transit = None;
    ball.teleport_cooldown = BALL_PORTAL_COOLDOWN;
    log::debug!("ball {} passed through portal {}", ball.id, source.as_str());
    true
}
