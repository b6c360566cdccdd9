//! Portal placement solver
//!
//! Turns a portal shot's wall hit into a candidate mount, rejects candidates
//! that would overlap the other portal, and runs the short opening effect
//! that precedes every committed placement.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::{Arena, Axis, WallHit};
use super::portal::{PortalId, PortalPair, Pose, WallInfo};
use crate::consts::*;
use crate::{project_on_plane, signed_angle};

/// Tolerance on the face coordinate and plane distance for "same wall"
const SAME_FACE_TOLERANCE: f32 = 0.03;
/// Normals closer than this count as facing the same way
const SAME_FACING_DOT: f32 = 0.999;

/// A computed mount that has not been applied yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementCandidate {
    pub pose: Pose,
    /// Would overlap or crowd the other portal; never applied
    pub blocked: bool,
    pub wall: WallInfo,
}

/// Compute where `portal` would mount for a shot that hit `hit`.
///
/// Vertical faces take the face normal as the portal normal and clamp the
/// rectangle into the face extent. Floors and ceilings additionally turn the
/// portal so its top edge points along the viewer's yaw. Returns `None` for
/// non-finite input and for faces too small to hold a portal (door jambs,
/// the underside of the lintel).
pub fn compute_placement(
    portal: PortalId,
    hit: &WallHit,
    portals: &PortalPair,
    arena: &Arena,
    viewer_yaw: f32,
) -> Option<PlacementCandidate> {
    if !hit.point.is_finite() || !hit.normal.is_finite() {
        return None;
    }
    let face = &hit.face;
    if !face.fits_portal() {
        return None;
    }
    let (pose, wall) = if face.axis == Axis::Y {
        let rotation = floor_rotation(hit.normal, viewer_yaw);
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let extent_x = PORTAL_HALF_WIDTH * right.x.abs() + PORTAL_HALF_HEIGHT * up.x.abs();
        let extent_z = PORTAL_HALF_WIDTH * right.z.abs() + PORTAL_HALF_HEIGHT * up.z.abs();
        let px = clamp_within(hit.point.x, -arena.half_x + extent_x, arena.half_x - extent_x);
        let pz = clamp_within(hit.point.z, -arena.half_z + extent_z, arena.half_z - extent_z);
        let py = if hit.normal.y > 0.0 {
            PORTAL_SURFACE_LIFT
        } else {
            arena.height - PORTAL_SURFACE_LIFT
        };
        let position = Vec3::new(px, py, pz);
        (Pose::new(position, rotation), WallInfo::new(Axis::Y, py, hit.normal, position))
    } else {
        let rotation = Quat::from_rotation_y(hit.normal.x.atan2(hit.normal.z));
        let half_h = PORTAL_HALF_HEIGHT + PORTAL_EDGE_PADDING;
        let half_w = PORTAL_HALF_WIDTH + PORTAL_EDGE_PADDING;
        let py = clamp_within(hit.point.y, face.y_min + half_h, face.y_max - half_h);
        let h_lo = face.h_min + half_w;
        let h_hi = face.h_max - half_w;
        let position = match face.axis {
            Axis::X => {
                let px = if arena.is_middle_face(face.coord) {
                    face.coord
                } else {
                    face.coord.signum() * arena.visual_half_x
                };
                Vec3::new(px, py, clamp_within(hit.point.z, h_lo, h_hi))
            }
            _ => Vec3::new(clamp_within(hit.point.x, h_lo, h_hi), py, face.coord.signum() * arena.visual_half_z),
        };
        (
            Pose::new(position, rotation),
            WallInfo::new(face.axis, face.coord, hit.normal, position),
        )
    };
    if !pose.position.is_finite() || !pose.rotation.is_finite() {
        return None;
    }
    let blocked =
        too_close_to_other(portal, &wall, pose.position, portals) || would_overlap_other(portal, &pose, portals);
    Some(PlacementCandidate { pose, blocked, wall })
}

/// Clamp into `[min, max]`; a face narrower than the portal centers it
fn clamp_within(value: f32, min: f32, max: f32) -> f32 {
    if min > max { (min + max) * 0.5 } else { value.clamp(min, max) }
}

/// Lay the portal flat against a floor or ceiling with its top edge toward `yaw`
fn floor_rotation(normal: Vec3, yaw: f32) -> Quat {
    let base = Quat::from_rotation_arc(Vec3::Z, normal);
    let desired = project_on_plane(Quat::from_rotation_y(yaw) * Vec3::NEG_Z, normal)
        .try_normalize()
        .unwrap_or(Vec3::NEG_Z);
    let current = project_on_plane(base * Vec3::Y, normal)
        .try_normalize()
        .unwrap_or(Vec3::NEG_Z);
    let twist = Quat::from_axis_angle(normal, signed_angle(current, desired, normal));
    (twist * base).normalize()
}

/// Projection overlap of two rectangles sharing half sizes on one separating axis
pub fn ranges_overlap_on_axis(
    axis: Vec3,
    center_delta: Vec3,
    a: (Vec3, Vec3),
    b: (Vec3, Vec3),
    half_w: f32,
    half_h: f32,
) -> bool {
    let dist = center_delta.dot(axis).abs();
    let a_radius = half_w * axis.dot(a.0).abs() + half_h * axis.dot(a.1).abs();
    let b_radius = half_w * axis.dot(b.0).abs() + half_h * axis.dot(b.1).abs();
    dist <= a_radius + b_radius
}

/// Separating-axis overlap of `pose` against the other portal's current
/// rectangle, on the same facing wall only
pub fn would_overlap_other(portal: PortalId, pose: &Pose, portals: &PortalPair) -> bool {
    let other = &portals.get(portal.other()).pose;
    if pose.normal().dot(other.normal()) < SAME_FACING_DOT {
        return false;
    }
    if (pose.position - other.position).dot(other.normal()).abs() > SAME_FACE_TOLERANCE {
        return false;
    }
    let half_w = PORTAL_HALF_WIDTH + PORTAL_OVERLAP_PADDING;
    let half_h = PORTAL_HALF_HEIGHT + PORTAL_OVERLAP_PADDING;
    let a = (pose.right(), pose.up());
    let b = (other.right(), other.up());
    let delta = other.position - pose.position;
    [a.0, a.1, b.0, b.1]
        .into_iter()
        .all(|axis| ranges_overlap_on_axis(axis, delta, a, b, half_w, half_h))
}

/// Minimum-separation rule against the other portal's committed mount
pub fn too_close_to_other(portal: PortalId, wall: &WallInfo, position: Vec3, portals: &PortalPair) -> bool {
    let Some(other) = portals.get(portal.other()).wall else {
        return false;
    };
    if other.axis != wall.axis || other.side_key != wall.side_key {
        return false;
    }
    if (wall.coord - other.coord).abs() > SAME_FACE_TOLERANCE || wall.normal.dot(other.normal) <= SAME_FACING_DOT {
        return false;
    }
    let span_w = (PORTAL_HALF_WIDTH + PORTAL_SAME_WALL_BUFFER) * 2.0;
    let span_h = (PORTAL_HALF_HEIGHT + PORTAL_SAME_WALL_BUFFER) * 2.0;
    let delta = (position - other.position).abs();
    match wall.axis {
        Axis::X => delta.z <= span_w && delta.y <= span_h,
        Axis::Z => delta.x <= span_w && delta.y <= span_h,
        Axis::Y => position.distance(other.position) <= PORTAL_WIDTH + PORTAL_SAME_WALL_BUFFER,
    }
}

/// Opening animation that commits its placement when it completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementEffect {
    pub portal: PortalId,
    pub candidate: PlacementCandidate,
    pub elapsed: f32,
}

impl PlacementEffect {
    pub fn new(portal: PortalId, candidate: PlacementCandidate) -> Self {
        Self {
            portal,
            candidate,
            elapsed: 0.0,
        }
    }

    /// Normalized progress in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.elapsed / PORTAL_PLACE_EFFECT_DURATION).min(1.0)
    }

    pub fn scale(&self) -> f32 {
        let t = self.progress();
        PORTAL_PLACE_EFFECT_START_SCALE + (1.0 - PORTAL_PLACE_EFFECT_START_SCALE) * t
    }

    pub fn opacity(&self) -> f32 {
        (1.0 - self.progress()) * PORTAL_PLACE_EFFECT_OPACITY
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// Queue an opening effect. Blocked candidates are dropped; a newer effect
/// for the same portal replaces the pending one.
pub fn start_effect(effects: &mut Vec<PlacementEffect>, portal: PortalId, candidate: PlacementCandidate) -> bool {
    if candidate.blocked {
        log::debug!("portal {} placement blocked", portal.as_str());
        return false;
    }
    effects.retain(|effect| effect.portal != portal);
    effects.push(PlacementEffect::new(portal, candidate));
    true
}

/// Advance all effects and mount the portals whose effect finished
pub fn update_effects(effects: &mut Vec<PlacementEffect>, portals: &mut PortalPair, dt: f32) -> Vec<PortalId> {
    let mut committed = Vec::new();
    effects.retain_mut(|effect| {
        effect.elapsed += dt;
        if !effect.is_complete() {
            return true;
        }
        portals.mount(effect.portal, effect.candidate.pose, effect.candidate.wall);
        log::info!(
            "portal {} mounted at ({:.2}, {:.2}, {:.2})",
            effect.portal.as_str(),
            effect.candidate.pose.position.x,
            effect.candidate.pose.position.y,
            effect.candidate.pose.position.z
        );
        committed.push(effect.portal);
        false
    });
    committed
}
