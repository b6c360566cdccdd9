//! Static arena geometry and world queries
//!
//! Two rooms split by a thin wall at x = 0 with a door cut into it. Every
//! predicate here is pure: it reads the arena and the current portal poses
//! and never mutates anything.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::portal::{PortalId, PortalPair, Pose};
use crate::consts::*;
use crate::plane_crossing_t;

/// World axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// One side of an axis-aligned wall: its plane coordinate and the outward
/// normal pointing into the space the body is in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSide {
    pub axis: Axis,
    pub coord: f32,
    pub normal: Vec3,
}

impl FaceSide {
    /// `outward` gives the sign of the normal along `axis`
    pub fn new(axis: Axis, coord: f32, outward: f32) -> Self {
        let sign = if outward < 0.0 { -1.0 } else { 1.0 };
        Self {
            axis,
            coord,
            normal: axis.unit() * sign,
        }
    }

    /// Whether a portal at `pose` is mounted on this side of the wall
    fn holds(&self, pose: &Pose) -> bool {
        (self.axis.component(pose.position) - self.coord).abs() <= WALL_COORD_TOLERANCE
            && pose.normal().dot(self.normal) >= NORMAL_AXIS_THRESHOLD
    }
}

/// A finite, axis-aligned wall face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallFace {
    pub axis: Axis,
    /// Face coordinate along `axis`
    pub coord: f32,
    /// Horizontal extent (z for X faces, x otherwise)
    pub h_min: f32,
    pub h_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl WallFace {
    /// Whether `point` falls within the face's extent grown by `margin` on
    /// every edge. Horizontal faces only bound x.
    pub fn contains_within(&self, point: Vec3, margin: f32) -> bool {
        let horizontal = if self.axis == Axis::X { point.z } else { point.x };
        let in_h = (self.h_min - margin..=self.h_max + margin).contains(&horizontal);
        if self.axis == Axis::Y {
            return in_h;
        }
        in_h && (self.y_min - margin..=self.y_max + margin).contains(&point.y)
    }

    /// Whether a padded portal rectangle fits on the face at all
    pub fn fits_portal(&self) -> bool {
        let wide = self.h_max - self.h_min >= 2.0 * (PORTAL_HALF_WIDTH + PORTAL_EDGE_PADDING);
        if self.axis == Axis::Y {
            return wide;
        }
        wide && self.y_max - self.y_min >= 2.0 * (PORTAL_HALF_HEIGHT + PORTAL_EDGE_PADDING)
    }

    pub fn is_vertical(&self) -> bool {
        self.axis != Axis::Y
    }
}

/// Nearest swept hit against a wall face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Interpolation parameter along the swept segment
    pub t: f32,
    pub point: Vec3,
    /// Outward normal of the face that was hit
    pub normal: Vec3,
    pub face: WallFace,
}

/// Collision queries the simulation needs from the world
pub trait WorldQuery {
    /// Whether a sphere at `point` touches any wall, floor, ceiling or door frame
    fn is_blocked(&self, point: Vec3, radius: f32) -> bool;
    /// Whether `point` lies inside `portal`'s opening inflated by `radius`
    fn is_in_portal_opening(&self, portal: PortalId, point: Vec3, radius: f32) -> bool;
    /// First wall face crossed by a sphere moving from `prev` to `cur`
    fn wall_hit(&self, prev: Vec3, cur: Vec3, radius: f32) -> Option<WallHit>;
}

/// Fixed room layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub half_x: f32,
    pub half_z: f32,
    pub height: f32,
    pub visual_half_x: f32,
    pub visual_half_z: f32,
    pub middle_half_thickness: f32,
    pub door_width: f32,
    pub door_height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            half_x: WORLD_HALF_X,
            half_z: WORLD_HALF_Z,
            height: ROOM_HEIGHT,
            visual_half_x: VISUAL_OUTER_WALL_HALF_X,
            visual_half_z: VISUAL_OUTER_WALL_HALF_Z,
            middle_half_thickness: MIDDLE_WALL_HALF_THICKNESS,
            door_width: DOOR_WIDTH,
            door_height: DOOR_HEIGHT,
        }
    }
}

impl Arena {
    /// Whether a sphere overlaps the solid part of the dividing wall
    pub fn middle_wall_blocks(&self, point: Vec3, radius: f32) -> bool {
        let in_middle_x = point.x.abs() < self.middle_half_thickness + radius;
        let in_door_gap = point.z.abs() < self.door_width * 0.5 - radius;
        let below_door_top = point.y < self.door_height - radius;
        in_middle_x && !(in_door_gap && below_door_top)
    }

    pub fn is_blocked(&self, point: Vec3, radius: f32) -> bool {
        point.x <= -self.half_x + radius
            || point.x >= self.half_x - radius
            || point.z <= -self.half_z + radius
            || point.z >= self.half_z - radius
            || point.y <= radius
            || point.y >= self.height - radius
            || self.middle_wall_blocks(point, radius)
    }

    /// Face coordinate of the dividing wall on the side of `x`
    pub fn middle_face_coord(&self, x: f32) -> f32 {
        if x >= 0.0 {
            self.middle_half_thickness
        } else {
            -self.middle_half_thickness
        }
    }

    pub fn is_middle_face(&self, coord: f32) -> bool {
        coord.abs() <= self.middle_half_thickness + 1e-6
    }

    /// Whether the dividing wall leaves a clear line between `from` and `to`
    /// for a body of half size `half_size`
    pub fn line_of_sight(&self, from: Vec3, to: Vec3, half_size: f32) -> bool {
        if (from.x < 0.0) == (to.x < 0.0) || from.x == 0.0 || to.x == 0.0 {
            return true;
        }
        let t = -from.x / (to.x - from.x);
        if t <= 0.0 || t >= 1.0 {
            return true;
        }
        let at = from.lerp(to, t);
        let safe_door_half = (self.door_width * 0.5 - half_size - ENEMY_DOOR_EPS).max(0.0);
        at.z.abs() <= safe_door_half && at.y <= self.door_height - half_size - ENEMY_DOOR_EPS
    }

    /// Swept hit of a sphere of `radius` moving `prev -> next` against every face.
    /// The smallest `t` wins.
    pub fn wall_hit(&self, prev: Vec3, next: Vec3, radius: f32) -> Option<WallHit> {
        let mut best: Option<WallHit> = None;
        let y_min = radius;
        let y_max = self.height - radius;

        // Outer x walls span the whole room depth.
        let x_in = self.half_x - radius;
        if next.x > x_in && prev.x <= x_in {
            let t = (x_in - prev.x) / (next.x - prev.x);
            let face = self.outer_face(Axis::X, self.half_x, -self.half_z, self.half_z, radius);
            offer(&mut best, t, prev, next, Vec3::NEG_X, face, 0.0);
        }
        if next.x < -x_in && prev.x >= -x_in {
            let t = (-x_in - prev.x) / (next.x - prev.x);
            let face = self.outer_face(Axis::X, -self.half_x, -self.half_z, self.half_z, radius);
            offer(&mut best, t, prev, next, Vec3::X, face, 0.0);
        }

        // Outer z walls are split by the dividing wall.
        let z_in = self.half_z - radius;
        let crossings = [
            (next.z > z_in && prev.z <= z_in, z_in, self.half_z, Vec3::NEG_Z),
            (next.z < -z_in && prev.z >= -z_in, -z_in, -self.half_z, Vec3::Z),
        ];
        for (crossed, plane, coord, normal) in crossings {
            if !crossed {
                continue;
            }
            let t = (plane - prev.z) / (next.z - prev.z);
            let left = self.outer_face(Axis::Z, coord, -self.half_x, -self.middle_half_thickness, radius);
            let right = self.outer_face(Axis::Z, coord, self.middle_half_thickness, self.half_x, radius);
            offer(&mut best, t, prev, next, normal, left, 0.0);
            offer(&mut best, t, prev, next, normal, right, 0.0);
        }

        // Dividing wall faces. Edges reach out by the radius so a sphere
        // grazing a door corner still hits.
        let left_face = -self.middle_half_thickness - radius;
        let right_face = self.middle_half_thickness + radius;
        if next.x > left_face && prev.x <= left_face {
            let t = (left_face - prev.x) / (next.x - prev.x);
            if let Some(face) = self.middle_face_at(prev.lerp(next, t), false, radius) {
                offer(&mut best, t, prev, next, Vec3::NEG_X, face, radius);
            }
        }
        if next.x < right_face && prev.x >= right_face {
            let t = (right_face - prev.x) / (next.x - prev.x);
            if let Some(face) = self.middle_face_at(prev.lerp(next, t), true, radius) {
                offer(&mut best, t, prev, next, Vec3::X, face, radius);
            }
        }

        // Door jambs and the underside of the lintel.
        let door_half = self.door_width * 0.5;
        let jamb_plane = door_half - radius;
        let jambs = [
            (next.z < -jamb_plane && prev.z >= -jamb_plane, -jamb_plane, -door_half, Vec3::Z),
            (next.z > jamb_plane && prev.z <= jamb_plane, jamb_plane, door_half, Vec3::NEG_Z),
        ];
        for (crossed, plane, coord, normal) in jambs {
            if crossed {
                let t = (plane - prev.z) / (next.z - prev.z);
                offer(&mut best, t, prev, next, normal, self.jamb_face(coord, radius), radius);
            }
        }
        let lintel_plane = self.door_height - radius;
        if next.y > lintel_plane && prev.y <= lintel_plane {
            let t = (lintel_plane - prev.y) / (next.y - prev.y);
            if prev.lerp(next, t).z.abs() <= door_half {
                offer(&mut best, t, prev, next, Vec3::NEG_Y, self.lintel_underside(), radius);
            }
        }

        // Floor and ceiling.
        if next.y <= y_min && prev.y > y_min {
            let t = (y_min - prev.y) / (next.y - prev.y);
            offer(&mut best, t, prev, next, Vec3::Y, self.horizontal_face(0.0), 0.0);
        }
        if next.y >= y_max && prev.y < y_max {
            let t = (y_max - prev.y) / (next.y - prev.y);
            offer(&mut best, t, prev, next, Vec3::NEG_Y, self.horizontal_face(self.height), 0.0);
        }

        best
    }

    fn outer_face(&self, axis: Axis, coord: f32, h_min: f32, h_max: f32, radius: f32) -> WallFace {
        WallFace {
            axis,
            coord,
            h_min,
            h_max,
            y_min: radius,
            y_max: self.height - radius,
        }
    }

    fn horizontal_face(&self, coord: f32) -> WallFace {
        WallFace {
            axis: Axis::Y,
            coord,
            h_min: -self.half_x,
            h_max: self.half_x,
            y_min: coord,
            y_max: coord,
        }
    }

    /// Side face of a door column, across the wall's thickness
    fn jamb_face(&self, coord: f32, radius: f32) -> WallFace {
        WallFace {
            axis: Axis::Z,
            coord,
            h_min: -self.middle_half_thickness,
            h_max: self.middle_half_thickness,
            y_min: radius,
            y_max: self.door_height,
        }
    }

    fn lintel_underside(&self) -> WallFace {
        WallFace {
            axis: Axis::Y,
            coord: self.door_height,
            h_min: -self.middle_half_thickness,
            h_max: self.middle_half_thickness,
            y_min: self.door_height,
            y_max: self.door_height,
        }
    }

    /// Segment of the dividing wall under `point`: a side column or the lintel above the door
    fn middle_face_at(&self, point: Vec3, positive_side: bool, radius: f32) -> Option<WallFace> {
        let door_half = self.door_width * 0.5;
        let y_max = self.height - radius;
        if point.y < radius || point.y > y_max {
            return None;
        }
        let (h_min, h_max, y_min) = if point.z <= -door_half + radius {
            (-self.half_z, -door_half, radius)
        } else if point.z >= door_half - radius {
            (door_half, self.half_z, radius)
        } else if point.y >= self.door_height - radius {
            (-door_half, door_half, self.door_height)
        } else {
            return None;
        };
        let coord = if positive_side {
            self.middle_half_thickness
        } else {
            -self.middle_half_thickness
        };
        Some(WallFace {
            axis: Axis::X,
            coord,
            h_min,
            h_max,
            y_min,
            y_max,
        })
    }
}

/// Keep the hit at `t` if it is the nearest so far and lands on `face`
/// (extent grown by `reach`)
fn offer(best: &mut Option<WallHit>, t: f32, prev: Vec3, next: Vec3, normal: Vec3, face: WallFace, reach: f32) {
    if !t.is_finite() || !(0.0..=1.0).contains(&t) {
        return;
    }
    if best.as_ref().is_some_and(|hit| t >= hit.t) {
        return;
    }
    let point = prev.lerp(next, t);
    if !face.contains_within(point, reach) {
        return;
    }
    *best = Some(WallHit {
        t,
        point,
        normal,
        face,
    });
}

/// Arena plus the live portal poses: everything a collision query needs
#[derive(Debug, Clone, Copy)]
pub struct Stage<'a> {
    pub arena: &'a Arena,
    pub portals: &'a PortalPair,
}

const WALL_COORD_TOLERANCE: f32 = 0.35;
const NORMAL_AXIS_THRESHOLD: f32 = 0.85;
const FLOOR_NORMAL_THRESHOLD: f32 = 0.75;

impl<'a> Stage<'a> {
    pub fn new(arena: &'a Arena, portals: &'a PortalPair) -> Self {
        Self { arena, portals }
    }

    /// Whether a sphere at `point` is inside the hole a portal cuts into
    /// `face`. Only a portal mounted on that side, facing the same way, opens it.
    pub fn in_wall_hole(&self, point: Vec3, radius: f32, face: FaceSide) -> bool {
        let depth_tolerance = radius + 0.25;
        self.portals.iter().any(|portal| {
            let pose = &portal.pose;
            if !face.holds(pose) {
                return false;
            }
            let local = pose.to_local(point);
            local.z.abs() <= depth_tolerance
                && local.x.abs() <= PORTAL_HALF_WIDTH + radius
                && local.y.abs() <= PORTAL_HALF_HEIGHT + radius
        })
    }

    /// Whether the segment `prev -> cur` passes through a hole in `face`
    pub fn passes_through_wall_hole(&self, prev: Vec3, cur: Vec3, radius: f32, face: FaceSide) -> bool {
        self.portals.iter().any(|portal| {
            let pose = &portal.pose;
            if !face.holds(pose) {
                return false;
            }
            let prev_side = pose.signed_distance(prev);
            let cur_side = pose.signed_distance(cur);
            if prev_side * cur_side > 0.0 {
                return false;
            }
            let t = plane_crossing_t(prev_side, cur_side, 0.5);
            pose.opening_contains(prev.lerp(cur, t), radius)
        })
    }

    /// Whether `point` stands above an upward-facing portal's footprint
    pub fn over_floor_hole(&self, point: Vec3) -> bool {
        self.portals.iter().any(|portal| {
            let pose = &portal.pose;
            if pose.normal().y < FLOOR_NORMAL_THRESHOLD || pose.signed_distance(point) < 0.0 {
                return false;
            }
            let footprint = Vec3::new(point.x, pose.position.y, point.z);
            pose.opening_contains(footprint, 0.0)
        })
    }

    /// Whether the segment `prev -> cur` drops through an upward-facing portal
    pub fn passes_through_floor_hole(&self, prev: Vec3, cur: Vec3) -> bool {
        self.portals.iter().any(|portal| {
            let pose = &portal.pose;
            if pose.normal().y < FLOOR_NORMAL_THRESHOLD {
                return false;
            }
            let prev_side = pose.signed_distance(prev);
            let cur_side = pose.signed_distance(cur);
            if prev_side * cur_side > 0.0 {
                return false;
            }
            let t = plane_crossing_t(prev_side, cur_side, 0.5);
            pose.opening_contains(prev.lerp(cur, t), 0.0)
        })
    }

    /// Whether a thin body moving `prev -> cur` strikes either portal's opening
    pub fn strikes_portal(&self, prev: Vec3, cur: Vec3, radius: f32) -> bool {
        const PLANE_EPS: f32 = 0.0005;
        if (cur - prev).length_squared() < 1e-10 {
            return false;
        }
        self.portals.iter().any(|portal| {
            let pose = &portal.pose;
            let prev_side = pose.signed_distance(prev);
            let cur_side = pose.signed_distance(cur);
            let crossed = (prev_side > PLANE_EPS && cur_side <= PLANE_EPS)
                || (prev_side < -PLANE_EPS && cur_side >= -PLANE_EPS);
            if !crossed {
                return false;
            }
            let t = plane_crossing_t(prev_side, cur_side, 0.0);
            pose.opening_contains(prev.lerp(cur, t), radius)
        })
    }
}

impl WorldQuery for Stage<'_> {
    fn is_blocked(&self, point: Vec3, radius: f32) -> bool {
        self.arena.is_blocked(point, radius)
    }

    fn is_in_portal_opening(&self, portal: PortalId, point: Vec3, radius: f32) -> bool {
        self.portals.get(portal).contains(point, radius)
    }

    fn wall_hit(&self, prev: Vec3, cur: Vec3, radius: f32) -> Option<WallHit> {
        self.arena.wall_hit(prev, cur, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_door_is_open() {
        let arena = Arena::default();
        assert!(!arena.is_blocked(Vec3::new(0.0, 1.7, 0.0), 0.1));
        assert!(arena.is_blocked(Vec3::new(0.0, 1.7, 3.0), 0.1));
        assert!(arena.is_blocked(Vec3::new(0.0, 5.0, 0.0), 0.1));
    }

    #[test]
    fn test_wall_hit_outer_wall() {
        let arena = Arena::default();
        let hit = arena
            .wall_hit(Vec3::new(17.0, 3.0, 1.0), Vec3::new(18.0, 3.0, 1.0), 0.08)
            .expect("hit");
        assert_eq!(hit.face.axis, Axis::X);
        assert_eq!(hit.face.coord, WORLD_HALF_X);
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert!((hit.point.x - (WORLD_HALF_X - 0.08)).abs() < 1e-4);
    }

    #[test]
    fn test_wall_hit_passes_through_door() {
        let arena = Arena::default();
        let hit = arena.wall_hit(Vec3::new(-1.0, 1.5, 0.0), Vec3::new(1.0, 1.5, 0.0), 0.08);
        assert!(hit.is_none());
    }

    #[test]
    fn test_wall_hit_middle_segments() {
        let arena = Arena::default();
        let column = arena
            .wall_hit(Vec3::new(-1.0, 1.5, 4.0), Vec3::new(1.0, 1.5, 4.0), 0.08)
            .expect("column hit");
        assert_eq!(column.face.coord, -MIDDLE_WALL_HALF_THICKNESS);
        assert_eq!(column.face.h_min, DOOR_WIDTH * 0.5);
        assert_eq!(column.normal, Vec3::NEG_X);

        let lintel = arena
            .wall_hit(Vec3::new(1.0, 6.0, 0.5), Vec3::new(-1.0, 6.0, 0.5), 0.08)
            .expect("lintel hit");
        assert_eq!(lintel.face.coord, MIDDLE_WALL_HALF_THICKNESS);
        assert_eq!(lintel.face.y_min, DOOR_HEIGHT);
        assert_eq!(lintel.normal, Vec3::X);
    }

    #[test]
    fn test_wall_hit_door_jamb_and_lintel_underside() {
        let arena = Arena::default();
        let jamb = arena
            .wall_hit(Vec3::new(0.0, 2.0, -1.2), Vec3::new(0.0, 2.0, -1.9), 0.08)
            .expect("jamb");
        assert_eq!(jamb.normal, Vec3::Z);
        assert_eq!(jamb.face.axis, Axis::Z);
        assert_eq!(jamb.face.coord, -DOOR_WIDTH * 0.5);
        assert!((jamb.point.z - (-DOOR_WIDTH * 0.5 + 0.08)).abs() < 1e-5);

        let underside = arena
            .wall_hit(Vec3::new(0.0, 3.5, 0.0), Vec3::new(0.0, 4.5, 0.0), 0.08)
            .expect("lintel underside");
        assert_eq!(underside.normal, Vec3::NEG_Y);
        assert_eq!(underside.face.coord, DOOR_HEIGHT);
    }

    #[test]
    fn test_wall_hit_grazes_door_corner() {
        let arena = Arena::default();
        // Ends in the door gap, but the sphere clips the column edge on the way.
        let prev = Vec3::new(-0.35, 2.0, -1.62);
        let next = prev + Vec3::new(1.0, 0.0, 1.0).normalize() * 0.2;
        assert!(!arena.is_blocked(next, 0.12));
        let hit = arena.wall_hit(prev, next, 0.12).expect("corner");
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert!(hit.t > 0.0 && hit.t < 1.0);
    }

    #[test]
    fn test_wall_hit_nearest_wins() {
        let arena = Arena::default();
        // Diagonal into the corner: z wall is reached first.
        let hit = arena
            .wall_hit(Vec3::new(-17.0, 3.0, 8.0), Vec3::new(-17.7, 3.0, 9.5), 0.08)
            .expect("hit");
        assert_eq!(hit.face.axis, Axis::Z);
    }

    #[test]
    fn test_wall_hit_floor() {
        let arena = Arena::default();
        let hit = arena
            .wall_hit(Vec3::new(2.0, 1.0, 2.0), Vec3::new(2.5, -1.0, 2.0), 0.08)
            .expect("floor");
        assert_eq!(hit.face.axis, Axis::Y);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_line_of_sight_through_door() {
        let arena = Arena::default();
        assert!(arena.line_of_sight(Vec3::new(-5.0, 2.2, 0.0), Vec3::new(5.0, 1.7, 0.0), 0.7));
        assert!(!arena.line_of_sight(Vec3::new(-5.0, 2.2, 5.0), Vec3::new(5.0, 1.7, 5.0), 0.7));
        assert!(arena.line_of_sight(Vec3::new(-5.0, 2.2, 5.0), Vec3::new(-3.0, 1.7, -5.0), 0.7));
    }

    #[test]
    fn test_wall_hole_matches_mounted_portal() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        // Portal A sits on the -z wall around x = -9.
        let inside = Vec3::new(-9.0, 2.0, -8.6);
        let south = FaceSide::new(Axis::Z, -WORLD_HALF_Z, 1.0);
        assert!(stage.in_wall_hole(inside, BALL_RADIUS, south));
        assert!(!stage.in_wall_hole(Vec3::new(-4.0, 2.0, -8.6), BALL_RADIUS, south));
        assert!(!stage.in_wall_hole(inside, BALL_RADIUS, FaceSide::new(Axis::X, -WORLD_HALF_X, 1.0)));
    }

    #[test]
    fn test_middle_wall_hole_only_on_mounted_side() {
        let arena = Arena::default();
        let front = Pose::from_yaw(Vec3::new(MIDDLE_WALL_HALF_THICKNESS, 2.0, -5.0), FRAC_PI_2);
        let portals = PortalPair::new(front, Pose::from_yaw(Vec3::new(-9.0, 2.0, -8.5), 0.0));
        let stage = Stage::new(&arena, &portals);
        let plus = FaceSide::new(Axis::X, MIDDLE_WALL_HALF_THICKNESS, 1.0);
        let minus = FaceSide::new(Axis::X, -MIDDLE_WALL_HALF_THICKNESS, -1.0);

        assert!(stage.in_wall_hole(Vec3::new(0.2, 2.0, -5.0), BALL_RADIUS, plus));
        assert!(!stage.in_wall_hole(Vec3::new(-0.2, 2.0, -5.0), BALL_RADIUS, minus));
        assert!(stage.passes_through_wall_hole(
            Vec3::new(0.4, 2.0, -5.0),
            Vec3::new(-0.1, 2.0, -5.0),
            BALL_RADIUS,
            plus
        ));
        assert!(!stage.passes_through_wall_hole(
            Vec3::new(-0.4, 2.0, -5.0),
            Vec3::new(0.1, 2.0, -5.0),
            BALL_RADIUS,
            minus
        ));
    }

    #[test]
    fn test_floor_hole() {
        let arena = Arena::default();
        let floor = Pose::new(
            Vec3::new(5.0, PORTAL_SURFACE_LIFT, 0.0),
            glam::Quat::from_rotation_arc(Vec3::Z, Vec3::Y),
        );
        let portals = PortalPair::new(floor, Pose::from_yaw(Vec3::new(17.5, 2.0, 0.0), 0.0));
        let stage = Stage::new(&arena, &portals);
        assert!(stage.over_floor_hole(Vec3::new(5.5, 1.7, 0.5)));
        assert!(!stage.over_floor_hole(Vec3::new(9.0, 1.7, 0.5)));
        assert!(stage.passes_through_floor_hole(Vec3::new(5.0, 0.5, 0.0), Vec3::new(5.0, -0.5, 0.0)));
    }

    #[test]
    fn test_strikes_portal() {
        let arena = Arena::default();
        let portals = PortalPair::default();
        let stage = Stage::new(&arena, &portals);
        assert!(stage.strikes_portal(Vec3::new(-9.0, 2.0, -7.0), Vec3::new(-9.0, 2.0, -8.6), 0.08));
        assert!(!stage.strikes_portal(Vec3::new(-3.0, 2.0, -7.0), Vec3::new(-3.0, 2.0, -8.6), 0.08));
        assert!(stage.is_in_portal_opening(PortalId::B, Vec3::new(17.5, 2.0, 1.0), 0.0));
    }
}
