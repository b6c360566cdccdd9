//! Portal entities
//!
//! Exactly two portals exist and always point at each other. Each portal is a
//! rectangle in its local XY plane with the front face along local +Z.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::Axis;
use super::transform::PortalTransform;
use crate::consts::*;
use crate::renderer::{Camera, PortalTargets};

/// Which of the two linked portals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalId {
    A,
    B,
}

impl PortalId {
    pub const ALL: [PortalId; 2] = [PortalId::A, PortalId::B];

    pub fn index(self) -> usize {
        match self {
            PortalId::A => 0,
            PortalId::B => 1,
        }
    }

    /// The linked portal
    pub fn other(self) -> PortalId {
        match self {
            PortalId::A => PortalId::B,
            PortalId::B => PortalId::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PortalId::A => "A",
            PortalId::B => "B",
        }
    }
}

/// Rigid placement of a portal rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Upright pose turned `yaw` radians about world +Y
    pub fn from_yaw(position: Vec3, yaw: f32) -> Self {
        Self::new(position, Quat::from_rotation_y(yaw))
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Outward normal of the front face
    pub fn normal(&self) -> Vec3 {
        (self.rotation * Vec3::Z).normalize()
    }

    pub fn right(&self) -> Vec3 {
        (self.rotation * Vec3::X).normalize()
    }

    pub fn up(&self) -> Vec3 {
        (self.rotation * Vec3::Y).normalize()
    }

    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Signed distance of `point` from the portal plane (positive in front)
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal().dot(point - self.position)
    }

    /// Whether `point` lies inside the opening inflated by `radius`.
    /// Depth along the normal is ignored.
    pub fn opening_contains(&self, point: Vec3, radius: f32) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= PORTAL_HALF_WIDTH + radius && local.y.abs() <= PORTAL_HALF_HEIGHT + radius
    }

    /// Opening corners in world space, counter-clockwise seen from the front
    pub fn corners(&self) -> [Vec3; 4] {
        [
            Vec3::new(-PORTAL_HALF_WIDTH, -PORTAL_HALF_HEIGHT, 0.0),
            Vec3::new(PORTAL_HALF_WIDTH, -PORTAL_HALF_HEIGHT, 0.0),
            Vec3::new(PORTAL_HALF_WIDTH, PORTAL_HALF_HEIGHT, 0.0),
            Vec3::new(-PORTAL_HALF_WIDTH, PORTAL_HALF_HEIGHT, 0.0),
        ]
        .map(|c| self.to_world(c))
    }
}

/// Face/side identity of a mount, with the coordinate rounded to millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideKey {
    pub axis: Axis,
    pub coord_mm: i64,
    pub positive: bool,
}

impl SideKey {
    pub fn new(axis: Axis, normal: Vec3, coord: f32) -> Self {
        Self {
            axis,
            coord_mm: (coord * 1000.0).round() as i64,
            positive: axis.component(normal) >= 0.0,
        }
    }
}

/// The wall face a portal is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallInfo {
    pub axis: Axis,
    /// World coordinate of the face along `axis`
    pub coord: f32,
    /// Outward normal of the face
    pub normal: Vec3,
    /// Portal center when mounted
    pub position: Vec3,
    pub side_key: SideKey,
}

impl WallInfo {
    pub fn new(axis: Axis, coord: f32, normal: Vec3, position: Vec3) -> Self {
        Self {
            axis,
            coord,
            normal,
            position,
            side_key: SideKey::new(axis, normal, coord),
        }
    }
}

/// One of the two linked portals
#[derive(Debug, Clone)]
pub struct Portal {
    pub id: PortalId,
    pub pose: Pose,
    /// Pose restored on game restart
    pub home: Pose,
    /// Which travel direction along the normal counts as entering (+1: moving against the normal)
    pub entry_sign: f32,
    /// Face the portal is currently mounted on
    pub wall: Option<WallInfo>,
    /// Face of the home pose, if it sits on one
    pub home_wall: Option<WallInfo>,
    /// Direct, one-bounce and two-bounce virtual cameras
    pub level_cameras: [Camera; 3],
    /// Created lazily by the renderer on first use
    pub targets: Option<PortalTargets>,
}

impl Portal {
    pub fn new(id: PortalId, home: Pose) -> Self {
        Self {
            id,
            pose: home,
            home,
            entry_sign: 1.0,
            wall: None,
            home_wall: None,
            level_cameras: [Camera::default(); 3],
            targets: None,
        }
    }

    /// Record the wall face under the home pose
    pub fn with_home_wall(mut self, wall: WallInfo) -> Self {
        self.home_wall = Some(wall);
        self.wall = Some(wall);
        self
    }

    pub fn destination(&self) -> PortalId {
        self.id.other()
    }

    pub fn normal(&self) -> Vec3 {
        self.pose.normal()
    }

    pub fn contains(&self, point: Vec3, radius: f32) -> bool {
        self.pose.opening_contains(point, radius)
    }

    /// Back to the home pose; render targets are kept for reuse
    pub fn reset(&mut self) {
        self.pose = self.home;
        self.wall = self.home_wall;
        self.level_cameras = [Camera::default(); 3];
    }
}

/// The mutually linked portal pair
#[derive(Debug, Clone)]
pub struct PortalPair {
    portals: [Portal; 2],
}

impl Default for PortalPair {
    fn default() -> Self {
        let (a_pos, a_yaw) = PORTAL_A_HOME;
        let (b_pos, b_yaw) = PORTAL_B_HOME;
        let a = Pose::from_yaw(Vec3::from_array(a_pos), a_yaw);
        let b = Pose::from_yaw(Vec3::from_array(b_pos), b_yaw);
        Self {
            portals: [
                Portal::new(PortalId::A, a).with_home_wall(WallInfo::new(Axis::Z, -WORLD_HALF_Z, Vec3::Z, a.position)),
                Portal::new(PortalId::B, b).with_home_wall(WallInfo::new(
                    Axis::X,
                    WORLD_HALF_X,
                    Vec3::NEG_X,
                    b.position,
                )),
            ],
        }
    }
}

impl PortalPair {
    pub fn new(a: Pose, b: Pose) -> Self {
        Self {
            portals: [Portal::new(PortalId::A, a), Portal::new(PortalId::B, b)],
        }
    }

    pub fn get(&self, id: PortalId) -> &Portal {
        &self.portals[id.index()]
    }

    pub fn get_mut(&mut self, id: PortalId) -> &mut Portal {
        &mut self.portals[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Portal> {
        self.portals.iter_mut()
    }

    /// Transform taking world space in front of `source` to the far side of its destination
    pub fn transform(&self, source: PortalId) -> PortalTransform {
        PortalTransform::between(&self.get(source).pose, &self.get(source.other()).pose)
    }

    /// Commit a new mount for `id`
    pub fn mount(&mut self, id: PortalId, pose: Pose, wall: WallInfo) {
        let portal = self.get_mut(id);
        portal.pose = pose;
        portal.wall = Some(wall);
    }

    pub fn reset(&mut self) {
        for portal in &mut self.portals {
            portal.reset();
        }
    }
}
