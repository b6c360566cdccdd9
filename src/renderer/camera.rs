//! Cameras and portal level cameras
//!
//! Cameras look down their local -Z with +Y up and use GL-style clip space
//! (NDC depth in [-1, 1]). A level camera sits where the viewer would appear
//! behind the destination portal and carries an off-axis frustum fit to the
//! destination opening, so its image exactly fills the source portal surface.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::consts::*;
use crate::sim::portal::Pose;
use crate::sim::transform::PortalTransform;

/// Camera transform plus projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::ZERO, Quat::IDENTITY, 1.0)
    }
}

impl Camera {
    /// Symmetric viewer camera
    pub fn perspective(position: Vec3, rotation: Quat, aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Self {
            position,
            rotation,
            projection: Mat4::perspective_rh_gl(CAMERA_FOV_Y, aspect, CAMERA_NEAR, PORTAL_CAMERA_FAR),
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World point in camera space (in front of the camera means z < 0)
    pub fn to_view(&self, point: Vec3) -> Vec3 {
        self.view_matrix().transform_point3(point)
    }

    /// World point in normalized device coordinates
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }
}

/// GL-style asymmetric perspective frustum
pub fn frustum_rh_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let x = 2.0 * near / (right - left);
    let y = 2.0 * near / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = -(far + near) / (far - near);
    let d = -2.0 * far * near / (far - near);
    Mat4::from_cols(
        Vec4::new(x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y, 0.0, 0.0),
        Vec4::new(a, b, c, -1.0),
        Vec4::new(0.0, 0.0, d, 0.0),
    )
}

/// Place `camera` where `reference` appears when seen through `source` out
/// of `destination`, and fit its frustum to the destination opening.
///
/// The pose depends only on the reference position, never on where the
/// viewer looks. When the fitted frustum is degenerate the previous
/// projection is kept and `false` is returned.
pub fn configure_level_camera(camera: &mut Camera, source: &Pose, destination: &Pose, reference: Vec3) -> bool {
    let transform = PortalTransform::between(source, destination);
    camera.position = transform.point(reference);
    camera.rotation = destination.rotation * Quat::from_rotation_y(std::f32::consts::PI);

    let offset = camera.position - destination.position;
    let near = destination.normal().dot(offset).abs().max(PORTAL_CAMERA_MIN_NEAR);

    let view = camera.view_matrix();
    let mut left = f32::INFINITY;
    let mut right = f32::NEG_INFINITY;
    let mut bottom = f32::INFINITY;
    let mut top = f32::NEG_INFINITY;
    for corner in destination.corners() {
        let local = view.transform_point3(corner);
        let depth = (-local.z).max(1e-4);
        let sx = near * local.x / depth;
        let sy = near * local.y / depth;
        left = left.min(sx);
        right = right.max(sx);
        bottom = bottom.min(sy);
        top = top.max(sy);
    }

    if ![left, right, bottom, top].iter().all(|v| v.is_finite()) || right - left < 1e-6 || top - bottom < 1e-6 {
        return false;
    }
    camera.projection = frustum_rh_gl(left, right, bottom, top, near, PORTAL_CAMERA_FAR);
    true
}

/// Build the direct, one-bounce and two-bounce cameras for the portal at
/// `source` leading to `destination`. Each level uses the previous level's
/// position as its reference.
pub fn configure_level_cameras(cameras: &mut [Camera; 3], source: &Pose, destination: &Pose, viewer: Vec3) {
    let mut reference = viewer;
    for camera in cameras.iter_mut() {
        configure_level_camera(camera, source, destination, reference);
        reference = camera.position;
    }
}
