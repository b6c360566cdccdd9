//! Portal visibility tests
//!
//! A portal counts as in view when at least one opening corner is in front
//! of the camera and the projected opening overlaps the NDC screen square.

use glam::{Vec2, Vec3};

use super::camera::Camera;
use crate::sim::portal::Pose;

const NDC_RECT: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

pub fn point_in_ndc_rect(p: Vec2) -> bool {
    p.x >= -1.0 && p.x <= 1.0 && p.y >= -1.0 && p.y <= 1.0
}

/// Even-odd point in polygon
pub fn point_in_polygon(point: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for (i, pi) in poly.iter().enumerate() {
        let pj = poly[j];
        let dy = pj.y - pi.y;
        let dy = if dy == 0.0 { 1e-8 } else { dy };
        if (pi.y > point.y) != (pj.y > point.y) && point.x < (pj.x - pi.x) * (point.y - pi.y) / dy + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y)
}

/// Whether `b` lies within the bounding box of segment `a`-`c`
fn on_segment(a: Vec2, b: Vec2, c: Vec2) -> bool {
    b.x <= a.x.max(c.x) && b.x >= a.x.min(c.x) && b.y <= a.y.max(c.y) && b.y >= a.y.min(c.y)
}

/// Segment intersection including collinear touching
pub fn segments_intersect(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);
    if (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) {
        return true;
    }
    const EPS: f32 = 1e-8;
    (o1.abs() < EPS && on_segment(p1, p2, q1))
        || (o2.abs() < EPS && on_segment(p1, q2, q1))
        || (o3.abs() < EPS && on_segment(p2, p1, q2))
        || (o4.abs() < EPS && on_segment(p2, q1, q2))
}

/// Convex polygon vs screen square overlap: containment either way or any
/// edge crossing
pub fn polygon_intersects_ndc_rect(poly: &[Vec2]) -> bool {
    if poly.iter().any(|&p| point_in_ndc_rect(p)) {
        return true;
    }
    if NDC_RECT.iter().any(|&corner| point_in_polygon(corner, poly)) {
        return true;
    }
    for (i, &a1) in poly.iter().enumerate() {
        let a2 = poly[(i + 1) % poly.len()];
        for (j, &b1) in NDC_RECT.iter().enumerate() {
            let b2 = NDC_RECT[(j + 1) % NDC_RECT.len()];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Whether the opening at `pose` is inside `camera`'s view frustum
pub fn in_camera_fov(pose: &Pose, camera: &Camera) -> bool {
    let view = camera.view_matrix();
    let view_projection = camera.view_projection();
    let mut any_in_front = false;
    let mut poly = [Vec2::ZERO; 4];
    for (slot, corner) in poly.iter_mut().zip(pose.corners()) {
        if view.transform_point3(corner).z < 0.0 {
            any_in_front = true;
        }
        *slot = view_projection.project_point3(corner).truncate();
    }
    any_in_front && poly.iter().all(|p| p.is_finite()) && polygon_intersects_ndc_rect(&poly)
}

/// Whether `viewer` is on the front side of the opening; only the front
/// face ever shows a portal image
pub fn facing_front(pose: &Pose, viewer: Vec3) -> bool {
    pose.signed_distance(viewer) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn square(center: Vec2, half: f32) -> [Vec2; 4] {
        [
            center + Vec2::new(-half, -half),
            center + Vec2::new(half, -half),
            center + Vec2::new(half, half),
            center + Vec2::new(-half, half),
        ]
    }

    #[test]
    fn test_polygon_inside_screen() {
        assert!(polygon_intersects_ndc_rect(&square(Vec2::ZERO, 0.2)));
    }

    #[test]
    fn test_polygon_surrounding_screen() {
        // Every vertex is off screen; the screen sits inside the polygon.
        assert!(polygon_intersects_ndc_rect(&square(Vec2::ZERO, 5.0)));
    }

    #[test]
    fn test_polygon_crossing_edges_only() {
        // A thin cross-shaped overlap: no vertex of either shape inside the other.
        let poly = [
            Vec2::new(-3.0, -0.1),
            Vec2::new(3.0, -0.1),
            Vec2::new(3.0, 0.1),
            Vec2::new(-3.0, 0.1),
        ];
        assert!(!poly.iter().any(|&p| point_in_ndc_rect(p)));
        assert!(polygon_intersects_ndc_rect(&poly));
    }

    #[test]
    fn test_polygon_off_screen() {
        assert!(!polygon_intersects_ndc_rect(&square(Vec2::new(4.0, 0.0), 0.5)));
        assert!(!polygon_intersects_ndc_rect(&square(Vec2::new(-2.0, 3.0), 0.9)));
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square(Vec2::ZERO, 1.0);
        assert!(point_in_polygon(Vec2::new(0.5, 0.5), &poly));
        assert!(!point_in_polygon(Vec2::new(1.5, 0.5), &poly));
    }

    #[test]
    fn test_segments_touching_collinear() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(3.0, 0.0)
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0)
        ));
    }

    #[test]
    fn test_fov_requires_corner_in_front() {
        let pose = Pose::from_yaw(Vec3::new(0.0, 2.0, -10.0), 0.0);
        let looking_at = Camera::perspective(Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, 1.0);
        assert!(in_camera_fov(&pose, &looking_at));
        let looking_away = Camera::perspective(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::PI),
            1.0,
        );
        assert!(!in_camera_fov(&pose, &looking_away));
    }

    #[test]
    fn test_fov_close_portal_surrounds_screen() {
        let pose = Pose::from_yaw(Vec3::new(0.0, 2.0, -0.3), 0.0);
        let camera = Camera::perspective(Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, 1.0);
        assert!(in_camera_fov(&pose, &camera));
    }

    #[test]
    fn test_facing_front() {
        let pose = Pose::from_yaw(Vec3::new(0.0, 2.0, -8.5), 0.0);
        assert!(facing_front(&pose, Vec3::new(0.0, 1.7, 0.0)));
        assert!(!facing_front(&pose, Vec3::new(0.0, 1.7, -9.0)));
    }
}
