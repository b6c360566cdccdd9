//! Recursive portal rendering
//!
//! Each portal surface shows up to two extra bounces of portal-in-portal
//! recursion at a fixed cost of at most four scene renders per portal per
//! frame. Passes run deepest first so every pass samples a texture that was
//! already written: seed (L3, no portals), L3, L2, then the final L1 view.

use glam::Vec3;

use super::camera::{Camera, configure_level_cameras};
use super::targets::{Level, PortalTargets, RenderTarget, TargetHandle, level_resolution, resolution_cap};
use super::visibility::{facing_front, in_camera_fov};
use crate::consts::*;
use crate::settings::QualityPreset;
use crate::sim::portal::{PortalId, PortalPair};

/// What a portal surface shows during a render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSource {
    Hidden,
    Texture(TargetHandle),
}

/// Scene collaborator. The renderer only orchestrates; geometry, materials
/// and lighting live behind this trait.
pub trait SceneBackend {
    /// Allocate a square offscreen color target
    fn create_target(&mut self, size: u32) -> TargetHandle;
    fn resize_target(&mut self, target: TargetHandle, size: u32);
    /// Camera transform and projection for the next render
    fn set_camera(&mut self, camera: &Camera);
    fn set_portal_surface(&mut self, portal: PortalId, source: SurfaceSource);
    /// Render the scene from the current camera into `target`
    fn render(&mut self, target: TargetHandle);
}

/// One render into a portal target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Seed,
    Level3,
    Level2,
    Final,
}

/// Which recursion levels a portal may render this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelFlags {
    pub l1: bool,
    pub l2: bool,
    pub l3: bool,
}

impl LevelFlags {
    pub fn allows(&self, level: Level) -> bool {
        match level {
            Level::L1 => self.l1,
            Level::L2 => self.l2,
            Level::L3 => self.l3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalReport {
    /// Viewer distance to the portal center
    pub distance: f32,
    pub flags: LevelFlags,
    /// Target side length per level (L1, L2, L3)
    pub resolutions: [u32; 3],
    /// Passes rendered for this portal, in order
    pub passes: Vec<Pass>,
}

/// Summary of one frame of portal rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    portals: [PortalReport; 2],
}

impl FrameReport {
    pub fn portal(&self, id: PortalId) -> &PortalReport {
        &self.portals[id.index()]
    }

    fn portal_mut(&mut self, id: PortalId) -> &mut PortalReport {
        &mut self.portals[id.index()]
    }

    /// Scene renders issued this frame
    pub fn total_passes(&self) -> usize {
        self.portals.iter().map(|p| p.passes.len()).sum()
    }

    /// Multi-line resolution readout for the debug HUD
    pub fn debug_text(&self) -> String {
        let yn = |v: bool| if v { "Y" } else { "N" };
        let mut lines = Vec::new();
        for id in PortalId::ALL {
            let p = self.portal(id);
            lines.push(format!(
                "Portal {}: d(player):{:.1}  L1:{} L2:{} L3:{}",
                id.as_str(),
                p.distance,
                p.resolutions[0],
                p.resolutions[1],
                p.resolutions[2]
            ));
        }
        for id in PortalId::ALL {
            let f = self.portal(id).flags;
            lines.push(format!(
                "  Portal {} L1/L2/L3: {}/{}/{}",
                id.as_str(),
                yn(f.l1),
                yn(f.l2),
                yn(f.l3)
            ));
        }
        lines.join("\n")
    }
}

/// Multipass portal renderer
#[derive(Debug, Clone)]
pub struct PortalRenderer {
    /// Largest target side length
    cap: u32,
    quality: QualityPreset,
}

impl PortalRenderer {
    pub fn new(screen_width: u32, quality: QualityPreset) -> Self {
        Self {
            cap: resolution_cap(screen_width, quality.max_portal_resolution()),
            quality,
        }
    }

    /// Recompute the resolution cap after the drawing buffer changed size
    pub fn resize(&mut self, screen_width: u32) {
        self.cap = resolution_cap(screen_width, self.quality.max_portal_resolution());
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Render both portal surfaces for this frame. Level cameras and targets
    /// are stored on the portals. Must run after the simulation step.
    pub fn render(&mut self, portals: &mut PortalPair, viewer: &Camera, backend: &mut dyn SceneBackend) -> FrameReport {
        let mut report = FrameReport::default();

        // ============================================================
        // Cameras, eligibility and target sizes
        // ============================================================
        for id in PortalId::ALL {
            let destination = portals.get(id.other()).pose;
            let portal = portals.get_mut(id);
            let source = portal.pose;
            configure_level_cameras(&mut portal.level_cameras, &source, &destination, viewer.position);
            let cameras = portal.level_cameras;

            let l1 = facing_front(&source, viewer.position) && in_camera_fov(&source, viewer);
            let l2 = l1 && in_camera_fov(&source, &cameras[0]);
            let l3 = l2 && in_camera_fov(&source, &cameras[1]);

            let mut resolutions = [PORTAL_RT_MIN; 3];
            for level in Level::ALL {
                let distance = cameras[level.index()].position.distance(destination.position);
                resolutions[level.index()] = level_resolution(level, distance, self.cap);
            }

            let targets = portal.targets.get_or_insert_with(|| create_targets(&mut *backend));
            if targets.final_view.needs_resize(resolutions[0]) {
                backend.resize_target(targets.final_view.handle, resolutions[0]);
            }

            let entry = report.portal_mut(id);
            entry.distance = viewer.position.distance(source.position);
            entry.flags = LevelFlags { l1, l2, l3 };
            entry.resolutions = resolutions;
        }

        // ============================================================
        // Passes, deepest first
        // ============================================================
        for id in PortalId::ALL {
            backend.set_portal_surface(id, SurfaceSource::Hidden);
        }
        for id in PortalId::ALL {
            if !report.portal(id).flags.l3 {
                continue;
            }
            let size = report.portal(id).resolutions[Level::L3.index()];
            let camera = portals.get(id).level_cameras[Level::L3.index()];
            if let Some(targets) = portals.get_mut(id).targets.as_mut() {
                draw(backend, &camera, &mut targets.seed, size);
                report.portal_mut(id).passes.push(Pass::Seed);
            }
        }

        self.prepass(portals, &mut report, backend, Level::L3);
        self.prepass(portals, &mut report, backend, Level::L2);
        self.prepass(portals, &mut report, backend, Level::L1);

        // Main frame: front faces show the final image, back faces nothing.
        show_surfaces(portals, backend, viewer.position, None, |t| t.final_view.handle);
        report
    }

    /// One recursive pass at `level` for every eligible portal. Surfaces
    /// show the next deeper level's image, except the destination the
    /// camera sits on.
    fn prepass(&self, portals: &mut PortalPair, report: &mut FrameReport, backend: &mut dyn SceneBackend, level: Level) {
        let pass = match level {
            Level::L3 => Pass::Level3,
            Level::L2 => Pass::Level2,
            Level::L1 => Pass::Final,
        };
        let sampled = |t: &PortalTargets| match level {
            Level::L3 => t.seed.handle,
            Level::L2 => t.level3_or_fallback(),
            Level::L1 => t.level2_or_fallback(),
        };

        for id in PortalId::ALL {
            if !report.portal(id).flags.allows(level) {
                continue;
            }
            let camera = portals.get(id).level_cameras[level.index()];
            show_surfaces(portals, backend, camera.position, Some(id.other()), sampled);

            let size = report.portal(id).resolutions[level.index()];
            let Some(targets) = portals.get_mut(id).targets.as_mut() else {
                continue;
            };
            let target = match level {
                Level::L3 => &mut targets.level3,
                Level::L2 => &mut targets.level2,
                Level::L1 => &mut targets.final_view,
            };
            draw(backend, &camera, target, size);
            report.portal_mut(id).passes.push(pass);
        }
    }
}

fn create_targets(backend: &mut dyn SceneBackend) -> PortalTargets {
    let mut make = || RenderTarget::new(backend.create_target(PORTAL_RT_MIN), PORTAL_RT_MIN);
    PortalTargets {
        seed: make(),
        level3: make(),
        level2: make(),
        final_view: make(),
    }
}

/// Resize lazily, then render from `camera` into `target`
fn draw(backend: &mut dyn SceneBackend, camera: &Camera, target: &mut RenderTarget, size: u32) {
    if target.needs_resize(size) {
        backend.resize_target(target.handle, size);
    }
    backend.set_camera(camera);
    backend.render(target.handle);
    target.has_data = true;
}

/// Point every surface at its `sampled` texture as seen from `from`:
/// back faces and the `hidden` portal show nothing
fn show_surfaces(
    portals: &PortalPair,
    backend: &mut dyn SceneBackend,
    from: Vec3,
    hidden: Option<PortalId>,
    sampled: impl Fn(&PortalTargets) -> TargetHandle,
) {
    for portal in portals.iter() {
        let source = match &portal.targets {
            Some(targets) if hidden != Some(portal.id) && facing_front(&portal.pose, from) => {
                SurfaceSource::Texture(sampled(targets))
            }
            _ => SurfaceSource::Hidden,
        };
        backend.set_portal_surface(portal.id, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::portal::Pose;
    use glam::Quat;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(TargetHandle, u32),
        Resize(TargetHandle, u32),
        Camera(Vec3),
        Surface(PortalId, SurfaceSource),
        Render(TargetHandle),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        next: u32,
    }

    impl Recorder {
        fn renders(&self) -> Vec<TargetHandle> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Render(h) => Some(*h),
                    _ => None,
                })
                .collect()
        }
    }

    impl SceneBackend for Recorder {
        fn create_target(&mut self, size: u32) -> TargetHandle {
            self.next += 1;
            let handle = TargetHandle(self.next);
            self.calls.push(Call::Create(handle, size));
            handle
        }

        fn resize_target(&mut self, target: TargetHandle, size: u32) {
            self.calls.push(Call::Resize(target, size));
        }

        fn set_camera(&mut self, camera: &Camera) {
            self.calls.push(Call::Camera(camera.position));
        }

        fn set_portal_surface(&mut self, portal: PortalId, source: SurfaceSource) {
            self.calls.push(Call::Surface(portal, source));
        }

        fn render(&mut self, target: TargetHandle) {
            self.calls.push(Call::Render(target));
        }
    }

    /// Two portals facing each other across the left room
    fn facing_pair() -> PortalPair {
        PortalPair::new(
            Pose::from_yaw(Vec3::new(-9.0, 2.0, -8.5), 0.0),
            Pose::from_yaw(Vec3::new(-9.0, 2.0, 8.5), PI),
        )
    }

    fn viewer(position: Vec3, yaw: f32) -> Camera {
        Camera::perspective(position, Quat::from_rotation_y(yaw), 16.0 / 9.0)
    }

    fn targets(portals: &PortalPair, id: PortalId) -> PortalTargets {
        portals.get(id).targets.clone().expect("targets")
    }

    #[test]
    fn test_full_recursion_pass_order() {
        let mut portals = facing_pair();
        let mut backend = Recorder::default();
        let mut renderer = PortalRenderer::new(1920, QualityPreset::High);
        let report = renderer.render(&mut portals, &viewer(Vec3::new(-9.0, 1.7, 0.0), 0.0), &mut backend);

        let a = report.portal(PortalId::A);
        assert_eq!(a.flags, LevelFlags { l1: true, l2: true, l3: true });
        assert_eq!(a.passes, vec![Pass::Seed, Pass::Level3, Pass::Level2, Pass::Final]);
        // B is behind the viewer.
        assert!(report.portal(PortalId::B).passes.is_empty());
        assert_eq!(report.total_passes(), 4);

        let t = targets(&portals, PortalId::A);
        assert_eq!(
            backend.renders(),
            vec![t.seed.handle, t.level3.handle, t.level2.handle, t.final_view.handle]
        );
        assert!(t.seed.has_data && t.level3.has_data && t.level2.has_data && t.final_view.has_data);
    }

    #[test]
    fn test_passes_sample_previous_level() {
        let mut portals = facing_pair();
        let mut backend = Recorder::default();
        let mut renderer = PortalRenderer::new(1920, QualityPreset::High);
        renderer.render(&mut portals, &viewer(Vec3::new(-9.0, 1.7, 0.0), 0.0), &mut backend);
        let t = targets(&portals, PortalId::A);

        // The surface state in effect at each render of portal A.
        let mut surface_a = SurfaceSource::Hidden;
        let mut surface_b = SurfaceSource::Hidden;
        let mut seen = Vec::new();
        for call in &backend.calls {
            match call {
                Call::Surface(PortalId::A, s) => surface_a = *s,
                Call::Surface(PortalId::B, s) => surface_b = *s,
                Call::Render(h) => seen.push((*h, surface_a, surface_b)),
                _ => {}
            }
        }
        assert_eq!(seen[0], (t.seed.handle, SurfaceSource::Hidden, SurfaceSource::Hidden));
        // The destination (B) stays hidden while rendering A's recursion.
        assert_eq!(
            seen[1],
            (t.level3.handle, SurfaceSource::Texture(t.seed.handle), SurfaceSource::Hidden)
        );
        assert_eq!(
            seen[2],
            (t.level2.handle, SurfaceSource::Texture(t.level3.handle), SurfaceSource::Hidden)
        );
        assert_eq!(
            seen[3],
            (t.final_view.handle, SurfaceSource::Texture(t.level2.handle), SurfaceSource::Hidden)
        );
        // Main frame shows the final image on A.
        assert_eq!(surface_a, SurfaceSource::Texture(t.final_view.handle));
    }

    #[test]
    fn test_portal_facing_away_renders_nothing() {
        let mut portals = PortalPair::default();
        let mut backend = Recorder::default();
        let mut renderer = PortalRenderer::new(1920, QualityPreset::Medium);
        // Behind portal A, looking at its back.
        let camera = viewer(Vec3::new(-9.0, 1.7, -12.0), PI);
        assert!(in_camera_fov(&portals.get(PortalId::A).pose, &camera));

        let report = renderer.render(&mut portals, &camera, &mut backend);
        let a = report.portal(PortalId::A);
        assert_eq!(a.flags, LevelFlags::default());
        assert!(a.passes.is_empty());
        let t = targets(&portals, PortalId::A);
        let handles = [t.seed.handle, t.level3.handle, t.level2.handle, t.final_view.handle];
        assert!(backend.renders().iter().all(|h| !handles.contains(h)));
        // The back face never shows an image.
        assert_eq!(
            backend.calls.iter().rev().find(|c| matches!(c, Call::Surface(PortalId::A, _))),
            Some(&Call::Surface(PortalId::A, SurfaceSource::Hidden))
        );
    }

    #[test]
    fn test_targets_created_once_and_resized_lazily() {
        let mut portals = facing_pair();
        let mut backend = Recorder::default();
        let mut renderer = PortalRenderer::new(1920, QualityPreset::High);
        let camera = viewer(Vec3::new(-9.0, 1.7, 0.0), 0.0);
        renderer.render(&mut portals, &camera, &mut backend);
        let creates = backend.calls.iter().filter(|c| matches!(c, Call::Create(..))).count();
        assert_eq!(creates, 8);

        backend.calls.clear();
        renderer.render(&mut portals, &camera, &mut backend);
        assert!(
            !backend
                .calls
                .iter()
                .any(|c| matches!(c, Call::Create(..) | Call::Resize(..)))
        );
        assert_eq!(backend.renders().len(), 4);
    }

    #[test]
    fn test_resolution_follows_camera_distance() {
        let mut portals = facing_pair();
        let mut backend = Recorder::default();
        let mut renderer = PortalRenderer::new(1920, QualityPreset::High);
        let report = renderer.render(&mut portals, &viewer(Vec3::new(-9.0, 2.0, 0.0), 0.0), &mut backend);
        let a = report.portal(PortalId::A);
        // L1 camera is 8.5 behind B: (8.5 - 2) / 26 of the way down from 1920.
        let expected = (1920.0_f32 + (128.0 - 1920.0) * (6.5 / 26.0)).round() as u32;
        assert_eq!(a.resolutions[0], expected);
        assert_eq!(targets(&portals, PortalId::A).final_view.size, expected);
        assert!(a.resolutions.iter().all(|&r| (PORTAL_RT_MIN..=PORTAL_RT_MAX).contains(&r)));
        assert!(report.debug_text().contains("Portal A: d(player):8.5"));
    }

    #[test]
    fn test_quality_caps_resolution() {
        let mut renderer = PortalRenderer::new(3840, QualityPreset::Low);
        assert_eq!(renderer.cap(), 1024);
        renderer.resize(640);
        assert_eq!(renderer.cap(), 640);
    }

    proptest! {
        #[test]
        fn prop_passes_are_bounded_and_nested(
            x in -17.0f32..17.0,
            z in -8.0f32..8.0,
            yaw in -PI..PI,
        ) {
            let mut portals = facing_pair();
            let mut backend = Recorder::default();
            let mut renderer = PortalRenderer::new(1280, QualityPreset::Medium);
            let report = renderer.render(&mut portals, &viewer(Vec3::new(x, 1.7, z), yaw), &mut backend);
            prop_assert!(report.total_passes() <= 8);
            prop_assert_eq!(backend.renders().len(), report.total_passes());
            for id in PortalId::ALL {
                let passes = &report.portal(id).passes;
                let allowed: [&[Pass]; 4] = [
                    &[],
                    &[Pass::Final],
                    &[Pass::Level2, Pass::Final],
                    &[Pass::Seed, Pass::Level3, Pass::Level2, Pass::Final],
                ];
                prop_assert!(allowed.contains(&passes.as_slice()));
            }
        }
    }
}
