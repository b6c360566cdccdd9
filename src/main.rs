//! Headless driver
//!
//! Runs a scripted battle round at a fixed frame rate against a counting
//! scene backend and logs the HUD. Usage: `portal-arena [settings.json] [seed]`.

use std::path::PathBuf;

use glam::Vec2;
use portal_arena::renderer::{Camera, PortalRenderer, SceneBackend, SurfaceSource, TargetHandle};
use portal_arena::sim::{DirectPath, FrameInput, GameMode, GamePhase, MenuAction, PortalId, World, update};
use portal_arena::{HudSink, HudSnapshot, Settings};

const SCREEN_WIDTH: u32 = 1280;
const SCREEN_HEIGHT: u32 = 720;
const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES: u32 = 60 * 30;

/// Backend that only counts what it is asked to do
#[derive(Debug, Default)]
struct CountingBackend {
    next_handle: u32,
    renders: u64,
    resizes: u64,
}

impl SceneBackend for CountingBackend {
    fn create_target(&mut self, _size: u32) -> TargetHandle {
        self.next_handle += 1;
        TargetHandle(self.next_handle)
    }

    fn resize_target(&mut self, _target: TargetHandle, _size: u32) {
        self.resizes += 1;
    }

    fn set_camera(&mut self, _camera: &Camera) {}

    fn set_portal_surface(&mut self, _portal: PortalId, _source: SurfaceSource) {}

    fn render(&mut self, _target: TargetHandle) {
        self.renders += 1;
    }
}

/// HUD that logs once a second
#[derive(Debug, Default)]
struct LogHud {
    frames: u32,
}

impl HudSink for LogHud {
    fn present(&mut self, snapshot: &HudSnapshot) {
        self.frames += 1;
        if self.frames % 60 != 0 {
            return;
        }
        log::info!("{}", snapshot.status_line());
        if let Some(text) = &snapshot.resolution_text {
            log::debug!("\n{text}");
        }
    }
}

/// Scripted input: strafe back and forth, sweep the view and keep firing
fn scripted_input(frame: u32) -> FrameInput {
    let t = frame as f32 * FRAME_DT;
    let mut input = FrameInput {
        move_axis: Vec2::new((t * 0.7).sin(), 0.0),
        look_delta: Vec2::new((t * 0.5).cos() * 0.01, 0.0),
        jump: frame % 240 == 120,
        fire_primary: frame % 20 == 0,
        ..Default::default()
    };
    match frame {
        0 => input.action = Some(MenuAction::Start(GameMode::Battle)),
        // Place both portals, then go back to the ball
        300 | 330 => input.switch_weapon = true,
        310 => input.fire_primary = true,
        320 => {
            input.fire_primary = false;
            input.fire_secondary = true;
        }
        _ => {}
    }
    input
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("settings.json"));
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5eed);

    let settings = Settings::load_or_default(&settings_path);
    log::info!(
        "portal-arena starting (quality {}, seed {seed:#x})",
        settings.quality.as_str()
    );

    let mut world = World::new(seed, settings.tuning);
    let mut director = DirectPath { arena: world.arena };
    let mut renderer = PortalRenderer::new(SCREEN_WIDTH, settings.quality);
    let mut backend = CountingBackend::default();
    let mut hud = LogHud::default();
    let aspect = SCREEN_WIDTH as f32 / SCREEN_HEIGHT as f32;

    for frame in 0..FRAMES {
        update(&mut world, &scripted_input(frame), FRAME_DT, &mut director);
        for event in &world.events {
            log::trace!("frame {frame}: {event:?}");
        }

        let viewer = world.player.camera(aspect);
        let report = renderer.render(&mut world.portals, &viewer, &mut backend);
        hud.present(&HudSnapshot::capture(
            &world,
            Some(&report),
            settings.show_resolution_debug,
        ));

        if world.phase == GamePhase::GameOver {
            log::info!("game over at frame {frame}");
            break;
        }
    }

    log::info!(
        "done: {} kills, {:.1}s elapsed, {} scene renders, {} target resizes",
        world.kill_count,
        world.elapsed,
        backend.renders,
        backend.resizes
    );
}
