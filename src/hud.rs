//! HUD snapshot
//!
//! The HUD collaborator gets a read-only copy of what it draws once per
//! frame; nothing in the core reads HUD state back.

use crate::consts::*;
use crate::renderer::FrameReport;
use crate::sim::{GameMode, GamePhase, Weapon, World};

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub weapon: Weapon,
    pub health: f32,
    pub ball_reserve: u32,
    /// Progress toward the next reserve ball in [0, 1]
    pub reserve_regen: f32,
    pub kill_count: u32,
    /// Remaining red flash after a hit
    pub hit_flash: f32,
    /// Per-portal resolution readout, when enabled in settings
    pub resolution_text: Option<String>,
}

impl HudSnapshot {
    pub fn capture(world: &World, report: Option<&FrameReport>, show_resolution_debug: bool) -> Self {
        Self {
            phase: world.phase,
            mode: world.mode,
            weapon: world.weapon,
            health: world.player.health,
            ball_reserve: world.ball_reserve,
            reserve_regen: world.regen_fraction(),
            kill_count: world.kill_count,
            hit_flash: world.player.hit_flash,
            resolution_text: report.filter(|_| show_resolution_debug).map(FrameReport::debug_text),
        }
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health / PLAYER_MAX_HEALTH).clamp(0.0, 1.0)
    }

    /// One-line status, used by the headless driver
    pub fn status_line(&self) -> String {
        format!(
            "[{}] hp {:.0} balls {}/{} kills {}",
            self.phase.as_str(),
            self.health,
            self.ball_reserve,
            BALL_RESERVE_MAX,
            self.kill_count
        )
    }
}

/// HUD collaborator
pub trait HudSink {
    fn present(&mut self, snapshot: &HudSnapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::MenuAction;

    #[test]
    fn test_capture_reflects_world() {
        let mut world = World::new(3, Tuning::default());
        world.apply_action(MenuAction::Start(GameMode::Battle));
        world.fire_ball();
        world.player.take_hit(ENEMY_PROJECTILE_DAMAGE);

        let hud = HudSnapshot::capture(&world, None, true);
        assert_eq!(hud.phase, GamePhase::Playing);
        assert_eq!(hud.ball_reserve, BALL_RESERVE_MAX - 1);
        assert_eq!(hud.reserve_regen, 0.0);
        assert!((hud.health_fraction() - 0.9).abs() < 1e-6);
        assert!(hud.hit_flash > 0.0);
        assert!(hud.resolution_text.is_none());
        assert_eq!(hud.status_line(), "[playing] hp 90 balls 4/5 kills 0");
    }

    #[test]
    fn test_resolution_text_only_when_enabled() {
        let world = World::new(3, Tuning::default());
        let report = FrameReport::default();
        assert!(HudSnapshot::capture(&world, Some(&report), false).resolution_text.is_none());
        let text = HudSnapshot::capture(&world, Some(&report), true).resolution_text;
        assert!(text.is_some_and(|t| t.starts_with("Portal A:")));
    }
}
