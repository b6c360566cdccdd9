//! Game settings and tuning
//!
//! Loaded from a JSON file; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Largest portal render target side length
    pub fn max_portal_resolution(&self) -> u32 {
        match self {
            QualityPreset::Low => 1024,
            QualityPreset::Medium => 2048,
            QualityPreset::High => PORTAL_RT_MAX,
        }
    }
}

/// Empirically tuned physics constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Balls ===
    pub ball_gravity: f32,
    /// Velocity multiplier applied every step
    pub ball_air_drag: f32,
    /// Restitution against static faces
    pub ball_bounce: f32,
    /// Tangential velocity multiplier on contact
    pub ball_friction: f32,
    /// Ball-ball restitution
    pub ball_restitution: f32,

    // === Player ===
    pub player_gravity: f32,
    /// Carry velocity multiplier applied on every grounded step
    pub landing_carry_decay: f32,
    pub max_horizontal_speed: f32,
    pub max_vertical_speed: f32,

    // === Enemies ===
    pub enemy_follow_accel: f32,
    pub enemy_knockback_scale: f32,
    pub enemy_immediate_push: f32,
    /// Ball rebound factor off an enemy
    pub enemy_ball_bounce: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_gravity: BALL_GRAVITY,
            ball_air_drag: BALL_AIR_DRAG,
            ball_bounce: BALL_BOUNCE,
            ball_friction: BALL_FRICTION,
            ball_restitution: BALL_RESTITUTION,

            player_gravity: GRAVITY,
            landing_carry_decay: LANDING_CARRY_DECAY,
            max_horizontal_speed: MAX_PLAYER_HORIZONTAL_SPEED,
            max_vertical_speed: MAX_PLAYER_VERTICAL_SPEED,

            enemy_follow_accel: ENEMY_FOLLOW_ACCEL,
            enemy_knockback_scale: ENEMY_KNOCKBACK_SCALE,
            enemy_immediate_push: ENEMY_IMMEDIATE_PUSH,
            enemy_ball_bounce: ENEMY_BALL_BOUNCE,
        }
    }
}

impl Tuning {
    /// Reject values that would make the simulation gain energy or go non-finite
    pub fn validate(&self) -> Result<(), SettingsError> {
        let unit_factors = [
            ("ball_air_drag", self.ball_air_drag),
            ("ball_bounce", self.ball_bounce),
            ("ball_friction", self.ball_friction),
            ("ball_restitution", self.ball_restitution),
            ("landing_carry_decay", self.landing_carry_decay),
        ];
        for (field, value) in unit_factors {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        let non_negative = [
            ("max_horizontal_speed", self.max_horizontal_speed),
            ("max_vertical_speed", self.max_vertical_speed),
            ("enemy_follow_accel", self.enemy_follow_accel),
            ("enemy_knockback_scale", self.enemy_knockback_scale),
            ("enemy_immediate_push", self.enemy_immediate_push),
            ("enemy_ball_bounce", self.enemy_ball_bounce),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{value} must be finite and non-negative"),
                });
            }
        }
        for (field, value) in [("ball_gravity", self.ball_gravity), ("player_gravity", self.player_gravity)] {
            if !value.is_finite() {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must be finite".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Include the per-portal resolution breakdown in the HUD snapshot
    pub show_resolution_debug: bool,
    pub tuning: Tuning,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.tuning.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "quality": "High", "tuning": { "ball_bounce": 0.5 } }"#)
            .expect("valid settings");
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.tuning.ball_bounce, 0.5);
        assert_eq!(settings.tuning.ball_friction, BALL_FRICTION);
        assert_eq!(settings.tuning.landing_carry_decay, LANDING_CARRY_DECAY);
    }

    #[test]
    fn test_rejects_energy_gain() {
        let err = Settings::from_json(r#"{ "tuning": { "ball_restitution": 1.4 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "ball_restitution", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Settings::from_json("{ quality: ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load_or_default(Path::new("/nonexistent/portal-arena.json"));
        assert_eq!(settings.quality, QualityPreset::Medium);
        assert_eq!(settings.tuning, Tuning::default());
    }

    #[test]
    fn test_preset_resolution_cap() {
        assert_eq!(QualityPreset::from_str("LOW"), Some(QualityPreset::Low));
        assert!(QualityPreset::Low.max_portal_resolution() < QualityPreset::High.max_portal_resolution());
        assert_eq!(QualityPreset::High.max_portal_resolution(), PORTAL_RT_MAX);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("portal-arena-settings-{}.json", std::process::id()));
        let settings = Settings::from_preset(QualityPreset::Low);
        settings.save(&path).expect("save");
        let loaded = Settings::load(&path).expect("load");
        assert_eq!(loaded.quality, QualityPreset::Low);
        let _ = std::fs::remove_file(&path);
    }
}
