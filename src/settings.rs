//! Engine settings and layout presets
//!
//! Persisted as JSON alongside the host app's other preferences.

use std::f32::consts::TAU;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Layout preset, one per rendering variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutPreset {
    /// Flat canvas of absolutely positioned views (pixel units)
    #[default]
    Canvas2d,
    /// WebGL sphere scene (world units)
    Scene3d,
}

impl LayoutPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutPreset::Canvas2d => "canvas2d",
            LayoutPreset::Scene3d => "scene3d",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "canvas2d" | "2d" | "canvas" => Some(LayoutPreset::Canvas2d),
            "scene3d" | "3d" | "scene" => Some(LayoutPreset::Scene3d),
            _ => None,
        }
    }
}

/// Tunable engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub preset: LayoutPreset,

    // === Orbit layout ===
    /// Shared orbit center
    pub center: Vec2,
    /// Orbit radius of the first bubble
    pub base_orbit: f32,
    /// Extra orbit radius per bubble already live
    pub orbit_step: f32,
    /// Upper bound of the random radius jitter (jitter is in [0, this))
    pub orbit_jitter: f32,
    /// Floor for orbit radius after repulsion
    pub min_orbit_radius: f32,
    /// Angular speed range (radians/second)
    pub min_angular_speed: f32,
    pub max_angular_speed: f32,

    // === Repulsion ===
    /// Fraction of the overlap corrected per pass, in (0, 1]
    pub damping: f32,

    // === Derived visuals ===
    /// Size (diameter) of a bubble with no reflections
    pub base_size: f32,
    /// Size added per reflection
    pub size_per_reflection: f32,
    /// Reflection count at which size stops growing
    pub size_cap: u32,
    /// RGB at zero reflections
    pub color_low: [u8; 3],
    /// RGB at the ramp cap
    pub color_high: [u8; 3],
    /// Reflection count at which color and intensity saturate
    pub color_cap: u32,
    /// Intensity at the ramp cap
    pub max_intensity: f32,

    // === Glow pulse ===
    pub glow_peak: f32,
    pub glow_rise_secs: f32,
    pub glow_decay_secs: f32,

    // === Lifecycle ===
    pub ttl_ms: i64,
    pub expiry_interval_secs: f32,
    pub collision_interval_secs: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_preset(LayoutPreset::Canvas2d)
    }
}

impl EngineSettings {
    /// Create settings from a layout preset
    pub fn from_preset(preset: LayoutPreset) -> Self {
        let mut settings = Self {
            preset,
            center: Vec2::ZERO,
            base_orbit: 0.0,
            orbit_step: 0.0,
            orbit_jitter: 0.0,
            min_orbit_radius: 0.0,
            min_angular_speed: 0.0,
            max_angular_speed: 0.0,
            damping: 0.5,
            base_size: 0.0,
            size_per_reflection: 0.0,
            size_cap: 0,
            color_low: [255, 249, 237],
            color_high: [255, 214, 0],
            color_cap: COLOR_RAMP_COUNT,
            max_intensity: 1.0,
            glow_peak: 12.0,
            glow_rise_secs: 0.12,
            glow_decay_secs: 0.2,
            ttl_ms: BUBBLE_TTL_MS,
            expiry_interval_secs: EXPIRY_INTERVAL_SECS,
            collision_interval_secs: COLLISION_INTERVAL_SECS,
        };
        settings.apply_preset(preset);
        settings
    }

    /// Apply a layout preset (updates unit-dependent settings only)
    pub fn apply_preset(&mut self, preset: LayoutPreset) {
        self.preset = preset;
        match preset {
            LayoutPreset::Canvas2d => {
                self.base_orbit = 60.0;
                self.orbit_step = 12.0;
                self.orbit_jitter = 20.0;
                self.min_orbit_radius = 40.0;
                // One revolution every 10-15 seconds
                self.min_angular_speed = TAU / 15.0;
                self.max_angular_speed = TAU / 10.0;
                self.base_size = 40.0;
                self.size_per_reflection = 4.0;
                self.size_cap = 10;
                self.glow_peak = 12.0;
            }
            LayoutPreset::Scene3d => {
                self.base_orbit = 3.0;
                self.orbit_step = 0.25;
                self.orbit_jitter = 3.0;
                self.min_orbit_radius = 2.0;
                self.min_angular_speed = 0.4;
                self.max_angular_speed = 0.6;
                self.base_size = 0.5;
                self.size_per_reflection = 0.1;
                self.size_cap = 20;
                self.glow_peak = 0.3;
            }
        }
    }

    /// Full length of a glow pulse
    pub fn glow_secs(&self) -> f32 {
        self.glow_rise_secs + self.glow_decay_secs
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid =
            |msg: &str| -> Result<(), SettingsError> { Err(SettingsError::Invalid(msg.to_string())) };

        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return invalid("damping must be in (0, 1]");
        }
        if self.min_angular_speed > self.max_angular_speed {
            return invalid("min_angular_speed exceeds max_angular_speed");
        }
        if self.base_orbit < 0.0 || self.orbit_step < 0.0 || self.orbit_jitter < 0.0 {
            return invalid("orbit layout values must be non-negative");
        }
        if self.min_orbit_radius < 0.0 {
            return invalid("min_orbit_radius must be non-negative");
        }
        if self.base_size <= 0.0 || self.size_per_reflection < 0.0 {
            return invalid("bubble size must be positive");
        }
        if self.color_cap == 0 {
            return invalid("color_cap must be at least 1");
        }
        if self.ttl_ms <= 0 {
            return invalid("ttl_ms must be positive");
        }
        if self.expiry_interval_secs <= 0.0 || self.collision_interval_secs <= 0.0 {
            return invalid("cadence intervals must be positive");
        }
        if self.glow_rise_secs < 0.0 || self.glow_decay_secs < 0.0 {
            return invalid("glow durations must be non-negative");
        }
        Ok(())
    }

    /// Load settings from a JSON file; missing fields take `Default` values
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!(
            "Loaded {} settings from {}",
            settings.preset.as_str(),
            path.as_ref().display()
        );
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineSettings::default().validate().is_ok());
        assert!(EngineSettings::from_preset(LayoutPreset::Scene3d).validate().is_ok());
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!(LayoutPreset::from_str("3D"), Some(LayoutPreset::Scene3d));
        assert_eq!(LayoutPreset::from_str("canvas"), Some(LayoutPreset::Canvas2d));
        assert_eq!(LayoutPreset::from_str("vr"), None);
    }

    #[test]
    fn test_validate_rejects_bad_damping() {
        let mut settings = EngineSettings::default();
        settings.damping = 0.0;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
        settings.damping = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EngineSettings = serde_json::from_str(r#"{"damping": 0.25}"#).unwrap();
        assert_eq!(settings.damping, 0.25);
        assert_eq!(settings.base_orbit, 60.0);
        assert_eq!(settings.ttl_ms, BUBBLE_TTL_MS);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "bubble_trouble_settings_{}.json",
            std::process::id()
        ));
        let settings = EngineSettings::from_preset(LayoutPreset::Scene3d);
        settings.save(&path).unwrap();
        let loaded = EngineSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }
}
