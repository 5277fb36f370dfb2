//! Bubble entity and its derived visuals

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{APPEAR_BOUNCE, APPEAR_SECS};
use crate::settings::EngineSettings;
use crate::{polar_to_cartesian, wrap_angle};

/// Reconciliation state of a live bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BubbleStatus {
    /// Created locally, not yet echoed by the feed
    Pending,
    /// Known to the feed
    Confirmed,
}

/// A time-boxed discussion room orbiting the shared center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub id: String,
    pub label: String,
    pub reflection_count: u32,
    /// Distance from the orbit center
    pub orbit_radius: f32,
    /// Angular position (radians, [0, 2π))
    pub angle: f32,
    /// Radians per second, fixed at creation
    pub angular_speed: f32,
    /// Epoch millis
    pub created_at_ms: i64,
    pub status: BubbleStatus,
    /// Current glow magnitude (0 when idle)
    #[serde(skip)]
    pub glow: f32,
    /// Seconds into the running glow pulse
    #[serde(skip)]
    pulse: Option<f32>,
    /// Seconds since the bubble entered the engine (appear animation)
    #[serde(skip)]
    age_secs: f32,
}

impl Bubble {
    pub fn new(
        id: String,
        label: String,
        reflection_count: u32,
        created_at_ms: i64,
        status: BubbleStatus,
    ) -> Self {
        Self {
            id,
            label,
            reflection_count,
            orbit_radius: 0.0,
            angle: 0.0,
            angular_speed: 0.0,
            created_at_ms,
            status,
            glow: 0.0,
            pulse: None,
            age_secs: 0.0,
        }
    }

    /// Live iff `now - created_at <= ttl`
    #[inline]
    pub fn is_live(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) <= ttl_ms
    }

    /// Cartesian position around `center`
    #[inline]
    pub fn position(&self, center: Vec2) -> Vec2 {
        center + polar_to_cartesian(self.orbit_radius, self.angle)
    }

    /// Advance angle and animations by `dt` seconds.
    /// Returns true when a glow pulse finished during this step.
    pub fn advance(&mut self, dt: f32, settings: &EngineSettings) -> bool {
        self.angle = wrap_angle(self.angle + self.angular_speed * dt);
        self.age_secs += dt;

        let Some(elapsed) = self.pulse else {
            return false;
        };
        let elapsed = elapsed + dt;
        if elapsed >= settings.glow_secs() {
            self.pulse = None;
            self.glow = 0.0;
            true
        } else {
            self.pulse = Some(elapsed);
            self.glow = glow_curve(elapsed, settings);
            false
        }
    }

    /// Count a reflection and restart the glow pulse
    pub fn reflect(&mut self) {
        self.reflection_count = self.reflection_count.saturating_add(1);
        self.pulse = Some(0.0);
        self.glow = 0.0;
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some()
    }

    /// Diameter, growing linearly with reflections up to the cap
    pub fn size(&self, settings: &EngineSettings) -> f32 {
        settings.base_size
            + self.reflection_count.min(settings.size_cap) as f32 * settings.size_per_reflection
    }

    /// Position along the color ramp, in [0, 1]
    fn ramp(&self, settings: &EngineSettings) -> f32 {
        let cap = settings.color_cap.max(1);
        self.reflection_count.min(cap) as f32 / cap as f32
    }

    /// RGB interpolated from `color_low` to `color_high`
    pub fn color(&self, settings: &EngineSettings) -> [u8; 3] {
        let t = self.ramp(settings);
        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            let lo = settings.color_low[i] as f32;
            let hi = settings.color_high[i] as f32;
            *channel = (lo + (hi - lo) * t).round().clamp(0.0, 255.0) as u8;
        }
        rgb
    }

    /// Emissive intensity, saturating at `max_intensity`
    pub fn intensity(&self, settings: &EngineSettings) -> f32 {
        self.ramp(settings) * settings.max_intensity
    }

    /// Scale multiplier for the appear animation (1.0 once settled)
    pub fn appear_scale(&self) -> f32 {
        if self.age_secs >= APPEAR_SECS {
            return 1.0;
        }
        let appear = (self.age_secs / APPEAR_SECS).clamp(0.0, 1.0);
        appear * (1.0 + APPEAR_BOUNCE * (appear * PI).sin())
    }
}

/// Glow magnitude `elapsed` seconds into a pulse: linear rise to the peak,
/// then linear decay to zero.
pub fn glow_curve(elapsed: f32, settings: &EngineSettings) -> f32 {
    let rise = settings.glow_rise_secs;
    let decay = settings.glow_decay_secs;
    if elapsed < 0.0 {
        0.0
    } else if elapsed < rise {
        settings.glow_peak * elapsed / rise
    } else if elapsed < rise + decay {
        settings.glow_peak * (1.0 - (elapsed - rise) / decay)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(count: u32) -> Bubble {
        Bubble::new("b".into(), "Test".into(), count, 0, BubbleStatus::Confirmed)
    }

    #[test]
    fn test_extreme_created_at_never_live() {
        let bubble = Bubble::new("a".into(), "a".into(), 0, i64::MIN, BubbleStatus::Confirmed);
        assert!(!bubble.is_live(1_700_000_000_000, crate::consts::BUBBLE_TTL_MS));
    }

    #[test]
    fn test_size_saturates() {
        let settings = EngineSettings::default();
        assert_eq!(bubble(0).size(&settings), 40.0);
        assert_eq!(bubble(3).size(&settings), 52.0);
        assert_eq!(bubble(10).size(&settings), 80.0);
        assert_eq!(bubble(50).size(&settings), 80.0);
    }

    #[test]
    fn test_color_ramp_endpoints() {
        let settings = EngineSettings::default();
        assert_eq!(bubble(0).color(&settings), [255, 249, 237]);
        assert_eq!(bubble(5).color(&settings), [255, 214, 0]);
        assert_eq!(bubble(9).color(&settings), [255, 214, 0]);
        // Halfway-ish: t = 0.4
        assert_eq!(bubble(2).color(&settings), [255, 235, 142]);
    }

    #[test]
    fn test_intensity_saturates() {
        let settings = EngineSettings::default();
        assert_eq!(bubble(0).intensity(&settings), 0.0);
        assert!((bubble(1).intensity(&settings) - 0.2).abs() < 1e-6);
        assert_eq!(bubble(5).intensity(&settings), 1.0);
        assert_eq!(bubble(8).intensity(&settings), 1.0);
    }

    #[test]
    fn test_glow_curve_shape() {
        let settings = EngineSettings::default();
        assert_eq!(glow_curve(0.0, &settings), 0.0);
        assert!((glow_curve(0.06, &settings) - 6.0).abs() < 1e-4);
        assert!((glow_curve(0.12, &settings) - 12.0).abs() < 1e-4);
        assert!((glow_curve(0.22, &settings) - 6.0).abs() < 1e-4);
        assert_eq!(glow_curve(0.5, &settings), 0.0);
    }

    #[test]
    fn test_pulse_completes_once() {
        let settings = EngineSettings::default();
        let mut b = bubble(0);
        b.reflect();
        assert!(b.is_pulsing());

        let mut completions = 0;
        for _ in 0..40 {
            if b.advance(1.0 / 60.0, &settings) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(!b.is_pulsing());
        assert_eq!(b.glow, 0.0);
    }

    #[test]
    fn test_appear_scale() {
        let settings = EngineSettings::default();
        let mut b = bubble(0);
        assert_eq!(b.appear_scale(), 0.0);
        b.advance(0.3, &settings);
        // appear = 0.5, bounce = 1.2
        assert!((b.appear_scale() - 0.6).abs() < 1e-5);
        b.advance(0.5, &settings);
        assert_eq!(b.appear_scale(), 1.0);
    }
}
