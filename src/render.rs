//! Read-only projection of the live set for a rendering backend
//!
//! Nothing here feeds back into the simulation.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::Serialize;

use crate::settings::EngineSettings;
use crate::sim::{Bubble, BubbleStatus};

/// Everything a view needs to draw one bubble
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBubble {
    pub id: String,
    pub label: String,
    pub status: BubbleStatus,
    pub reflection_count: u32,
    /// Cartesian center
    pub position: Vec2,
    /// Diameter (collision size)
    pub size: f32,
    /// Appear-animation multiplier on top of `size`
    pub scale: f32,
    pub color: [u8; 3],
    pub intensity: f32,
    pub glow: f32,
}

impl RenderBubble {
    pub fn from_bubble(bubble: &Bubble, settings: &EngineSettings) -> Self {
        Self {
            id: bubble.id.clone(),
            label: bubble.label.clone(),
            status: bubble.status,
            reflection_count: bubble.reflection_count,
            position: bubble.position(settings.center),
            size: bubble.size(settings),
            scale: bubble.appear_scale(),
            color: bubble.color(settings),
            intensity: bubble.intensity(settings),
            glow: bubble.glow,
        }
    }

    /// Size actually drawn this frame, including glow
    pub fn drawn_size(&self) -> f32 {
        self.size * self.scale + self.glow
    }

    /// Pack for a GPU instance buffer
    pub fn instance(&self) -> BubbleInstance {
        let [r, g, b] = self.color.map(|c| c as f32 / 255.0);
        BubbleInstance {
            position: self.position.to_array(),
            size: self.size * self.scale,
            glow: self.glow,
            color: [r, g, b, self.intensity],
        }
    }
}

/// Per-bubble instance data (32 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BubbleInstance {
    pub position: [f32; 2],
    pub size: f32,
    pub glow: f32,
    /// rgb + intensity
    pub color: [f32; 4],
}

/// Pack a whole snapshot into instance bytes
pub fn instance_bytes(bubbles: &[RenderBubble]) -> Vec<u8> {
    let instances: Vec<BubbleInstance> = bubbles.iter().map(RenderBubble::instance).collect();
    bytemuck::cast_slice(&instances).to_vec()
}
