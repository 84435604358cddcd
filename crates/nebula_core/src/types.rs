use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screen-space rectangle of a surface, in pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// World offset that places this surface's top-left corner at the origin
    pub fn world_offset(&self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// One surface as reported by the window registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Stable identity for the lifetime of the surface
    pub id: Uuid,
    pub rect: Rect,
    /// Position within the registry's ordered sequence
    pub index: usize,
}

/// A moving attractor. Derived every frame, never stored.
pub type CenterPoint = Vec3;

/// A single simulated particle.
///
/// `position`, `velocity` and `target_center` always change together within
/// one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Index into the current center list
    pub target_center: usize,
    /// Hue in turns (0..1), shared by every particle of a system
    pub color_hue: f32,
}

/// Per-system drawing parameters, refreshed without a rebuild
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderHints {
    pub size: f32,
    pub opacity: f32,
}

/// Vertex handed to the renderer, one per particle
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DrawVertex {
    pub position: [f32; 3],
    /// RGBA, alpha carries the system opacity
    pub color: [f32; 4],
}
