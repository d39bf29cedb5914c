use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Viewport centre tracking the player, kept inside the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Vec2,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            center: viewport / 2.0,
            viewport,
        }
    }

    /// Centre on `target`, clamped so the viewport never shows past the edges.
    ///
    /// A world narrower than the viewport is centred on that axis.
    pub fn follow(&mut self, target: Vec2, world_size: Vec2) {
        let half = self.viewport / 2.0;
        self.center = Vec2::new(
            clamp_axis(target.x, half.x, world_size.x),
            clamp_axis(target.y, half.y, world_size.y),
        );
    }

    /// Top-left corner of the visible region in world units.
    pub fn top_left(&self) -> Vec2 {
        self.center - self.viewport / 2.0
    }
}

fn clamp_axis(target: f32, half: f32, extent: f32) -> f32 {
    if extent <= half * 2.0 {
        extent / 2.0
    } else {
        target.clamp(half, extent - half)
    }
}
