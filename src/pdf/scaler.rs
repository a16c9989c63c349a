//! Output bitmap sizing.

use super::engine::Transform;

/// Per-axis scale from page points to output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    /// `zoom * density` on both axes.
    pub fn uniform(density: f32, zoom: f32) -> Self {
        let factor = zoom * density;
        Self {
            x: factor,
            y: factor,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::scale(self.x, self.y)
    }
}

/// Computes the output bitmap size for a page of `page_width` x `page_height`
/// points rendered at `density` and `zoom`.
///
/// Each axis is rounded to the nearest pixel and never drops below 1.
pub fn compute_size(page_width: f32, page_height: f32, density: f32, zoom: f32) -> (u32, u32) {
    compute_scaled_size(page_width, page_height, Scale::uniform(density, zoom))
}

/// Like [`compute_size`], with an explicit per-axis scale.
pub fn compute_scaled_size(page_width: f32, page_height: f32, scale: Scale) -> (u32, u32) {
    (
        scaled_dimension(page_width, scale.x),
        scaled_dimension(page_height, scale.y),
    )
}

fn scaled_dimension(points: f32, scale: f32) -> u32 {
    // `max` also maps NaN to 1; the cast saturates at u32::MAX.
    (points * scale).round().max(1.0) as u32
}
