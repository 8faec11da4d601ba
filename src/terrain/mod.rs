//! Horizontally scrolling cave terrain.
//!
//! A fixed window of segments slides left as time passes. Segments that
//! leave the viewport are recycled at the trailing edge with fresh heights,
//! so the landscape is endless while storage stays constant.

mod heights;
mod scroller;

pub use heights::{HeightBounds, HeightSource, SmoothHeights, UniformHeights};
pub use scroller::TerrainScroller;

use glam::Vec2;

/// Axis-aligned rectangle in window pixels (y grows downward)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Letterboxed play area derived from the viewport at a fixed aspect ratio.
///
/// Full viewport width; height = width / aspect, centred vertically.
pub fn game_field(viewport: &Rect, aspect: f32) -> Rect {
    let height = viewport.width / aspect;
    Rect::new(
        viewport.x,
        viewport.y + (viewport.height - height) / 2.0,
        viewport.width,
        height,
    )
}

/// One column of terrain: a ceiling hanging from the field top and a floor
/// rising from the field bottom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSegment {
    /// Left edge in window pixels
    pub start_x: f32,
    /// Ceiling depth below the field top (pixels)
    pub top_height: f32,
    /// Floor height above the field bottom (pixels)
    pub bottom_height: f32,
}

impl TerrainSegment {
    /// Ceiling rectangle for drawing
    pub fn ceiling(&self, field: &Rect, width: f32) -> Rect {
        Rect::new(self.start_x, field.y, width, self.top_height)
    }

    /// Floor rectangle for drawing
    pub fn floor(&self, field: &Rect, width: f32) -> Rect {
        Rect::new(
            self.start_x,
            field.y + field.height - self.bottom_height,
            width,
            self.bottom_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_field_letterbox() {
        // 16:9 viewport fills exactly
        let field = game_field(&Rect::new(0.0, 0.0, 1280.0, 720.0), 16.0 / 9.0);
        assert!((field.height - 720.0).abs() < 1e-3);
        assert!(field.y.abs() < 1e-3);

        // Taller viewport gets bars top and bottom
        let field = game_field(&Rect::new(0.0, 0.0, 1280.0, 1000.0), 16.0 / 9.0);
        assert!((field.height - 720.0).abs() < 1e-3);
        assert!((field.y - 140.0).abs() < 1e-3);
    }

    #[test]
    fn test_segment_rects_hug_field_edges() {
        let field = Rect::new(0.0, 100.0, 1280.0, 720.0);
        let seg = TerrainSegment {
            start_x: 64.0,
            top_height: 90.0,
            bottom_height: 120.0,
        };

        let ceiling = seg.ceiling(&field, 64.0);
        assert_eq!(ceiling, Rect::new(64.0, 100.0, 64.0, 90.0));

        let floor = seg.floor(&field, 64.0);
        assert_eq!(floor.max().y, field.max().y);
        assert_eq!(floor.height, 120.0);
    }
}
