//! Scrolling terrain parameters.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Segments across one game-field width
pub const SEGMENTS_PER_VIEWPORT: usize = 20;

/// Game field aspect ratio (width / height), letterboxed inside the viewport
pub const FIELD_ASPECT: f32 = 16.0 / 9.0;

/// How segment heights are drawn
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HeightProfile {
    /// Independent uniform draws per segment (seeded if `seed` is set)
    Uniform { seed: Option<u64> },

    /// Perlin noise over the absolute segment index, for rolling caves
    Smooth {
        seed: u32,
        /// Noise cycles per segment
        frequency: f64,
    },
}

impl Default for HeightProfile {
    fn default() -> Self {
        Self::Uniform { seed: None }
    }
}

/// Terrain scroller configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Segments visible across the field; the window stores one more
    pub segments_per_viewport: usize,

    /// Tallest segment as a fraction of field height
    pub max_height_fraction: f32,

    /// Scroll speed (segments per second)
    pub speed_segments_per_s: f64,

    /// Game field aspect ratio (width / height)
    pub field_aspect: f32,

    pub height_profile: HeightProfile,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            segments_per_viewport: SEGMENTS_PER_VIEWPORT,
            max_height_fraction: 0.2,
            speed_segments_per_s: 2.0,
            field_aspect: FIELD_ASPECT,
            height_profile: HeightProfile::default(),
        }
    }
}

impl TerrainParams {
    /// Window capacity (segments per viewport + 1 trailing slot)
    pub fn segments_stored(&self) -> usize {
        self.segments_per_viewport + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.segments_per_viewport == 0 {
            return Err(Error::invalid("terrain.segments_per_viewport", "must be > 0"));
        }
        if !(self.max_height_fraction > 0.0 && self.max_height_fraction <= 0.5) {
            return Err(Error::invalid(
                "terrain.max_height_fraction",
                format!("must be in (0, 0.5], got {}", self.max_height_fraction),
            ));
        }
        if !(self.speed_segments_per_s.is_finite() && self.speed_segments_per_s >= 0.0) {
            return Err(Error::invalid(
                "terrain.speed_segments_per_s",
                "must be finite and >= 0",
            ));
        }
        if !(self.field_aspect.is_finite() && self.field_aspect > 0.0) {
            return Err(Error::invalid("terrain.field_aspect", "must be > 0"));
        }
        Ok(())
    }
}
