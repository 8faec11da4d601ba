//! Segment height generators.

use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::HeightProfile;

/// Allowed segment heights for the current field (pixels)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightBounds {
    pub min: f32,
    pub max: f32,
}

impl HeightBounds {
    /// `max = field_height * fraction`, `min = max / 2`
    pub fn for_field(field_height: f32, max_fraction: f32) -> Self {
        let max = field_height * max_fraction;
        Self { min: max / 2.0, max }
    }

    pub fn contains(&self, height: f32) -> bool {
        height >= self.min && height <= self.max
    }
}

/// Produces (top, bottom) heights for a segment.
///
/// `segment_index` counts segments since the session started, so sources
/// can be coherent along the scroll direction.
pub trait HeightSource: Send {
    fn heights(&mut self, segment_index: u64, bounds: HeightBounds) -> (f32, f32);
}

/// Two independent uniform draws per segment
pub struct UniformHeights {
    rng: StdRng,
}

impl UniformHeights {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn draw(&mut self, bounds: HeightBounds) -> f32 {
        if bounds.max > bounds.min {
            self.rng.gen_range(bounds.min..=bounds.max)
        } else {
            bounds.min
        }
    }
}

impl HeightSource for UniformHeights {
    fn heights(&mut self, _segment_index: u64, bounds: HeightBounds) -> (f32, f32) {
        let top = self.draw(bounds);
        let bottom = self.draw(bounds);
        (top, bottom)
    }
}

/// Perlin noise along the segment index; ceiling and floor sample
/// separate rows so they move independently.
pub struct SmoothHeights {
    perlin: Perlin,
    frequency: f64,
}

impl SmoothHeights {
    const CEILING_ROW: f64 = 0.5;
    const FLOOR_ROW: f64 = 17.5;

    pub fn new(seed: u32, frequency: f64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            frequency,
        }
    }

    fn sample(&self, x: f64, row: f64, bounds: HeightBounds) -> f32 {
        // Perlin output is nominally [-1, 1]; clamp guards the rare overshoot
        let n = self.perlin.get([x, row]).clamp(-1.0, 1.0) as f32;
        let t = (n + 1.0) / 2.0;
        (bounds.min + t * (bounds.max - bounds.min)).clamp(bounds.min, bounds.max)
    }
}

impl HeightSource for SmoothHeights {
    fn heights(&mut self, segment_index: u64, bounds: HeightBounds) -> (f32, f32) {
        let x = segment_index as f64 * self.frequency;
        (
            self.sample(x, Self::CEILING_ROW, bounds),
            self.sample(x, Self::FLOOR_ROW, bounds),
        )
    }
}

/// Build the height source named by a profile
pub fn from_profile(profile: HeightProfile) -> Box<dyn HeightSource> {
    match profile {
        HeightProfile::Uniform { seed } => Box::new(UniformHeights::new(seed)),
        HeightProfile::Smooth { seed, frequency } => Box::new(SmoothHeights::new(seed, frequency)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_for_field() {
        let bounds = HeightBounds::for_field(720.0, 0.2);
        assert!((bounds.max - 144.0).abs() < 1e-4);
        assert!((bounds.min - 72.0).abs() < 1e-4);
    }

    #[test]
    fn test_uniform_heights_in_bounds_and_seeded() {
        let bounds = HeightBounds { min: 72.0, max: 144.0 };
        let mut a = UniformHeights::new(Some(9));
        let mut b = UniformHeights::new(Some(9));

        for i in 0..500 {
            let (top, bottom) = a.heights(i, bounds);
            assert!(bounds.contains(top));
            assert!(bounds.contains(bottom));
            assert_eq!((top, bottom), b.heights(i, bounds));
        }
    }

    #[test]
    fn test_smooth_heights_in_bounds_and_continuous() {
        let bounds = HeightBounds { min: 50.0, max: 100.0 };
        let mut source = SmoothHeights::new(3, 0.05);

        let mut previous = source.heights(0, bounds);
        for i in 1..400 {
            let current = source.heights(i, bounds);
            assert!(bounds.contains(current.0));
            assert!(bounds.contains(current.1));
            // Low frequency noise moves gently between neighbours
            assert!((current.0 - previous.0).abs() < 0.25 * (bounds.max - bounds.min));
            previous = current;
        }
    }

    #[test]
    fn test_degenerate_bounds() {
        let bounds = HeightBounds { min: 10.0, max: 10.0 };
        let mut source = UniformHeights::new(Some(1));
        assert_eq!(source.heights(0, bounds), (10.0, 10.0));
    }
}
