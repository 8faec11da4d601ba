//! Fixed-capacity terrain window that recycles segments as it scrolls.

use super::heights::{from_profile, HeightBounds, HeightSource};
use super::{game_field, Rect, TerrainSegment};
use crate::params::TerrainParams;

/// Storage for one window position. Heights and geometry are generated
/// lazily and cleared together when the slot is recycled.
#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    heights: Option<(f32, f32)>,
    start_x: Option<f32>,
}

/// Endless scrolling terrain backed by `segments_per_viewport + 1` slots
pub struct TerrainScroller {
    params: TerrainParams,
    slots: Vec<Slot>,
    source: Box<dyn HeightSource>,
    /// Simulated seconds since the session started
    elapsed_s: f64,
    /// Scroll distance in segments (`speed * elapsed`)
    begin_offset: f64,
    /// Whole segments recycled so far
    current_index: u64,
    segment_width: f32,
    field: Rect,
    bounds: HeightBounds,
}

impl TerrainScroller {
    /// Create a scroller using the height profile from `params`
    pub fn new(params: TerrainParams) -> Self {
        let source = from_profile(params.height_profile);
        Self::with_source(params, source)
    }

    /// Create a scroller with an explicit height source
    pub fn with_source(params: TerrainParams, source: Box<dyn HeightSource>) -> Self {
        let slots = vec![Slot::default(); params.segments_stored()];
        Self {
            params,
            slots,
            source,
            elapsed_s: 0.0,
            begin_offset: 0.0,
            current_index: 0,
            segment_width: 0.0,
            field: Rect::default(),
            bounds: HeightBounds { min: 0.0, max: 0.0 },
        }
    }

    /// Advance the scroll by `dt` seconds against the current viewport.
    ///
    /// A zero-area viewport is a no-op: time does not advance and nothing
    /// is generated or moved.
    pub fn advance(&mut self, viewport: &Rect, dt: f32) {
        if viewport.is_empty() {
            return;
        }

        let field = game_field(viewport, self.params.field_aspect);
        if field.is_empty() {
            return;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed_s += dt as f64;
        self.begin_offset = self.params.speed_segments_per_s * self.elapsed_s;

        self.segment_width = (field.width / self.params.segments_per_viewport as f32).ceil();
        self.bounds = HeightBounds::for_field(field.height, self.params.max_height_fraction);
        self.field = field;

        self.populate();
        if self.recycle() > 0 {
            self.populate();
        }
    }

    /// Generate missing heights/geometry and reposition existing segments
    fn populate(&mut self) {
        let width = self.segment_width;
        let scrolled = (self.begin_offset - self.current_index as f64) as f32;
        let mut previous_x: Option<f32> = None;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.heights.is_none() {
                let index = self.current_index + i as u64;
                slot.heights = Some(self.source.heights(index, self.bounds));
            }

            let x = match (slot.start_x, previous_x) {
                (Some(_), _) => (i as f32 - scrolled) * width,
                (None, Some(prev)) => prev + width,
                (None, None) => 0.0,
            };
            slot.start_x = Some(x);
            previous_x = Some(x);
        }
    }

    /// Shift out segments that have fully left the viewport.
    ///
    /// Returns the number of recycled slots.
    fn recycle(&mut self) -> usize {
        let target = self.begin_offset.floor() as u64;
        if target <= self.current_index {
            return 0;
        }

        let len = self.slots.len();
        let count = (target - self.current_index).min(len as u64) as usize;
        if count == len {
            self.slots.fill(Slot::default());
        } else {
            self.slots.rotate_left(count);
            self.slots[len - count..].fill(Slot::default());
        }

        log::trace!("recycled {} terrain segments at index {}", count, target);
        self.current_index = target;
        count
    }

    /// Generated segments in window order (leftmost first)
    pub fn segments(&self) -> impl Iterator<Item = TerrainSegment> + '_ {
        self.slots.iter().filter_map(Self::segment_of)
    }

    /// Segment stored at window slot `index`, if generated
    pub fn segment(&self, index: usize) -> Option<TerrainSegment> {
        self.slots.get(index).and_then(Self::segment_of)
    }

    fn segment_of(slot: &Slot) -> Option<TerrainSegment> {
        match (slot.start_x, slot.heights) {
            (Some(start_x), Some((top_height, bottom_height))) => Some(TerrainSegment {
                start_x,
                top_height,
                bottom_height,
            }),
            _ => None,
        }
    }

    /// Window capacity (constant for the scroller's lifetime)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn segment_width(&self) -> f32 {
        self.segment_width
    }

    /// Game field used on the last non-degenerate tick
    pub fn field(&self) -> Rect {
        self.field
    }

    /// Height bounds used on the last non-degenerate tick
    pub fn height_bounds(&self) -> HeightBounds {
        self.bounds
    }

    pub fn begin_offset(&self) -> f64 {
        self.begin_offset
    }

    pub fn current_index(&self) -> u64 {
        self.current_index
    }
}
