//! Flattens the simulation into coloured quads for the renderer.
//!
//! All coordinates are window pixels with y growing downward; the shader
//! maps them to clip space using the viewport size.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::audio::{ControlQueue, ControlSample};
use crate::simulation::Simulation;
use crate::terrain::Rect;

/// Vertex layout shared with `shader.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    /// Quad-local coordinates in [-1, 1], used for the circle mask
    pub local: [f32; 2],
    pub color: [f32; 4],
    /// 0 = filled rectangle, 1 = circle inscribed in the quad
    pub shape: f32,
}

pub const VERTICES_PER_QUAD: usize = 6;

/// Background clear colour
pub const BACKGROUND: Color = Color::rgb8(47, 52, 64);
pub const TERRAIN: Color = Color::rgb8(63, 83, 140);
pub const BODY: Color = Color::rgb8(255, 85, 84);
const SPECTRUM: Color = Color::rgba8(200, 210, 230, 90);
const PITCH_TRACE: Color = Color::rgba8(255, 200, 120, 200);

/// Body centre as a fraction of the field width
pub const BODY_X_FRACTION: f32 = 0.3;
/// Body radius as a fraction of the field width
pub const BODY_RADIUS_FRACTION: f32 = 0.03;

/// Fraction of the field height the spectrum bars may fill
const SPECTRUM_HEIGHT_FRACTION: f32 = 0.25;
const TRACE_DOT_PX: f32 = 3.0;

/// sRGB colour stored as 8-bit components
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 255)
    }

    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Linear RGBA for an sRGB render target
    pub fn to_linear(self) -> [f32; 4] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a as f32 / 255.0,
        ]
    }
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Shape {
    Rect,
    Circle,
}

/// Body placement for the current frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyCircle {
    pub center: Vec2,
    pub radius: f32,
}

impl BodyCircle {
    /// Place the body in `field`: fixed x, y offset from the field centre by
    /// `position` (up is positive), kept entirely inside the field.
    pub fn place(field: &Rect, position: f32) -> Self {
        let radius = BODY_RADIUS_FRACTION * field.width;
        let x = field.x + BODY_X_FRACTION * field.width;

        let y = field.center().y - position;
        let (top, bottom) = (field.y + radius, field.max().y - radius);
        let y = if top <= bottom { y.clamp(top, bottom) } else { field.center().y };
        let y = if y.is_finite() { y } else { field.center().y };

        Self {
            center: Vec2::new(x, y),
            radius,
        }
    }
}

/// Reusable quad list; buffers are allocated once and refilled each frame
pub struct SceneBuilder {
    vertices: Vec<QuadVertex>,
    max_quads: usize,
    band: Range<usize>,
    spectrum: Vec<f32>,
    history: Vec<ControlSample>,
}

impl SceneBuilder {
    /// `band` is the spectrum bin range drawn by the diagnostics overlay
    pub fn new(max_quads: usize, band: Range<usize>) -> Self {
        Self {
            vertices: Vec::with_capacity(max_quads * VERTICES_PER_QUAD),
            max_quads,
            band,
            spectrum: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Build this frame's quads. Pass `diagnostics` to overlay the spectrum
    /// and pitch trace from the control queue.
    pub fn build(&mut self, sim: &Simulation, diagnostics: Option<&ControlQueue>) -> &[QuadVertex] {
        self.vertices.clear();

        let terrain = sim.terrain();
        let field = terrain.field();
        if field.is_empty() {
            return &self.vertices;
        }

        let width = terrain.segment_width();
        for segment in terrain.segments() {
            self.push_quad(&segment.ceiling(&field, width), TERRAIN, Shape::Rect);
            self.push_quad(&segment.floor(&field, width), TERRAIN, Shape::Rect);
        }

        if let Some(queue) = diagnostics {
            self.push_spectrum(queue, &field);
            self.push_pitch_trace(queue, &field);
        }

        // Body last so it is never hidden
        let body = BodyCircle::place(&field, sim.body().position);
        let bounds = Rect::new(
            body.center.x - body.radius,
            body.center.y - body.radius,
            body.radius * 2.0,
            body.radius * 2.0,
        );
        self.push_quad(&bounds, BODY, Shape::Circle);

        &self.vertices
    }

    /// Retarget the diagnostics overlay, e.g. once the device rate is known
    pub fn set_band(&mut self, band: Range<usize>) {
        self.band = band;
    }

    pub fn band(&self) -> Range<usize> {
        self.band.clone()
    }

    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    fn push_spectrum(&mut self, queue: &ControlQueue, field: &Rect) {
        let mut spectrum = std::mem::take(&mut self.spectrum);
        queue.copy_spectrum(&mut spectrum);

        let end = self.band.end.min(spectrum.len());
        let start = self.band.start.min(end);
        let peak = spectrum[start..end]
            .iter()
            .copied()
            .filter(|m| m.is_finite())
            .fold(0.0f32, f32::max);

        if peak > 0.0 {
            let bar_width = field.width / (end - start) as f32;
            let max_height = field.height * SPECTRUM_HEIGHT_FRACTION;
            for (i, &m) in spectrum[start..end].iter().enumerate() {
                if !(m.is_finite() && m > 0.0) {
                    continue;
                }
                let height = m / peak * max_height;
                let x = field.x + i as f32 * bar_width;
                let bar = Rect::new(x, field.max().y - height, bar_width, height);
                self.push_quad(&bar, SPECTRUM, Shape::Rect);
            }
        }

        self.spectrum = spectrum;
    }

    fn push_pitch_trace(&mut self, queue: &ControlQueue, field: &Rect) {
        let mut history = std::mem::take(&mut self.history);
        queue.copy_history(&mut history);

        let voiced = |s: &&ControlSample| s.voiced && s.pitch_log.is_finite();
        let (lo, hi) = history
            .iter()
            .filter(voiced)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.pitch_log), hi.max(s.pitch_log))
            });

        if lo <= hi {
            let span = (hi - lo).max(1e-3);
            let step = field.width / history.len() as f32;
            for (i, sample) in history.iter().enumerate() {
                if !voiced(&sample) {
                    continue;
                }
                let t = (sample.pitch_log - lo) / span;
                let y = field.max().y - t * (field.height - TRACE_DOT_PX);
                let dot = Rect::new(
                    field.x + i as f32 * step,
                    y - TRACE_DOT_PX,
                    TRACE_DOT_PX,
                    TRACE_DOT_PX,
                );
                self.push_quad(&dot, PITCH_TRACE, Shape::Rect);
            }
        }

        self.history = history;
    }

    fn push_quad(&mut self, rect: &Rect, color: Color, shape: Shape) {
        if rect.is_empty() {
            return;
        }
        if self.quad_count() >= self.max_quads {
            log::trace!("quad budget of {} reached, dropping geometry", self.max_quads);
            return;
        }

        let color = color.to_linear();
        let shape = match shape {
            Shape::Rect => 0.0,
            Shape::Circle => 1.0,
        };
        let (min, max) = (rect.min(), rect.max());
        let corner = |x: f32, y: f32, lx: f32, ly: f32| QuadVertex {
            position: [x, y],
            local: [lx, ly],
            color,
            shape,
        };

        let tl = corner(min.x, min.y, -1.0, -1.0);
        let tr = corner(max.x, min.y, 1.0, -1.0);
        let bl = corner(min.x, max.y, -1.0, 1.0);
        let br = corner(max.x, max.y, 1.0, 1.0);
        self.vertices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
    }
}
