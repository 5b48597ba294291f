use glam::Vec4;

use super::color;
use crate::core::target::Resolution;
use crate::core::view::View;

/// Pixels computed together in one batch
pub const LANES: usize = 4;
/// Hard iteration cap
pub const MAX_ITERATIONS: u32 = 128;
pub const BAILOUT_BITS: u32 = 5;
/// Escape radius
pub const BAILOUT: f32 = (1u32 << BAILOUT_BITS) as f32;

const LANE_OFFSETS: Vec4 = Vec4::new(0.0, 1.0, 2.0, 3.0);

/// Outcome of iterating one batch of points.
///
/// Per lane: `iterations` counts the iterations that started inside the
/// bailout radius (always in `1..=MAX_ITERATIONS`), `m2` is `x² + y²` at
/// escape, and `inside` is 1.0 for points that never escaped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    pub iterations: Vec4,
    pub m2: Vec4,
    pub inside: Vec4,
}

impl Escape {
    pub fn counts(&self) -> [u32; LANES] {
        self.iterations.to_array().map(|n| n as u32)
    }

    pub fn interior(&self) -> [bool; LANES] {
        self.inside.to_array().map(|v| v != 0.0)
    }
}

/// Iterate `z ← z² + c` for four points at once.
///
/// All lanes advance together; a lane that leaves the bailout radius stops
/// counting and keeps its escape modulus, and the batch ends when every lane
/// escaped or the cap is reached.
pub fn escape(x0: Vec4, y0: Vec4) -> Escape {
    let bail2 = Vec4::splat(BAILOUT * BAILOUT);
    let mut x = x0;
    let mut y = y0;
    let mut m2 = Vec4::ZERO;
    let mut iterations = Vec4::ZERO;
    let mut inside = Vec4::ONE;

    for _ in 0..MAX_ITERATIONS {
        let x2 = x * x;
        let y2 = y * y;
        let live = inside.cmpne(Vec4::ZERO);

        m2 = Vec4::select(live, x2 + y2, m2);
        iterations += inside;
        inside = Vec4::select(m2.cmplt(bail2), inside, Vec4::ZERO);
        if !inside.cmpne(Vec4::ZERO).any() {
            break;
        }

        y = 2.0 * x * y + y0;
        x = x2 - y2 + x0;
    }

    Escape {
        iterations,
        m2,
        inside,
    }
}

/// Pixel-to-plane mapping for one frame.
///
/// The image spans `4 * zoom` units horizontally around the view centre and
/// uses square pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub step: f32,
    pub width: u32,
}

impl Viewport {
    pub fn new(view: View, resolution: Resolution) -> Self {
        let step = 4.0 / resolution.width.max(1) as f32 * view.zoom;
        Self {
            origin_x: view.center_x - resolution.width as f32 * step * 0.5,
            origin_y: view.center_y - resolution.height as f32 * step * 0.5,
            step,
            width: resolution.width,
        }
    }

    /// Real parts of the batch starting at column `col`
    pub fn lane_x(&self, col: u32) -> Vec4 {
        Vec4::splat(self.origin_x) + Vec4::splat(self.step) * (Vec4::splat(col as f32) + LANE_OFFSETS)
    }

    /// Imaginary part of every pixel in `row`
    pub fn row_y(&self, row: u32) -> f32 {
        self.origin_y + row as f32 * self.step
    }

    /// Plane coordinates of one pixel
    pub fn point(&self, col: u32, row: u32) -> (f32, f32) {
        (self.lane_x(col).x, self.row_y(row))
    }
}

/// Compute one scanline of packed colours into `out`.
///
/// A trailing partial batch is computed with padded lanes and only the real
/// pixels are stored. Pixels of `out` past `width` are left untouched.
///
/// # Panics
///
/// Panics if `out` holds fewer than `width` pixels.
pub fn render_row(viewport: &Viewport, row: u32, out: &mut [u32]) {
    let width = viewport.width as usize;
    assert!(
        out.len() >= width,
        "scanline buffer holds {} pixels, image is {} wide",
        out.len(),
        width
    );
    let y0 = Vec4::splat(viewport.row_y(row));

    for (batch, chunk) in out[..width].chunks_mut(LANES).enumerate() {
        let x0 = viewport.lane_x((batch * LANES) as u32);
        let packed = color::shade(&escape(x0, y0));
        chunk.copy_from_slice(&packed[..chunk.len()]);
    }
}

/// Packed colour of a single pixel, identical to what [`render_row`] produces
pub fn render_pixel(viewport: &Viewport, col: u32, row: u32) -> u32 {
    let y0 = Vec4::splat(viewport.row_y(row));
    color::shade(&escape(viewport.lane_x(col), y0))[0]
}
