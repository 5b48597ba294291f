use std::f32::consts::PI;

use glam::Vec4;

use super::escape::{Escape, BAILOUT, LANES};

/// Lower bound applied to `m2` before taking logarithms
pub const M2_FLOOR: f32 = 2.0;

/// Cosine frequencies of the red, green and blue channels
const RED: f32 = 4.0 * BAILOUT / (3.5 * PI);
const GREEN: f32 = 4.0 * BAILOUT / (5.0 * PI);
const BLUE: f32 = 4.0 * BAILOUT / (9.0 * PI);

pub fn pack(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub fn unpack(pixel: u32) -> [u8; 3] {
    [(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]
}

fn lanes(v: Vec4, f: impl Fn(f32) -> f32) -> Vec4 {
    Vec4::from_array(v.to_array().map(f))
}

/// Continuous escape value, normalised by the bailout radius
pub fn smooth(iterations: Vec4, m2: Vec4) -> Vec4 {
    let m2 = m2.max(Vec4::splat(M2_FLOOR));
    let nu = iterations + Vec4::ONE - lanes(lanes(m2, f32::log2) * 0.5, f32::log2);
    lanes(nu.max(Vec4::ZERO) * (4.0 / (BAILOUT * BAILOUT)), f32::sqrt)
}

/// `½ − ½·cos(π·x)`, a period-2 wave in `[0, 1]`
fn wave(x: Vec4) -> Vec4 {
    Vec4::splat(0.5) - 0.5 * lanes(x * PI, f32::cos)
}

fn channel(x: Vec4) -> [u32; LANES] {
    (wave(x) * 255.0).to_array().map(|c| (c as u32).min(255))
}

/// Packed `0x00RRGGBB` colours for a batch; interior points are black
pub fn shade(escape: &Escape) -> [u32; LANES] {
    let nu = smooth(escape.iterations, escape.m2);
    let r = channel(nu * RED);
    let g = channel(nu * GREEN);
    let b = channel(nu * BLUE);
    let inside = escape.interior();

    let mut out = [0u32; LANES];
    for lane in 0..LANES {
        if !inside[lane] {
            out[lane] = r[lane] << 16 | g[lane] << 8 | b[lane];
        }
    }
    out
}
