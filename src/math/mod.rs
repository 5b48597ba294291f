pub mod color;
pub mod escape;

pub use color::{pack, shade, unpack};
pub use escape::{escape, render_pixel, render_row, Escape, Viewport, LANES, MAX_ITERATIONS};
