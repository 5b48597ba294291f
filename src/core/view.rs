use serde::{Deserialize, Serialize};

/// Neutral midpoint of a raw analog axis byte
pub const AXIS_CENTER: u8 = 0x80;

/// View transform shared by every worker of a pool
///
/// `zoom` scales the visible span: at `zoom = 1` the image covers 4 units of
/// the complex plane horizontally. Smaller values zoom in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub zoom: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl View {
    pub const fn new(zoom: f32, center_x: f32, center_y: f32) -> Self {
        Self {
            zoom,
            center_x,
            center_y,
        }
    }

    /// Apply one navigation delta.
    ///
    /// Pan is scaled by the current zoom so a full stick deflection moves the
    /// same fraction of the screen at every depth. The zoom change is
    /// multiplicative and the result never drops below `tuning.zoom_floor`.
    pub fn navigate(&self, delta: NavDelta, tuning: &NavTuning) -> Self {
        let center_x = self.center_x + delta.pan_x * tuning.pan_scale * self.zoom;
        let center_y = self.center_y + delta.pan_y * tuning.pan_scale * self.zoom;
        let zoom = self.zoom * (1.0 + delta.zoom * tuning.zoom_scale);

        Self {
            // NaN fails the comparison and is clamped as well
            zoom: if zoom >= tuning.zoom_floor {
                zoom
            } else {
                tuning.zoom_floor
            },
            center_x,
            center_y,
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(1.0, -0.5, 0.0)
    }
}

/// Navigation input for one host iteration, in centred axis units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavDelta {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
}

impl NavDelta {
    pub const fn new(pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        Self { pan_x, pan_y, zoom }
    }

    pub fn is_idle(&self) -> bool {
        self.pan_x == 0.0 && self.pan_y == 0.0 && self.zoom == 0.0
    }
}

/// Scale factors turning axis units into view changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavTuning {
    pub pan_scale: f32,
    pub zoom_scale: f32,
    pub zoom_floor: f32,
}

impl Default for NavTuning {
    fn default() -> Self {
        Self {
            pan_scale: 0.001,
            zoom_scale: 0.0005,
            zoom_floor: 0.0001,
        }
    }
}

/// Centre a raw axis byte around zero.
///
/// Values in `[-dead_zone, dead_zone)` around the midpoint read as exactly
/// neutral, so a resting stick does not drift the view.
pub fn center_axis(raw: u8, dead_zone: u8) -> i32 {
    let value = raw as i32 - AXIS_CENTER as i32;
    let band = dead_zone as i32;
    if value >= -band && value < band {
        0
    } else {
        value
    }
}
