use std::collections::VecDeque;

use super::view::{center_axis, NavDelta, AXIS_CENTER};

/// Input sampled once per host iteration.
///
/// Axes are raw bytes centred on [`AXIS_CENTER`]; buttons are edge-free
/// "held this iteration" flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFrame {
    pub pan_x: u8,
    pub pan_y: u8,
    pub zoom: u8,
    pub quit: bool,
    pub export: bool,
    pub reset: bool,
}

impl InputFrame {
    /// Sticks at rest, no buttons
    pub const NEUTRAL: Self = Self {
        pan_x: AXIS_CENTER,
        pan_y: AXIS_CENTER,
        zoom: AXIS_CENTER,
        quit: false,
        export: false,
        reset: false,
    };

    pub const fn axes(pan_x: u8, pan_y: u8, zoom: u8) -> Self {
        Self {
            pan_x,
            pan_y,
            zoom,
            ..Self::NEUTRAL
        }
    }

    /// Navigation delta after applying the dead zone to every axis
    pub fn delta(&self, dead_zone: u8) -> NavDelta {
        NavDelta::new(
            center_axis(self.pan_x, dead_zone) as f32,
            center_axis(self.pan_y, dead_zone) as f32,
            center_axis(self.zoom, dead_zone) as f32,
        )
    }
}

impl Default for InputFrame {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Anything the host loop can poll for input
pub trait InputSource {
    fn poll(&mut self) -> InputFrame;
}

/// Replays a fixed list of frames, then stays neutral
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: InputFrame) -> &mut Self {
        self.frames.push_back(frame);
        self
    }

    pub fn repeat(&mut self, frame: InputFrame, times: usize) -> &mut Self {
        self.frames.extend(std::iter::repeat(frame).take(times));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputFrame {
        self.frames.pop_front().unwrap_or(InputFrame::NEUTRAL)
    }
}
