use std::collections::HashSet;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{InputFrame, InputSource};
use super::view::AXIS_CENTER;

/// Wheel lines that make one full zoom deflection
const WHEEL_LINE: f32 = 1.0;
/// Pixels of touchpad scroll per wheel line
const PIXELS_PER_LINE: f32 = 40.0;

/// Keyboard and mouse wheel mapped onto the navigation pad.
///
/// Held keys deflect an axis fully: A/D or arrows pan horizontally, W/S or
/// arrows vertically, Q zooms in and E out. The wheel gives a one-poll zoom
/// deflection proportional to the distance scrolled. Escape quits, Space or P
/// exports and R or Home resets; those fire once per key press.
#[derive(Debug, Clone, Default)]
pub struct KeyboardInput {
    held: HashSet<KeyCode>,
    wheel: f32,
    quit: bool,
    export: bool,
    reset: bool,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(code, event.repeat),
                        ElementState::Released => {
                            self.held.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
            }
            WindowEvent::Focused(false) => self.held.clear(),
            _ => {}
        }
    }

    fn press(&mut self, code: KeyCode, repeat: bool) {
        self.held.insert(code);
        if repeat {
            return;
        }
        match code {
            KeyCode::Escape => self.quit = true,
            KeyCode::Space | KeyCode::KeyP => self.export = true,
            KeyCode::KeyR | KeyCode::Home => self.reset = true,
            _ => {}
        }
    }

    fn is_down(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.held.contains(c))
    }

    /// Raw axis byte for a pair of opposing key groups
    fn axis(&self, negative: &[KeyCode], positive: &[KeyCode]) -> u8 {
        match (self.is_down(negative), self.is_down(positive)) {
            (true, false) => 0x00,
            (false, true) => 0xFF,
            _ => AXIS_CENTER,
        }
    }

    fn wheel_axis(&mut self) -> Option<u8> {
        if self.wheel == 0.0 {
            return None;
        }
        // Scrolling up zooms in, which shrinks `zoom`
        let deflection = (-self.wheel / WHEEL_LINE).clamp(-1.0, 1.0);
        self.wheel = 0.0;
        Some((AXIS_CENTER as f32 + deflection * 127.0).round() as u8)
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> InputFrame {
        let keys_zoom = self.axis(&[KeyCode::KeyQ], &[KeyCode::KeyE]);
        let zoom = match self.wheel_axis() {
            Some(wheel) if keys_zoom == AXIS_CENTER => wheel,
            _ => keys_zoom,
        };

        let frame = InputFrame {
            pan_x: self.axis(
                &[KeyCode::KeyA, KeyCode::ArrowLeft],
                &[KeyCode::KeyD, KeyCode::ArrowRight],
            ),
            // Screen rows grow downwards, as does the imaginary axis
            pan_y: self.axis(
                &[KeyCode::KeyW, KeyCode::ArrowUp],
                &[KeyCode::KeyS, KeyCode::ArrowDown],
            ),
            zoom,
            quit: self.quit,
            export: self.export,
            reset: self.reset,
        };

        self.export = false;
        self.reset = false;
        frame
    }
}
