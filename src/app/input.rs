use crate::car::SteerCommand;
use crate::controller::ViewerCommand;
use crate::render::CAMERA_PRESETS;
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

const PIXELS_PER_WHEEL_STEP: f32 = 40.0;
const INSTANT_CUT: &str = r#"{"duration": 0.0}"#;

/// Turns raw window input into controller commands.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    dragging: bool,
    shift: bool,
    cursor: Option<(f32, f32)>,
}

impl InputState {
    pub fn set_shift(&mut self, held: bool) {
        self.shift = held;
    }

    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> Option<ViewerCommand> {
        if !pressed {
            return None;
        }
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        let command = match code {
            KeyCode::Digit1 => self.preset_command(0),
            KeyCode::Digit2 => self.preset_command(1),
            KeyCode::Digit3 => self.preset_command(2),
            KeyCode::Digit4 => self.preset_command(3),
            KeyCode::Digit5 => self.preset_command(4),
            KeyCode::Digit6 => self.preset_command(5),
            KeyCode::Digit7 => self.preset_command(6),
            KeyCode::KeyB => ViewerCommand::SetBodyColor("black".to_string()),
            KeyCode::KeyU => ViewerCommand::SetBodyColor("blue".to_string()),
            KeyCode::KeyR => ViewerCommand::SetBodyColor("red".to_string()),
            KeyCode::Space => ViewerCommand::ToggleDriveMode,
            KeyCode::ArrowLeft => ViewerCommand::Steer(SteerCommand::Left),
            KeyCode::ArrowRight => ViewerCommand::Steer(SteerCommand::Right),
            KeyCode::ArrowUp | KeyCode::ArrowDown => ViewerCommand::Steer(SteerCommand::Center),
            KeyCode::KeyN => ViewerCommand::ToggleDayNight,
            KeyCode::KeyP => ViewerCommand::OpenSidebar("part".to_string()),
            KeyCode::KeyC => ViewerCommand::OpenSidebar("color".to_string()),
            KeyCode::Backspace => ViewerCommand::CloseAll,
            _ => return None,
        };
        Some(command)
    }

    /// Shift turns a preset key into a cut with no animation.
    fn preset_command(&self, index: usize) -> ViewerCommand {
        let id = CAMERA_PRESETS[index].id.to_string();
        if self.shift {
            ViewerCommand::SelectViewWith {
                id,
                overrides: INSTANT_CUT.to_string(),
            }
        } else {
            ViewerCommand::SelectView(id)
        }
    }

    pub fn handle_button(&mut self, button: MouseButton, pressed: bool) {
        if button == MouseButton::Left {
            self.dragging = pressed;
        }
    }

    pub fn handle_cursor(&mut self, x: f32, y: f32) -> Option<ViewerCommand> {
        let previous = self.cursor.replace((x, y));
        if !self.dragging {
            return None;
        }
        let (px, py) = previous?;
        let (dx, dy) = (x - px, y - py);
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(ViewerCommand::OrbitRotate { dx, dy })
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.dragging = false;
    }

    pub fn handle_wheel(&mut self, delta: MouseScrollDelta) -> Option<ViewerCommand> {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_STEP,
        };
        (steps != 0.0).then_some(ViewerCommand::OrbitZoom(steps))
    }
}
