use super::{ControlError, ViewController};
use crate::car::SteerCommand;

/// Requests from the interaction bridge (keyboard, mouse, scripted input).
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    SelectView(String),
    /// `overrides` is the JSON accepted by [`ViewController::select_view_with`].
    SelectViewWith { id: String, overrides: String },
    SetBodyColor(String),
    ToggleDriveMode,
    Steer(SteerCommand),
    ToggleDayNight,
    OpenSidebar(String),
    CloseSidebar(String),
    CloseAll,
    OrbitRotate { dx: f32, dy: f32 },
    OrbitZoom(f32),
    Resize { width: u32, height: u32 },
}

impl ViewController {
    /// Applies a command. Failures are logged and dropped so input can never
    /// stop the frame loop.
    pub fn dispatch(&mut self, command: ViewerCommand) {
        let label = format!("{:?}", command);
        match self.apply(command) {
            Ok(()) => log::trace!("Applied {}", label),
            Err(ControlError::NotReady) => log::debug!("Ignored {}: car not loaded", label),
            Err(err) => log::warn!("Ignored {}: {}", label, err),
        }
    }

    fn apply(&mut self, command: ViewerCommand) -> Result<(), ControlError> {
        match command {
            ViewerCommand::SelectView(id) => self.select_view(&id)?,
            ViewerCommand::SelectViewWith { id, overrides } => {
                self.select_view_with(&id, &overrides)?
            }
            ViewerCommand::SetBodyColor(name) => self.set_body_color(&name)?,
            ViewerCommand::ToggleDriveMode => {
                self.toggle_drive_mode();
            }
            ViewerCommand::Steer(direction) => {
                self.steer(direction)?;
            }
            ViewerCommand::ToggleDayNight => {
                self.toggle_day_night();
            }
            ViewerCommand::OpenSidebar(name) => self.open_sidebar(&name)?,
            ViewerCommand::CloseSidebar(name) => self.close_sidebar(&name)?,
            ViewerCommand::CloseAll => self.close_all(),
            ViewerCommand::OrbitRotate { dx, dy } => self.orbit_rotate(dx, dy),
            ViewerCommand::OrbitZoom(steps) => self.orbit_zoom(steps),
            ViewerCommand::Resize { width, height } => self.resize(width, height),
        }
        Ok(())
    }
}
