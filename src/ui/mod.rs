#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sidebar {
    #[default]
    None,
    Part,
    Color,
}

impl Sidebar {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "part" => Some(Sidebar::Part),
            "color" | "colour" => Some(Sidebar::Color),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Sidebar::None => "none",
            Sidebar::Part => "part",
            Sidebar::Color => "color",
        }
    }
}

/// Which side panel is open and whether the canvas is shifted for it.
#[derive(Debug, Clone, Default)]
pub struct SidebarState {
    active: Sidebar,
    part_open: bool,
    color_open: bool,
    canvas_shifted: bool,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening one panel closes the other.
    pub fn open(&mut self, sidebar: Sidebar) {
        match sidebar {
            Sidebar::Part => {
                self.close(Sidebar::Color);
                self.part_open = true;
            }
            Sidebar::Color => {
                self.close(Sidebar::Part);
                self.color_open = true;
            }
            Sidebar::None => return,
        }
        self.active = sidebar;
        self.canvas_shifted = true;
    }

    /// Hides one panel; the canvas stays shifted until `close_all`.
    pub fn close(&mut self, sidebar: Sidebar) {
        match sidebar {
            Sidebar::Part => self.part_open = false,
            Sidebar::Color => self.color_open = false,
            Sidebar::None => {}
        }
    }

    pub fn close_all(&mut self) {
        self.close(self.active);
        self.canvas_shifted = false;
    }

    pub fn active(&self) -> Sidebar {
        self.active
    }

    pub fn is_open(&self, sidebar: Sidebar) -> bool {
        match sidebar {
            Sidebar::Part => self.part_open,
            Sidebar::Color => self.color_open,
            Sidebar::None => !self.part_open && !self.color_open,
        }
    }

    pub fn canvas_shifted(&self) -> bool {
        self.canvas_shifted
    }
}

#[cfg(test)]
mod tests {
    use super::{Sidebar, SidebarState};

    #[test]
    fn test_opening_one_sidebar_closes_the_other() {
        let mut state = SidebarState::new();
        state.open(Sidebar::Part);
        state.open(Sidebar::Color);
        assert!(state.is_open(Sidebar::Color));
        assert!(!state.is_open(Sidebar::Part));
        assert_eq!(state.active(), Sidebar::Color);
        assert!(state.canvas_shifted());
    }

    #[test]
    fn test_close_all_hides_active_and_unshifts() {
        let mut state = SidebarState::new();
        state.open(Sidebar::Part);
        state.close_all();
        assert!(state.is_open(Sidebar::None));
        assert!(!state.canvas_shifted());
        assert_eq!(Sidebar::from_name("Color"), Some(Sidebar::Color));
        assert_eq!(Sidebar::from_name("trunk"), None);
    }
}
