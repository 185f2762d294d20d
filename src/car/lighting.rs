use crate::car::materials::hex_rgb;

pub const TONE_MAPPING_EXPOSURE: f32 = 1.3;

const DAY_COLOR: u32 = 0xffffff;
const NIGHT_COLOR: u32 = 0x333333;

/// Ambient fill light. Rig lights follow the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub name: &'static str,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Camera-attached ambient lights for the day and night looks.
#[derive(Debug, Clone)]
pub struct LightRig {
    lights: Vec<AmbientLight>,
    is_day: bool,
    exposure: f32,
}

impl LightRig {
    pub fn new(is_day: bool) -> Self {
        let mut rig = Self {
            lights: Vec::new(),
            is_day,
            exposure: TONE_MAPPING_EXPOSURE,
        };
        rig.rebuild(is_day);
        rig
    }

    /// Removes the current lights and adds a fresh pair for `is_day`.
    pub fn rebuild(&mut self, is_day: bool) {
        self.lights.clear();
        let color = hex_rgb(if is_day { DAY_COLOR } else { NIGHT_COLOR });
        self.lights.push(AmbientLight {
            name: "ambient_key",
            color,
            intensity: 1.0,
        });
        self.lights.push(AmbientLight {
            name: "ambient_fill",
            color,
            intensity: 0.5,
        });
        self.is_day = is_day;
        log::debug!("Light rig rebuilt for {}", if is_day { "day" } else { "night" });
    }

    pub fn lights(&self) -> &[AmbientLight] {
        &self.lights
    }

    pub fn is_day(&self) -> bool {
        self.is_day
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }
}
