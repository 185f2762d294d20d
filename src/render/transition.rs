use crate::render::camera::{OrbitControls, PerspectiveCamera};
use crate::render::tween::{Easing, Tween, TweenState};
use glam::Vec3;

pub const DEFAULT_TRANSITION_SECONDS: f32 = 2.0;

/// Named camera viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPreset {
    pub id: &'static str,
    pub aliases: &'static [&'static str],
    pub position: Vec3,
    /// `None` falls back to [`DEFAULT_TRANSITION_SECONDS`].
    pub duration: Option<f32>,
}

impl CameraPreset {
    pub fn find(id: &str) -> Option<&'static CameraPreset> {
        CAMERA_PRESETS
            .iter()
            .find(|preset| preset.id == id || preset.aliases.contains(&id))
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration.unwrap_or(DEFAULT_TRANSITION_SECONDS)
    }
}

pub const CAMERA_PRESETS: [CameraPreset; 7] = [
    CameraPreset {
        id: "first_look",
        aliases: &["firstLook"],
        position: Vec3::new(10.7, 169.5, 1071.0),
        duration: None,
    },
    CameraPreset {
        id: "free_view",
        aliases: &["freeView"],
        position: Vec3::new(-974.0, 347.0, 398.0),
        duration: Some(3.0),
    },
    CameraPreset {
        id: "dimensions",
        aliases: &[],
        position: Vec3::new(1070.0, 170.0, -40.0),
        duration: Some(5.0),
    },
    CameraPreset {
        id: "sunroof",
        aliases: &[],
        position: Vec3::new(847.0, 436.0, 517.0),
        duration: Some(5.0),
    },
    CameraPreset {
        id: "head_light",
        aliases: &["front_light", "headLight"],
        position: Vec3::new(-5.5, 170.0, 1071.0),
        duration: Some(5.0),
    },
    CameraPreset {
        id: "rear_light",
        aliases: &["rearLight"],
        position: Vec3::new(29.0, 170.0, -1071.0),
        duration: Some(5.0),
    },
    CameraPreset {
        id: "wheel_rings",
        aliases: &["wheelRings"],
        position: Vec3::new(635.0, 170.0, -862.0),
        duration: Some(5.0),
    },
];

/// Per-call options merged over the preset defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionOverrides {
    pub delay: Option<f32>,
    pub duration: Option<f32>,
}

impl TransitionOverrides {
    pub fn with_delay(delay: f32) -> Self {
        Self {
            delay: Some(delay),
            duration: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    Started(&'static str),
    Completed(&'static str),
}

#[derive(Debug, Clone)]
struct ActiveTransition {
    preset: &'static CameraPreset,
    delay_remaining: f32,
    duration: f32,
    /// Built when the delay runs out, starting from the camera position at that moment.
    motion: Option<Tween<Vec3>>,
}

#[derive(Debug, Clone, Default)]
enum TransitionPhase {
    #[default]
    Idle,
    Transitioning(ActiveTransition),
}

/// Scripted camera moves. While a move is in flight it owns the camera and
/// orbit stays disabled.
#[derive(Debug, Default)]
pub struct CameraTransitionEngine {
    phase: TransitionPhase,
    completed: u64,
}

impl CameraTransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, TransitionPhase::Transitioning(_))
    }

    pub fn active_preset(&self) -> Option<&'static str> {
        match &self.phase {
            TransitionPhase::Transitioning(active) => Some(active.preset.id),
            TransitionPhase::Idle => None,
        }
    }

    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    /// Replaces any transition in flight; its completion never fires.
    pub fn transition_to(
        &mut self,
        preset: &'static CameraPreset,
        overrides: TransitionOverrides,
        orbit: &mut OrbitControls,
    ) -> TransitionEvent {
        if orbit.is_enabled() {
            orbit.suspend();
        } else {
            orbit.flush();
        }
        if let Some(previous) = self.active_preset() {
            log::debug!("Camera transition to {} superseded by {}", previous, preset.id);
        }
        let duration = overrides
            .duration
            .unwrap_or_else(|| preset.duration_seconds())
            .max(0.0);
        let delay = overrides.delay.unwrap_or(0.0).max(0.0);
        log::debug!(
            "Camera transition to {} (delay {:.2}s, duration {:.2}s)",
            preset.id,
            delay,
            duration
        );
        self.phase = TransitionPhase::Transitioning(ActiveTransition {
            preset,
            delay_remaining: delay,
            duration,
            motion: None,
        });
        TransitionEvent::Started(preset.id)
    }

    pub fn update(
        &mut self,
        dt: f32,
        camera: &mut PerspectiveCamera,
        orbit: &mut OrbitControls,
    ) -> Option<TransitionEvent> {
        let TransitionPhase::Transitioning(active) = &mut self.phase else {
            return None;
        };
        let mut step = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if active.motion.is_none() {
            if active.delay_remaining > step {
                active.delay_remaining -= step;
                return None;
            }
            step -= active.delay_remaining;
            active.delay_remaining = 0.0;
            active.motion = Some(Tween::new(
                camera.position,
                active.preset.position,
                active.duration,
                Easing::ExpoOut,
            ));
        }
        let motion = active.motion.as_mut()?;
        match motion.advance(step) {
            TweenState::Active(position) => {
                camera.position = position;
                None
            }
            TweenState::Done(position) => {
                let id = active.preset.id;
                camera.position = position;
                camera.update_projection();
                orbit.resume();
                self.phase = TransitionPhase::Idle;
                self.completed += 1;
                log::debug!("Camera transition to {} complete", id);
                Some(TransitionEvent::Completed(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraPreset, CameraTransitionEngine, TransitionEvent, TransitionOverrides};
    use crate::render::camera::{OrbitControls, PerspectiveCamera};
    use glam::Vec3;

    fn rig() -> (PerspectiveCamera, OrbitControls) {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 5000.0);
        camera.position = Vec3::new(0.0, 0.0, 100.0);
        (camera, OrbitControls::new(Vec3::ZERO))
    }

    fn run(
        engine: &mut CameraTransitionEngine,
        camera: &mut PerspectiveCamera,
        orbit: &mut OrbitControls,
        frames: usize,
    ) -> Vec<TransitionEvent> {
        (0..frames)
            .filter_map(|_| engine.update(1.0 / 60.0, camera, orbit))
            .collect()
    }

    #[test]
    fn test_presets_resolve_by_id_and_alias() {
        assert_eq!(CameraPreset::find("head_light").unwrap().id, "head_light");
        assert_eq!(CameraPreset::find("front_light").unwrap().id, "head_light");
        assert_eq!(CameraPreset::find("wheelRings").unwrap().id, "wheel_rings");
        assert!(CameraPreset::find("trunk").is_none());
        assert_eq!(CameraPreset::find("first_look").unwrap().duration_seconds(), 2.0);
    }

    #[test]
    fn test_overrides_reject_unknown_keys() {
        let parsed = TransitionOverrides::from_json(r#"{"delay": 1.0}"#).unwrap();
        assert_eq!(parsed, TransitionOverrides::with_delay(1.0));
        assert!(TransitionOverrides::from_json(r#"{"ease": "linear"}"#).is_err());
    }

    #[test]
    fn test_transition_disables_orbit_until_complete() {
        let (mut camera, mut orbit) = rig();
        orbit.resume();
        let mut engine = CameraTransitionEngine::new();
        let preset = CameraPreset::find("dimensions").unwrap();
        let overrides = TransitionOverrides {
            delay: None,
            duration: Some(0.5),
        };
        engine.transition_to(preset, overrides, &mut orbit);
        assert!(!orbit.is_enabled());

        let events = run(&mut engine, &mut camera, &mut orbit, 10);
        assert!(events.is_empty());
        assert!(!orbit.is_enabled());

        let events = run(&mut engine, &mut camera, &mut orbit, 30);
        assert_eq!(events, vec![TransitionEvent::Completed("dimensions")]);
        assert!(orbit.is_enabled());
        assert_eq!(camera.position, preset.position);
    }

    #[test]
    fn test_superseding_transition_completes_once_at_new_target() {
        let (mut camera, mut orbit) = rig();
        orbit.resume();
        let mut engine = CameraTransitionEngine::new();
        let fast = TransitionOverrides {
            delay: None,
            duration: Some(0.5),
        };
        engine.transition_to(CameraPreset::find("sunroof").unwrap(), fast, &mut orbit);
        run(&mut engine, &mut camera, &mut orbit, 5);

        let target = CameraPreset::find("rear_light").unwrap();
        engine.transition_to(target, fast, &mut orbit);
        let events = run(&mut engine, &mut camera, &mut orbit, 120);

        assert_eq!(events, vec![TransitionEvent::Completed("rear_light")]);
        assert_eq!(engine.completed_count(), 1);
        assert!(orbit.is_enabled());
        assert_eq!(camera.position, target.position);
    }

    #[test]
    fn test_delay_holds_camera_in_place() {
        let (mut camera, mut orbit) = rig();
        let mut engine = CameraTransitionEngine::new();
        let overrides = TransitionOverrides {
            delay: Some(1.0),
            duration: Some(0.5),
        };
        engine.transition_to(CameraPreset::find("free_view").unwrap(), overrides, &mut orbit);
        let start = camera.position;
        run(&mut engine, &mut camera, &mut orbit, 30);
        assert_eq!(camera.position, start);
        assert!(engine.is_transitioning());
        assert!(!orbit.is_enabled());

        let events = run(&mut engine, &mut camera, &mut orbit, 90);
        assert_eq!(events, vec![TransitionEvent::Completed("free_view")]);
        assert!(orbit.is_enabled());
    }
}
