mod commands;

pub use commands::ViewerCommand;

use crate::assets::{AssetLoadJob, EnvironmentMaps, LoadEvent, ScrollTexture};
use crate::car::{
    plan_steer, AuxiliaryPart, BindingSummary, CarParts, LightRig, MaterialBinder, PaintAnimation, PaintColor,
    SteerCommand, SteerDirection, SteeringAnimation, WheelSet, BODY_PANEL_NODE,
};
use crate::config::ViewerConfig;
use crate::render::{
    CameraPreset, CameraTransitionEngine, FramePacket, FrameRenderer, OrbitControls,
    PerspectiveCamera, RenderSurface, Staging, TransitionEvent, TransitionOverrides,
};
use crate::scene::{MaterialId, SceneGraph};
use crate::ui::{Sidebar, SidebarState};
use glam::Vec3;
use std::path::PathBuf;

const CAMERA_FOV_DEG: f32 = 60.0;
const CAMERA_FOCAL_EXTENSION_MM: f32 = 10.0;
const CAMERA_NEAR: f32 = 0.01;
const CAMERA_FAR: f32 = 1000.0;
const ORBIT_MAX_POLAR: f32 = 0.9 * std::f32::consts::FRAC_PI_2;

const CAR_ROOT_Y: f32 = -170.0;
const GROUND_OFFSET_Y: f32 = -177.0;
const SHADOW_OFFSET_Y: f32 = -180.0;
const SHADOW_PLANE_SCALE: f32 = 1.1;
const INTRO_PRESET: &str = "first_look";
const AUTO_PRESET: &str = "free_view";
const AUTO_TRANSITION_DELAY: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("no car is loaded yet")]
    NotReady,
    #[error("unknown camera preset '{0}'")]
    UnknownPreset(String),
    #[error("unknown body color '{0}'")]
    UnknownColor(String),
    #[error("unknown sidebar '{0}'")]
    UnknownSidebar(String),
    #[error("invalid transition overrides: {0}")]
    InvalidOverride(String),
    #[error("loaded car has no '{0}' part")]
    MissingPart(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading(f32),
    Ready,
    Failed(String),
}

/// Interaction state, mutated only through [`ViewController`] operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub car_loaded: bool,
    pub drive_mode: bool,
    pub steer_direction: SteerDirection,
    pub is_day: bool,
    pub active_sidebar: Sidebar,
    pub current_camera_target: Option<&'static str>,
    pub orbit_enabled: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            car_loaded: false,
            drive_mode: false,
            steer_direction: SteerDirection::None,
            is_day: true,
            active_sidebar: Sidebar::None,
            current_camera_target: None,
            orbit_enabled: false,
        }
    }
}

struct LoadedCar {
    graph: SceneGraph,
    parts: CarParts,
    wheels: Option<WheelSet>,
    body_material: Option<MaterialId>,
    staging: Staging,
}

pub struct ViewController {
    state: ControllerState,
    load_status: LoadStatus,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    transitions: CameraTransitionEngine,
    surface: RenderSurface,
    environment: EnvironmentMaps,
    ground: ScrollTexture,
    binder: MaterialBinder,
    lights: LightRig,
    sidebars: SidebarState,
    car: Option<LoadedCar>,
    paint: Option<PaintAnimation>,
    steering: Option<SteeringAnimation>,
    frame: u64,
    wheel_spin: f32,
    ground_scroll: f32,
    chunk_bytes: usize,
}

impl ViewController {
    pub fn new(config: &ViewerConfig, environment: EnvironmentMaps, ground: ScrollTexture) -> Self {
        let surface = RenderSurface::new(config.window_width, config.window_height);
        let mut camera =
            PerspectiveCamera::new(CAMERA_FOV_DEG, surface.aspect(), CAMERA_NEAR, CAMERA_FAR);
        camera.set_focal_length(camera.focal_length() + CAMERA_FOCAL_EXTENSION_MM);

        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.max_polar_angle = ORBIT_MAX_POLAR;

        log::debug!(
            "Camera fov {:.1} deg, clip {}..{}",
            camera.fov_deg(),
            camera.near(),
            camera.far()
        );

        let state = ControllerState::default();
        let binder = MaterialBinder::new(environment.reflection.clone());
        Self {
            lights: LightRig::new(state.is_day),
            state,
            load_status: LoadStatus::Idle,
            camera,
            orbit,
            transitions: CameraTransitionEngine::new(),
            surface,
            environment,
            ground,
            binder,
            sidebars: SidebarState::new(),
            car: None,
            paint: None,
            steering: None,
            frame: 0,
            wheel_spin: config.wheel_spin_per_frame,
            ground_scroll: config.ground_scroll_per_frame,
            chunk_bytes: config.load_chunk_bytes,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.car.as_ref().map(|car| &car.graph)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn transitions_completed(&self) -> u64 {
        self.transitions.completed_count()
    }

    pub fn begin_load(&mut self, path: impl Into<PathBuf>) -> AssetLoadJob {
        let job = AssetLoadJob::new(path, self.chunk_bytes);
        log::info!("Loading car asset {}", job.path().display());
        self.load_status = LoadStatus::Loading(0.0);
        job
    }

    pub fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress(fraction) => {
                log::trace!("Load progress {:.0}%", fraction * 100.0);
                self.load_status = LoadStatus::Loading(fraction);
            }
            LoadEvent::Complete(graph) => {
                self.on_asset_loaded(graph);
            }
            LoadEvent::Failed(err) => {
                log::error!("Car asset failed to load: {}", err);
                self.load_status = LoadStatus::Failed(err.to_string());
            }
        }
    }

    /// Classifies, binds and stages a freshly loaded car, then starts the
    /// intro camera move.
    pub fn on_asset_loaded(&mut self, mut graph: SceneGraph) -> BindingSummary {
        self.paint = None;
        self.steering = None;
        self.state.steer_direction = SteerDirection::None;

        let root = graph.root();
        graph.node_mut(root).transform.position = Vec3::ZERO;
        let bounds = graph.world_bounds();
        let size = bounds.map(|b| b.size().length()).unwrap_or(0.0);
        let center = bounds.map(|b| b.center()).unwrap_or(Vec3::ZERO);
        if bounds.is_none() {
            log::warn!("Loaded car has no mesh bounds; staging with zero size");
        }

        if size > 0.0 {
            self.orbit.min_distance = size / 1.5;
            self.orbit.max_distance = size;
            self.camera.set_clip(size / 100.0, size * 100.0);
            self.camera.update_projection();
        }
        if let Some(intro) = CameraPreset::find(INTRO_PRESET) {
            self.camera.position = intro.position;
        }
        self.camera.look_at(center);

        let staging = Staging {
            size,
            center,
            ground_y: GROUND_OFFSET_Y,
            shadow_y: SHADOW_OFFSET_Y,
            shadow_extent: size * SHADOW_PLANE_SCALE,
        };
        self.ground.offset = [0.0, 0.0];
        self.ground.repeat = ScrollTexture::GROUND_REPEAT;
        self.lights.rebuild(self.state.is_day);

        let root_transform = &mut graph.node_mut(root).transform;
        root_transform.position.y = CAR_ROOT_Y;
        root_transform.rotation.y += std::f32::consts::FRAC_PI_2;

        let parts = CarParts::classify(&graph);
        let summary = self.binder.bind(&mut graph, &parts);
        let wheels = parts.wheels();
        if wheels.is_none() {
            log::warn!("Car is missing one or more wheel nodes; steering and drive spin disabled");
        }
        let body_material = graph
            .find_by_name(BODY_PANEL_NODE)
            .and_then(|id| graph.node(id).materials.first().copied());
        if body_material.is_none() {
            log::warn!("Car has no '{}' panel; paint changes disabled", BODY_PANEL_NODE);
        }

        log::info!(
            "Car ready: {} nodes, {} tires, size {:.1}, center ({:.1}, {:.1}, {:.1})",
            graph.node_count(),
            parts.auxiliary(AuxiliaryPart::Tire).len(),
            size,
            center.x,
            center.y,
            center.z
        );
        self.car = Some(LoadedCar {
            graph,
            parts,
            wheels,
            body_material,
            staging,
        });
        self.state.car_loaded = true;
        self.load_status = LoadStatus::Ready;

        if let Err(err) =
            self.transition_to(AUTO_PRESET, TransitionOverrides::with_delay(AUTO_TRANSITION_DELAY))
        {
            log::warn!("Intro camera move skipped: {}", err);
        }
        summary
    }

    pub fn select_view(&mut self, id: &str) -> Result<(), ControlError> {
        self.transition_to(id, TransitionOverrides::default())
    }

    /// `overrides` is a JSON object with optional `delay` and `duration`.
    pub fn select_view_with(&mut self, id: &str, overrides: &str) -> Result<(), ControlError> {
        let overrides = TransitionOverrides::from_json(overrides)
            .map_err(|err| ControlError::InvalidOverride(err.to_string()))?;
        self.transition_to(id, overrides)
    }

    pub fn transition_to(
        &mut self,
        id: &str,
        overrides: TransitionOverrides,
    ) -> Result<(), ControlError> {
        if !self.state.car_loaded {
            return Err(ControlError::NotReady);
        }
        let preset =
            CameraPreset::find(id).ok_or_else(|| ControlError::UnknownPreset(id.to_string()))?;
        if let TransitionEvent::Started(target) =
            self.transitions.transition_to(preset, overrides, &mut self.orbit)
        {
            self.state.current_camera_target = Some(target);
        }
        self.state.orbit_enabled = self.orbit.is_enabled();
        Ok(())
    }

    pub fn set_body_color(&mut self, name: &str) -> Result<(), ControlError> {
        let color =
            PaintColor::from_name(name).ok_or_else(|| ControlError::UnknownColor(name.to_string()))?;
        let car = self.car.as_ref().ok_or(ControlError::NotReady)?;
        let material = car
            .body_material
            .ok_or(ControlError::MissingPart(BODY_PANEL_NODE))?;
        log::debug!("Painting body {}", color.name());
        self.paint = Some(PaintAnimation::start(&car.graph, material, color));
        Ok(())
    }

    pub fn toggle_drive_mode(&mut self) -> bool {
        self.state.drive_mode = !self.state.drive_mode;
        log::info!("Drive mode {}", if self.state.drive_mode { "on" } else { "off" });
        self.state.drive_mode
    }

    pub fn steer(&mut self, command: SteerCommand) -> Result<SteerDirection, ControlError> {
        let car = self.car.as_ref().ok_or(ControlError::NotReady)?;
        let wheels = car.wheels.ok_or(ControlError::MissingPart("wheels"))?;
        let plan = plan_steer(self.state.steer_direction, command);
        self.steering = Some(SteeringAnimation::start(&car.graph, &wheels, &plan));
        self.state.steer_direction = plan.direction;
        log::debug!("Steer {:?} -> {:?}", command, plan.direction);
        Ok(plan.direction)
    }

    /// Swaps the light rig and re-runs material binding.
    pub fn toggle_day_night(&mut self) -> bool {
        self.state.is_day = !self.state.is_day;
        self.lights.rebuild(self.state.is_day);
        if let Some(car) = self.car.as_mut() {
            self.binder.bind(&mut car.graph, &car.parts);
        }
        self.state.is_day
    }

    pub fn open_sidebar(&mut self, name: &str) -> Result<(), ControlError> {
        let sidebar = parse_sidebar(name)?;
        self.sidebars.open(sidebar);
        self.state.active_sidebar = self.sidebars.active();
        Ok(())
    }

    pub fn close_sidebar(&mut self, name: &str) -> Result<(), ControlError> {
        let sidebar = parse_sidebar(name)?;
        if !self.sidebars.is_open(sidebar) {
            log::debug!("Sidebar {} is already closed", sidebar.name());
        }
        self.sidebars.close(sidebar);
        self.state.active_sidebar = self.sidebars.active();
        Ok(())
    }

    pub fn close_all(&mut self) {
        self.sidebars.close_all();
        self.state.active_sidebar = self.sidebars.active();
    }

    /// Updates camera aspect, projection and surface size together.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface = RenderSurface::new(width, height);
        self.camera.set_aspect(self.surface.aspect());
        self.camera.update_projection();
        log::debug!("Resized to {}x{}", self.surface.width, self.surface.height);
    }

    pub fn orbit_rotate(&mut self, dx: f32, dy: f32) {
        self.orbit.rotate(dx, dy, self.surface.height as f32);
    }

    pub fn orbit_zoom(&mut self, steps: f32) {
        self.orbit.zoom(steps);
    }

    /// One frame: scripted animations, orbit damping, render, then drive.
    pub fn frame(&mut self, dt: f32, renderer: &mut dyn FrameRenderer) {
        self.frame += 1;

        if let Some(event) = self.transitions.update(dt, &mut self.camera, &mut self.orbit) {
            log::debug!("{:?}", event);
        }
        self.state.orbit_enabled = self.orbit.is_enabled();

        if let Some(car) = self.car.as_mut() {
            if let Some(paint) = self.paint.as_mut() {
                if paint.advance(&mut car.graph, dt) {
                    self.paint = None;
                }
            }
            if let Some(steering) = self.steering.as_mut() {
                steering.advance(&mut car.graph, dt);
                if steering.is_finished() {
                    self.steering = None;
                }
            }
        }

        self.orbit.update(&mut self.camera);

        let packet = FramePacket {
            frame: self.frame,
            surface: self.surface,
            view: self.camera.view_matrix(),
            projection: self.camera.projection(),
            aspect: self.camera.aspect(),
            scene: self.car.as_ref().map(|car| &car.graph),
            lights: &self.lights,
            ground: self.car.as_ref().map(|_| &self.ground),
            staging: self.car.as_ref().map(|car| car.staging),
            background: &self.environment.background,
        };
        match renderer.render(&packet) {
            Ok(()) => {
                if let Some(car) = self.car.as_mut() {
                    car.graph.acknowledge_material_updates();
                }
            }
            Err(err) => log::error!("Frame {} failed to render: {}", self.frame, err),
        }

        if self.state.car_loaded && self.state.drive_mode {
            self.advance_drive();
        }
    }

    fn advance_drive(&mut self) {
        let Some(car) = self.car.as_mut() else {
            return;
        };
        self.ground.scroll(self.ground_scroll);
        if let Some(wheels) = car.wheels {
            for id in wheels.all() {
                car.graph.node_mut(id).transform.rotation.x += self.wheel_spin;
            }
        }
    }

    pub fn status_line(&self) -> String {
        match &self.load_status {
            LoadStatus::Idle => "idle".to_string(),
            LoadStatus::Loading(fraction) => format!("loading {:.0}%", fraction * 100.0),
            LoadStatus::Failed(_) => "load failed".to_string(),
            LoadStatus::Ready => format!(
                "{}{} | drive {} | steer {:?} | {} | {}",
                self.state.current_camera_target.unwrap_or("-"),
                if self.state.orbit_enabled { "" } else { " (locked)" },
                if self.state.drive_mode { "on" } else { "off" },
                self.state.steer_direction,
                if self.state.is_day { "day" } else { "night" },
                self.state.active_sidebar.name()
            ),
        }
    }

    /// Window title: application name, frame rate and cadence, then the status line.
    pub fn title_line(&self, app_name: &str, fps: f32, frame_dt: f32) -> String {
        format!(
            "{} | {:.0} fps ({:.1} ms) | {}",
            app_name,
            fps,
            frame_dt * 1000.0,
            self.status_line()
        )
    }
}

#[cfg(test)]
impl ViewController {
    pub fn sidebars(&self) -> &SidebarState {
        &self.sidebars
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn surface(&self) -> RenderSurface {
        self.surface
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn ground(&self) -> &ScrollTexture {
        &self.ground
    }

    pub fn staging(&self) -> Option<Staging> {
        self.car.as_ref().map(|car| car.staging)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitions.is_transitioning()
    }
}

fn parse_sidebar(name: &str) -> Result<Sidebar, ControlError> {
    Sidebar::from_name(name).ok_or_else(|| ControlError::UnknownSidebar(name.to_string()))
}
