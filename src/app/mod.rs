mod input;
mod timing;

use crate::assets::{AssetLoadJob, EnvironmentMaps, LoadEvent, ScrollTexture};
use crate::config::ViewerConfig;
use crate::controller::{ViewController, ViewerCommand};
use crate::render::{FramePacket, FrameRenderer, GpuPresenter, RenderError};
use crate::scene::serialization::save_material_report;
use input::InputState;
use timing::FrameClock;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "carviz";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Start-up options resolved by `main`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: ViewerConfig,
    pub material_report: Option<PathBuf>,
}

/// Forwards frame packets to the GPU presenter and keeps per-frame stats.
#[derive(Default)]
struct WindowPresenter {
    gpu: Option<GpuPresenter>,
    presented: u64,
    last_mesh_count: usize,
}

impl WindowPresenter {
    fn log_scene_change(&mut self, packet: &FramePacket<'_>) {
        let meshes = packet.scene.map_or(0, |scene| {
            scene
                .traverse(scene.root())
                .into_iter()
                .filter(|id| scene.node(*id).is_mesh)
                .count()
        });
        if meshes == self.last_mesh_count {
            return;
        }
        log::debug!(
            "Presenting {} meshes against {} ({} faces of {:?})",
            meshes,
            packet.background.label(),
            packet.background.faces().len(),
            packet.background.face_size()
        );
        if let Some(staging) = packet.staging {
            log::debug!(
                "Car size {:.1}; ground at y {:.1}, shadow at y {:.1} spanning {:.1} around {:?}",
                staging.size,
                staging.ground_y,
                staging.shadow_y,
                staging.shadow_extent,
                staging.center
            );
        }
        if let Some(ground) = packet.ground {
            let (width, height) = ground.size();
            log::debug!("Ground texture {} {}x{}", ground.label(), width, height);
        }
        self.last_mesh_count = meshes;
    }
}

impl FrameRenderer for WindowPresenter {
    fn render(&mut self, packet: &FramePacket<'_>) -> Result<(), RenderError> {
        self.log_scene_change(packet);
        let gpu = self
            .gpu
            .as_mut()
            .ok_or_else(|| RenderError::PresenterUnavailable("GPU not initialized".to_string()))?;
        log::trace!(
            "Frame {} {}x{}, {} lights ({}, exposure {}), {} material updates",
            packet.frame,
            packet.surface.width,
            packet.surface.height,
            packet.lights.lights().len(),
            if packet.lights.is_day() { "day" } else { "night" },
            packet.lights.exposure(),
            packet.scene.map_or(0, |scene| scene.pending_material_updates())
        );
        gpu.render(packet)?;
        self.presented += 1;
        Ok(())
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    config: ViewerConfig,
    controller: ViewController,
    presenter: WindowPresenter,
    load_job: Option<AssetLoadJob>,
    material_report: Option<PathBuf>,
    input: InputState,
    clock: FrameClock,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(options: RunOptions) -> Self {
        let config = options.config;
        let environment = EnvironmentMaps::load_or_neutral(&config.skybox_dir, &config.reflection_dir);
        let ground = ScrollTexture::load_or_neutral(&config.floor_texture);
        let controller = ViewController::new(&config, environment, ground);
        Self {
            window: None,
            config,
            controller,
            presenter: WindowPresenter::default(),
            load_job: None,
            material_report: options.material_report,
            input: InputState::default(),
            clock: FrameClock::default(),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn poll_load(&mut self) {
        let Some(job) = self.load_job.as_mut() else {
            return;
        };
        let Some(event) = job.poll() else {
            self.load_job = None;
            return;
        };
        let completed = matches!(event, LoadEvent::Complete(_));
        let finished = job.is_finished();
        if finished {
            log::info!("Load of {} finished", job.path().display());
        }
        self.controller.handle_load_event(event);
        if finished {
            self.load_job = None;
        }
        if completed {
            self.write_material_report();
        }
    }

    fn write_material_report(&mut self) {
        let (Some(path), Some(scene)) = (self.material_report.take(), self.controller.scene()) else {
            return;
        };
        match save_material_report(scene, &path) {
            Ok(()) => log::info!("Wrote material report to {}", path.display()),
            Err(err) => log::warn!("Failed to write material report {}: {}", path.display(), err),
        }
    }

    fn render(&mut self) {
        self.poll_load();
        let now = Instant::now();
        let dt = self.clock.tick(now);
        if let (Some(fps), Some(window)) = (self.clock.sample_fps(now), &self.window) {
            window.set_title(&self.controller.title_line(WINDOW_TITLE, fps, dt));
        }
        self.controller.frame(dt, &mut self.presenter);
    }

    fn dispatch(&mut self, command: Option<ViewerCommand>) {
        if let Some(command) = command {
            self.controller.dispatch(command);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        log::info!("Window created ({}x{})", size.width, size.height);
        self.controller.resize(size.width, size.height);
        match pollster::block_on(GpuPresenter::new(window.clone())) {
            Ok(gpu) => self.presenter.gpu = Some(gpu),
            Err(err) => {
                log::error!("Failed to initialize GPU presenter: {}", err);
                event_loop.exit();
                return;
            }
        }
        self.update_target_frame_duration(&window);
        self.window = Some(window);
        self.load_job = Some(self.controller.begin_load(self.config.asset.clone()));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                if pressed && event.repeat {
                    return;
                }
                let command = self.input.handle_key(event.physical_key, pressed);
                self.dispatch(command);
            }
            WindowEvent::Resized(new_size) => {
                self.dispatch(Some(ViewerCommand::Resize {
                    width: new_size.width,
                    height: new_size.height,
                }));
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.set_shift(modifiers.state().shift_key());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let command = self.input.handle_cursor(position.x as f32, position.y as f32);
                self.dispatch(command);
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.input.cursor_left();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input
                    .handle_button(button, state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let command = self.input.handle_wheel(delta);
                self.dispatch(command);
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!(
            "Presented {} frames ({} controller frames, {} camera moves)",
            self.presenter.presented,
            self.controller.frame_count(),
            self.controller.transitions_completed()
        );
    }
}

pub fn run(options: RunOptions) -> Result<(), AppError> {
    log::info!("carviz car viewer");
    log::info!("   1-7 camera presets (shift to cut), B/U/R paint, Space drive, arrows steer, N day/night");
    log::info!("   Press ESC or close window to exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye");
    Ok(())
}
