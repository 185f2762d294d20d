pub mod camera;
mod geometry;
mod gpu;
pub mod transition;
pub mod tween;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use gpu::GpuPresenter;
pub use transition::{
    CameraPreset, CameraTransitionEngine, TransitionEvent, TransitionOverrides, CAMERA_PRESETS,
};
pub use tween::{Easing, Tween, TweenState};

use crate::assets::{CubeMap, ScrollTexture};
use crate::car::LightRig;
use crate::scene::SceneGraph;
use glam::{Mat4, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("presenter unavailable: {0}")]
    PresenterUnavailable(String),
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Pixel size of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Ground and contact shadow placed under the car on load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Staging {
    pub size: f32,
    pub center: Vec3,
    pub ground_y: f32,
    pub shadow_y: f32,
    pub shadow_extent: f32,
}

/// Everything a presenter needs to draw one frame.
pub struct FramePacket<'a> {
    pub frame: u64,
    pub surface: RenderSurface,
    pub view: Mat4,
    pub projection: Mat4,
    pub aspect: f32,
    pub scene: Option<&'a SceneGraph>,
    pub lights: &'a LightRig,
    pub ground: Option<&'a ScrollTexture>,
    pub staging: Option<Staging>,
    pub background: &'a CubeMap,
}

/// Backend seam. The controller hands it one packet per frame.
pub trait FrameRenderer {
    fn render(&mut self, packet: &FramePacket<'_>) -> Result<(), RenderError>;
}


#[cfg(test)]
mod tests {
    use super::RenderSurface;

    #[test]
    fn test_surface_never_has_zero_extent() {
        let surface = RenderSurface::new(0, 0);
        assert_eq!((surface.width, surface.height), (1, 1));
        assert_eq!(RenderSurface::new(1920, 1080).aspect(), 1920.0 / 1080.0);
    }
}
