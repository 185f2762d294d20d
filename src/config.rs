use crate::assets::DEFAULT_CHUNK_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Viewer settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset: PathBuf,
    pub skybox_dir: PathBuf,
    pub reflection_dir: PathBuf,
    pub floor_texture: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
    /// Radians added to each wheel per frame while driving.
    pub wheel_spin_per_frame: f32,
    /// Ground texture u offset added per frame while driving.
    pub ground_scroll_per_frame: f32,
    pub load_chunk_bytes: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: PathBuf::from("assets/car/scene.gltf"),
            skybox_dir: PathBuf::from("assets/environment/skybox"),
            reflection_dir: PathBuf::from("assets/environment/envReflection"),
            floor_texture: PathBuf::from("assets/environment/floor.jpg"),
            window_width: 1280,
            window_height: 720,
            wheel_spin_per_frame: 0.05,
            ground_scroll_per_frame: 0.01,
            load_chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
