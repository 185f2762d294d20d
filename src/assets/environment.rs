use super::AssetError;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// Face file names in +X, -X, +Y, -Y, +Z, -Z order.
pub const CUBE_FACE_FILES: [&str; 6] = ["px.jpg", "nx.jpg", "py.jpg", "ny.jpg", "pz.jpg", "nz.jpg"];

const NEUTRAL_RGB: [u8; 3] = [204, 204, 204];

#[derive(Debug)]
pub struct CubeMap {
    label: String,
    face_size: (u32, u32),
    faces: Vec<RgbaImage>,
}

impl CubeMap {
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let mut faces = Vec::with_capacity(CUBE_FACE_FILES.len());
        for file in CUBE_FACE_FILES {
            let path = dir.join(file);
            let face = image::open(&path)
                .map_err(|source| AssetError::EnvironmentFace {
                    path: path.display().to_string(),
                    source,
                })?
                .to_rgba8();
            faces.push(face);
        }
        let face_size = faces[0].dimensions();
        if faces.iter().any(|face| face.dimensions() != face_size) {
            return Err(AssetError::FaceSizeMismatch {
                dir: dir.display().to_string(),
            });
        }
        Ok(Self {
            label: dir.display().to_string(),
            face_size,
            faces,
        })
    }

    /// Single-texel cube used when the face images are unavailable.
    pub fn solid(label: &str, rgb: [u8; 3]) -> Self {
        let texel = image::Rgba([rgb[0], rgb[1], rgb[2], 255]);
        Self {
            label: label.to_string(),
            face_size: (1, 1),
            faces: (0..CUBE_FACE_FILES.len())
                .map(|_| RgbaImage::from_pixel(1, 1, texel))
                .collect(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn face_size(&self) -> (u32, u32) {
        self.face_size
    }

    pub fn faces(&self) -> &[RgbaImage] {
        &self.faces
    }
}

/// Skybox and reflection maps, shared by reference with every material.
#[derive(Debug, Clone)]
pub struct EnvironmentMaps {
    pub background: Arc<CubeMap>,
    pub reflection: Arc<CubeMap>,
}

impl EnvironmentMaps {
    pub fn new(background: CubeMap, reflection: CubeMap) -> Self {
        Self {
            background: Arc::new(background),
            reflection: Arc::new(reflection),
        }
    }

    pub fn neutral() -> Self {
        Self::new(
            CubeMap::solid("neutral-sky", NEUTRAL_RGB),
            CubeMap::solid("neutral-reflection", NEUTRAL_RGB),
        )
    }

    pub fn load_or_neutral(sky_dir: &Path, reflection_dir: &Path) -> Self {
        let background = load_cube_or_neutral(sky_dir, "neutral-sky");
        let reflection = load_cube_or_neutral(reflection_dir, "neutral-reflection");
        Self::new(background, reflection)
    }
}

fn load_cube_or_neutral(dir: &Path, fallback_label: &str) -> CubeMap {
    match CubeMap::load(dir) {
        Ok(map) => {
            log::info!(
                "Loaded cube map {} ({}x{})",
                map.label(),
                map.face_size().0,
                map.face_size().1
            );
            map
        }
        Err(err) => {
            log::warn!("{}; using {}", err, fallback_label);
            CubeMap::solid(fallback_label, NEUTRAL_RGB)
        }
    }
}

/// Repeating texture whose UV offset is advanced by the drive animation.
#[derive(Debug, Clone)]
pub struct ScrollTexture {
    label: String,
    size: (u32, u32),
    pub offset: [f32; 2],
    pub repeat: [f32; 2],
}

impl ScrollTexture {
    pub const GROUND_REPEAT: [f32; 2] = [100.0, 100.0];

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let size = image::image_dimensions(path).map_err(|source| AssetError::EnvironmentFace {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            label: path.display().to_string(),
            size,
            offset: [0.0, 0.0],
            repeat: Self::GROUND_REPEAT,
        })
    }

    pub fn neutral() -> Self {
        Self {
            label: "neutral-ground".to_string(),
            size: (1, 1),
            offset: [0.0, 0.0],
            repeat: Self::GROUND_REPEAT,
        }
    }

    pub fn load_or_neutral(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("{}; using neutral ground texture", err);
            Self::neutral()
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn scroll(&mut self, du: f32) {
        self.offset[0] += du;
    }
}

#[cfg(test)]
mod tests {
    use super::{CubeMap, EnvironmentMaps, ScrollTexture, CUBE_FACE_FILES};
    use crate::assets::AssetError;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "carviz_env_{}_{}_{}",
            tag,
            std::process::id(),
            nonce
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cube_map_loads_six_faces() {
        let dir = temp_dir("faces");
        for file in CUBE_FACE_FILES {
            image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
                .save(dir.join(file))
                .unwrap();
        }

        let cube = CubeMap::load(&dir).unwrap();
        assert_eq!(cube.face_size(), (4, 4));
        assert_eq!(cube.faces().len(), 6);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_faces_report_the_face_path() {
        let dir = temp_dir("empty");
        match CubeMap::load(&dir) {
            Err(AssetError::EnvironmentFace { path, .. }) => assert!(path.ends_with("px.jpg")),
            other => panic!("expected face error, got {other:?}"),
        }
        let maps = EnvironmentMaps::load_or_neutral(&dir, &dir);
        assert_eq!(maps.reflection.label(), "neutral-reflection");
        assert_eq!(maps.background.label(), "neutral-sky");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_scroll_texture_advances_u_only() {
        let mut texture = ScrollTexture::neutral();
        texture.scroll(0.01);
        texture.scroll(0.01);
        assert!((texture.offset[0] - 0.02).abs() < 1e-6);
        assert_eq!(texture.offset[1], 0.0);
        assert_eq!(texture.repeat, [100.0, 100.0]);
    }
}
