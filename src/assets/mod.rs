mod environment;

pub use environment::{CubeMap, EnvironmentMaps, ScrollTexture};

use crate::scene::{Aabb, Material, MaterialId, SceneGraph, Side, TextureEncoding, TextureRef, Transform};
use glam::{EulerRot, Quat, Vec3};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHUNK_BYTES: usize = 256 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF {path} contains no scene")]
    EmptyScene { path: String },
    #[error("failed to decode environment face {path}: {source}")]
    EnvironmentFace {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("environment faces in {dir} have mismatched sizes")]
    FaceSizeMismatch { dir: String },
}

/// Outcome of one [`AssetLoadJob::poll`].
#[derive(Debug)]
pub enum LoadEvent {
    Progress(f32),
    Complete(SceneGraph),
    Failed(AssetError),
}

struct OpenFile {
    file: File,
    total: u64,
}

/// Reads a glTF/GLB file one chunk per poll so loading never blocks a frame
/// for the whole file.
pub struct AssetLoadJob {
    path: PathBuf,
    chunk_bytes: usize,
    open: Option<OpenFile>,
    buffer: Vec<u8>,
    finished: bool,
}

impl AssetLoadJob {
    pub fn new(path: impl Into<PathBuf>, chunk_bytes: usize) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: chunk_bytes.max(1),
            open: None,
            buffer: Vec::new(),
            finished: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances the load by one chunk. Returns `None` once a terminal event
    /// has been delivered.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(graph)) => {
                self.finished = true;
                self.buffer = Vec::new();
                Some(LoadEvent::Complete(graph))
            }
            Ok(None) => Some(LoadEvent::Progress(self.fraction())),
            Err(err) => {
                self.finished = true;
                self.buffer = Vec::new();
                Some(LoadEvent::Failed(err))
            }
        }
    }

    fn step(&mut self) -> Result<Option<SceneGraph>, AssetError> {
        let display = self.path.display().to_string();
        if self.open.is_none() {
            let file = File::open(&self.path).map_err(|source| AssetError::Read {
                path: display.clone(),
                source,
            })?;
            let total = file
                .metadata()
                .map_err(|source| AssetError::Read {
                    path: display.clone(),
                    source,
                })?
                .len();
            self.buffer.reserve(total as usize);
            self.open = Some(OpenFile { file, total });
        }
        let Some(open) = self.open.as_mut() else {
            return Ok(None);
        };

        let mut chunk = vec![0u8; self.chunk_bytes];
        let read = open
            .file
            .read(&mut chunk)
            .map_err(|source| AssetError::Read {
                path: display.clone(),
                source,
            })?;
        self.buffer.extend_from_slice(&chunk[..read]);

        if read == 0 || self.buffer.len() as u64 >= open.total {
            log::debug!("Read {} bytes from {}", self.buffer.len(), display);
            return scene_from_gltf(&self.buffer, &display).map(Some);
        }
        Ok(None)
    }

    fn fraction(&self) -> f32 {
        match &self.open {
            Some(open) if open.total > 0 => {
                (self.buffer.len() as f64 / open.total as f64).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }
}

/// Converts a glTF document (JSON or binary container) into a [`SceneGraph`].
/// Only names, transforms, materials and bounds are kept; vertex data stays
/// with the renderer.
pub fn scene_from_gltf(bytes: &[u8], label: &str) -> Result<SceneGraph, AssetError> {
    let document = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::Parse {
        path: label.to_string(),
        source,
    })?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::EmptyScene {
            path: label.to_string(),
        })?;

    let mut graph = SceneGraph::new(scene.name().unwrap_or("Scene"));
    let mut materials: HashMap<Option<usize>, MaterialId> = HashMap::new();
    let root = graph.root();
    for node in scene.nodes() {
        append_node(&mut graph, root, &node, &mut materials);
    }
    Ok(graph)
}

fn append_node(
    graph: &mut SceneGraph,
    parent: crate::scene::NodeId,
    node: &gltf::Node<'_>,
    materials: &mut HashMap<Option<usize>, MaterialId>,
) {
    let name = node.name().unwrap_or("");
    let id = match node.mesh() {
        Some(mesh) => {
            let mut material_ids = Vec::new();
            let mut bounds: Option<Aabb> = None;
            for primitive in mesh.primitives() {
                let material = primitive.material();
                let material_id = match materials.get(&material.index()) {
                    Some(existing) => *existing,
                    None => {
                        let created = graph.add_material(convert_material(&material));
                        materials.insert(material.index(), created);
                        created
                    }
                };
                material_ids.push(material_id);
                if let Some(primitive_bounds) = primitive_bounds(&primitive) {
                    bounds = Some(match bounds {
                        Some(existing) => existing.union(primitive_bounds),
                        None => primitive_bounds,
                    });
                }
            }
            graph.add_mesh(parent, name, material_ids, bounds)
        }
        None => graph.add_node(parent, name),
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    let (rx, ry, rz) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
    graph.node_mut(id).transform = Transform {
        position: Vec3::from_array(translation),
        rotation: Vec3::new(rx, ry, rz),
        scale: Vec3::from_array(scale),
    };

    for child in node.children() {
        append_node(graph, id, &child, materials);
    }
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let mut out = Material::new(material.name().unwrap_or(""));
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    out.params.color = [r, g, b];
    out.params.opacity = a;
    out.params.metalness = pbr.metallic_factor();
    out.params.roughness = pbr.roughness_factor();
    out.params.emissive = material.emissive_factor();
    if material.double_sided() {
        out.params.side = Side::Double;
    }
    out.map = pbr
        .base_color_texture()
        .map(|info| texture_ref(&info.texture()));
    out.emissive_map = material
        .emissive_texture()
        .map(|info| texture_ref(&info.texture()));
    out
}

fn texture_ref(texture: &gltf::Texture<'_>) -> TextureRef {
    let source = match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => uri.to_string(),
        gltf::image::Source::View { mime_type, .. } => {
            format!("embedded:{}#{}", mime_type, texture.index())
        }
    };
    TextureRef {
        source,
        encoding: TextureEncoding::Linear,
    }
}

fn primitive_bounds(primitive: &gltf::Primitive<'_>) -> Option<Aabb> {
    let accessor = primitive.get(&gltf::Semantic::Positions)?;
    let min = json_vec3(&accessor.min()?)?;
    let max = json_vec3(&accessor.max()?)?;
    Some(Aabb::new(min, max))
}

fn json_vec3(value: &gltf::json::Value) -> Option<Vec3> {
    let values = value.as_array()?;
    if values.len() < 3 {
        return None;
    }
    Some(Vec3::new(
        values[0].as_f64()? as f32,
        values[1].as_f64()? as f32,
        values[2].as_f64()? as f32,
    ))
}

#[cfg(test)]
mod tests {
    use super::{scene_from_gltf, AssetError, AssetLoadJob, LoadEvent};
    use crate::scene::Side;

    const CAR_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "name": "car", "nodes": [0] } ],
        "nodes": [
            { "name": "body_group", "children": [1, 2] },
            { "name": "badane_mashin", "mesh": 0 },
            { "name": "WheelFL", "mesh": 1, "translation": [100.0, 0.0, 50.0] }
        ],
        "meshes": [
            { "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] },
            { "primitives": [ { "attributes": { "POSITION": 1 }, "material": 1 } ] }
        ],
        "materials": [
            {
                "name": "rang_badane_mashin",
                "doubleSided": true,
                "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.1, 0.1, 1.0], "metallicFactor": 0.7 }
            },
            { "name": "lastic" }
        ],
        "accessors": [
            { "componentType": 5126, "count": 3, "type": "VEC3", "min": [-200.0, -50.0, -90.0], "max": [200.0, 60.0, 90.0] },
            { "componentType": 5126, "count": 3, "type": "VEC3", "min": [-30.0, -30.0, -10.0], "max": [30.0, 30.0, 10.0] }
        ]
    }"#;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("carviz_{}_{}_{}.gltf", tag, std::process::id(), nonce));
        path
    }

    #[test]
    fn test_gltf_nodes_materials_and_bounds_are_converted() {
        let graph = scene_from_gltf(CAR_GLTF.as_bytes(), "car.gltf").unwrap();
        assert_eq!(graph.node(graph.root()).name, "car");

        let body = graph.find_by_name("badane_mashin").unwrap();
        let body_node = graph.node(body);
        assert!(body_node.is_mesh);
        let paint = graph.material(body_node.materials[0]);
        assert_eq!(paint.name, "rang_badane_mashin");
        assert_eq!(paint.params.side, Side::Double);
        assert!((paint.params.metalness - 0.7).abs() < 1e-6);
        assert!((paint.params.color[0] - 0.5).abs() < 1e-6);

        let wheel = graph.find_by_name("WheelFL").unwrap();
        assert_eq!(graph.node(wheel).transform.position.x, 100.0);

        let bounds = graph.world_bounds().unwrap();
        assert_eq!(bounds.min.x, -200.0);
        assert_eq!(bounds.max.x, 200.0);
    }

    #[test]
    fn test_load_job_reports_progress_then_completes() {
        let path = temp_path("progress");
        std::fs::write(&path, CAR_GLTF).unwrap();

        let mut job = AssetLoadJob::new(&path, 128);
        let mut progress = Vec::new();
        let mut graph = None;
        while let Some(event) = job.poll() {
            match event {
                LoadEvent::Progress(fraction) => progress.push(fraction),
                LoadEvent::Complete(loaded) => graph = Some(loaded),
                LoadEvent::Failed(err) => panic!("unexpected failure: {err}"),
            }
        }

        assert!(job.is_finished());
        assert!(!progress.is_empty());
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(progress.iter().all(|fraction| (0.0..=1.0).contains(fraction)));
        assert!(graph.unwrap().find_by_name("WheelFL").is_some());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_fails_once() {
        let mut job = AssetLoadJob::new(temp_path("missing"), 64);
        match job.poll() {
            Some(LoadEvent::Failed(AssetError::Read { .. })) => {}
            other => panic!("expected read failure, got {other:?}"),
        }
        assert!(job.poll().is_none());
    }

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        match scene_from_gltf(b"definitely not gltf", "junk.glb") {
            Err(AssetError::Parse { path, .. }) => assert_eq!(path, "junk.glb"),
            other => panic!("expected parse failure, got {other:?}"),
        }
    }
}
