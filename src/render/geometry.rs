//! CPU-side frame geometry: the ground and shadow planes plus one wire box
//! per mesh. Built fresh from each packet.

use super::{FramePacket, Staging};
use crate::assets::{CubeMap, ScrollTexture};
use crate::car::LightRig;
use crate::scene::{Aabb, SceneGraph};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Side length of the square ground plane.
pub const GROUND_EXTENT: f32 = 20000.0;

const GROUND_COLOR: [f32; 3] = [0.45, 0.45, 0.47];
const GRID_COLOR: [f32; 3] = [0.32, 0.32, 0.34];
const SHADOW_ALPHA: f32 = 0.55;

#[rustfmt::skip]
/// 12 box edges as corner index pairs. Corner bit 0 is x, bit 1 is y, bit 2 is z.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub fn new(position: Vec3, color: [f32; 3], alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            color: [color[0], color[1], color[2], alpha],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// View-projection uniform (must match `view` in the WGSL source).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ViewUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[rustfmt::skip]
/// Maps the GL clip-space depth range of the camera projection onto wgpu's 0..1.
const GL_TO_WGPU_DEPTH: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

impl ViewUniform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_proj: (GL_TO_WGPU_DEPTH * projection * view).to_cols_array_2d(),
        }
    }
}

/// Vertices for one frame, split by primitive topology.
#[derive(Debug, Default)]
pub struct FrameGeometry {
    /// Ground then shadow, drawn back to front without depth testing.
    pub planes: Vec<ColorVertex>,
    /// Ground grid and mesh bounds.
    pub lines: Vec<ColorVertex>,
}

impl FrameGeometry {
    pub fn build(packet: &FramePacket<'_>) -> Self {
        let mut geometry = Self::default();
        let tint = light_tint(packet.lights);
        if let Some(staging) = packet.staging {
            geometry.push_planes(&staging, tint);
            if let Some(ground) = packet.ground {
                geometry.push_grid(&staging, ground, tint);
            }
        }
        if let Some(scene) = packet.scene {
            geometry.push_bounds(scene, tint);
        }
        geometry
    }

    fn push_planes(&mut self, staging: &Staging, tint: f32) {
        let ground_half = GROUND_EXTENT * 0.5;
        let ground_center = Vec3::new(staging.center.x, staging.ground_y, staging.center.z);
        push_quad(&mut self.planes, ground_center, ground_half, scale(GROUND_COLOR, tint), 1.0);
        if staging.shadow_extent > 0.0 {
            let shadow_center = Vec3::new(staging.center.x, staging.shadow_y, staging.center.z);
            push_quad(
                &mut self.planes,
                shadow_center,
                staging.shadow_extent * 0.5,
                [0.0, 0.0, 0.0],
                SHADOW_ALPHA,
            );
        }
    }

    /// One line per texture repeat, shifted along x by the scroll offset.
    fn push_grid(&mut self, staging: &Staging, ground: &ScrollTexture, tint: f32) {
        let cells_x = ground.repeat[0].max(1.0);
        let cells_z = ground.repeat[1].max(1.0);
        let cell_x = GROUND_EXTENT / cells_x;
        let cell_z = GROUND_EXTENT / cells_z;
        let half = GROUND_EXTENT * 0.5;
        let y = staging.ground_y;
        let origin_x = staging.center.x - half;
        let origin_z = staging.center.z - half;
        let shift = ground.offset[0].rem_euclid(1.0) * cell_x;
        let color = scale(GRID_COLOR, tint);

        for i in 0..cells_x as usize {
            let x = origin_x + i as f32 * cell_x + shift;
            self.lines.push(ColorVertex::new(Vec3::new(x, y, origin_z), color, 1.0));
            self.lines.push(ColorVertex::new(Vec3::new(x, y, origin_z + GROUND_EXTENT), color, 1.0));
        }
        for i in 0..=cells_z as usize {
            let z = origin_z + i as f32 * cell_z;
            self.lines.push(ColorVertex::new(Vec3::new(origin_x, y, z), color, 1.0));
            self.lines.push(ColorVertex::new(Vec3::new(origin_x + GROUND_EXTENT, y, z), color, 1.0));
        }
    }

    fn push_bounds(&mut self, scene: &SceneGraph, tint: f32) {
        for id in scene.traverse(scene.root()) {
            let node = scene.node(id);
            let Some(bounds) = node.local_bounds.filter(|_| node.is_mesh) else {
                continue;
            };
            let color = node
                .materials
                .first()
                .map(|material| scene.material(*material).params.color)
                .unwrap_or([1.0, 1.0, 1.0]);
            push_box(&mut self.lines, &bounds, &scene.world_matrix(id), scale(color, tint));
        }
    }
}

/// Flat clear color: the mean texel over every background face.
pub fn clear_color(background: &CubeMap) -> wgpu::Color {
    let mut sum = [0.0f64; 3];
    let mut count = 0u64;
    for face in background.faces() {
        for pixel in face.pixels() {
            for (channel, total) in sum.iter_mut().enumerate() {
                *total += pixel.0[channel] as f64 / 255.0;
            }
            count += 1;
        }
    }
    if count == 0 {
        return wgpu::Color::BLACK;
    }
    let n = count as f64;
    wgpu::Color {
        r: sum[0] / n,
        g: sum[1] / n,
        b: sum[2] / n,
        a: 1.0,
    }
}

/// Combined brightness of the rig, saturating at 1.
fn light_tint(lights: &LightRig) -> f32 {
    lights
        .lights()
        .iter()
        .map(|light| light.intensity * (light.color[0] + light.color[1] + light.color[2]) / 3.0)
        .sum::<f32>()
        .min(1.0)
}

fn scale(color: [f32; 3], tint: f32) -> [f32; 3] {
    [color[0] * tint, color[1] * tint, color[2] * tint]
}

/// Horizontal square as two triangles.
fn push_quad(out: &mut Vec<ColorVertex>, center: Vec3, half: f32, color: [f32; 3], alpha: f32) {
    let corners = [
        center + Vec3::new(-half, 0.0, -half),
        center + Vec3::new(half, 0.0, -half),
        center + Vec3::new(half, 0.0, half),
        center + Vec3::new(-half, 0.0, half),
    ];
    for index in [0, 2, 1, 0, 3, 2] {
        out.push(ColorVertex::new(corners[index], color, alpha));
    }
}

fn push_box(out: &mut Vec<ColorVertex>, bounds: &Aabb, world: &Mat4, color: [f32; 3]) {
    let corners: Vec<Vec3> = (0..8)
        .map(|bits| {
            let local = Vec3::new(
                if bits & 1 == 0 { bounds.min.x } else { bounds.max.x },
                if bits & 2 == 0 { bounds.min.y } else { bounds.max.y },
                if bits & 4 == 0 { bounds.min.z } else { bounds.max.z },
            );
            world.transform_point3(local)
        })
        .collect();
    for (a, b) in BOX_EDGES {
        out.push(ColorVertex::new(corners[a], color, 1.0));
        out.push(ColorVertex::new(corners[b], color, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderSurface;
    use crate::scene::Material;

    fn staging() -> Staging {
        Staging {
            size: 400.0,
            center: Vec3::new(10.0, -150.0, 0.0),
            ground_y: -177.0,
            shadow_y: -180.0,
            shadow_extent: 440.0,
        }
    }

    fn packet<'a>(
        scene: Option<&'a SceneGraph>,
        lights: &'a LightRig,
        ground: Option<&'a ScrollTexture>,
        background: &'a CubeMap,
        staging: Option<Staging>,
    ) -> FramePacket<'a> {
        FramePacket {
            frame: 1,
            surface: RenderSurface::new(800, 600),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            aspect: 800.0 / 600.0,
            scene,
            lights,
            ground,
            staging,
            background,
        }
    }

    #[test]
    fn test_nothing_staged_draws_nothing() {
        let lights = LightRig::new(true);
        let background = CubeMap::solid("sky", [0, 0, 0]);
        let geometry = FrameGeometry::build(&packet(None, &lights, None, &background, None));
        assert!(geometry.planes.is_empty());
        assert!(geometry.lines.is_empty());
    }

    #[test]
    fn test_ground_and_shadow_sit_at_their_heights() {
        let lights = LightRig::new(true);
        let background = CubeMap::solid("sky", [0, 0, 0]);
        let geometry =
            FrameGeometry::build(&packet(None, &lights, None, &background, Some(staging())));

        assert_eq!(geometry.planes.len(), 12);
        let (ground, shadow) = geometry.planes.split_at(6);
        assert!(ground.iter().all(|v| v.position[1] == -177.0 && v.color[3] == 1.0));
        assert!(shadow.iter().all(|v| v.position[1] == -180.0 && v.color[3] == SHADOW_ALPHA));
        let shadow_max_x = shadow.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((shadow_max_x - (10.0 + 220.0)).abs() < 1e-3);
        let ground_max_x = ground.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((ground_max_x - (10.0 + GROUND_EXTENT * 0.5)).abs() < 1e-2);
    }

    #[test]
    fn test_each_mesh_gets_a_world_space_wire_box() {
        let mut scene = SceneGraph::new("car");
        let mut red = Material::new("red");
        red.params.color = [1.0, 0.0, 0.0];
        let red = scene.add_material(red);
        let root = scene.root();
        let body = scene.add_node(root, "body");
        scene.node_mut(body).transform.position = Vec3::new(0.0, 5.0, 0.0);
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        scene.add_mesh(body, "panel", vec![red], Some(bounds));
        scene.add_mesh(root, "no_bounds", vec![], None);

        let lights = LightRig::new(true);
        let background = CubeMap::solid("sky", [0, 0, 0]);
        let geometry =
            FrameGeometry::build(&packet(Some(&scene), &lights, None, &background, None));

        assert_eq!(geometry.lines.len(), 24);
        let min_y = geometry.lines.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = geometry.lines.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!((min_y, max_y), (4.0, 6.0));
        assert!(geometry.lines.iter().all(|v| v.color == [1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_night_rig_darkens_geometry() {
        let mut scene = SceneGraph::new("car");
        let white = scene.add_material(Material::new("white"));
        let root = scene.root();
        scene.add_mesh(root, "panel", vec![white], Some(Aabb::new(Vec3::ZERO, Vec3::ONE)));
        let background = CubeMap::solid("sky", [0, 0, 0]);

        let day = LightRig::new(true);
        let night = LightRig::new(false);
        let lit = FrameGeometry::build(&packet(Some(&scene), &day, None, &background, None));
        let dim = FrameGeometry::build(&packet(Some(&scene), &night, None, &background, None));
        assert_eq!(lit.lines[0].color[0], 1.0);
        assert!(dim.lines[0].color[0] < 0.5);
    }

    #[test]
    fn test_grid_scrolls_with_ground_offset() {
        let lights = LightRig::new(true);
        let background = CubeMap::solid("sky", [0, 0, 0]);
        let mut ground = ScrollTexture::neutral();
        let still = FrameGeometry::build(&packet(
            None,
            &lights,
            Some(&ground),
            &background,
            Some(staging()),
        ));
        ground.scroll(0.25);
        let moved = FrameGeometry::build(&packet(
            None,
            &lights,
            Some(&ground),
            &background,
            Some(staging()),
        ));

        let cell = GROUND_EXTENT / ground.repeat[0];
        assert_eq!(still.lines.len(), moved.lines.len());
        let dx = moved.lines[0].position[0] - still.lines[0].position[0];
        assert!((dx - 0.25 * cell).abs() < 1e-2);
        assert!(moved.lines.iter().all(|v| v.position[1] == -177.0));
    }

    #[test]
    fn test_clear_color_averages_background() {
        let background = CubeMap::solid("sky", [255, 0, 51]);
        let color = clear_color(&background);
        assert_eq!((color.r, color.g), (1.0, 0.0));
        assert!((color.b - 0.2).abs() < 1e-6);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn test_uniform_maps_depth_into_unit_range() {
        let projection = Mat4::perspective_rh_gl(1.0, 1.0, 1.0, 100.0);
        let uniform = Mat4::from_cols_array_2d(&ViewUniform::new(Mat4::IDENTITY, projection).view_proj);
        let near = uniform.project_point3(Vec3::new(0.0, 0.0, -1.0));
        let far = uniform.project_point3(Vec3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}
