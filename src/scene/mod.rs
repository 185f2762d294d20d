pub mod serialization;

use crate::assets::CubeMap;
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::sync::Arc;

/// Index of a node inside its owning [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Index of a material inside its owning [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

/// Local transform. Rotation is XYZ euler in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        compose_transform_matrix(self.position, self.rotation, self.scale)
    }
}

pub fn compose_transform_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let orientation = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Mat4::from_scale_rotation_translation(scale, orientation, position)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let first = matrix.transform_point3(corners[0]);
        corners[1..]
            .iter()
            .map(|corner| matrix.transform_point3(*corner))
            .fold(Aabb::new(first, first), |acc, point| {
                acc.union(Aabb::new(point, point))
            })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextureEncoding {
    Linear,
    Srgb,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TextureRef {
    pub source: String,
    pub encoding: TextureEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// Scalar material state that the binder and the paint tween write.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MaterialParams {
    pub color: [f32; 3],
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub reflectivity: f32,
    pub transmission: f32,
    pub emissive: [f32; 3],
    pub env_map_intensity: f32,
    pub side: Side,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            reflectivity: 0.5,
            transmission: 0.0,
            emissive: [0.0, 0.0, 0.0],
            env_map_intensity: 1.0,
            side: Side::Front,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub params: MaterialParams,
    pub env_map: Option<Arc<CubeMap>>,
    pub map: Option<TextureRef>,
    pub emissive_map: Option<TextureRef>,
    /// Set whenever the material must be re-uploaded by the renderer.
    pub needs_update: bool,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: MaterialParams::default(),
            env_map: None,
            map: None,
            emissive_map: None,
            needs_update: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn snapshot(&self) -> MaterialSnapshot {
        MaterialSnapshot {
            name: self.name.clone(),
            params: self.params.clone(),
            env_map: self.env_map.as_ref().map(|map| map.label().to_string()),
            map: self.map.clone(),
            emissive_map: self.emissive_map.clone(),
        }
    }
}

/// Visual state of a material, without upload bookkeeping.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MaterialSnapshot {
    pub name: String,
    pub params: MaterialParams,
    pub env_map: Option<String>,
    pub map: Option<TextureRef>,
    pub emissive_map: Option<TextureRef>,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub materials: Vec<MaterialId>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub is_mesh: bool,
    pub local_bounds: Option<Aabb>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub render_order: i32,
}

impl SceneNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::default(),
            materials: Vec::new(),
            children: Vec::new(),
            parent,
            is_mesh: false,
            local_bounds: None,
            cast_shadow: false,
            receive_shadow: false,
            render_order: 0,
        }
    }
}

/// Arena-backed node hierarchy of one loaded asset.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    materials: Vec<Material>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![SceneNode::new(root_name, None)],
            materials: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode::new(name, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: &str,
        materials: Vec<MaterialId>,
        bounds: Option<Aabb>,
    ) -> NodeId {
        let id = self.add_node(parent, name);
        let node = &mut self.nodes[id.0];
        node.is_mesh = true;
        node.materials = materials;
        node.local_bounds = bounds;
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth-first pre-order walk starting at `start` (inclusive).
    pub fn traverse(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse(self.root)
            .into_iter()
            .find(|id| self.nodes[id.0].name == name)
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = self.nodes[id.0].transform.matrix();
        let mut parent = self.nodes[id.0].parent;
        while let Some(parent_id) = parent {
            let node = &self.nodes[parent_id.0];
            matrix = node.transform.matrix() * matrix;
            parent = node.parent;
        }
        matrix
    }

    /// World-space bounds of every mesh with known local bounds.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.traverse(self.root)
            .into_iter()
            .filter_map(|id| {
                let bounds = self.nodes[id.0].local_bounds?;
                Some(bounds.transformed(&self.world_matrix(id)))
            })
            .reduce(Aabb::union)
    }

    /// Materials referenced by mesh nodes, each listed once, in traversal order.
    pub fn mesh_materials(&self) -> Vec<MaterialId> {
        let mut seen = vec![false; self.materials.len()];
        let mut out = Vec::new();
        for id in self.traverse(self.root) {
            let node = &self.nodes[id.0];
            if !node.is_mesh {
                continue;
            }
            for material in &node.materials {
                if !seen[material.0] {
                    seen[material.0] = true;
                    out.push(*material);
                }
            }
        }
        out
    }

    pub fn pending_material_updates(&self) -> usize {
        self.materials.iter().filter(|material| material.needs_update).count()
    }

    /// Called once the renderer has consumed every dirty material.
    pub fn acknowledge_material_updates(&mut self) {
        for material in &mut self.materials {
            material.needs_update = false;
        }
    }

    pub fn material_snapshot(&self) -> Vec<MaterialSnapshot> {
        self.materials.iter().map(Material::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{compose_transform_matrix, Aabb, Material, SceneGraph};
    use glam::Vec3;

    #[test]
    fn test_traverse_is_depth_first_pre_order() {
        let mut graph = SceneGraph::new("root");
        let a = graph.add_node(graph.root(), "a");
        let b = graph.add_node(graph.root(), "b");
        let a1 = graph.add_node(a, "a1");
        let order = graph.traverse(graph.root());
        assert_eq!(order, vec![graph.root(), a, a1, b]);
        assert_eq!(graph.find_by_name("a1"), Some(a1));
        assert_eq!(graph.find_by_name("missing"), None);
    }

    #[test]
    fn test_world_bounds_follow_parent_transforms() {
        let mut graph = SceneGraph::new("root");
        let group = graph.add_node(graph.root(), "group");
        graph.node_mut(group).transform.position = Vec3::new(10.0, 0.0, 0.0);
        let material = graph.add_material(Material::new("paint"));
        graph.add_mesh(
            group,
            "box",
            vec![material],
            Some(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
        );

        let bounds = graph.world_bounds().unwrap();
        assert!((bounds.center() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert!((bounds.size() - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn test_mesh_materials_are_deduplicated() {
        let mut graph = SceneGraph::new("root");
        let shared = graph.add_material(Material::new("shared"));
        let other = graph.add_material(Material::new("other"));
        graph.add_mesh(graph.root(), "m1", vec![shared], None);
        graph.add_mesh(graph.root(), "m2", vec![shared, other], None);
        assert_eq!(graph.mesh_materials(), vec![shared, other]);
    }

    #[test]
    fn test_dirty_materials_are_acknowledged() {
        let mut graph = SceneGraph::new("root");
        let paint = graph.add_material(Material::new("paint"));
        graph.add_material(Material::new("rubber"));
        graph.material_mut(paint).mark_dirty();
        assert_eq!(graph.pending_material_updates(), 1);
        graph.acknowledge_material_updates();
        assert_eq!(graph.pending_material_updates(), 0);
    }

    #[test]
    fn test_compose_transform_keeps_translation() {
        let matrix = compose_transform_matrix(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::ONE,
        );
        let origin = matrix.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        assert!(matrix.to_cols_array().iter().all(|value| value.is_finite()));
    }
}
