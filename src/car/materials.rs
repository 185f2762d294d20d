use crate::assets::CubeMap;
use crate::car::classify::{CarParts, PartRole};
use crate::render::{Easing, Tween, TweenState};
use crate::scene::{MaterialId, MaterialParams, NodeId, SceneGraph, Side, TextureEncoding};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Node whose material the paint palette recolors.
pub const BODY_PANEL_NODE: &str = "badane_mashin";
pub const PAINT_TWEEN_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSelector {
    MaterialName(&'static str),
    NodeName(&'static str),
    NodeAndMaterial(&'static str, &'static str),
    Role(PartRole),
}

impl MaterialSelector {
    fn matches(&self, graph: &SceneGraph, parts: &CarParts, node: NodeId, material: MaterialId) -> bool {
        let node_name = graph.node(node).name.as_str();
        let material_name = graph.material(material).name.as_str();
        match *self {
            MaterialSelector::MaterialName(name) => material_name == name,
            MaterialSelector::NodeName(name) => node_name == name,
            MaterialSelector::NodeAndMaterial(node_wanted, material_wanted) => {
                node_name == node_wanted && material_name == material_wanted
            }
            MaterialSelector::Role(role) => parts.nodes(role).contains(&node),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaterialRule {
    pub label: &'static str,
    pub selector: MaterialSelector,
    pub apply: fn(&mut MaterialParams),
    pub render_order: Option<i32>,
}

fn body_paint(params: &mut MaterialParams) {
    params.metalness = 0.02;
    params.roughness = 0.04;
    params.reflectivity = 0.05;
    params.side = Side::Double;
}

fn windshield(params: &mut MaterialParams) {
    params.metalness = 0.0;
    params.reflectivity = 0.5;
    params.roughness = 0.0;
    params.side = Side::Double;
}

fn headlight_glass(params: &mut MaterialParams) {
    params.opacity = 1.0;
    params.metalness = 0.0;
    params.roughness = 0.0;
    params.reflectivity = 1.0;
    params.transmission = 0.9;
}

fn turn_indicator(params: &mut MaterialParams) {
    params.emissive = rgb8(255, 51, 0);
}

fn wheel_ring(params: &mut MaterialParams) {
    params.color = rgb8(75, 75, 75);
    params.roughness = 0.3;
    params.metalness = 0.6;
    params.reflectivity = 0.4;
}

pub const MATERIAL_RULES: [MaterialRule; 5] = [
    MaterialRule {
        label: "body paint",
        selector: MaterialSelector::MaterialName("rang_badane_mashin"),
        apply: body_paint,
        render_order: Some(1),
    },
    MaterialRule {
        label: "windshield",
        selector: MaterialSelector::NodeName("Shishe_jelo"),
        apply: windshield,
        render_order: None,
    },
    MaterialRule {
        label: "headlight glass",
        selector: MaterialSelector::NodeAndMaterial("shise_cheragh_jelo", "shishe_cheragh_jelo"),
        apply: headlight_glass,
        render_order: None,
    },
    MaterialRule {
        label: "turn indicator",
        selector: MaterialSelector::NodeName("cheragh_rahnama_jelo"),
        apply: turn_indicator,
        render_order: None,
    },
    MaterialRule {
        label: "wheel ring",
        selector: MaterialSelector::Role(PartRole::WheelRing),
        apply: wheel_ring,
        render_order: None,
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingSummary {
    pub meshes: usize,
    pub materials: usize,
    pub rule_hits: usize,
    pub textures_normalized: usize,
}

/// Applies the shared reflection map and per-part material tuning.
#[derive(Debug, Clone)]
pub struct MaterialBinder {
    reflection: Arc<CubeMap>,
}

impl MaterialBinder {
    pub fn new(reflection: Arc<CubeMap>) -> Self {
        Self { reflection }
    }

    pub fn bind(&self, graph: &mut SceneGraph, parts: &CarParts) -> BindingSummary {
        let mut summary = BindingSummary::default();
        let meshes: Vec<NodeId> = graph
            .traverse(graph.root())
            .into_iter()
            .filter(|id| graph.node(*id).is_mesh)
            .collect();

        let mut touched = BTreeSet::new();
        for &node_id in &meshes {
            let node = graph.node_mut(node_id);
            node.cast_shadow = true;
            node.receive_shadow = true;
            let materials = node.materials.clone();
            for material_id in materials {
                let material = graph.material_mut(material_id);
                material.env_map = Some(Arc::clone(&self.reflection));
                material.params.env_map_intensity = 1.0;
                material.mark_dirty();
                touched.insert(material_id);

                for rule in &MATERIAL_RULES {
                    if !rule.selector.matches(graph, parts, node_id, material_id) {
                        continue;
                    }
                    let material = graph.material_mut(material_id);
                    (rule.apply)(&mut material.params);
                    material.mark_dirty();
                    if let Some(order) = rule.render_order {
                        graph.node_mut(node_id).render_order = order;
                    }
                    summary.rule_hits += 1;
                    log::trace!(
                        "Applied {} to {} ({:?})",
                        rule.label,
                        graph.node(node_id).name,
                        parts.primary_role(node_id)
                    );
                }
            }
        }
        summary.meshes = meshes.len();
        summary.materials = touched.len();
        summary.textures_normalized = normalize_texture_encoding(graph);

        log::info!(
            "Bound {} materials on {} meshes ({} rule hits, {} textures set to sRGB)",
            summary.materials,
            summary.meshes,
            summary.rule_hits,
            summary.textures_normalized
        );
        summary
    }
}

/// Forces color and emissive textures of every mesh material to sRGB.
pub fn normalize_texture_encoding(graph: &mut SceneGraph) -> usize {
    let mut normalized = 0;
    for material_id in graph.mesh_materials() {
        let material = graph.material_mut(material_id);
        let mut has_texture = false;
        for texture in [material.map.as_mut(), material.emissive_map.as_mut()]
            .into_iter()
            .flatten()
        {
            texture.encoding = TextureEncoding::Srgb;
            has_texture = true;
        }
        if has_texture {
            material.mark_dirty();
            normalized += 1;
        }
    }
    normalized
}

pub fn rgb8(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

pub fn hex_rgb(hex: u32) -> [f32; 3] {
    rgb8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintColor {
    Black,
    Blue,
    Red,
}

impl PaintColor {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "black" => Some(PaintColor::Black),
            "blue" => Some(PaintColor::Blue),
            "red" => Some(PaintColor::Red),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaintColor::Black => "black",
            PaintColor::Blue => "blue",
            PaintColor::Red => "red",
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        match self {
            PaintColor::Black => hex_rgb(0x000000),
            PaintColor::Blue => hex_rgb(0x001969),
            PaintColor::Red => hex_rgb(0xc40000),
        }
    }
}

/// Color fade on one material; the final frame writes the exact target.
#[derive(Debug, Clone)]
pub struct PaintAnimation {
    material: MaterialId,
    tween: Tween<[f32; 3]>,
}

impl PaintAnimation {
    pub fn start(graph: &SceneGraph, material: MaterialId, color: PaintColor) -> Self {
        let from = graph.material(material).params.color;
        Self {
            material,
            tween: Tween::new(from, color.rgb(), PAINT_TWEEN_SECONDS, Easing::Power1Out),
        }
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Returns `true` once the animation has finished.
    pub fn advance(&mut self, graph: &mut SceneGraph, dt: f32) -> bool {
        let (color, done) = match self.tween.advance(dt) {
            TweenState::Active(color) => (color, false),
            TweenState::Done(color) => (color, true),
        };
        let material = graph.material_mut(self.material);
        material.params.color = color;
        material.mark_dirty();
        done
    }
}
