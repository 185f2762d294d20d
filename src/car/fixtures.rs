use crate::scene::{Aabb, Material, MaterialId, SceneGraph};
use glam::Vec3;

/// Material handles of [`car_graph`].
#[derive(Debug, Clone, Copy)]
pub struct CarMaterials {
    pub paint: MaterialId,
    pub windshield: MaterialId,
    pub headlight_glass: MaterialId,
    pub indicator: MaterialId,
    pub rim: MaterialId,
    pub rubber: MaterialId,
    pub trim: MaterialId,
}

/// Small car-shaped graph using the asset's real node and material names.
pub fn car_graph() -> (SceneGraph, CarMaterials) {
    let mut graph = SceneGraph::new("car");
    let materials = CarMaterials {
        paint: graph.add_material(Material::new("rang_badane_mashin")),
        windshield: graph.add_material(Material::new("shishe")),
        headlight_glass: graph.add_material(Material::new("shishe_cheragh_jelo")),
        indicator: graph.add_material(Material::new("narenji")),
        rim: graph.add_material(Material::new("ring_felez")),
        rubber: graph.add_material(Material::new("lastic")),
        trim: graph.add_material(Material::new("plastic")),
    };
    let panel = Some(Aabb::new(Vec3::new(-200.0, 0.0, -450.0), Vec3::new(200.0, 140.0, 450.0)));
    let tire = Some(Aabb::new(Vec3::splat(-35.0), Vec3::splat(35.0)));

    let root = graph.root();
    let body = graph.add_node(root, "body_group");
    graph.add_mesh(body, "badane_mashin", vec![materials.paint], panel);
    graph.add_mesh(body, "Shishe_jelo", vec![materials.windshield], None);
    graph.add_mesh(body, "shise_cheragh_jelo", vec![materials.headlight_glass], None);
    graph.add_mesh(body, "cheragh_rahnama_jelo", vec![materials.indicator], None);
    let housing = graph.add_node(body, "Cheagh_jelo");
    graph.add_mesh(housing, "shishe", vec![materials.windshield], None);
    graph.add_mesh(body, "shishe_ghrmez", vec![materials.windshield], None);
    graph.add_mesh(body, "lastik_saghf", vec![materials.trim], None);
    graph.add_mesh(body, "seat", vec![materials.trim], None);

    for (name, tire_name, offset) in [
        ("WheelFL", "Lastik_FL", Vec3::new(-160.0, 35.0, 300.0)),
        ("WheelFR", "lastik_FR", Vec3::new(160.0, 35.0, 300.0)),
        ("WheelBL", "lastik_BL", Vec3::new(-160.0, 35.0, -300.0)),
        ("WheelBR", "lastik_BR", Vec3::new(160.0, 35.0, -300.0)),
    ] {
        let wheel = graph.add_node(root, name);
        graph.node_mut(wheel).transform.position = offset;
        graph.add_mesh(wheel, tire_name, vec![materials.rubber], tire);
        graph.add_mesh(wheel, "ring", vec![materials.rim], None);
    }

    (graph, materials)
}
