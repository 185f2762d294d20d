use crate::scene::SceneGraph;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(serde::Serialize)]
struct NodeEntry<'a> {
    name: &'a str,
    materials: Vec<&'a str>,
    render_order: i32,
    cast_shadow: bool,
    receive_shadow: bool,
}

#[derive(serde::Serialize)]
struct MaterialReport<'a> {
    nodes: Vec<NodeEntry<'a>>,
    materials: Vec<crate::scene::MaterialSnapshot>,
}

pub fn material_report_json(graph: &SceneGraph) -> Result<String> {
    let nodes = graph
        .traverse(graph.root())
        .into_iter()
        .map(|id| graph.node(id))
        .filter(|node| node.is_mesh)
        .map(|node| NodeEntry {
            name: node.name.as_str(),
            materials: node
                .materials
                .iter()
                .map(|material| graph.material(*material).name.as_str())
                .collect(),
            render_order: node.render_order,
            cast_shadow: node.cast_shadow,
            receive_shadow: node.receive_shadow,
        })
        .collect();
    let report = MaterialReport {
        nodes,
        materials: graph.material_snapshot(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn save_material_report(graph: &SceneGraph, path: &Path) -> Result<()> {
    let json = material_report_json(graph)?;
    std::fs::write(path, json)?;
    Ok(())
}
