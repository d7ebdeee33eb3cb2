//! Document outline: the embedding tree of a diagram, for `wam inspect`.

use wam_core::{EntityId, SceneGraph};

/// One line of the outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub id: EntityId,
    /// Nesting level; top-level cells are 0.
    pub depth: usize,
    pub type_tag: &'static str,
    pub label: Option<String>,
    pub summary: String,
}

/// Embedding tree in paint order, parents before their children.
///
/// Links are listed at the depth of the tree they appear in, with their
/// endpoints in the summary.
pub fn compute_outline(scene: &SceneGraph) -> Vec<OutlineEntry> {
    let mut out = Vec::with_capacity(scene.len());
    for &id in scene.ids() {
        if scene.parent_of(id).is_none() {
            visit(scene, id, 0, &mut out);
        }
    }
    out
}

fn visit(scene: &SceneGraph, id: EntityId, depth: usize, out: &mut Vec<OutlineEntry>) {
    let Ok(entity) = scene.get(id) else {
        return;
    };
    let summary = match (entity.shape(), entity.link()) {
        (Some(shape), _) => {
            let b = shape.bounds();
            format!("{}x{} at ({}, {})", b.width, b.height, b.x, b.y)
        }
        (None, Some(link)) => {
            let end = |e: wam_core::LinkEnd| match e.entity() {
                Some(id) => id.to_string(),
                None => "point".to_string(),
            };
            format!("{} -> {}", end(link.source), end(link.target))
        }
        (None, None) => String::new(),
    };
    out.push(OutlineEntry {
        id,
        depth,
        type_tag: entity.type_tag(),
        label: entity.label().map(str::to_string),
        summary,
    });

    let mut children = scene.children_of(id);
    children.sort_by_key(|c| scene.z_index(*c));
    for child in children {
        visit(scene, child, depth + 1, out);
    }
}

/// Indented text rendering of an outline.
pub fn format_outline(entries: &[OutlineEntry]) -> String {
    let mut text = String::new();
    for entry in entries {
        let indent = "  ".repeat(entry.depth);
        let label = entry
            .label
            .as_deref()
            .map(|l| format!(" \"{l}\""))
            .unwrap_or_default();
        text.push_str(&format!(
            "{indent}{} {}{label}  {}\n",
            entry.type_tag, entry.id, entry.summary
        ));
    }
    text
}
