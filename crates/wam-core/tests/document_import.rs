//! Integration tests: JSON document → SceneGraph → JSON.
//!
//! Exercises import checks, embedding restored from `parent`, and the
//! cascade rules on a graph built from a fixture.

use pretty_assertions::assert_eq;
use wam_core::{
    Bounds, DiagramDocument, EntityId, ImportError, LinkEnd, Point, SceneError, SceneGraph,
    ShapeFactory, ShapeKind,
};

fn load(text: &str) -> SceneGraph {
    DiagramDocument::from_json(text).unwrap().to_scene().unwrap()
}

// ─── Import ──────────────────────────────────────────────────────────────

#[test]
fn fixture_restores_embedding_and_links() {
    let doc = DiagramDocument::from_json(include_str!("fixtures/realm_with_service.json")).unwrap();
    assert_eq!(doc.title, "Auth Landscape");

    let scene = doc.to_scene().unwrap();
    let realm = EntityId::intern("realm_main");
    let svc = EntityId::intern("svc_auth");
    let link = EntityId::intern("link_login");

    assert_eq!(scene.len(), 4);
    assert_eq!(scene.parent_of(svc), Some(realm));
    assert_eq!(scene.children_of(realm), vec![svc]);
    assert_eq!(
        scene.get(realm).unwrap().shape().unwrap().kind,
        ShapeKind::SecurityRealm
    );
    assert_eq!(scene.links_of(svc), vec![link]);
    assert_eq!(
        scene.get(link).unwrap().link().unwrap().source,
        LinkEnd::Entity(EntityId::intern("app_portal"))
    );
}

#[test]
fn enum_without_options_is_rejected() {
    let err = DiagramDocument::from_json(include_str!("fixtures/enum_without_options.json"))
        .unwrap_err();
    match err {
        ImportError::InvalidProperty { entity, key, .. } => {
            assert_eq!(entity.as_str(), "app_billing");
            assert_eq!(key, "owner");
        }
        other => panic!("expected InvalidProperty, got {other:?}"),
    }
}

#[test]
fn import_into_existing_graph_is_atomic() {
    let mut scene = load(include_str!("fixtures/realm_with_service.json"));
    let before = scene.serialize();

    // A child claiming a non-container parent.
    let bad = include_str!("fixtures/realm_with_service.json")
        .replace(r#""parent": "realm_main""#, r#""parent": "app_portal""#);
    let snapshot = serde_json::from_str::<DiagramDocument>(&bad).unwrap().snapshot;
    assert_eq!(
        scene.deserialize(&snapshot),
        Err(SceneError::NotContainer(EntityId::intern("app_portal")))
    );
    assert_eq!(scene.serialize(), before);
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn export_reimport_is_lossless() {
    let scene = load(include_str!("fixtures/realm_with_service.json"));
    let json = DiagramDocument::from_scene("Auth Landscape", &scene)
        .to_json()
        .unwrap();
    let again = load(&json);
    assert_eq!(again.serialize(), scene.serialize());
}

// ─── Cascade ─────────────────────────────────────────────────────────────

#[test]
fn deleting_realm_removes_child_and_its_links() {
    let mut scene = load(include_str!("fixtures/realm_with_service.json"));
    let removed = scene.remove_entities(&[EntityId::intern("realm_main")]);
    let names: Vec<&str> = removed.iter().map(EntityId::as_str).collect();
    assert_eq!(names, vec!["realm_main", "svc_auth", "link_login"]);
    assert_eq!(scene.ids(), &[EntityId::intern("app_portal")]);
}

#[test]
fn link_bounds_include_vertices() {
    let scene = load(include_str!("fixtures/realm_with_service.json"));
    // Portal center (760,120), vertex (400,120), service center (100,80).
    assert_eq!(
        scene.bounds_of(EntityId::intern("link_login")).unwrap(),
        Bounds::new(100.0, 80.0, 660.0, 40.0)
    );
}

#[test]
fn factory_nodes_survive_export() {
    let factory = ShapeFactory::default();
    let mut scene = SceneGraph::new();
    for kind in ShapeKind::ALL {
        let node = factory
            .create_node_at(kind.as_str(), Point::new(10.0, 10.0))
            .unwrap();
        scene.add_entity(node).unwrap();
    }
    let json = DiagramDocument::from_scene("All kinds", &scene)
        .to_json()
        .unwrap();
    assert_eq!(load(&json).serialize(), scene.serialize());
}
