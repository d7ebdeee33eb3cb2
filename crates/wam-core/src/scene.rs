//! The scene graph: every entity of a diagram plus its embedding forest.
//!
//! Entities live in a `StableDiGraph`; the only graph edges are
//! parent → child embedding relations, so each node has at most one
//! incoming edge. Paint order is a separate `z_order` list (first = back).
//! Links are entities too: their endpoints reference shapes by id and are
//! not graph edges.

use crate::error::SceneError;
use crate::geometry::{Bounds, Point, Size};
use crate::id::EntityId;
use crate::model::{Attrs, Body, Entity, LinkBody, LinkEnd, merge_attrs};
use crate::property::CellData;
use crate::template::id_prefix;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Offset applied to duplicated entities.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Change notification queued by every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    Added(EntityId),
    Removed(EntityId),
    Changed(EntityId),
    /// Contents were replaced wholesale (`deserialize`, `clear`).
    Reset,
}

/// One entity in a serialized scene, with its embedding parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
}

/// Full serialized copy of a scene, cells in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub cells: Vec<CellRecord>,
}

impl SceneSnapshot {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    graph: StableDiGraph<Entity, ()>,
    id_index: HashMap<EntityId, NodeIndex>,
    z_order: Vec<EntityId>,
    events: Vec<GraphEvent>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a snapshot, checking every structural rule.
    ///
    /// # Errors
    /// Duplicate ids, links to missing or non-shape entities, self-loops and
    /// invalid embeddings are all rejected.
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Result<Self, SceneError> {
        let mut scene = Self::new();
        for cell in &snapshot.cells {
            scene.insert(cell.entity.clone())?;
        }
        for cell in &snapshot.cells {
            if let Some(link) = cell.entity.link() {
                scene.check_link_ends(cell.entity.id, link.source, link.target)?;
            }
        }
        for cell in &snapshot.cells {
            if let Some(parent) = cell.parent {
                scene.embed(parent, cell.entity.id)?;
            }
        }
        scene.events.clear();
        Ok(scene)
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Ids in paint order, back to front.
    pub fn ids(&self) -> &[EntityId] {
        &self.z_order
    }

    /// Entities in paint order, back to front.
    pub fn entities(&self) -> impl DoubleEndedIterator<Item = &Entity> + '_ {
        self.z_order
            .iter()
            .filter_map(|id| self.id_index.get(id).map(|idx| &self.graph[*idx]))
    }

    /// Position of `id` in paint order.
    pub fn z_index(&self, id: EntityId) -> Option<usize> {
        self.z_order.iter().position(|z| *z == id)
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.id_index
            .get(&id)
            .map(|idx| &self.graph[*idx])
            .ok_or(SceneError::NotFound(id))
    }

    /// Apply `f` to an entity, queueing `Changed` only if it succeeds.
    fn modify<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Entity) -> Result<R, SceneError>,
    ) -> Result<R, SceneError> {
        let idx = self.index_of(id)?;
        let out = f(&mut self.graph[idx])?;
        self.events.push(GraphEvent::Changed(id));
        Ok(out)
    }

    fn index_of(&self, id: EntityId) -> Result<NodeIndex, SceneError> {
        self.id_index
            .get(&id)
            .copied()
            .ok_or(SceneError::NotFound(id))
    }

    // ─── Add / remove ────────────────────────────────────────────────────

    /// Add an entity on top of the paint order.
    ///
    /// # Errors
    /// `DuplicateId` if the id is taken; for links, `NotFound`/`NotANode`
    /// for bad endpoints and `SelfLoop` when both ends are the same entity.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId, SceneError> {
        if self.contains(entity.id) {
            return Err(SceneError::DuplicateId(entity.id));
        }
        if let Some(link) = entity.link() {
            self.check_link_ends(entity.id, link.source, link.target)?;
        }
        self.insert(entity)
    }

    fn insert(&mut self, entity: Entity) -> Result<EntityId, SceneError> {
        let id = entity.id;
        if self.contains(id) {
            return Err(SceneError::DuplicateId(id));
        }
        let idx = self.graph.add_node(entity);
        self.id_index.insert(id, idx);
        self.z_order.push(id);
        self.events.push(GraphEvent::Added(id));
        Ok(id)
    }

    fn check_link_ends(
        &self,
        link: EntityId,
        source: LinkEnd,
        target: LinkEnd,
    ) -> Result<(), SceneError> {
        for end in [source, target].iter().filter_map(LinkEnd::entity) {
            if !self.get(end)?.is_shape() {
                return Err(SceneError::NotANode(end));
            }
        }
        if let (Some(s), Some(t)) = (source.entity(), target.entity())
            && s == t
        {
            return Err(SceneError::SelfLoop(link));
        }
        Ok(())
    }

    /// Remove entities together with their embedded descendants and every
    /// link attached to a removed shape. Unknown ids are skipped.
    ///
    /// Returns the removed ids in paint order.
    pub fn remove_entities(&mut self, ids: &[EntityId]) -> Vec<EntityId> {
        let mut doomed: HashSet<EntityId> = HashSet::new();
        for &id in ids {
            if !self.contains(id) {
                log::debug!("remove_entities: skipping unknown {id}");
                continue;
            }
            doomed.insert(id);
            doomed.extend(self.descendants(id));
        }
        let dangling: Vec<EntityId> = self
            .entities()
            .filter_map(|e| {
                let link = e.link()?;
                let hits = [link.source, link.target]
                    .iter()
                    .filter_map(LinkEnd::entity)
                    .any(|end| doomed.contains(&end));
                hits.then_some(e.id)
            })
            .collect();
        doomed.extend(dangling);

        let removed: Vec<EntityId> = self
            .z_order
            .iter()
            .copied()
            .filter(|id| doomed.contains(id))
            .collect();
        for id in &removed {
            if let Some(idx) = self.id_index.remove(id) {
                self.graph.remove_node(idx);
            }
            self.events.push(GraphEvent::Removed(*id));
        }
        self.z_order.retain(|id| !doomed.contains(id));
        removed
    }

    /// Remove one entity (with cascade).
    ///
    /// # Errors
    /// `NotFound` when the id is absent.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Vec<EntityId>, SceneError> {
        self.index_of(id)?;
        Ok(self.remove_entities(&[id]))
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.id_index.clear();
        self.z_order.clear();
        self.events.push(GraphEvent::Reset);
    }

    /// Copy an entity under a fresh id, offset by `DUPLICATE_OFFSET`.
    /// Embedded children are not copied; a duplicated shape keeps its parent.
    pub fn duplicate(&mut self, id: EntityId) -> Result<EntityId, SceneError> {
        let mut copy = self.get(id)?.clone();
        copy.id = EntityId::with_prefix(&id_prefix(copy.type_tag()));
        match &mut copy.body {
            Body::Shape(s) => {
                s.position = s.position.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
            }
            Body::Link(l) => l.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET),
        }
        let parent = self.parent_of(id);
        let new_id = self.insert(copy)?;
        if let Some(parent) = parent {
            self.embed(parent, new_id)?;
        }
        Ok(new_id)
    }

    // ─── Paint order ─────────────────────────────────────────────────────

    /// Move to the top of the paint order. Returns true if the order changed.
    pub fn reorder_to_front(&mut self, id: EntityId) -> Result<bool, SceneError> {
        let pos = self.z_index(id).ok_or(SceneError::NotFound(id))?;
        if pos + 1 == self.z_order.len() {
            return Ok(false);
        }
        let id = self.z_order.remove(pos);
        self.z_order.push(id);
        self.events.push(GraphEvent::Changed(id));
        Ok(true)
    }

    /// Move to the bottom of the paint order. Returns true if the order changed.
    pub fn reorder_to_back(&mut self, id: EntityId) -> Result<bool, SceneError> {
        let pos = self.z_index(id).ok_or(SceneError::NotFound(id))?;
        if pos == 0 {
            return Ok(false);
        }
        let id = self.z_order.remove(pos);
        self.z_order.insert(0, id);
        self.events.push(GraphEvent::Changed(id));
        Ok(true)
    }

    // ─── Serialization ───────────────────────────────────────────────────

    pub fn serialize(&self) -> SceneSnapshot {
        SceneSnapshot {
            cells: self
                .entities()
                .map(|e| CellRecord {
                    entity: e.clone(),
                    parent: self.parent_of(e.id),
                })
                .collect(),
        }
    }

    /// Replace all contents with `snapshot`. On error the graph is untouched.
    pub fn deserialize(&mut self, snapshot: &SceneSnapshot) -> Result<(), SceneError> {
        let fresh = Self::from_snapshot(snapshot)?;
        let mut events = std::mem::take(&mut self.events);
        *self = fresh;
        events.push(GraphEvent::Reset);
        self.events = events;
        Ok(())
    }

    // ─── Embedding ───────────────────────────────────────────────────────

    /// Make `child` an embedded child of `parent`, replacing any previous
    /// parent.
    ///
    /// # Errors
    /// `NotFound`, `NotANode` (links never embed), `SelfEmbed`,
    /// `NotContainer`, or `WouldCycle` when `parent` descends from `child`.
    pub fn embed(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        let p_idx = self.index_of(parent)?;
        let c_idx = self.index_of(child)?;
        if parent == child {
            return Err(SceneError::SelfEmbed(child));
        }
        for id in [parent, child] {
            if !self.get(id)?.is_shape() {
                return Err(SceneError::NotANode(id));
            }
        }
        if !self.graph[p_idx].is_container() {
            return Err(SceneError::NotContainer(parent));
        }
        if self.is_ancestor_of(child, parent) {
            return Err(SceneError::WouldCycle { parent, child });
        }
        if self.parent_of(child) == Some(parent) {
            return Ok(());
        }
        self.detach(c_idx);
        self.graph.add_edge(p_idx, c_idx, ());
        self.events.push(GraphEvent::Changed(child));
        Ok(())
    }

    /// Detach `child` from its parent. Returns false if it had none.
    pub fn unembed(&mut self, child: EntityId) -> Result<bool, SceneError> {
        let c_idx = self.index_of(child)?;
        let detached = self.detach(c_idx);
        if detached {
            self.events.push(GraphEvent::Changed(child));
        }
        Ok(detached)
    }

    fn detach(&mut self, c_idx: NodeIndex) -> bool {
        let incoming: Vec<_> = self
            .graph
            .edges_directed(c_idx, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        let any = !incoming.is_empty();
        for edge in incoming {
            self.graph.remove_edge(edge);
        }
        any
    }

    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        let idx = self.id_index.get(&id)?;
        self.graph
            .neighbors_directed(*idx, Direction::Incoming)
            .next()
            .map(|p| self.graph[p].id)
    }

    /// Direct children, in paint order.
    pub fn children_of(&self, id: EntityId) -> Vec<EntityId> {
        let Some(idx) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let children: HashSet<EntityId> = self
            .graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .map(|c| self.graph[c].id)
            .collect();
        self.z_order
            .iter()
            .copied()
            .filter(|z| children.contains(z))
            .collect()
    }

    /// All transitive children, depth first.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = self.children_of(id);
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(next));
        }
        out
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: EntityId, descendant: EntityId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Scene-space anchor of a link end: a shape's center or a pinned point.
    pub fn end_point(&self, end: LinkEnd) -> Option<Point> {
        match end {
            LinkEnd::Point(p) => Some(p),
            LinkEnd::Entity(id) => self.get(id).ok()?.shape().map(|s| s.bounds().center()),
        }
    }

    /// Resolved polyline of a link: source, vertices, target.
    pub fn link_points(&self, id: EntityId) -> Result<Vec<Point>, SceneError> {
        let link = self.get(id)?.link().ok_or(SceneError::NotALink(id))?;
        let mut points = Vec::with_capacity(link.vertices.len() + 2);
        points.extend(self.end_point(link.source));
        points.extend(link.vertices.iter().copied());
        points.extend(self.end_point(link.target));
        Ok(points)
    }

    /// Axis-aligned box of an entity. For links, the box of the resolved
    /// polyline.
    pub fn bounds_of(&self, id: EntityId) -> Result<Bounds, SceneError> {
        match &self.get(id)?.body {
            Body::Shape(s) => Ok(s.bounds()),
            Body::Link(_) => Ok(Bounds::from_points(self.link_points(id)?).unwrap_or_default()),
        }
    }

    /// Links with at least one end on `id`.
    pub fn links_of(&self, id: EntityId) -> Vec<EntityId> {
        self.entities()
            .filter(|e| {
                e.link().is_some_and(|l| {
                    l.source.entity() == Some(id) || l.target.entity() == Some(id)
                })
            })
            .map(|e| e.id)
            .collect()
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    pub fn set_position(&mut self, id: EntityId, position: Point) -> Result<(), SceneError> {
        self.modify(id, |e| {
            let shape = e.shape_mut().ok_or(SceneError::NotANode(id))?;
            shape.position = position;
            Ok(())
        })
    }

    pub fn resize(&mut self, id: EntityId, position: Point, size: Size) -> Result<(), SceneError> {
        self.modify(id, |e| {
            let shape = e.shape_mut().ok_or(SceneError::NotANode(id))?;
            shape.position = position;
            shape.size = size;
            Ok(())
        })
    }

    /// Move a shape's position, or a link's vertices and pinned ends.
    pub fn translate(&mut self, id: EntityId, dx: f64, dy: f64) -> Result<(), SceneError> {
        self.modify(id, |e| {
            match &mut e.body {
                Body::Shape(s) => s.position = s.position.translate(dx, dy),
                Body::Link(l) => l.translate(dx, dy),
            }
            Ok(())
        })
    }

    /// Copy `path`'s vertices and pinned end points onto link `id`.
    ///
    /// Ends attached to an entity are kept as they are.
    pub fn set_link_path(&mut self, id: EntityId, path: &LinkBody) -> Result<(), SceneError> {
        self.modify(id, |e| {
            let link = e.link_mut().ok_or(SceneError::NotALink(id))?;
            link.vertices = path.vertices.clone();
            for (end, new) in [(&mut link.source, path.source), (&mut link.target, path.target)] {
                if let (LinkEnd::Point(p), LinkEnd::Point(q)) = (end, new) {
                    *p = q;
                }
            }
            Ok(())
        })
    }

    /// Replace an entity's data record. The property key set may not change.
    pub fn set_data(&mut self, id: EntityId, data: CellData) -> Result<(), SceneError> {
        self.modify(id, |e| {
            if !e.data.same_keys(&data) {
                return Err(SceneError::PropsKeysChanged(id));
            }
            e.data = data;
            Ok(())
        })
    }

    /// Overwrite presentation attributes present in `attrs`.
    pub fn merge_attrs(&mut self, id: EntityId, attrs: &Attrs) -> Result<(), SceneError> {
        self.modify(id, |e| {
            merge_attrs(&mut e.attrs, attrs);
            Ok(())
        })
    }

    // ─── Notifications ───────────────────────────────────────────────────

    /// Pending change notifications, oldest first.
    pub fn pending_events(&self) -> &[GraphEvent] {
        &self.events
    }

    /// Take every pending notification.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ShapeFactory;
    use pretty_assertions::assert_eq;

    fn node(factory: &ShapeFactory, tag: &str, x: f64, y: f64) -> Entity {
        factory.create_node_at(tag, Point::new(x, y)).unwrap()
    }

    #[test]
    fn add_get_and_duplicate_ids() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let a = node(&factory, "Service", 0.0, 0.0);
        let id = scene.add_entity(a.clone()).unwrap();
        assert_eq!(scene.get(id).unwrap(), &a);
        assert_eq!(scene.add_entity(a), Err(SceneError::DuplicateId(id)));
        assert_eq!(scene.drain_events(), vec![GraphEvent::Added(id)]);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut scene = SceneGraph::new();
        let ghost = EntityId::intern("scene_ghost");
        assert_eq!(scene.get(ghost), Err(SceneError::NotFound(ghost)));
        assert_eq!(scene.reorder_to_front(ghost), Err(SceneError::NotFound(ghost)));
        assert!(scene.remove_entities(&[ghost]).is_empty());
    }

    #[test]
    fn embed_rules() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let realm = scene.add_entity(node(&factory, "SecurityRealm", 0.0, 0.0)).unwrap();
        let inner = scene.add_entity(node(&factory, "SecurityRealm", 10.0, 10.0)).unwrap();
        let svc = scene.add_entity(node(&factory, "Service", 20.0, 20.0)).unwrap();

        assert_eq!(scene.embed(svc, realm), Err(SceneError::NotContainer(svc)));
        assert_eq!(scene.embed(realm, realm), Err(SceneError::SelfEmbed(realm)));

        scene.embed(realm, inner).unwrap();
        scene.embed(inner, svc).unwrap();
        assert_eq!(
            scene.embed(inner, realm),
            Err(SceneError::WouldCycle {
                parent: inner,
                child: realm
            })
        );
        assert!(scene.is_ancestor_of(realm, svc));
        assert_eq!(scene.parent_of(svc), Some(inner));

        // Re-embedding moves the child rather than adding a second parent.
        scene.embed(realm, svc).unwrap();
        assert_eq!(scene.parent_of(svc), Some(realm));
        assert_eq!(scene.children_of(realm), vec![inner, svc]);
        assert!(scene.unembed(svc).unwrap());
        assert!(!scene.unembed(svc).unwrap());
    }

    #[test]
    fn remove_cascades_to_children_and_links() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let realm = scene.add_entity(node(&factory, "SecurityRealm", 0.0, 0.0)).unwrap();
        let child = scene.add_entity(node(&factory, "Service", 10.0, 10.0)).unwrap();
        let other = scene.add_entity(node(&factory, "Application", 300.0, 0.0)).unwrap();
        scene.embed(realm, child).unwrap();
        let link = factory
            .create_edge_between("Invocation", LinkEnd::Entity(other), LinkEnd::Entity(child))
            .unwrap();
        let link = scene.add_entity(link).unwrap();

        let removed = scene.remove_entities(&[realm]);
        assert_eq!(removed, vec![realm, child, link]);
        assert_eq!(scene.ids(), &[other]);
    }

    #[test]
    fn links_reject_self_loops_and_missing_ends() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let a = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();
        let looped = factory
            .create_edge_between("Invocation", LinkEnd::Entity(a), LinkEnd::Entity(a))
            .unwrap();
        let looped_id = looped.id;
        assert_eq!(scene.add_entity(looped), Err(SceneError::SelfLoop(looped_id)));

        let ghost = EntityId::intern("scene_missing_end");
        let dangling = factory
            .create_edge_between("Invocation", LinkEnd::Entity(a), LinkEnd::Entity(ghost))
            .unwrap();
        assert_eq!(scene.add_entity(dangling), Err(SceneError::NotFound(ghost)));
    }

    #[test]
    fn reorder_front_and_back() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let a = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();
        let b = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();
        let c = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();

        assert!(scene.reorder_to_back(c).unwrap());
        assert_eq!(scene.ids(), &[c, a, b]);
        assert!(scene.reorder_to_front(c).unwrap());
        assert_eq!(scene.ids(), &[a, b, c]);
        assert!(!scene.reorder_to_front(c).unwrap());
    }

    #[test]
    fn serialize_roundtrip_keeps_order_and_parents() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let realm = scene.add_entity(node(&factory, "SecurityRealm", 0.0, 0.0)).unwrap();
        let svc = scene.add_entity(node(&factory, "Service", 10.0, 10.0)).unwrap();
        scene.embed(realm, svc).unwrap();
        let snap = scene.serialize();

        let mut other = SceneGraph::new();
        other.add_entity(node(&factory, "Application", 0.0, 0.0)).unwrap();
        other.deserialize(&snap).unwrap();
        assert_eq!(other.serialize(), snap);
        assert_eq!(other.parent_of(svc), Some(realm));
        assert_eq!(other.drain_events().last(), Some(&GraphEvent::Reset));
    }

    #[test]
    fn failed_deserialize_leaves_graph_untouched() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let keep = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();
        let before = scene.serialize();

        let a = node(&factory, "Service", 0.0, 0.0);
        let bad = SceneSnapshot {
            cells: vec![
                CellRecord {
                    entity: a.clone(),
                    parent: None,
                },
                CellRecord {
                    entity: a,
                    parent: None,
                },
            ],
        };
        assert!(scene.deserialize(&bad).is_err());
        assert_eq!(scene.serialize(), before);
        assert!(scene.contains(keep));
    }

    #[test]
    fn duplicate_offsets_and_keeps_parent() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let realm = scene.add_entity(node(&factory, "SecurityRealm", 0.0, 0.0)).unwrap();
        let svc = scene.add_entity(node(&factory, "Service", 10.0, 10.0)).unwrap();
        scene.embed(realm, svc).unwrap();

        let copy = scene.duplicate(svc).unwrap();
        assert_ne!(copy, svc);
        assert_eq!(
            scene.get(copy).unwrap().shape().unwrap().position,
            Point::new(30.0, 30.0)
        );
        assert_eq!(scene.parent_of(copy), Some(realm));

        let realm_copy = scene.duplicate(realm).unwrap();
        assert!(scene.children_of(realm_copy).is_empty());
    }

    #[test]
    fn set_data_keeps_key_set() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let svc = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();

        let mut data = scene.get(svc).unwrap().data.clone();
        data.name = "Billing".into();
        scene.set_data(svc, data.clone()).unwrap();
        assert_eq!(scene.get(svc).unwrap().data.name, "Billing");

        data.props.remove("port");
        assert_eq!(scene.set_data(svc, data), Err(SceneError::PropsKeysChanged(svc)));
    }

    #[test]
    fn link_bounds_follow_endpoints() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let a = scene.add_entity(node(&factory, "Service", 0.0, 0.0)).unwrap();
        let link = factory
            .create_edge_between(
                "LegacyRelationship",
                LinkEnd::Entity(a),
                LinkEnd::Point(Point::new(300.0, 200.0)),
            )
            .unwrap();
        let link = scene.add_entity(link).unwrap();
        // Service is 120×80, so its center is (60, 40).
        assert_eq!(
            scene.bounds_of(link).unwrap(),
            Bounds::new(60.0, 40.0, 240.0, 160.0)
        );
        assert_eq!(scene.links_of(a), vec![link]);
        assert_eq!(scene.resize(link, Point::ZERO, Size::default()), Err(SceneError::NotANode(link)));
    }
}
