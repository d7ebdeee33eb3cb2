//! Graph-level undo/redo.
//!
//! Each step is a full `SceneSnapshot` taken *before* a user mutation.
//! Undo and redo swap whole snapshots in and out of the graph; the replay
//! runs with recording suspended so it never lands on the stacks itself.

use wam_core::{SceneError, SceneGraph, SceneSnapshot};

pub struct GraphHistory {
    undo_stack: Vec<SceneSnapshot>,
    redo_stack: Vec<SceneSnapshot>,
    max_depth: usize,
    suspended: bool,
}

impl std::fmt::Debug for GraphHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHistory")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("suspended", &self.suspended)
            .finish()
    }
}

impl GraphHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            suspended: false,
        }
    }

    /// Record `state` as the step to return to. Clears redo.
    ///
    /// Ignored while suspended. Returns whether a step was recorded.
    pub fn snapshot(&mut self, state: SceneSnapshot) -> bool {
        if self.suspended {
            return false;
        }
        self.redo_stack.clear();
        self.undo_stack.push(state);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        true
    }

    /// Run `f` with recording suspended, restoring the previous flag after.
    pub fn with_suspended<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.suspended;
        self.suspended = true;
        let out = f(self);
        self.suspended = prev;
        out
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Step back. Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, graph: &mut SceneGraph) -> Result<bool, SceneError> {
        let Some(prev) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let current = graph.serialize();
        match self.replay(graph, &prev) {
            Ok(()) => {
                self.redo_stack.push(current);
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push(prev);
                Err(e)
            }
        }
    }

    /// Step forward again. Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, graph: &mut SceneGraph) -> Result<bool, SceneError> {
        let Some(next) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let current = graph.serialize();
        match self.replay(graph, &next) {
            Ok(()) => {
                self.undo_stack.push(current);
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(next);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn replay(&mut self, graph: &mut SceneGraph, state: &SceneSnapshot) -> Result<(), SceneError> {
        self.with_suspended(|_| graph.deserialize(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wam_core::{Point, ShapeFactory};

    fn add_service(graph: &mut SceneGraph, x: f64) {
        let node = ShapeFactory::default()
            .create_node_at("Service", Point::new(x, 0.0))
            .unwrap();
        graph.add_entity(node).unwrap();
    }

    #[test]
    fn undo_restores_exact_snapshot() {
        let mut graph = SceneGraph::new();
        let mut history = GraphHistory::new(50);
        let mut states = Vec::new();
        for i in 0..3 {
            states.push(graph.serialize());
            history.snapshot(graph.serialize());
            add_service(&mut graph, f64::from(i) * 150.0);
        }
        for expected in states.iter().rev() {
            assert!(history.can_undo());
            assert!(history.undo(&mut graph).unwrap());
            assert_eq!(&graph.serialize(), expected);
        }
        assert!(!history.can_undo());
        assert!(!history.undo(&mut graph).unwrap());
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let mut graph = SceneGraph::new();
        let mut history = GraphHistory::new(50);
        history.snapshot(graph.serialize());
        add_service(&mut graph, 0.0);
        let after = graph.serialize();

        history.undo(&mut graph).unwrap();
        assert!(history.can_redo());
        history.redo(&mut graph).unwrap();
        assert_eq!(graph.serialize(), after);
        assert!(!history.can_redo());
    }

    #[test]
    fn new_snapshot_clears_redo() {
        let mut graph = SceneGraph::new();
        let mut history = GraphHistory::new(50);
        history.snapshot(graph.serialize());
        add_service(&mut graph, 0.0);
        history.undo(&mut graph).unwrap();
        assert!(history.can_redo());
        history.snapshot(graph.serialize());
        assert!(!history.can_redo());
    }

    #[test]
    fn bounded_depth_evicts_oldest() {
        let mut graph = SceneGraph::new();
        let mut history = GraphHistory::new(2);
        for i in 0..4 {
            history.snapshot(graph.serialize());
            add_service(&mut graph, f64::from(i) * 150.0);
        }
        assert_eq!(history.undo_len(), 2);
        history.undo(&mut graph).unwrap();
        history.undo(&mut graph).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(!history.can_undo());
    }

    #[test]
    fn suspended_snapshots_are_ignored() {
        let graph = SceneGraph::new();
        let mut history = GraphHistory::new(50);
        let recorded = history.with_suspended(|h| h.snapshot(graph.serialize()));
        assert!(!recorded);
        assert!(!history.is_suspended());
        assert!(!history.can_undo());
    }
}
