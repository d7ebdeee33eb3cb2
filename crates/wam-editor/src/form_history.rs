//! Per-entity undo/redo of property edits.
//!
//! Independent of the graph history: each entity has its own bounded past
//! and future of `CellData` states.

use std::collections::HashMap;
use wam_core::{CellData, EntityId};

#[derive(Debug, Default)]
struct FieldStack {
    past: Vec<CellData>,
    future: Vec<CellData>,
    after_undo: bool,
}

#[derive(Debug)]
pub struct FormHistory {
    stacks: HashMap<EntityId, FieldStack>,
    limit: usize,
}

impl FormHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            stacks: HashMap::new(),
            limit,
        }
    }

    /// Record `state` for `id`.
    ///
    /// A state equal to the most recent one is dropped. A push that follows
    /// an undo starts a fresh branch: the past collected so far is discarded.
    pub fn push(&mut self, id: EntityId, state: &CellData) {
        let stack = self.stacks.entry(id).or_default();
        if stack.past.last() == Some(state) {
            return;
        }
        stack.past.push(state.clone());
        if stack.past.len() > self.limit {
            stack.past.remove(0);
        }
        stack.future.clear();
        if stack.after_undo {
            stack.past.clear();
            stack.after_undo = false;
        }
    }

    /// Previous state for `id`, stashing `current` for redo.
    pub fn undo(&mut self, id: EntityId, current: &CellData) -> Option<CellData> {
        let stack = self.stacks.get_mut(&id)?;
        let prev = stack.past.pop()?;
        stack.future.push(current.clone());
        stack.after_undo = true;
        Some(prev)
    }

    /// Next state for `id`, stashing `current` for undo.
    pub fn redo(&mut self, id: EntityId, current: &CellData) -> Option<CellData> {
        let stack = self.stacks.get_mut(&id)?;
        let next = stack.future.pop()?;
        stack.past.push(current.clone());
        stack.after_undo = false;
        Some(next)
    }

    pub fn can_undo(&self, id: EntityId) -> bool {
        self.stacks.get(&id).is_some_and(|s| !s.past.is_empty())
    }

    pub fn can_redo(&self, id: EntityId) -> bool {
        self.stacks.get(&id).is_some_and(|s| !s.future.is_empty())
    }

    pub fn past_len(&self, id: EntityId) -> usize {
        self.stacks.get(&id).map_or(0, |s| s.past.len())
    }

    /// Forget the history of entities that are gone.
    pub fn clear(&mut self, ids: &[EntityId]) {
        for id in ids {
            self.stacks.remove(id);
        }
    }

    /// Keep only the histories of entities for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        self.stacks.retain(|id, _| keep(*id));
    }

    pub fn clear_all(&mut self) {
        self.stacks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wam_core::PropertyDescriptor;

    fn data(port: f64) -> CellData {
        CellData::new("Service", "Service", "urn:wam:service")
            .with_prop("port", PropertyDescriptor::number("Port", port))
    }

    #[test]
    fn equal_pushes_are_deduplicated() {
        let id = EntityId::intern("svc_form_dedup");
        let mut history = FormHistory::new(20);
        history.push(id, &data(80.0));
        history.push(id, &data(80.0));
        assert_eq!(history.past_len(id), 1);
        history.push(id, &data(443.0));
        assert_eq!(history.past_len(id), 2);
    }

    #[test]
    fn undo_redo_walk() {
        let id = EntityId::intern("svc_form_walk");
        let mut history = FormHistory::new(20);
        history.push(id, &data(80.0));
        let prev = history.undo(id, &data(443.0)).unwrap();
        assert_eq!(prev, data(80.0));
        assert!(history.can_redo(id));
        let next = history.redo(id, &prev).unwrap();
        assert_eq!(next, data(443.0));
        assert!(history.can_undo(id));
    }

    #[test]
    fn edit_after_undo_starts_fresh_branch() {
        let id = EntityId::intern("svc_form_branch");
        let mut history = FormHistory::new(20);
        history.push(id, &data(1.0));
        history.push(id, &data(2.0));
        history.undo(id, &data(3.0)).unwrap();
        history.push(id, &data(9.0));
        assert!(!history.can_undo(id));
        assert!(!history.can_redo(id));
    }

    #[test]
    fn bounded_and_independent() {
        let a = EntityId::intern("svc_form_a");
        let b = EntityId::intern("svc_form_b");
        let mut history = FormHistory::new(3);
        for i in 0..10 {
            history.push(a, &data(f64::from(i)));
        }
        assert_eq!(history.past_len(a), 3);
        assert_eq!(history.past_len(b), 0);
        assert_eq!(history.undo(b, &data(0.0)), None);
        history.clear(&[a]);
        assert!(!history.can_undo(a));
    }
}
