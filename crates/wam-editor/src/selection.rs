//! The current selection and its change observers.
//!
//! Membership is set-like but order is kept: the last id is the most
//! recently selected entity, which is where tool affordances attach.
//! Observers run synchronously after every change with the before/after
//! ids.

use std::fmt;
use wam_core::EntityId;

/// Payload handed to selection observers.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub before: Vec<EntityId>,
    pub after: Vec<EntityId>,
}

impl SelectionChange {
    pub fn added(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.after.iter().copied().filter(|id| !self.before.contains(id))
    }

    pub fn removed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.before.iter().copied().filter(|id| !self.after.contains(id))
    }
}

/// Handle returned by `on_selection_changed`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&SelectionChange)>;

#[derive(Default)]
pub struct Selection {
    ids: Vec<EntityId>,
    listeners: Vec<(Subscription, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("ids", &self.ids)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    /// Most recently selected id.
    pub fn last(&self) -> Option<EntityId> {
        self.ids.last().copied()
    }

    /// True when `other` holds exactly the same ids, in any order.
    pub fn same_members(&self, other: &[EntityId]) -> bool {
        self.ids.len() == other.len() && other.iter().all(|id| self.ids.contains(id))
    }

    /// Register an observer. It fires after every change until unsubscribed.
    pub fn on_selection_changed(
        &mut self,
        listener: impl FnMut(&SelectionChange) + 'static,
    ) -> Subscription {
        let sub = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((sub, Box::new(listener)));
        sub
    }

    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != sub);
        self.listeners.len() != before
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Replace the whole selection. Duplicates are dropped, first wins.
    pub fn set(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        let mut next: Vec<EntityId> = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        self.replace(next);
    }

    /// Select `id` on top of the current selection (moving it to last).
    pub fn add(&mut self, id: EntityId) {
        let mut next: Vec<EntityId> = self.ids.iter().copied().filter(|i| *i != id).collect();
        next.push(id);
        self.replace(next);
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: EntityId) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.add(id);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.retain(|i| i != id);
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Keep only ids for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        let next: Vec<EntityId> = self.ids.iter().copied().filter(|id| keep(*id)).collect();
        self.replace(next);
    }

    fn replace(&mut self, next: Vec<EntityId>) {
        if next == self.ids {
            return;
        }
        let before = std::mem::replace(&mut self.ids, next);
        let change = SelectionChange {
            before,
            after: self.ids.clone(),
        };
        log::debug!(
            "selection {} -> {} ids",
            change.before.len(),
            change.after.len()
        );
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids(names: &[&str]) -> Vec<EntityId> {
        names.iter().map(|n| EntityId::intern(n)).collect()
    }

    #[test]
    fn set_dedups_and_keeps_order() {
        let mut sel = Selection::new();
        sel.set(ids(&["a", "b", "a", "c"]));
        assert_eq!(sel.ids(), ids(&["a", "b", "c"]).as_slice());
        assert_eq!(sel.last(), Some(EntityId::intern("c")));
    }

    #[test]
    fn add_moves_to_last() {
        let mut sel = Selection::new();
        sel.set(ids(&["a", "b"]));
        sel.add(EntityId::intern("a"));
        assert_eq!(sel.ids(), ids(&["b", "a"]).as_slice());
        assert!(sel.same_members(&ids(&["a", "b"])));
    }

    #[test]
    fn observers_get_before_and_after() {
        let seen: Rc<RefCell<Vec<SelectionChange>>> = Rc::default();
        let mut sel = Selection::new();
        let sink = seen.clone();
        let sub = sel.on_selection_changed(move |c| sink.borrow_mut().push(c.clone()));

        sel.set(ids(&["a", "b"]));
        sel.remove(EntityId::intern("a"));
        // No-op changes are not reported.
        sel.remove(EntityId::intern("zz"));

        let log = seen.borrow().clone();
        assert_eq!(log.len(), 2);
        assert!(log[0].before.is_empty());
        assert_eq!(log[0].after, ids(&["a", "b"]));
        assert_eq!(log[1].removed().collect::<Vec<_>>(), ids(&["a"]));

        assert!(sel.unsubscribe(sub));
        sel.clear();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn toggle() {
        let mut sel = Selection::new();
        sel.toggle(EntityId::intern("a"));
        sel.toggle(EntityId::intern("b"));
        sel.toggle(EntityId::intern("a"));
        assert_eq!(sel.ids(), ids(&["b"]).as_slice());
    }
}
