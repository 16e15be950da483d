//! Tab registry
//!
//! Insertion-ordered list of open tabs. Order mirrors the tab strip, and
//! lookups are linear scans since a drop-down terminal rarely holds more
//! than a handful of tabs.

use thiserror::Error;

use tilda_ui::traits::TabId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TabError {
    #[error("{0} is not tracked by this window")]
    NotFound(TabId),

    #[error("No tab at position {0}")]
    NoSuchPosition(usize),
}

/// One open tab and the terminal session it owns
#[derive(Debug)]
pub struct TabEntry<S> {
    pub id: TabId,
    pub session: S,
}

/// Ordered list of tab entries
#[derive(Debug)]
pub struct TabRegistry<S> {
    tabs: Vec<TabEntry<S>>,
    next_id: u64,
}

impl<S> TabRegistry<S> {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            next_id: 1,
        }
    }

    /// The id the next `allocate_id` call will return
    pub fn peek_id(&self) -> TabId {
        TabId(self.next_id)
    }

    /// Reserve the id for a tab about to be created
    pub fn allocate_id(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append an entry; it becomes the last tab
    pub fn push(&mut self, id: TabId, session: S) {
        debug_assert!(self.position(id).is_none(), "duplicate {}", id);
        self.tabs.push(TabEntry { id, session });
    }

    /// Index of the entry for `id`
    pub fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn find(&self, id: TabId) -> Result<&TabEntry<S>, TabError> {
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .ok_or(TabError::NotFound(id))
    }

    /// Entry at a tab-strip position
    pub fn get(&self, index: usize) -> Result<&TabEntry<S>, TabError> {
        self.tabs.get(index).ok_or(TabError::NoSuchPosition(index))
    }

    /// Remove and return the entry for `id`
    pub fn remove(&mut self, id: TabId) -> Result<TabEntry<S>, TabError> {
        let index = self.position(id).ok_or(TabError::NotFound(id))?;
        Ok(self.tabs.remove(index))
    }

    /// Drop every entry, returning them in tab order
    pub fn drain(&mut self) -> Vec<TabEntry<S>> {
        std::mem::take(&mut self.tabs)
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

impl<S> Default for TabRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&'static str]) -> TabRegistry<&'static str> {
        let mut registry = TabRegistry::new();
        for name in names {
            let id = registry.allocate_id();
            registry.push(id, *name);
        }
        registry
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry: TabRegistry<()> = TabRegistry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_peek_does_not_reserve() {
        let mut registry: TabRegistry<()> = TabRegistry::new();
        let peeked = registry.peek_id();
        assert_eq!(registry.peek_id(), peeked);
        assert_eq!(registry.allocate_id(), peeked);
        assert_ne!(registry.peek_id(), peeked);
    }

    #[test]
    fn test_insertion_order() {
        let registry = registry_with(&["a", "b", "c"]);
        let sessions: Vec<_> = (0..3).map(|i| registry.get(i).unwrap().session).collect();
        assert_eq!(sessions, ["a", "b", "c"]);
    }

    #[test]
    fn test_remove_middle() {
        let mut registry = registry_with(&["a", "b", "c"]);
        let b = registry.get(1).unwrap().id;

        let removed = registry.remove(b).unwrap();
        assert_eq!(removed.session, "b");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().session, "c");
    }

    #[test]
    fn test_stale_id() {
        let mut registry = registry_with(&["a"]);
        let stale = TabId(99);
        assert_eq!(registry.find(stale).unwrap_err(), TabError::NotFound(stale));
        assert_eq!(registry.remove(stale).unwrap_err(), TabError::NotFound(stale));
        assert_eq!(registry.get(3).unwrap_err(), TabError::NoSuchPosition(3));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drain() {
        let mut registry = registry_with(&["a", "b"]);
        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }
}
