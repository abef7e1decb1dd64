//! In-memory storage used by the `memory` backend and by tests.
//!
//! Each store keeps insertion order and counts successful writes, which is how
//! the reconciliation tests check that a second identical pass writes nothing.

use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::shared::error::{ManagementError, Result};

/// Entities addressable by a string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

pub struct InMemoryStore<T> {
    entity_type: &'static str,
    items: RwLock<IndexMap<String, T>>,
    writes: AtomicUsize,
}

impl<T: Keyed + Clone> InMemoryStore<T> {
    pub fn new(entity_type: &'static str) -> Self {
        Self {
            entity_type,
            items: RwLock::new(IndexMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.items.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.read().contains_key(id)
    }

    pub fn find<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items
            .read()
            .values()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    pub fn find_one<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.read().values().find(|item| predicate(item)).cloned()
    }

    pub fn insert(&self, item: T) -> Result<()> {
        let mut items = self.items.write();
        if items.contains_key(item.key()) {
            return Err(ManagementError::duplicate(self.entity_type, item.key()));
        }
        items.insert(item.key().to_string(), item);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn replace(&self, item: T) -> Result<()> {
        let mut items = self.items.write();
        match items.get_mut(item.key()) {
            Some(slot) => {
                *slot = item;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(ManagementError::not_found(self.entity_type, item.key())),
        }
    }

    pub fn upsert(&self, item: T) {
        self.items.write().insert(item.key().to_string(), item);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.items.write().shift_remove(id).is_some();
        if removed {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    /// Remove every matching item, returning how many went away.
    pub fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, item| !predicate(item));
        let removed = before - items.len();
        if removed > 0 {
            self.writes.fetch_add(removed, Ordering::SeqCst);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Successful inserts, replaces and removals since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        value: u32,
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, value: u32) -> Item {
        Item { id: id.to_string(), value }
    }

    #[test]
    fn test_insert_and_duplicate() {
        let store = InMemoryStore::new("Item");
        store.insert(item("a", 1)).unwrap();
        let err = store.insert(item("a", 2)).unwrap_err();
        assert!(matches!(err, ManagementError::Duplicate { .. }));
        assert_eq!(store.get("a").unwrap().value, 1);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_replace_missing_is_not_found() {
        let store: InMemoryStore<Item> = InMemoryStore::new("Item");
        assert!(matches!(
            store.replace(item("x", 1)),
            Err(ManagementError::NotFound { .. })
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_remove_where_counts_writes() {
        let store = InMemoryStore::new("Item");
        store.insert(item("a", 1)).unwrap();
        store.insert(item("b", 2)).unwrap();
        store.insert(item("c", 2)).unwrap();

        assert_eq!(store.remove_where(|i| i.value == 2), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_count(), 5);
        assert!(!store.remove("missing"));
        assert_eq!(store.write_count(), 5);
    }

    #[test]
    fn test_find_keeps_insertion_order() {
        let store = InMemoryStore::new("Item");
        store.insert(item("b", 1)).unwrap();
        store.insert(item("a", 1)).unwrap();
        let ids: Vec<String> = store.find(|_| true).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }
}
