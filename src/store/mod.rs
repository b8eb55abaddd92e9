//! The read-only lookup table of cached results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The category key that is present in the seeded store.
pub const READY_CATEGORY: &str = "ready";

/// A single retrievable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Display name of the item.
    pub name: String,
}

impl Item {
    /// Creates a new item with the given name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for Item {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Builds a list of items from names.
pub fn items<I, S>(names: I) -> Vec<Item>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Item::new).collect()
}

/// An immutable mapping from category key to an ordered list of items.
///
/// The table is frozen once built; there is no way to insert after
/// construction, so concurrent reads need no locking.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: HashMap<String, Vec<Item>>,
}

impl ResultStore {
    /// Creates the store with the fixed `"ready"` entry.
    pub fn seeded() -> Self {
        Self::builder()
            .entry(READY_CATEGORY, items(["Pizza", "Burger", "Pasta"]))
            .build()
    }

    /// Starts building a store with custom entries.
    pub fn builder() -> ResultStoreBuilder {
        ResultStoreBuilder::default()
    }

    /// Looks up the items stored under `key`.
    pub fn lookup(&self, key: &str) -> Option<&[Item]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of categories in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store has no categories.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects entries before a [`ResultStore`] is frozen.
#[derive(Debug, Default)]
pub struct ResultStoreBuilder {
    entries: HashMap<String, Vec<Item>>,
}

impl ResultStoreBuilder {
    /// Adds or replaces the items for `key`.
    pub fn entry<K: Into<String>>(mut self, key: K, items: Vec<Item>) -> Self {
        self.entries.insert(key.into(), items);
        self
    }

    /// Freezes the entries into a store.
    pub fn build(self) -> ResultStore {
        ResultStore {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_lookup() {
        let store = ResultStore::seeded();
        let ready = store.lookup(READY_CATEGORY).unwrap();
        assert_eq!(ready, items(["Pizza", "Burger", "Pasta"]).as_slice());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = ResultStore::seeded();
        assert!(store.lookup("fresh").is_none());
        assert!(store.lookup("").is_none());
        assert!(!store.contains("Ready"));
    }

    #[test]
    fn test_builder_replaces_entry() {
        let store = ResultStore::builder()
            .entry("a", items(["x"]))
            .entry("a", items(["y", "z"]))
            .build();
        assert_eq!(store.lookup("a").unwrap(), items(["y", "z"]).as_slice());
    }

    #[test]
    fn test_concurrent_reads() {
        let store = std::sync::Arc::new(ResultStore::seeded());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.lookup(READY_CATEGORY).map(<[Item]>::to_vec))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap().len(), 3);
        }
    }
}
