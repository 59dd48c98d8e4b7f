//! Specialized collection types

use std::collections::HashMap;

pub use slotmap::{new_key_type, Key, SlotMap};

/// Arena addressed both by a generation-checked key and by a string id
///
/// Values live in a [`SlotMap`], so a key taken before a removal never
/// resolves to whatever later reuses the slot. The string index maps the
/// external id onto the current key, and insertion order is preserved for
/// iteration.
#[derive(Debug, Clone)]
pub struct KeyedArena<K: Key, V> {
    slots: SlotMap<K, V>,
    index: HashMap<String, K>,
    order: Vec<K>,
}

impl<K: Key, V> KeyedArena<K, V> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            index: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert a value under `id`, replacing (and returning) any previous value
    pub fn insert(&mut self, id: impl Into<String>, value: V) -> (K, Option<V>) {
        let id = id.into();
        let previous = self.remove(&id);
        let key = self.slots.insert(value);
        self.index.insert(id, key);
        self.order.push(key);
        (key, previous)
    }

    /// Remove the value stored under `id`
    pub fn remove(&mut self, id: &str) -> Option<V> {
        let key = self.index.remove(id)?;
        self.order.retain(|k| *k != key);
        self.slots.remove(key)
    }

    /// Resolve an id to its current key
    pub fn key_of(&self, id: &str) -> Option<K> {
        self.index.get(id).copied()
    }

    /// Look up a value by id
    pub fn get(&self, id: &str) -> Option<&V> {
        self.key_of(id).and_then(|k| self.slots.get(k))
    }

    /// Look up a value by id, mutably
    pub fn get_mut(&mut self, id: &str) -> Option<&mut V> {
        let key = self.key_of(id)?;
        self.slots.get_mut(key)
    }

    /// Look up a value by key; stale keys resolve to `None`
    pub fn get_by_key(&self, key: K) -> Option<&V> {
        self.slots.get(key)
    }

    /// Check whether `id` is present
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.order.clear();
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|k| self.slots.get(*k))
    }

    /// Iterate over values in insertion order, mutably
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        let order = &self.order;
        let mut by_key: HashMap<K, &mut V> = self.slots.iter_mut().collect();
        order.iter().filter_map(move |k| by_key.remove(k))
    }

    /// Iterate over `(id, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        let mut ids: HashMap<K, &str> = self
            .index
            .iter()
            .map(|(id, k)| (*k, id.as_str()))
            .collect();
        self.order
            .iter()
            .filter_map(move |k| Some((ids.remove(k)?, self.slots.get(*k)?)))
    }

    /// Ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|(id, _)| id.to_string()).collect()
    }

    /// Keep only the values for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut V) -> bool) {
        let mut dropped = Vec::new();
        for (id, key) in &self.index {
            if let Some(value) = self.slots.get_mut(*key) {
                if !keep(id, value) {
                    dropped.push(id.clone());
                }
            }
        }
        for id in dropped {
            self.remove(&id);
        }
    }
}

impl<K: Key, V> Default for KeyedArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    new_key_type! {
        struct TestKey;
    }

    #[test]
    fn test_insert_get_and_order() {
        let mut arena: KeyedArena<TestKey, i32> = KeyedArena::new();
        arena.insert("b", 2);
        arena.insert("a", 1);
        arena.insert("c", 3);

        assert_eq!(arena.get("a"), Some(&1));
        assert_eq!(arena.ids(), vec!["b", "a", "c"]);
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![2, 1, 3]);
    }

    #[test]
    fn test_stale_key_does_not_resolve_after_reuse() {
        let mut arena: KeyedArena<TestKey, &str> = KeyedArena::new();
        let (old_key, _) = arena.insert("player", "first");
        arena.remove("player");
        let (new_key, _) = arena.insert("player", "second");

        assert_ne!(old_key, new_key);
        assert_eq!(arena.get_by_key(old_key), None);
        assert_eq!(arena.get_by_key(new_key), Some(&"second"));
    }

    #[test]
    fn test_reinsert_replaces_and_moves_to_back() {
        let mut arena: KeyedArena<TestKey, i32> = KeyedArena::new();
        arena.insert("a", 1);
        arena.insert("b", 2);
        let (_, previous) = arena.insert("a", 10);

        assert_eq!(previous, Some(1));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_values_mut_and_retain() {
        let mut arena: KeyedArena<TestKey, i32> = KeyedArena::new();
        arena.insert("a", 1);
        arena.insert("b", 2);
        arena.insert("c", 3);

        for v in arena.values_mut() {
            *v *= 10;
        }
        arena.retain(|id, _| id != "b");

        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![10, 30]);
        assert!(!arena.contains("b"));
    }
}
