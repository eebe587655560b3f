use crate::Subscription;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A key-unique reactive map.
///
/// Backed by `BTreeMap` for deterministic iteration order. `insert` over an
/// existing key replaces the value, observed as a removal of the old value
/// followed by an insertion of the new one.
pub struct MapCell<K: Ord, V> {
    entries: BTreeMap<K, V>,
    next_id: u64,
    on_insert: Vec<(u64, Box<dyn Fn(&K, &V)>)>,
    on_remove: Vec<(u64, Box<dyn Fn(&K, &V)>)>,
}

impl<K: Ord, V> MapCell<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
            on_insert: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// Insert or replace. Returns the previous value for the key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old = self.entries.remove(&key);
        if let Some(ref old_value) = old {
            for (_, listener) in &self.on_remove {
                listener(&key, old_value);
            }
        }
        for (_, listener) in &self.on_insert {
            listener(&key, &value);
        }
        self.entries.insert(key, value);
        old
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key);
        if let Some(ref value) = removed {
            for (_, listener) in &self.on_remove {
                listener(key, value);
            }
        }
        removed
    }

    /// Remove every entry, firing `on_remove` per entry in key order.
    pub fn clear(&mut self) {
        let drained = std::mem::take(&mut self.entries);
        for (key, value) in &drained {
            for (_, listener) in &self.on_remove {
                listener(key, value);
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> std::collections::btree_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> std::collections::btree_map::Values<'_, K, V> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> std::collections::btree_map::ValuesMut<'_, K, V> {
        self.entries.values_mut()
    }

    pub fn on_insert(&mut self, listener: impl Fn(&K, &V) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.on_insert.push((id, Box::new(listener)));
        Subscription(id)
    }

    pub fn on_remove(&mut self, listener: impl Fn(&K, &V) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.on_remove.push((id, Box::new(listener)));
        Subscription(id)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.on_insert.len() + self.on_remove.len();
        self.on_insert.retain(|(id, _)| *id != sub.0);
        self.on_remove.retain(|(id, _)| *id != sub.0);
        self.on_insert.len() + self.on_remove.len() != before
    }
}

/// Clones the entries only. The clone has no listeners.
impl<K: Ord + Clone, V: Clone> Clone for MapCell<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            next_id: 0,
            on_insert: Vec::new(),
            on_remove: Vec::new(),
        }
    }
}

impl<K: Ord, V> Default for MapCell<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for MapCell<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCell")
            .field("entries", &self.entries)
            .field("listeners", &(self.on_insert.len() + self.on_remove.len()))
            .finish()
    }
}

impl<K: Ord + Serialize, V: Serialize> Serialize for MapCell<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, K: Ord + Deserialize<'de>, V: Deserialize<'de>> Deserialize<'de> for MapCell<K, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<K, V>::deserialize(deserializer)?;
        Ok(Self {
            entries,
            next_id: 0,
            on_insert: Vec::new(),
            on_remove: Vec::new(),
        })
    }
}
