use std::{
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
    hash::Hash,
    rc::Rc,
};

use derive_ex::derive_ex;
use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    core::{with_batch, Atom},
    observe::Observers,
    Subscription,
};


/// Change event delivered to [`ReactiveMap::observe`] handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum MapChange<K, V> {
    Insert { key: K, value: V },
    Update { key: K, old: V, value: V },
    Remove { key: K, old: V },
    Clear,
}

/// A map instrumented for dependency tracking.
///
/// Owns an [`IndexMap`] and delegates every operation through tracker hooks:
/// reads of a key register an edge on that key, whole-map reads register an
/// edge on the iteration key, and mutations notify exactly the keys they
/// change. Mutations that do not change observable state (inserting an equal
/// value, removing an absent key) notify nothing.
#[derive_ex(Clone, bound())]
pub struct ReactiveMap<K: 'static, V: 'static>(Rc<MapNode<K, V>>);

struct MapNode<K, V> {
    entries: RefCell<IndexMap<K, V>>,
    // atoms for every key ever read or written, including absent keys
    key_atoms: RefCell<HashMap<K, Rc<Atom>>>,
    size: Rc<Atom>,
    iteration: Rc<Atom>,
    observers: Observers<MapChange<K, V>>,
}

impl<K, V> ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    pub fn new() -> Self {
        Self(Rc::new(MapNode {
            entries: RefCell::new(IndexMap::new()),
            key_atoms: RefCell::new(HashMap::new()),
            size: Atom::new(),
            iteration: Atom::new(),
            observers: Observers::new(),
        }))
    }

    fn key_atom(&self, key: &K) -> Rc<Atom> {
        self.0
            .key_atoms
            .borrow_mut()
            .entry(key.clone())
            .or_insert_with(Atom::new)
            .clone()
    }

    /// Gets the value for `key`, registering a dependency on that key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.key_atom(key).track();
        self.0.entries.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.key_atom(key).track();
        self.0.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.size.track();
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `value` under `key` and returns the previous value.
    ///
    /// Inserting a value equal to the current one is a no-op. A new key
    /// notifies the key, the size and the iteration edges; an overwrite
    /// notifies the key only.
    pub fn insert(&self, key: K, value: V) -> Option<V>
    where
        V: PartialEq,
    {
        let old = {
            let mut entries = self.0.entries.borrow_mut();
            match entries.get(&key) {
                Some(old) if *old == value => return Some(old.clone()),
                _ => entries.insert(key.clone(), value.clone()),
            }
        };
        match &old {
            Some(old_value) => {
                self.0.observers.emit(&MapChange::Update {
                    key: key.clone(),
                    old: old_value.clone(),
                    value,
                });
                self.key_atom(&key).notify();
            }
            None => {
                self.0.observers.emit(&MapChange::Insert {
                    key: key.clone(),
                    value,
                });
                with_batch(|| {
                    self.key_atom(&key).notify();
                    self.0.size.notify();
                    self.0.iteration.notify();
                });
            }
        }
        old
    }

    /// Removes `key` and returns its value. Removing an absent key is a
    /// no-op.
    pub fn remove(&self, key: &K) -> Option<V> {
        let old = self.0.entries.borrow_mut().shift_remove(key)?;
        self.0.observers.emit(&MapChange::Remove {
            key: key.clone(),
            old: old.clone(),
        });
        with_batch(|| {
            self.key_atom(key).notify();
            self.0.size.notify();
            self.0.iteration.notify();
        });
        Some(old)
    }

    /// Removes every entry. Clearing an empty map is a no-op.
    pub fn clear(&self) {
        let removed: Vec<K> = {
            let mut entries = self.0.entries.borrow_mut();
            if entries.is_empty() {
                return;
            }
            let keys = entries.keys().cloned().collect();
            entries.clear();
            keys
        };
        self.0.observers.emit(&MapChange::Clear);
        with_batch(|| {
            for key in &removed {
                self.key_atom(key).notify();
            }
            self.0.size.notify();
            self.0.iteration.notify();
        });
    }

    /// Snapshot of the keys, in insertion order. Registers a dependency on
    /// the iteration key, so additions and removals re-trigger.
    pub fn keys(&self) -> Vec<K> {
        self.0.iteration.track();
        self.0.entries.borrow().keys().cloned().collect()
    }

    /// Snapshot of the values, in insertion order. Registers dependencies on
    /// the iteration key and on every present key, so value overwrites
    /// re-trigger as well.
    pub fn values(&self) -> Vec<V> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }

    /// Snapshot of the entries, in insertion order. Tracks like
    /// [`values`](Self::values).
    pub fn entries(&self) -> Vec<(K, V)> {
        self.0.iteration.track();
        let snapshot: Vec<(K, V)> = self
            .0
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, _) in &snapshot {
            self.key_atom(key).track();
        }
        snapshot
    }

    /// Calls `f` for every entry. Tracks like [`values`](Self::values).
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in self.entries() {
            f(&key, &value);
        }
    }

    /// Borrows the underlying map with no tracking.
    pub fn raw(&self) -> Ref<'_, IndexMap<K, V>> {
        self.0.entries.borrow()
    }

    /// Mutably borrows the underlying map. Mutations made through this view
    /// never notify.
    pub fn raw_mut(&self) -> RefMut<'_, IndexMap<K, V>> {
        self.0.entries.borrow_mut()
    }

    /// Registers a raw change handler, invoked synchronously on every actual
    /// mutation of this map.
    pub fn observe(&self, f: impl Fn(&MapChange<K, V>) + 'static) -> Subscription {
        let key = self.0.observers.insert(f);
        Subscription::from_rc_fn(self.0.clone(), move |node| node.observers.remove(key))
    }

    /// Returns `true` if both handles point at the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<K, V> Default for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for ReactiveMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.entries.try_borrow() {
            Ok(entries) => f.debug_map().entries(entries.iter()).finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

impl<K, V> Serialize for ReactiveMap<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.entries.try_borrow() {
            Ok(entries) => serializer.collect_map(entries.iter()),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
