use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::core::Atom;


/// A map from shared keys to values that does not keep its keys alive.
///
/// Keys are `Rc` handles compared by pointer identity. Entries whose key has
/// been dropped behave as absent and are pruned on the next mutation. Not
/// enumerable: there is no length, iteration or change-handler surface, only
/// per-key reads and writes, each tracked per key.
#[derive_ex(Clone, bound())]
pub struct ReactiveWeakMap<K: 'static, V: 'static>(Rc<WeakMapNode<K, V>>);

struct WeakMapNode<K, V> {
    // keyed by the Rc data pointer
    slots: RefCell<HashMap<usize, WeakSlot<K, V>>>,
}

// `value: None` marks a key that was read while absent; the slot exists so
// the read can leave a dependency edge behind
struct WeakSlot<K, V> {
    key: Weak<K>,
    value: Option<V>,
    atom: Rc<Atom>,
}

fn slot_key<K>(key: &Rc<K>) -> usize {
    Rc::as_ptr(key) as usize
}

impl<K: 'static, V: 'static> ReactiveWeakMap<K, V> {
    pub fn new() -> Self {
        Self(Rc::new(WeakMapNode {
            slots: RefCell::new(HashMap::new()),
        }))
    }

    /// Returns the live slot atom for `key`, creating an empty slot if the
    /// key has none. A slot left behind by a dropped key whose address was
    /// reused is replaced.
    fn slot_atom(&self, key: &Rc<K>) -> Rc<Atom> {
        let mut slots = self.0.slots.borrow_mut();
        let slot = slots
            .entry(slot_key(key))
            .and_modify(|slot| {
                if slot.key.strong_count() == 0 {
                    *slot = WeakSlot {
                        key: Rc::downgrade(key),
                        value: None,
                        atom: Atom::new(),
                    };
                }
            })
            .or_insert_with(|| WeakSlot {
                key: Rc::downgrade(key),
                value: None,
                atom: Atom::new(),
            });
        slot.atom.clone()
    }

    /// Gets the value for `key`, registering a dependency on that key's
    /// entry. Reading an absent key still registers the edge, so the
    /// consumer re-runs when the key is later inserted.
    pub fn get(&self, key: &Rc<K>) -> Option<V>
    where
        V: Clone,
    {
        self.slot_atom(key).track();
        self.0
            .slots
            .borrow()
            .get(&slot_key(key))
            .and_then(|slot| slot.value.clone())
    }

    pub fn contains_key(&self, key: &Rc<K>) -> bool {
        self.slot_atom(key).track();
        self.0
            .slots
            .borrow()
            .get(&slot_key(key))
            .is_some_and(|slot| slot.value.is_some())
    }

    /// Inserts `value` under `key` and returns the previous value.
    ///
    /// Inserting a value equal to the current one is a no-op.
    pub fn insert(&self, key: &Rc<K>, value: V) -> Option<V>
    where
        V: Clone + PartialEq,
    {
        self.prune(key);
        let atom = self.slot_atom(key);
        let old = {
            let mut slots = self.0.slots.borrow_mut();
            let slot = slots.get_mut(&slot_key(key)).unwrap();
            match &slot.value {
                Some(old) if *old == value => return Some(old.clone()),
                _ => slot.value.replace(value),
            }
        };
        atom.notify();
        old
    }

    /// Removes `key` and returns its value. Removing an absent key is a
    /// no-op. The dependency edge survives, so consumers that read the key
    /// re-run if it is inserted again.
    pub fn remove(&self, key: &Rc<K>) -> Option<V> {
        self.prune(key);
        let (atom, old) = {
            let mut slots = self.0.slots.borrow_mut();
            let slot = slots.get_mut(&slot_key(key))?;
            if slot.key.strong_count() == 0 {
                return None;
            }
            let old = slot.value.take()?;
            (slot.atom.clone(), old)
        };
        atom.notify();
        Some(old)
    }

    /// Drops slots whose keys are gone, keeping the one for `keep` even if
    /// it is about to be replaced.
    fn prune(&self, keep: &Rc<K>) {
        let keep = slot_key(keep);
        self.0
            .slots
            .borrow_mut()
            .retain(|&k, slot| k == keep || slot.key.strong_count() != 0);
    }

    /// Returns `true` if both handles point at the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<K: 'static, V: 'static> Default for ReactiveWeakMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for ReactiveWeakMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = match self.0.slots.try_borrow() {
            Ok(slots) => slots
                .values()
                .filter(|slot| slot.key.strong_count() != 0 && slot.value.is_some())
                .count(),
            Err(_) => return write!(f, "<borrowed>"),
        };
        f.debug_struct("ReactiveWeakMap").field("len", &live).finish()
    }
}
