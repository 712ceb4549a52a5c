use std::{cell::Ref, cell::RefCell, collections::HashMap, hash::Hash, rc::Rc};

use derive_ex::derive_ex;
use indexmap::IndexSet;
use serde::Serialize;

use crate::{
    core::{with_batch, Atom},
    observe::Observers,
    Subscription,
};


/// Change event delivered to [`ReactiveSet::observe`] handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum SetChange<T> {
    Insert { value: T },
    Remove { value: T },
    Clear,
}

/// A set instrumented for dependency tracking.
///
/// Membership reads register an edge per element, so a consumer asking
/// `contains(&a)` re-runs when `a` is added or removed but not when an
/// unrelated element changes. Inserting a present element or removing an
/// absent one notifies nothing.
#[derive_ex(Clone, bound())]
pub struct ReactiveSet<T: 'static>(Rc<SetNode<T>>);

struct SetNode<T> {
    items: RefCell<IndexSet<T>>,
    item_atoms: RefCell<HashMap<T, Rc<Atom>>>,
    size: Rc<Atom>,
    iteration: Rc<Atom>,
    observers: Observers<SetChange<T>>,
}

impl<T> ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    pub fn new() -> Self {
        Self(Rc::new(SetNode {
            items: RefCell::new(IndexSet::new()),
            item_atoms: RefCell::new(HashMap::new()),
            size: Atom::new(),
            iteration: Atom::new(),
            observers: Observers::new(),
        }))
    }

    fn item_atom(&self, value: &T) -> Rc<Atom> {
        self.0
            .item_atoms
            .borrow_mut()
            .entry(value.clone())
            .or_insert_with(Atom::new)
            .clone()
    }

    /// Returns `true` if `value` is present, registering a dependency on
    /// that element's membership.
    pub fn contains(&self, value: &T) -> bool {
        self.item_atom(value).track();
        self.0.items.borrow().contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.size.track();
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `value`, returning `true` if it was not already present.
    /// Inserting a present element is a no-op.
    pub fn insert(&self, value: T) -> bool {
        if !self.0.items.borrow_mut().insert(value.clone()) {
            return false;
        }
        self.0.observers.emit(&SetChange::Insert {
            value: value.clone(),
        });
        with_batch(|| {
            self.item_atom(&value).notify();
            self.0.size.notify();
            self.0.iteration.notify();
        });
        true
    }

    /// Removes `value`, returning `true` if it was present. Removing an
    /// absent element is a no-op.
    pub fn remove(&self, value: &T) -> bool {
        if !self.0.items.borrow_mut().shift_remove(value) {
            return false;
        }
        self.0.observers.emit(&SetChange::Remove {
            value: value.clone(),
        });
        with_batch(|| {
            self.item_atom(value).notify();
            self.0.size.notify();
            self.0.iteration.notify();
        });
        true
    }

    /// Removes every element. Clearing an empty set is a no-op.
    pub fn clear(&self) {
        let removed: Vec<T> = {
            let mut items = self.0.items.borrow_mut();
            if items.is_empty() {
                return;
            }
            items.drain(..).collect()
        };
        self.0.observers.emit(&SetChange::Clear);
        with_batch(|| {
            for value in &removed {
                self.item_atom(value).notify();
            }
            self.0.size.notify();
            self.0.iteration.notify();
        });
    }

    /// Snapshot of the elements, in insertion order. Registers a dependency
    /// on the iteration key.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.iteration.track();
        self.0.items.borrow().iter().cloned().collect()
    }

    /// Calls `f` for every element. Tracks like [`to_vec`](Self::to_vec).
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for value in self.to_vec() {
            f(&value);
        }
    }

    /// Borrows the underlying set with no tracking.
    pub fn raw(&self) -> Ref<'_, IndexSet<T>> {
        self.0.items.borrow()
    }

    /// Registers a raw change handler, invoked synchronously on every actual
    /// mutation of this set.
    pub fn observe(&self, f: impl Fn(&SetChange<T>) + 'static) -> Subscription {
        let key = self.0.observers.insert(f);
        Subscription::from_rc_fn(self.0.clone(), move |node| node.observers.remove(key))
    }

    /// Returns `true` if both handles point at the same set.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Default for ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReactiveSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => f.debug_set().entries(items.iter()).finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

impl<T: Serialize> Serialize for ReactiveSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.items.try_borrow() {
            Ok(items) => serializer.collect_seq(items.iter()),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
