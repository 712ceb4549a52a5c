use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::core::Atom;

#[cfg(test)]
mod tests;

/// Creates a new [`Signal`] holding `initial`.
pub fn signal<T: 'static>(initial: T) -> Signal<T> {
    Signal::new(initial)
}

/// A shared reactive cell: the callable get/set unit of the engine, and the
/// box form of an observable for values that are not containers themselves.
///
/// Similar to `Rc<RefCell<T>>`, but reads register dependency edges for the
/// enclosing computation and writes notify dependent consumers.
#[derive_ex(Clone, bound())]
pub struct Signal<T: 'static>(Rc<SignalNode<T>>);

struct SignalNode<T> {
    atom: Rc<Atom>,
    value: RefCell<T>,
}

impl<T: 'static> Signal<T> {
    /// Creates a new `Signal` with the given initial value.
    pub fn new(value: T) -> Self {
        Self(Rc::new(SignalNode {
            atom: Atom::new(),
            value: RefCell::new(value),
        }))
    }

    /// Gets the current value, registering a dependency on this signal for
    /// the enclosing computation.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.borrow().clone()
    }

    /// Gets the current value without tracking.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    /// Borrows the current value, registering a dependency on this signal.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.atom.track();
        self.0.value.borrow()
    }

    /// Borrows the current value without tracking.
    pub fn borrow_untracked(&self) -> Ref<'_, T> {
        self.0.value.borrow()
    }

    /// Sets a new value and notifies dependents, unless the new value equals
    /// the current one, in which case nothing is notified.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        {
            let mut current = self.0.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.0.atom.notify();
    }

    /// Sets a new value and notifies dependents unconditionally.
    pub fn set_force(&self, value: T) {
        *self.0.value.borrow_mut() = value;
        self.0.atom.notify();
    }

    /// Mutates the value in place and notifies dependents.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.value.borrow_mut());
        self.0.atom.notify();
    }

    /// Returns `true` if both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

impl<T> Serialize for Signal<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}

impl<'de, T> Deserialize<'de> for Signal<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Signal<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Signal::new)
    }
}
