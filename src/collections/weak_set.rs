use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::core::Atom;

#[cfg(test)]
mod tests;

/// A set of shared values that does not keep its members alive.
///
/// Members are `Rc` handles compared by pointer identity. Members whose last
/// outside handle was dropped behave as absent and are pruned on the next
/// mutation. Not enumerable; membership reads are tracked per member.
#[derive_ex(Clone, bound())]
pub struct ReactiveWeakSet<T: 'static>(Rc<WeakSetNode<T>>);

struct WeakSetNode<T> {
    slots: RefCell<HashMap<usize, WeakSlot<T>>>,
}

// `present: false` marks a member that was probed while absent; the slot
// keeps the dependency edge alive
struct WeakSlot<T> {
    member: Weak<T>,
    present: bool,
    atom: Rc<Atom>,
}

fn slot_key<T>(value: &Rc<T>) -> usize {
    Rc::as_ptr(value) as usize
}

impl<T: 'static> ReactiveWeakSet<T> {
    pub fn new() -> Self {
        Self(Rc::new(WeakSetNode {
            slots: RefCell::new(HashMap::new()),
        }))
    }

    fn slot_atom(&self, value: &Rc<T>) -> Rc<Atom> {
        let mut slots = self.0.slots.borrow_mut();
        let slot = slots
            .entry(slot_key(value))
            .and_modify(|slot| {
                if slot.member.strong_count() == 0 {
                    *slot = WeakSlot {
                        member: Rc::downgrade(value),
                        present: false,
                        atom: Atom::new(),
                    };
                }
            })
            .or_insert_with(|| WeakSlot {
                member: Rc::downgrade(value),
                present: false,
                atom: Atom::new(),
            });
        slot.atom.clone()
    }

    /// Returns `true` if `value` is a member, registering a dependency on
    /// that membership. Probing an absent value still registers the edge.
    pub fn contains(&self, value: &Rc<T>) -> bool {
        self.slot_atom(value).track();
        self.0
            .slots
            .borrow()
            .get(&slot_key(value))
            .is_some_and(|slot| slot.present)
    }

    /// Adds `value`, returning `true` if it was not already a member.
    /// Re-adding a member is a no-op.
    pub fn insert(&self, value: &Rc<T>) -> bool {
        self.prune(value);
        let atom = self.slot_atom(value);
        {
            let mut slots = self.0.slots.borrow_mut();
            let slot = slots.get_mut(&slot_key(value)).unwrap();
            if slot.present {
                return false;
            }
            slot.present = true;
        }
        atom.notify();
        true
    }

    /// Removes `value`, returning `true` if it was a member. Removing a
    /// non-member is a no-op.
    pub fn remove(&self, value: &Rc<T>) -> bool {
        self.prune(value);
        let atom = {
            let mut slots = self.0.slots.borrow_mut();
            let Some(slot) = slots.get_mut(&slot_key(value)) else {
                return false;
            };
            if slot.member.strong_count() == 0 || !slot.present {
                return false;
            }
            slot.present = false;
            slot.atom.clone()
        };
        atom.notify();
        true
    }

    fn prune(&self, keep: &Rc<T>) {
        let keep = slot_key(keep);
        self.0
            .slots
            .borrow_mut()
            .retain(|&k, slot| k == keep || slot.member.strong_count() != 0);
    }

    /// Returns `true` if both handles point at the same set.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: 'static> Default for ReactiveWeakSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ReactiveWeakSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = match self.0.slots.try_borrow() {
            Ok(slots) => slots
                .values()
                .filter(|slot| slot.member.strong_count() != 0 && slot.present)
                .count(),
            Err(_) => return write!(f, "<borrowed>"),
        };
        f.debug_struct("ReactiveWeakSet").field("len", &live).finish()
    }
}
