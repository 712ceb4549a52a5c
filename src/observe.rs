use std::{cell::RefCell, rc::Rc};

use slabmap::SlabMap;

/// Table of raw change handlers attached to a reactive container.
///
/// Handlers fire synchronously on every actual mutation, independent of
/// batching; the batch model only coalesces consumer re-runs.
pub(crate) struct Observers<E>(RefCell<SlabMap<Rc<dyn Fn(&E)>>>);

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self(RefCell::new(SlabMap::new()))
    }

    pub fn insert(&self, f: impl Fn(&E) + 'static) -> usize {
        self.0.borrow_mut().insert(Rc::new(f))
    }

    pub fn remove(&self, key: usize) {
        self.0.borrow_mut().remove(key);
    }

    pub fn emit(&self, event: &E) {
        if self.0.borrow().is_empty() {
            return;
        }
        // handlers may subscribe/unsubscribe while running
        let handlers: Vec<Rc<dyn Fn(&E)>> = self.0.borrow().values().cloned().collect();
        for handler in handlers {
            handler(event);
        }
    }
}
