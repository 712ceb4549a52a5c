use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::core::{schedule, track, Atom, BindSink, CyclicError, SinkId, SourceBindings};

#[cfg(test)]
mod tests;

/// Creates a lazy memoized reactive value.
///
/// The getter does not run until the value is first read. Once read, the
/// result is cached and invalidated exactly when a dependency recorded
/// during the last evaluation changes. While the computed value is itself
/// observed, each dependency change re-runs the getter once; dependents are
/// notified only when the recomputed value differs from the cached one.
pub fn computed<T: PartialEq + 'static>(f: impl FnMut() -> T + 'static) -> Computed<T> {
    Computed::new(f)
}

/// A cached reactive value derived from other observable state.
#[derive_ex(Clone, bound())]
pub struct Computed<T: 'static>(Rc<ComputedNode<T>>);

struct ComputedNode<T: 'static> {
    id: SinkId,
    atom: Rc<Atom>,
    dirty: Cell<bool>,
    has_value: Cell<bool>,
    state: RefCell<ComputedState<T>>,
}

struct ComputedState<T> {
    f: Box<dyn FnMut() -> T>,
    eq: fn(&T, &T) -> bool,
    value: Option<T>,
    sources: SourceBindings,
}

impl<T: 'static> Computed<T> {
    pub fn new(f: impl FnMut() -> T + 'static) -> Self
    where
        T: PartialEq,
    {
        Self(Rc::new(ComputedNode {
            id: SinkId::new(),
            atom: Atom::new(),
            dirty: Cell::new(false),
            has_value: Cell::new(false),
            state: RefCell::new(ComputedState {
                f: Box::new(f),
                eq: |a, b| a == b,
                value: None,
                sources: SourceBindings::new(),
            }),
        }))
    }

    /// Reads the value, recomputing first if it is stale, and registers a
    /// dependency on this computed for the enclosing computation.
    ///
    /// Panics if the getter reads this computed back (cyclic dependency);
    /// use [`try_get`](Self::try_get) for the fallible form.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.freshen();
        self.0.atom.track();
        self.0.cached()
    }

    /// Reads the value without registering a dependency.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.0.freshen();
        self.0.cached()
    }

    /// Like [`get`](Self::get), but returns an error instead of panicking on
    /// a cyclic dependency.
    pub fn try_get(&self) -> Result<T, CyclicError>
    where
        T: Clone,
    {
        self.0.recompute()?;
        self.0.atom.track();
        Ok(self.0.cached())
    }

    /// Returns `true` if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: 'static> ComputedNode<T> {
    fn cached(&self) -> T
    where
        T: Clone,
    {
        self.state.borrow().value.clone().unwrap()
    }

    fn freshen(self: &Rc<Self>) {
        if let Err(e) = self.recompute() {
            panic!("{e}");
        }
    }

    fn recompute(self: &Rc<Self>) -> Result<(), CyclicError> {
        if self.has_value.get() && !self.dirty.get() {
            return Ok(());
        }
        let mut guard = self.state.try_borrow_mut().map_err(|_| CyclicError {})?;
        self.dirty.set(false);
        let st = &mut *guard;
        st.sources.clear();
        let weak = Rc::downgrade(self);
        let weak: Weak<dyn BindSink> = weak;
        let (value, sources) = track(weak, self.id, || (st.f)());
        let changed = match &st.value {
            Some(old) => !(st.eq)(old, &value),
            None => true,
        };
        st.value = Some(value);
        st.sources = sources;
        self.has_value.set(true);
        drop(guard);
        if changed {
            self.atom.notify();
        }
        Ok(())
    }
}

impl<T: 'static> BindSink for ComputedNode<T> {
    fn sink_id(&self) -> SinkId {
        self.id
    }

    fn notify(self: Rc<Self>) {
        // invalidation is eager; recomputation is deferred to the flush
        // (observed) or to the next read (unobserved)
        if !self.has_value.get() || self.dirty.get() {
            return;
        }
        self.dirty.set(true);
        if self.atom.is_observed() {
            schedule(self);
        }
    }

    fn flush(self: Rc<Self>) {
        if self.dirty.get() && self.atom.is_observed() {
            self.freshen();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.state.try_borrow() {
            Ok(st) => match &st.value {
                Some(value) if !self.0.dirty.get() => std::fmt::Debug::fmt(value, f),
                _ => write!(f, "<stale>"),
            },
            Err(_) => write!(f, "<computing>"),
        }
    }
}
