use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    core::{schedule, track, with_batch, BindSink, SinkId, SourceBindings},
    Subscription,
};

#[cfg(test)]
mod tests;

/// Runs `f` once, synchronously, and re-runs it whenever any observable
/// state it read during its last run changes.
///
/// Outside a batch the re-run happens before the triggering write returns;
/// inside a batch all affected runs coalesce into one at the outermost exit.
/// Dropping the returned [`Subscription`] disposes the effect.
pub fn autorun(f: impl FnMut() + 'static) -> Subscription {
    let node = EffectNode::new(f);
    node.clone().run();
    Subscription::from_rc_fn(node, EffectNode::dispose)
}

/// Alias of [`autorun`].
pub fn effect(f: impl FnMut() + 'static) -> Subscription {
    autorun(f)
}

struct EffectNode<F> {
    id: SinkId,
    disposed: Cell<bool>,
    state: RefCell<EffectState<F>>,
}

struct EffectState<F> {
    f: F,
    sources: SourceBindings,
}

impl<F: FnMut() + 'static> EffectNode<F> {
    fn new(f: F) -> Rc<Self> {
        Rc::new(Self {
            id: SinkId::new(),
            disposed: Cell::new(false),
            state: RefCell::new(EffectState {
                f,
                sources: SourceBindings::new(),
            }),
        })
    }

    fn run(self: Rc<Self>) {
        // writes made by `f` itself are deferred until the run completes
        with_batch(|| {
            if self.disposed.get() {
                return;
            }
            let st = &mut *self.state.borrow_mut();
            st.sources.clear();
            let weak = Rc::downgrade(&self);
            let weak: Weak<dyn BindSink> = weak;
            let ((), sources) = track(weak, self.id, || (st.f)());
            st.sources = sources;
        });
    }

    fn dispose(self: Rc<Self>) {
        self.disposed.set(true);
        self.state.borrow_mut().sources.clear();
    }
}

impl<F: FnMut() + 'static> BindSink for EffectNode<F> {
    fn sink_id(&self) -> SinkId {
        self.id
    }

    fn notify(self: Rc<Self>) {
        if !self.disposed.get() {
            schedule(self);
        }
    }

    fn flush(self: Rc<Self>) {
        self.run();
    }
}

/// Tracks the result of `source` and invokes `callback(new, old)` whenever
/// it changes.
///
/// Unlike [`autorun`], the callback is not invoked at creation: `source` is
/// evaluated once to establish the dependency set, and `callback` fires only
/// on subsequent changes of the evaluated result.
pub fn watch<T, F, C>(source: F, callback: C) -> Subscription
where
    T: PartialEq + 'static,
    F: FnMut() -> T + 'static,
    C: FnMut(&T, &T) + 'static,
{
    let node = WatchNode::new(source, callback);
    node.clone().run(false);
    Subscription::from_rc_fn(node, WatchNode::dispose)
}

struct WatchNode<F, C, T> {
    id: SinkId,
    disposed: Cell<bool>,
    state: RefCell<WatchState<F, C, T>>,
}

struct WatchState<F, C, T> {
    source: F,
    callback: C,
    last: Option<T>,
    sources: SourceBindings,
}

impl<T, F, C> WatchNode<F, C, T>
where
    T: PartialEq + 'static,
    F: FnMut() -> T + 'static,
    C: FnMut(&T, &T) + 'static,
{
    fn new(source: F, callback: C) -> Rc<Self> {
        Rc::new(Self {
            id: SinkId::new(),
            disposed: Cell::new(false),
            state: RefCell::new(WatchState {
                source,
                callback,
                last: None,
                sources: SourceBindings::new(),
            }),
        })
    }

    fn run(self: Rc<Self>, fire: bool) {
        with_batch(|| {
            if self.disposed.get() {
                return;
            }
            let st = &mut *self.state.borrow_mut();
            st.sources.clear();
            let weak = Rc::downgrade(&self);
            let weak: Weak<dyn BindSink> = weak;
            let (value, sources) = track(weak, self.id, || (st.source)());
            st.sources = sources;
            match st.last.take() {
                Some(old) if fire && old != value => (st.callback)(&value, &old),
                _ => {}
            }
            st.last = Some(value);
        });
    }

    fn dispose(self: Rc<Self>) {
        self.disposed.set(true);
        self.state.borrow_mut().sources.clear();
    }
}

impl<T, F, C> BindSink for WatchNode<F, C, T>
where
    T: PartialEq + 'static,
    F: FnMut() -> T + 'static,
    C: FnMut(&T, &T) + 'static,
{
    fn sink_id(&self) -> SinkId {
        self.id
    }

    fn notify(self: Rc<Self>) {
        if !self.disposed.get() {
            schedule(self);
        }
    }

    fn flush(self: Rc<Self>) {
        self.run(true);
    }
}
