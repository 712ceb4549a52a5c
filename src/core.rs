use std::{
    cell::{Cell, RefCell},
    collections::{HashSet, VecDeque},
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

use parse_display::Display;
use slabmap::SlabMap;


thread_local! {
    static RUNTIME: ReactiveRuntime = ReactiveRuntime::new();
}

/// Per-thread reactive runtime.
///
/// Owns the active-consumer stack, the batch depth and the queue of
/// invalidated consumers. Nodes created on one thread belong to that
/// thread's runtime; there is no cross-thread sharing.
struct ReactiveRuntime {
    frames: RefCell<Vec<Frame>>,
    batch: Cell<usize>,
    flushing: Cell<bool>,
    queue: RefCell<VecDeque<QueueEntry>>,
    queued: RefCell<HashSet<SinkId>>,
}

impl ReactiveRuntime {
    fn new() -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
            batch: Cell::new(0),
            flushing: Cell::new(false),
            queue: RefCell::new(VecDeque::new()),
            queued: RefCell::new(HashSet::new()),
        }
    }
}

enum Frame {
    Track(TrackFrame),
    Untrack,
}

struct TrackFrame {
    sink: Weak<dyn BindSink>,
    id: SinkId,
    sources: SourceBindings,
    seen: HashSet<AtomId>,
}

struct QueueEntry {
    id: SinkId,
    sink: Weak<dyn BindSink>,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
struct AtomId(u64);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct SinkId(u64);

impl SinkId {
    pub(crate) fn new() -> Self {
        SinkId(next_id())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct BindKey(usize);

/// A reactive consumer: an effect, a watch, or a computed node.
pub(crate) trait BindSink: 'static {
    fn sink_id(&self) -> SinkId;

    /// Eager invalidation hook, called synchronously when a tracked
    /// dependency changed.
    fn notify(self: Rc<Self>);

    /// Deferred re-run hook, called by the scheduler flush.
    fn flush(self: Rc<Self>);
}

/// One observed (target, key) pair.
///
/// Holds the table of consumers currently depending on this key. Reads call
/// [`Atom::track`], mutations call [`Atom::notify`].
pub(crate) struct Atom {
    id: AtomId,
    sinks: RefCell<SlabMap<Weak<dyn BindSink>>>,
}

impl Atom {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: AtomId(next_id()),
            sinks: RefCell::new(SlabMap::new()),
        })
    }

    /// Records a read of this atom into the innermost tracking frame.
    ///
    /// No-op outside any tracking frame and under [`untracked`].
    pub fn track(self: &Rc<Self>) {
        RUNTIME.with(|rt| {
            let mut frames = rt.frames.borrow_mut();
            let Some(Frame::Track(frame)) = frames.last_mut() else {
                return;
            };
            if !frame.seen.insert(self.id) {
                return;
            }
            let key = BindKey(self.sinks.borrow_mut().insert(frame.sink.clone()));
            frame.sources.0.push(SourceBinding {
                source: self.clone(),
                key,
            });
        });
    }

    /// Invalidates every consumer bound to this atom.
    ///
    /// All consumers are invalidated before any of them re-runs, and re-runs
    /// are deferred while a batch is open.
    pub fn notify(&self) {
        let targets: Vec<Rc<dyn BindSink>> = self
            .sinks
            .borrow()
            .values()
            .filter_map(|sink| sink.upgrade())
            .collect();
        if targets.is_empty() {
            return;
        }
        with_batch(|| {
            for sink in targets {
                sink.notify();
            }
        });
    }

    pub fn is_observed(&self) -> bool {
        self.sinks.borrow().values().any(|s| s.strong_count() > 0)
    }

    fn unbind(&self, key: BindKey) {
        self.sinks.borrow_mut().remove(key.0);
    }
}

pub(crate) struct SourceBinding {
    source: Rc<Atom>,
    key: BindKey,
}

/// The edge list held by a consumer. Dropping it releases every edge, so a
/// panicking consumer still unbinds.
#[derive(Default)]
pub(crate) struct SourceBindings(Vec<SourceBinding>);

impl SourceBindings {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn clear(&mut self) {
        for b in self.0.drain(..) {
            b.source.unbind(b.key);
        }
    }
}

impl Drop for SourceBindings {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Runs `f` under a fresh tracking frame for `sink` and returns the
/// dependency edges recorded during the run.
pub(crate) fn track<T>(
    sink: Weak<dyn BindSink>,
    id: SinkId,
    f: impl FnOnce() -> T,
) -> (T, SourceBindings) {
    RUNTIME.with(|rt| {
        rt.frames.borrow_mut().push(Frame::Track(TrackFrame {
            sink,
            id,
            sources: SourceBindings::new(),
            seen: HashSet::new(),
        }));
    });
    let guard = FrameGuard { id: Some(id) };
    let ret = f();
    let sources = guard.finish();
    (ret, sources)
}

struct FrameGuard {
    id: Option<SinkId>,
}

impl FrameGuard {
    fn finish(mut self) -> SourceBindings {
        let id = self.id.take().unwrap();
        pop_track_frame(id)
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            // unwinding: the collected edges are released by SourceBindings::drop
            drop(pop_track_frame(id));
        }
    }
}

fn pop_track_frame(id: SinkId) -> SourceBindings {
    RUNTIME.with(|rt| match rt.frames.borrow_mut().pop() {
        Some(Frame::Track(frame)) if frame.id == id => frame.sources,
        _ => panic!("tracking frames must be strictly nested"),
    })
}

/// Calls `f` with dependency tracking suspended.
///
/// Reads performed inside `f` do not register edges for the enclosing
/// computation.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    RUNTIME.with(|rt| rt.frames.borrow_mut().push(Frame::Untrack));
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            RUNTIME.with(|rt| {
                if !matches!(rt.frames.borrow_mut().pop(), Some(Frame::Untrack)) {
                    panic!("tracking frames must be strictly nested");
                }
            });
        }
    }
    let _guard = Guard;
    f()
}

/// Queues an invalidated consumer for re-run. When no batch is open the
/// queue is flushed before this call returns.
pub(crate) fn schedule(sink: Rc<dyn BindSink>) {
    RUNTIME.with(|rt| {
        if rt.queued.borrow_mut().insert(sink.sink_id()) {
            rt.queue.borrow_mut().push_back(QueueEntry {
                id: sink.sink_id(),
                sink: Rc::downgrade(&sink),
            });
        }
    });
    maybe_flush();
}

fn maybe_flush() {
    RUNTIME.with(|rt| {
        if rt.batch.get() != 0 || rt.flushing.get() {
            return;
        }
        rt.flushing.set(true);
        struct FlushGuard<'a>(&'a Cell<bool>);
        impl Drop for FlushGuard<'_> {
            fn drop(&mut self) {
                self.0.set(false);
            }
        }
        let _guard = FlushGuard(&rt.flushing);
        loop {
            let entry = rt.queue.borrow_mut().pop_front();
            let Some(entry) = entry else {
                break;
            };
            rt.queued.borrow_mut().remove(&entry.id);
            if let Some(sink) = entry.sink.upgrade() {
                sink.flush();
            }
        }
    });
}

/// Runs `f` inside a batch scope: notifications produced by writes inside
/// `f` are coalesced and each affected consumer re-runs at most once, after
/// `f` returns. Nested calls flatten into the outermost scope.
pub(crate) fn with_batch<T>(f: impl FnOnce() -> T) -> T {
    RUNTIME.with(|rt| rt.batch.set(rt.batch.get() + 1));
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            RUNTIME.with(|rt| rt.batch.set(rt.batch.get() - 1));
        }
    }
    let guard = Guard;
    let ret = f();
    drop(guard);
    maybe_flush();
    ret
}

/// Returned by fallible reads of a computed value whose getter reads itself.
#[non_exhaustive]
#[derive(Display, Debug)]
#[display("detect cyclic dependency")]
pub struct CyclicError {}

impl std::error::Error for CyclicError {}
