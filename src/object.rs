use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    core::{with_batch, Atom},
    observe::Observers,
    value::{BoxValue, Func, Value},
    Computed, Subscription,
};


/// Reactivity depth applied when a value is written into a field or element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Depth {
    /// Written raw trees are wrapped recursively.
    Deep,
    /// Only the top level of a written raw tree is wrapped.
    Shallow,
    /// Written values are stored as-is, replacement is the only tracked
    /// change.
    Ref,
}

/// Change event delivered to [`Obj::observe`] handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjChange {
    Set {
        key: Rc<str>,
        // absent for a fresh key and when replacing a computed field
        old: Option<Value>,
        value: Value,
    },
    Remove {
        key: Rc<str>,
        old: Value,
    },
}

enum FieldValue {
    Data(Value),
    Computed(Computed<Value>),
    Action(Func),
}

/// A reactive string-keyed object.
///
/// The dynamic counterpart of a wrapped plain object: field reads register a
/// dependency on that field, writes notify exactly the field they change,
/// and writes of an equal value notify nothing. Handles are shared; cloning
/// an `Obj` clones the handle, not the fields.
#[derive_ex(Clone)]
pub struct Obj(Rc<ObjNode>);

struct ObjNode {
    fields: RefCell<IndexMap<Rc<str>, FieldValue>>,
    // atoms for every field ever read or written, including absent fields
    atoms: RefCell<HashMap<Rc<str>, Rc<Atom>>>,
    keys_atom: Rc<Atom>,
    observers: Observers<ObjChange>,
    default_depth: Depth,
    depth_overrides: RefCell<HashMap<Rc<str>, Depth>>,
}

impl Obj {
    pub fn new() -> Self {
        Self::with_depth(Depth::Deep)
    }

    pub(crate) fn with_depth(default_depth: Depth) -> Self {
        Self(Rc::new(ObjNode {
            fields: RefCell::new(IndexMap::new()),
            atoms: RefCell::new(HashMap::new()),
            keys_atom: Atom::new(),
            observers: Observers::new(),
            default_depth,
            depth_overrides: RefCell::new(HashMap::new()),
        }))
    }

    /// Creates a builder for an object with per-field annotations.
    pub fn builder() -> crate::model::ObjectBuilder {
        crate::model::ObjectBuilder::new()
    }

    fn atom(&self, key: &str) -> Rc<Atom> {
        let mut atoms = self.0.atoms.borrow_mut();
        if let Some(atom) = atoms.get(key) {
            return atom.clone();
        }
        let atom = Atom::new();
        atoms.insert(key.into(), atom.clone());
        atom
    }

    fn depth_of(&self, key: &str) -> Depth {
        self.0
            .depth_overrides
            .borrow()
            .get(key)
            .copied()
            .unwrap_or(self.0.default_depth)
    }

    fn convert(&self, key: &str, value: Value) -> Value {
        match self.depth_of(key) {
            Depth::Deep => observable(value),
            Depth::Shallow => observable_shallow(value),
            Depth::Ref => value,
        }
    }

    /// Reads a field, registering a dependency on it. Absent fields read as
    /// [`Value::Null`] and still register the edge, so the consumer re-runs
    /// when the field is later set.
    ///
    /// A computed field evaluates (or returns its cache) and additionally
    /// tracks through the computed node itself.
    pub fn get(&self, key: &str) -> Value {
        self.atom(key).track();
        let slot = {
            let fields = self.0.fields.borrow();
            match fields.get(key) {
                Some(FieldValue::Data(v)) => return v.clone(),
                Some(FieldValue::Computed(c)) => Some(c.clone()),
                Some(FieldValue::Action(f)) => return Value::Func(f.clone()),
                None => None,
            }
        };
        // evaluated outside the borrow; the getter may read this object
        match slot {
            Some(computed) => computed.get(),
            None => Value::Null,
        }
    }

    /// Writes a field and notifies its dependents.
    ///
    /// The written value is converted per the field's depth annotation (deep
    /// by default). Writing a value equal to the current one notifies
    /// nothing. Writing to a boxed field stores into the box instead of
    /// replacing it. A fresh field also notifies key-set consumers.
    pub fn set(&self, key: &str, value: Value) {
        let value = self.convert(key, value);
        let key: Rc<str> = key.into();
        enum Outcome {
            Noop,
            Boxed(BoxValue),
            Stored { old: Option<Value>, fresh: bool },
        }
        let outcome = {
            let mut fields = self.0.fields.borrow_mut();
            match fields.get(&key) {
                Some(FieldValue::Data(Value::Box(b))) if !matches!(value, Value::Box(_)) => {
                    Outcome::Boxed(b.clone())
                }
                Some(FieldValue::Data(old)) if *old == value => Outcome::Noop,
                _ => {
                    let fresh = !fields.contains_key(&key);
                    let old = match fields.insert(key.clone(), FieldValue::Data(value.clone())) {
                        Some(FieldValue::Data(old)) => Some(old),
                        _ => None,
                    };
                    Outcome::Stored { old, fresh }
                }
            }
        };
        match outcome {
            Outcome::Noop => {}
            Outcome::Boxed(b) => b.set(value),
            Outcome::Stored { old, fresh } => {
                self.0.observers.emit(&ObjChange::Set {
                    key: key.clone(),
                    old,
                    value,
                });
                with_batch(|| {
                    self.atom(&key).notify();
                    if fresh {
                        self.0.keys_atom.notify();
                    }
                });
            }
        }
    }

    /// Removes a field, returning `true` if it was present. Removing an
    /// absent field is a no-op. The dependency edge survives, so consumers
    /// that read the field re-run if it is set again.
    pub fn delete(&self, key: &str) -> bool {
        let old = {
            let mut fields = self.0.fields.borrow_mut();
            match fields.shift_remove(key) {
                Some(FieldValue::Data(v)) => v,
                Some(_) => Value::Null,
                None => return false,
            }
        };
        self.0.observers.emit(&ObjChange::Remove {
            key: key.into(),
            old,
        });
        with_batch(|| {
            self.atom(key).notify();
            self.0.keys_atom.notify();
        });
        true
    }

    /// Returns `true` if the field is present, registering a dependency on
    /// it.
    pub fn has(&self, key: &str) -> bool {
        self.atom(key).track();
        self.0.fields.borrow().contains_key(key)
    }

    /// Snapshot of the field names, in insertion order. Registers a
    /// dependency on the key set, so additions and removals re-trigger.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.keys_atom.track();
        self.0.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.keys_atom.track();
        self.0.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` for every field. Registers dependencies on the key set and
    /// on every present field.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Value)) {
        for key in self.keys() {
            let value = self.get(&key);
            f(&key, &value);
        }
    }

    /// Invokes the callable stored under `key` with `args`.
    ///
    /// A plain function field runs as-is; an action field runs inside a
    /// batch scope. Returns [`Value::Null`] if the field is not callable.
    pub fn call(&self, key: &str, args: &[Value]) -> Value {
        self.atom(key).track();
        let slot = {
            let fields = self.0.fields.borrow();
            match fields.get(key) {
                Some(FieldValue::Data(Value::Func(f))) => Some((f.clone(), false)),
                Some(FieldValue::Action(f)) => Some((f.clone(), true)),
                _ => None,
            }
        };
        match slot {
            Some((f, true)) => with_batch(|| f.call(self, args)),
            Some((f, false)) => f.call(self, args),
            None => Value::Null,
        }
    }

    /// Returns the un-instrumented view of this object. Reads and writes
    /// through it touch the same fields without tracking or notifying.
    pub fn raw(&self) -> RawObj {
        RawObj(self.0.clone())
    }

    /// Returns the instrumented handle for a raw view. `obj.raw()` and
    /// `Obj::from_raw(&obj.raw())` point at the same object.
    pub fn from_raw(raw: &RawObj) -> Obj {
        Obj(raw.0.clone())
    }

    /// Registers a raw change handler, invoked synchronously on every actual
    /// mutation of this object.
    pub fn observe(&self, f: impl Fn(&ObjChange) + 'static) -> Subscription {
        let key = self.0.observers.insert(f);
        Subscription::from_rc_fn(self.0.clone(), move |node| node.observers.remove(key))
    }

    /// Untracked snapshot as a JSON tree. Computed fields snapshot their
    /// current value; callable fields are skipped.
    pub fn to_json(&self) -> serde_json::Value {
        crate::untracked(|| {
            let snapshot: Vec<(Rc<str>, Option<Value>)> = self
                .0
                .fields
                .borrow()
                .iter()
                .map(|(key, slot)| {
                    let value = match slot {
                        FieldValue::Data(Value::Func(_)) | FieldValue::Action(_) => None,
                        FieldValue::Data(v) => Some(v.clone()),
                        FieldValue::Computed(c) => Some(c.get_untracked()),
                    };
                    (key.clone(), value)
                })
                .collect();
            let mut out = serde_json::Map::new();
            for (key, value) in snapshot {
                if let Some(value) = value {
                    out.insert(key.to_string(), value.to_json_untracked());
                }
            }
            serde_json::Value::Object(out)
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set_field_depth(&self, key: &str, depth: Depth) {
        self.0.depth_overrides.borrow_mut().insert(key.into(), depth);
    }

    /// Replaces a field holding a plain function with a computed field whose
    /// getter invokes that function on this object.
    pub(crate) fn define_computed(&self, key: &str) {
        let getter = {
            let fields = self.0.fields.borrow();
            match fields.get(key) {
                Some(FieldValue::Data(Value::Func(f))) => f.clone(),
                _ => return,
            }
        };
        self.set_computed_with(key, move |obj| getter.call(obj, &[]));
    }

    /// Installs a computed field evaluating `f` against this object.
    pub(crate) fn set_computed_with(&self, key: &str, f: impl Fn(&Obj) -> Value + 'static) {
        let weak = Rc::downgrade(&self.0);
        let computed = Computed::new(move || match weak.upgrade() {
            Some(node) => f(&Obj(node)),
            None => Value::Null,
        });
        let key: Rc<str> = key.into();
        let fresh = !self.0.fields.borrow().contains_key(&key);
        self.0
            .fields
            .borrow_mut()
            .insert(key.clone(), FieldValue::Computed(computed));
        with_batch(|| {
            self.atom(&key).notify();
            if fresh {
                self.0.keys_atom.notify();
            }
        });
    }

    /// Marks a field holding a plain function as an action: calls through
    /// [`call`](Self::call) run inside a batch scope.
    pub(crate) fn define_action(&self, key: &str) {
        let mut fields = self.0.fields.borrow_mut();
        if let Some(slot) = fields.get_mut(key) {
            if let FieldValue::Data(Value::Func(f)) = slot {
                *slot = FieldValue::Action(f.clone());
            }
        }
    }

    /// Wraps the current field value in a box, so later writes store into
    /// the box and reads return the box itself.
    pub(crate) fn box_field(&self, key: &str) {
        let mut fields = self.0.fields.borrow_mut();
        match fields.get_mut(key) {
            Some(FieldValue::Data(v)) if !matches!(v, Value::Box(_)) => {
                *v = Value::Box(BoxValue::new(std::mem::take(v)));
            }
            Some(_) => {}
            None => {
                fields.insert(key.into(), FieldValue::Data(Value::Box(BoxValue::new(Value::Null))));
            }
        }
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Obj {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Obj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = match self.0.fields.try_borrow() {
            Ok(fields) => fields,
            Err(_) => return write!(f, "<borrowed>"),
        };
        let mut map = f.debug_map();
        for (key, slot) in fields.iter() {
            match slot {
                FieldValue::Data(v) => map.entry(&key, v),
                FieldValue::Computed(_) => map.entry(&key, &"<computed>"),
                FieldValue::Action(_) => map.entry(&key, &"<action>"),
            };
        }
        map.finish()
    }
}

impl Serialize for Obj {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Un-instrumented view of an [`Obj`]. Operations touch the same storage
/// but never register edges, never notify consumers, and never convert
/// written values.
#[derive_ex(Clone)]
pub struct RawObj(Rc<ObjNode>);

impl RawObj {
    pub fn get(&self, key: &str) -> Value {
        match self.0.fields.borrow().get(key) {
            Some(FieldValue::Data(v)) => v.clone(),
            Some(FieldValue::Computed(c)) => c.get_untracked(),
            Some(FieldValue::Action(f)) => Value::Func(f.clone()),
            None => Value::Null,
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        self.0
            .fields
            .borrow_mut()
            .insert(key.into(), FieldValue::Data(value));
    }

    pub fn delete(&self, key: &str) -> bool {
        self.0.fields.borrow_mut().shift_remove(key).is_some()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for RawObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Raw")?;
        std::fmt::Debug::fmt(&Obj(self.0.clone()), f)
    }
}

/// Change event delivered to [`Arr::observe`] handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrChange {
    Set { index: usize, old: Value, value: Value },
    Insert { index: usize, value: Value },
    Remove { index: usize, old: Value },
    Clear,
}

/// A reactive array of [`Value`]s.
///
/// Element reads register a dependency per index; structural changes notify
/// the length and iteration keys plus every shifted index. Handles are
/// shared, like [`Obj`].
#[derive_ex(Clone)]
pub struct Arr(Rc<ArrNode>);

struct ArrNode {
    items: RefCell<Vec<Value>>,
    atoms: RefCell<Vec<Rc<Atom>>>,
    len_atom: Rc<Atom>,
    iteration: Rc<Atom>,
    observers: Observers<ArrChange>,
    default_depth: Depth,
}

impl Arr {
    pub fn new() -> Self {
        Self::with_depth(Depth::Deep)
    }

    pub(crate) fn with_depth(default_depth: Depth) -> Self {
        Self(Rc::new(ArrNode {
            items: RefCell::new(Vec::new()),
            atoms: RefCell::new(Vec::new()),
            len_atom: Atom::new(),
            iteration: Atom::new(),
            observers: Observers::new(),
            default_depth,
        }))
    }

    pub fn from_iter(items: impl IntoIterator<Item = Value>) -> Self {
        let arr = Self::new();
        arr.0.items.borrow_mut().extend(items);
        arr
    }

    fn index_atom(&self, index: usize) -> Rc<Atom> {
        let mut atoms = self.0.atoms.borrow_mut();
        while atoms.len() <= index {
            atoms.push(Atom::new());
        }
        atoms[index].clone()
    }

    fn convert(&self, value: Value) -> Value {
        match self.0.default_depth {
            Depth::Deep => observable(value),
            Depth::Shallow => observable_shallow(value),
            Depth::Ref => value,
        }
    }

    /// Reads the element at `index`, registering a dependency on it. An
    /// out-of-bounds read registers a dependency on the length instead, so
    /// the consumer re-runs when the array grows.
    pub fn get(&self, index: usize) -> Option<Value> {
        let items = self.0.items.borrow();
        if index < items.len() {
            let value = items[index].clone();
            drop(items);
            self.index_atom(index).track();
            Some(value)
        } else {
            drop(items);
            self.0.len_atom.track();
            None
        }
    }

    pub fn len(&self) -> usize {
        self.0.len_atom.track();
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the element at `index`. Writing an equal value or writing
    /// out of bounds is a no-op.
    pub fn set(&self, index: usize, value: Value) {
        let value = self.convert(value);
        let old = {
            let mut items = self.0.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) if *slot == value => return,
                Some(slot) => std::mem::replace(slot, value.clone()),
                None => return,
            }
        };
        self.0.observers.emit(&ArrChange::Set { index, old, value });
        self.index_atom(index).notify();
    }

    pub fn push(&self, value: Value) {
        let value = self.convert(value);
        let index = {
            let mut items = self.0.items.borrow_mut();
            items.push(value.clone());
            items.len() - 1
        };
        self.0.observers.emit(&ArrChange::Insert { index, value });
        with_batch(|| {
            self.index_atom(index).notify();
            self.0.len_atom.notify();
            self.0.iteration.notify();
        });
    }

    pub fn pop(&self) -> Option<Value> {
        let (index, old) = {
            let mut items = self.0.items.borrow_mut();
            let old = items.pop()?;
            (items.len(), old)
        };
        self.0.observers.emit(&ArrChange::Remove {
            index,
            old: old.clone(),
        });
        with_batch(|| {
            self.index_atom(index).notify();
            self.0.len_atom.notify();
            self.0.iteration.notify();
        });
        Some(old)
    }

    /// Inserts at `index`, shifting later elements. Inserting past the end
    /// is a no-op.
    pub fn insert(&self, index: usize, value: Value) {
        let value = self.convert(value);
        let end = {
            let mut items = self.0.items.borrow_mut();
            if index > items.len() {
                return;
            }
            items.insert(index, value.clone());
            items.len()
        };
        self.0.observers.emit(&ArrChange::Insert { index, value });
        with_batch(|| {
            // every element from the insertion point shifted
            for i in index..end {
                self.index_atom(i).notify();
            }
            self.0.len_atom.notify();
            self.0.iteration.notify();
        });
    }

    /// Removes the element at `index`, shifting later elements. Removing out
    /// of bounds is a no-op.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let (old, end) = {
            let mut items = self.0.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            let old = items.remove(index);
            (old, items.len() + 1)
        };
        self.0.observers.emit(&ArrChange::Remove {
            index,
            old: old.clone(),
        });
        with_batch(|| {
            for i in index..end {
                self.index_atom(i).notify();
            }
            self.0.len_atom.notify();
            self.0.iteration.notify();
        });
        Some(old)
    }

    /// Removes every element. Clearing an empty array is a no-op.
    pub fn clear(&self) {
        let end = {
            let mut items = self.0.items.borrow_mut();
            if items.is_empty() {
                return;
            }
            let end = items.len();
            items.clear();
            end
        };
        self.0.observers.emit(&ArrChange::Clear);
        with_batch(|| {
            for i in 0..end {
                self.index_atom(i).notify();
            }
            self.0.len_atom.notify();
            self.0.iteration.notify();
        });
    }

    /// Snapshot of the elements. Registers dependencies on the iteration key
    /// and on every index.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.iteration.track();
        let snapshot: Vec<Value> = self.0.items.borrow().clone();
        for i in 0..snapshot.len() {
            self.index_atom(i).track();
        }
        snapshot
    }

    /// Calls `f` for every element. Tracks like [`to_vec`](Self::to_vec).
    pub fn for_each(&self, mut f: impl FnMut(usize, &Value)) {
        for (i, value) in self.to_vec().iter().enumerate() {
            f(i, value);
        }
    }

    /// Returns the un-instrumented view of this array.
    pub fn raw(&self) -> RawArr {
        RawArr(self.0.clone())
    }

    pub fn from_raw(raw: &RawArr) -> Arr {
        Arr(raw.0.clone())
    }

    /// Registers a raw change handler, invoked synchronously on every actual
    /// mutation of this array.
    pub fn observe(&self, f: impl Fn(&ArrChange) + 'static) -> Subscription {
        let key = self.0.observers.insert(f);
        Subscription::from_rc_fn(self.0.clone(), move |node| node.observers.remove(key))
    }

    /// Untracked snapshot as a JSON tree.
    pub fn to_json(&self) -> serde_json::Value {
        crate::untracked(|| {
            let snapshot: Vec<Value> = self.0.items.borrow().clone();
            serde_json::Value::Array(snapshot.iter().map(|v| v.to_json_untracked()).collect())
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Arr {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Arr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Arr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.items.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

impl Serialize for Arr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Un-instrumented view of an [`Arr`].
#[derive_ex(Clone)]
pub struct RawArr(Rc<ArrNode>);

impl RawArr {
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) {
        if let Some(slot) = self.0.items.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    pub fn push(&self, value: Value) {
        self.0.items.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for RawArr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Raw")?;
        std::fmt::Debug::fmt(&Arr(self.0.clone()), f)
    }
}

thread_local! {
    // identity cache for wrapped raw trees; guarantees each raw handle is
    // wrapped at most once and terminates on shared subtrees
    static WRAP_CACHE: RefCell<HashMap<usize, CachedWrap>> = RefCell::new(HashMap::new());
}

enum CachedWrap {
    Obj(Weak<ObjNode>),
    Arr(Weak<ArrNode>),
}

fn cached_wrap(key: usize) -> Option<Value> {
    WRAP_CACHE.with(|cache| match cache.borrow().get(&key)? {
        CachedWrap::Obj(node) => node.upgrade().map(|n| Value::Obj(Obj(n))),
        CachedWrap::Arr(node) => node.upgrade().map(|n| Value::Arr(Arr(n))),
    })
}

fn cache_wrap(key: usize, wrapped: &Value) {
    WRAP_CACHE.with(|cache| {
        let entry = match wrapped {
            Value::Obj(o) => CachedWrap::Obj(Rc::downgrade(&o.0)),
            Value::Arr(a) => CachedWrap::Arr(Rc::downgrade(&a.0)),
            _ => return,
        };
        cache.borrow_mut().insert(key, entry);
    });
}

/// Wraps a value for deep reactivity.
///
/// Raw JSON trees become reactive containers recursively. Values that are
/// already reactive ([`Obj`], [`Arr`], [`BoxValue`]) are returned as-is, so
/// wrapping is idempotent. Primitives and functions pass through unchanged.
/// The same raw handle always wraps to the same container.
pub fn observable(value: Value) -> Value {
    match value {
        Value::Raw(raw) => {
            let key = Rc::as_ptr(&raw.0) as usize;
            if let Some(wrapped) = cached_wrap(key) {
                return wrapped;
            }
            let wrapped = Value::from_json(raw.get());
            cache_wrap(key, &wrapped);
            wrapped
        }
        other => other,
    }
}

/// Wraps a value for shallow reactivity: only the top level of a raw tree
/// becomes a reactive container; nested objects and arrays stay raw.
pub fn observable_shallow(value: Value) -> Value {
    match value {
        Value::Raw(raw) => {
            let key = Rc::as_ptr(&raw.0) as usize;
            if let Some(wrapped) = cached_wrap(key) {
                return wrapped;
            }
            let wrapped = match raw.get() {
                serde_json::Value::Object(fields) => {
                    let obj = Obj::with_depth(Depth::Shallow);
                    for (field, value) in fields {
                        obj.raw().set(&field, shallow_value(value));
                    }
                    Value::Obj(obj)
                }
                serde_json::Value::Array(items) => {
                    let arr = Arr::with_depth(Depth::Shallow);
                    for value in items {
                        arr.raw().push(shallow_value(value));
                    }
                    Value::Arr(arr)
                }
                other => Value::from_json(other),
            };
            cache_wrap(key, &wrapped);
            wrapped
        }
        other => other,
    }
}

fn shallow_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => Value::raw(json),
        other => Value::from_json(other),
    }
}
