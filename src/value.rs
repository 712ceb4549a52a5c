use std::{cell::RefCell, rc::Rc};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    object::{Arr, Obj},
    Signal,
};

#[cfg(test)]
mod tests;

/// A dynamically typed value held by reactive objects and arrays.
///
/// Containers ([`Obj`], [`Arr`], [`BoxValue`], [`RawValue`]) are shared
/// handles and compare by identity; primitives compare by value. [`Func`]
/// values are opaque callables, compared by identity and skipped when
/// serializing.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Obj(Obj),
    Arr(Arr),
    Box(BoxValue),
    Func(Func),
    Raw(RawValue),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(s.as_ref().into())
    }

    /// Wraps a plain JSON tree as an un-instrumented value. Reads and writes
    /// of its contents are never tracked until it is passed through
    /// [`observable`](crate::observable).
    pub fn raw(json: serde_json::Value) -> Self {
        Value::Raw(RawValue::new(json))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&Obj> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&Arr> {
        match self {
            Value::Arr(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Deeply converts a JSON tree into reactive containers: JSON objects
    /// become [`Obj`], JSON arrays become [`Arr`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(n) = n.as_i64() {
                    Value::Int(n)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.into()),
            serde_json::Value::Array(items) => {
                Value::Arr(Arr::from_iter(items.into_iter().map(Value::from_json)))
            }
            serde_json::Value::Object(fields) => {
                let obj = Obj::new();
                for (key, value) in fields {
                    obj.set(&key, Value::from_json(value));
                }
                Value::Obj(obj)
            }
        }
    }

    /// Untracked snapshot of this value as a JSON tree.
    ///
    /// Functions and action fields serialize as `null`; boxes serialize as
    /// their contents.
    pub fn to_json(&self) -> serde_json::Value {
        crate::untracked(|| self.to_json_untracked())
    }

    pub(crate) fn to_json_untracked(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Func(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Obj(o) => o.to_json(),
            Value::Arr(a) => a.to_json(),
            Value::Box(b) => b.get().to_json_untracked(),
            Value::Raw(r) => r.0.borrow().clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a == b,
            (Value::Arr(a), Value::Arr(b)) => a.ptr_eq(b),
            (Value::Box(a), Value::Box(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Raw(a), Value::Raw(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => b.fmt(f),
            Value::Int(n) => n.fmt(f),
            Value::Float(n) => n.fmt(f),
            Value::Str(s) => s.fmt(f),
            Value::Obj(o) => o.fmt(f),
            Value::Arr(a) => a.fmt(f),
            Value::Box(b) => f.debug_tuple("Box").field(&*b.0.borrow_untracked()).finish(),
            Value::Func(_) => write!(f, "<func>"),
            Value::Raw(r) => f.debug_tuple("Raw").field(&*r.0.borrow()).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}
impl From<Obj> for Value {
    fn from(v: Obj) -> Self {
        Value::Obj(v)
    }
}
impl From<Arr> for Value {
    fn from(v: Arr) -> Self {
        Value::Arr(v)
    }
}
impl From<Func> for Value {
    fn from(v: Func) -> Self {
        Value::Func(v)
    }
}
impl From<BoxValue> for Value {
    fn from(v: BoxValue) -> Self {
        Value::Box(v)
    }
}
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(v)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

/// An opaque callable value.
///
/// Receives the object it is invoked on and the call arguments. Compared by
/// identity.
#[derive_ex(Clone)]
pub struct Func(Rc<dyn Fn(&Obj, &[Value]) -> Value>);

impl Func {
    pub fn new(f: impl Fn(&Obj, &[Value]) -> Value + 'static) -> Self {
        Func(Rc::new(f))
    }

    pub fn call(&self, this: &Obj, args: &[Value]) -> Value {
        (self.0)(this, args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        // compare data pointers only; vtable addresses are not stable
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const u8,
            Rc::as_ptr(&other.0) as *const u8,
        )
    }
}

impl std::fmt::Debug for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<func>")
    }
}

/// The box form of an observable: a reactive cell for a single [`Value`],
/// for leaves that are not containers themselves.
#[derive_ex(Clone)]
pub struct BoxValue(Signal<Value>);

impl BoxValue {
    pub fn new(value: Value) -> Self {
        BoxValue(Signal::new(value))
    }

    /// Reads the boxed value, registering a dependency on the box.
    pub fn get(&self) -> Value {
        self.0.get()
    }

    /// Replaces the boxed value. Writing an equal value notifies nothing.
    pub fn set(&self, value: Value) {
        self.0.set(value);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl std::fmt::Debug for BoxValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxValue").field(&self.0).finish()
    }
}

/// A shared, un-instrumented JSON tree.
///
/// Reads and writes through a `RawValue` are never tracked and never notify.
/// Passing one to [`observable`](crate::observable) wraps the same tree in
/// reactive containers; the wrap is idempotent per tree.
#[derive_ex(Clone)]
pub struct RawValue(pub(crate) Rc<RefCell<serde_json::Value>>);

impl RawValue {
    pub fn new(json: serde_json::Value) -> Self {
        RawValue(Rc::new(RefCell::new(json)))
    }

    pub fn get(&self) -> serde_json::Value {
        self.0.borrow().clone()
    }

    pub fn set(&self, json: serde_json::Value) {
        *self.0.borrow_mut() = json;
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RawValue").field(&*self.0.borrow()).finish()
    }
}
