use crate::{
    object::{observable, observable_shallow, Depth, Obj},
    value::{Func, Value},
};

#[cfg(test)]
mod tests;

/// Per-field reactivity annotation, applied by [`define`] and
/// [`make_observable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// Deep reactivity (the default for plain fields).
    Observable,
    /// Top-level reactivity only; nested trees stay raw.
    Shallow,
    /// The value is an opaque reference; replacement is the only tracked
    /// change.
    Ref,
    /// The field value is wrapped in a box; writes store into the box.
    Boxed,
    /// The field holds a getter function; reads evaluate it with caching
    /// and dependency tracking.
    Computed,
    /// The field holds a function; calls run inside a batch scope.
    Action,
}

/// Instruments an object's fields according to an annotation map.
///
/// Non-object targets (primitives, functions, arrays, raw non-object trees)
/// are returned unchanged. A raw object tree is wrapped first, then
/// annotated.
pub fn define(target: Value, annotations: &[(&str, Annotation)]) -> Value {
    let wrapped = match &target {
        Value::Obj(_) => target,
        Value::Raw(raw) if raw.get().is_object() => observable(target),
        _ => return target,
    };
    if let Value::Obj(obj) = &wrapped {
        make_observable(obj, annotations);
    }
    wrapped
}

/// Applies annotations to an existing reactive object, field by field.
///
/// Fields already holding values are converted in place without notifying;
/// the annotation then governs every later write.
pub fn make_observable(obj: &Obj, annotations: &[(&str, Annotation)]) {
    for &(key, annotation) in annotations {
        match annotation {
            Annotation::Observable => {
                obj.set_field_depth(key, Depth::Deep);
                rewrap(obj, key, observable);
            }
            Annotation::Shallow => {
                obj.set_field_depth(key, Depth::Shallow);
                rewrap(obj, key, observable_shallow);
            }
            Annotation::Ref => {
                obj.set_field_depth(key, Depth::Ref);
            }
            Annotation::Boxed => {
                obj.box_field(key);
            }
            Annotation::Computed => {
                obj.define_computed(key);
            }
            Annotation::Action => {
                obj.define_action(key);
            }
        }
    }
}

// conversion during definition is silent; the annotation map describes the
// intended initial shape, not a mutation
fn rewrap(obj: &Obj, key: &str, wrap: fn(Value) -> Value) {
    let raw = obj.raw();
    let value = raw.get(key);
    if matches!(value, Value::Raw(_)) {
        raw.set(key, wrap(value));
    }
}

/// Convenience form of [`define`]: every data field becomes deeply
/// observable and every function field becomes an action.
pub fn model(target: Value) -> Value {
    let wrapped = match &target {
        Value::Obj(_) => target,
        Value::Raw(raw) if raw.get().is_object() => observable(target),
        _ => return target,
    };
    if let Value::Obj(obj) = &wrapped {
        for key in obj.raw().keys() {
            if matches!(obj.raw().get(&key), Value::Func(_)) {
                obj.define_action(&key);
            } else {
                obj.set_field_depth(&key, Depth::Deep);
                rewrap(obj, &key, observable);
            }
        }
    }
    wrapped
}

/// Declarative construction of an annotated reactive object, the
/// class-with-decorated-fields counterpart.
///
/// ```
/// use eficy_reactive::{Obj, Value};
///
/// let counter = Obj::builder()
///     .field("count", 0)
///     .computed("double", |this| {
///         Value::Int(this.get("count").as_int().unwrap_or(0) * 2)
///     })
///     .action("increment", |this, _args| {
///         let n = this.get("count").as_int().unwrap_or(0);
///         this.set("count", Value::Int(n + 1));
///         Value::Null
///     })
///     .build();
/// ```
pub struct ObjectBuilder {
    obj: Obj,
}

impl ObjectBuilder {
    pub(crate) fn new() -> Self {
        Self { obj: Obj::new() }
    }

    /// Adds a deeply observable data field.
    pub fn field(self, key: &str, value: impl Into<Value>) -> Self {
        self.obj.set(key, value.into());
        self
    }

    /// Adds a shallowly observable field.
    pub fn shallow(self, key: &str, value: impl Into<Value>) -> Self {
        self.obj.set_field_depth(key, Depth::Shallow);
        self.obj.set(key, value.into());
        self
    }

    /// Adds an opaque-reference field.
    pub fn reference(self, key: &str, value: impl Into<Value>) -> Self {
        self.obj.set_field_depth(key, Depth::Ref);
        self.obj.set(key, value.into());
        self
    }

    /// Adds a boxed field.
    pub fn boxed(self, key: &str, value: impl Into<Value>) -> Self {
        self.obj.set(key, value.into());
        self.obj.box_field(key);
        self
    }

    /// Adds a computed field evaluating `f` against the object.
    pub fn computed(self, key: &str, f: impl Fn(&Obj) -> Value + 'static) -> Self {
        self.obj.set_computed_with(key, f);
        self
    }

    /// Adds an action field; calls through [`Obj::call`] run in a batch.
    pub fn action(self, key: &str, f: impl Fn(&Obj, &[Value]) -> Value + 'static) -> Self {
        self.obj.set(key, Value::Func(Func::new(f)));
        self.obj.define_action(key);
        self
    }

    pub fn build(self) -> Obj {
        self.obj
    }
}
