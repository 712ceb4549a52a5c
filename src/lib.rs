mod action;
mod collections;
mod computed;
mod core;
mod effect;
mod model;
mod object;
mod observe;
mod signal;
mod subscription;
mod value;

pub use action::{action, batch, create_action};
pub use collections::{
    MapChange, ReactiveMap, ReactiveSet, ReactiveWeakMap, ReactiveWeakSet, SetChange,
};
pub use computed::{computed, Computed};
pub use crate::core::{untracked, CyclicError};
pub use effect::{autorun, effect, watch};
pub use model::{define, make_observable, model, Annotation, ObjectBuilder};
pub use object::{
    observable, observable_shallow, Arr, ArrChange, Obj, ObjChange, RawArr, RawObj,
};
pub use signal::{signal, Signal};
pub use subscription::Subscription;
pub use value::{BoxValue, Func, RawValue, Value};
