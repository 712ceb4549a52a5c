//! Typed reactive containers.
//!
//! Each container owns its backing collection and instruments every
//! operation: reads register fine-grained dependency edges (per key, per
//! element, or on the iteration key), mutations notify exactly what changed,
//! and no-op mutations notify nothing.

pub mod map;
pub mod set;
pub mod weak_map;
pub mod weak_set;

pub use map::{MapChange, ReactiveMap};
pub use set::{ReactiveSet, SetChange};
pub use weak_map::ReactiveWeakMap;
pub use weak_set::ReactiveWeakSet;
