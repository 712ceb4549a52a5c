use crate::core::with_batch;

#[cfg(test)]
mod tests;

/// Runs `f` in a transaction: all change notifications produced inside are
/// deferred, and at the outermost exit each affected consumer re-runs at
/// most once, observing only the final post-batch state.
///
/// Nested calls flatten; only the outermost exit flushes.
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_batch(f)
}

/// Alias of [`batch`], under the annotation-facing name.
pub fn action<T>(f: impl FnOnce() -> T) -> T {
    with_batch(f)
}

/// Wraps a closure so that every call runs inside [`batch`].
pub fn create_action(mut f: impl FnMut() + 'static) -> impl FnMut() {
    move || with_batch(&mut f)
}
