use std::{any::Any, mem::take, rc::Rc};

/// Handle for a registered consumer or change handler.
///
/// Dropping the subscription disposes it: the consumer is unbound from every
/// dependency edge and is never invoked again.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
    pub(crate) fn from_rc_fn<T: 'static>(
        this: Rc<T>,
        unsubscribe: impl Fn(Rc<T>) + Copy + 'static,
    ) -> Self {
        Subscription(RawSubscription::RcFn {
            this,
            unsubscribe: Box::new(move |this| unsubscribe(this.downcast().unwrap())),
        })
    }

    /// Disposes immediately. Equivalent to dropping the subscription.
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::RcFn { this, unsubscribe } => unsubscribe(this),
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    RcFn {
        this: Rc<dyn Any>,
        unsubscribe: Box<dyn Fn(Rc<dyn Any>)>,
    },
}
