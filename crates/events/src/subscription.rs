//! Cancellable subscription handle.
//!
//! A realtime feed hands one of these back from every `subscribe` call. Cancelling it
//! detaches the listener; no further callbacks are delivered afterwards.
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let handle = documents.subscribe(collection, query, on_change);
//! // ...
//! handle.unsubscribe(); // or simply drop it
//! ```
//!
//! ## Drop semantics
//!
//! Dropping a handle cancels it. Keep the handle alive for as long as the feed should keep
//! delivering; call [`SubscriptionHandle::detach`] to deliberately leak a listener for the
//! lifetime of its source.

type CancelFn = Box<dyn FnOnce() + Send>;

pub struct SubscriptionHandle {
    cancel: Option<CancelFn>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel (e.g. a feed that failed to attach).
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Tear down the subscription.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Keep the listener attached for the lifetime of its source.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl core::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unsubscribe_runs_cancel_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let handle = SubscriptionHandle::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        handle.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_cancels_but_detach_does_not() {
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        drop(SubscriptionHandle::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let c = calls.clone();
        SubscriptionHandle::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .detach();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_handle_is_inactive() {
        assert!(!SubscriptionHandle::noop().is_active());
    }
}
