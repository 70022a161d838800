//! In-memory listener registry with broadcast fan-out.

use std::sync::{Arc, Mutex, Weak};

use crate::subscription::SubscriptionHandle;

/// Listener callback for a broadcast feed.
pub type Callback<M> = Arc<dyn Fn(M) + Send + Sync>;

struct Inner<L> {
    next_id: u64,
    listeners: Vec<(u64, L)>,
}

/// Registry of live listeners.
///
/// - No IO / no async
/// - Registration order is delivery order
/// - Listeners are invoked **outside** the registry lock, so a callback may subscribe,
///   unsubscribe or read the source that is notifying it
///
/// Cloning yields another handle to the same registry.
pub struct ListenerRegistry<L> {
    inner: Arc<Mutex<Inner<L>>>,
}

impl<L> Clone for ListenerRegistry<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<L> ListenerRegistry<L>
where
    L: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; the returned handle removes it again.
    pub fn register(&self, listener: L) -> SubscriptionHandle {
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.listeners.push((id, listener));
                id
            }
            Err(_) => {
                // A poisoned registry never delivers again; hand back an inert handle.
                tracing::error!("listener registry lock poisoned; listener not registered");
                return SubscriptionHandle::noop();
            }
        };

        let weak: Weak<Mutex<Inner<L>>> = Arc::downgrade(&self.inner);
        SubscriptionHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.listeners.retain(|(lid, _)| *lid != id);
                }
            }
        })
    }

    /// Clone out the current listeners in registration order.
    pub fn snapshot(&self) -> Vec<L> {
        match self.inner.lock() {
            Ok(inner) => inner.listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.listeners.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M> ListenerRegistry<Callback<M>>
where
    M: Clone + 'static,
{
    /// Deliver `message` to every listener registered at the time of the call.
    pub fn publish(&self, message: M) {
        for listener in self.snapshot() {
            listener(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, Callback<u32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb: Callback<u32> = Arc::new(move |m| sink.lock().unwrap().push(m));
        (seen, cb)
    }

    #[test]
    fn publish_fans_out_in_order() {
        let registry: ListenerRegistry<Callback<u32>> = ListenerRegistry::new();
        let (a, cb_a) = recorder();
        let (b, cb_b) = recorder();
        let _ha = registry.register(cb_a);
        let _hb = registry.register(cb_b);

        registry.publish(1);
        registry.publish(2);

        assert_eq!(*a.lock().unwrap(), vec![1, 2]);
        assert_eq!(*b.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let registry: ListenerRegistry<Callback<u32>> = ListenerRegistry::new();
        let (seen, cb) = recorder();
        let handle = registry.register(cb);

        registry.publish(1);
        handle.unsubscribe();
        registry.publish(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(registry.is_empty());
    }

    #[test]
    fn listener_may_unsubscribe_others_during_publish() {
        let registry: ListenerRegistry<Callback<u32>> = ListenerRegistry::new();
        let (seen, cb) = recorder();
        let victim = Arc::new(Mutex::new(Some(registry.register(cb))));

        let v = victim.clone();
        let _killer = registry.register(Arc::new(move |_| {
            if let Some(h) = v.lock().unwrap().take() {
                h.unsubscribe();
            }
        }));

        registry.publish(1);
        registry.publish(2);

        // The victim was in the snapshot of the first publish only.
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let registry: ListenerRegistry<Callback<u32>> = ListenerRegistry::new();
        let (_, cb) = recorder();
        let handle = registry.register(cb);
        drop(registry);
        handle.unsubscribe();
    }
}
