//! Realtime catalog feed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use storefront_backend::{
    BackendError, Direction, Document, DocumentStore, FeedCallback, Query, StoreContext,
};
use storefront_events::SubscriptionHandle;

use crate::product::Product;
use crate::snapshot::SharedCatalog;

/// One catalog delivery: the full product list, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUpdate {
    pub revision: u64,
    pub products: Vec<Product>,
}

pub type CatalogCallback = Arc<dyn Fn(CatalogUpdate) + Send + Sync>;

struct SyncInner {
    documents: Arc<dyn DocumentStore>,
    collection: String,
    catalog: SharedCatalog,
    next_id: AtomicU64,
    /// Id of the subscription allowed to deliver; 0 means none.
    current: AtomicU64,
    active: Mutex<Option<SubscriptionHandle>>,
}

impl SyncInner {
    fn deliver(&self, id: u64, result: Result<Vec<Document>, BackendError>, on_change: &CatalogCallback) {
        if self.current.load(Ordering::SeqCst) != id {
            tracing::debug!(subscription = id, "dropping delivery from a replaced catalog feed");
            return;
        }
        let docs = match result {
            Ok(docs) => docs,
            Err(err) => {
                tracing::error!(error = %err, collection = %self.collection, "catalog feed failed");
                return;
            }
        };

        let mut products = Vec::with_capacity(docs.len());
        for doc in docs {
            let doc_id = doc.id.clone();
            match Product::from_document(doc) {
                Ok(product) => products.push(product),
                Err(err) => {
                    tracing::warn!(document = %doc_id, error = %err, "skipping malformed product")
                }
            }
        }

        let revision = self.catalog.replace(products.clone());
        tracing::info!(revision, products = products.len(), "catalog snapshot delivered");
        on_change(CatalogUpdate { revision, products });
    }

    fn teardown(&self) {
        self.current.store(0, Ordering::SeqCst);
        let previous = match self.active.lock() {
            Ok(mut active) => active.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = previous {
            handle.unsubscribe();
        }
    }
}

/// Keeps the shared catalog snapshot in step with the products collection.
///
/// At most one feed is live per `CatalogSync`: subscribing again tears down the previous feed
/// first. The feed is ordered by `createdAt`, newest first; products still waiting for their
/// server timestamp are left out until the commit time is known.
pub struct CatalogSync {
    inner: Arc<SyncInner>,
}

/// Receipt for [`CatalogSync::subscribe`].
///
/// The feed belongs to the `CatalogSync`, so dropping this value does not stop it.
#[derive(Debug, Clone)]
pub struct CatalogSubscription {
    id: u64,
    inner: std::sync::Weak<SyncInner>,
}

impl CatalogSubscription {
    /// Stop the feed if it is still the live one. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            if inner.current.load(Ordering::SeqCst) == self.id {
                inner.teardown();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.current.load(Ordering::SeqCst) == self.id)
    }
}

impl core::fmt::Debug for SyncInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogSync")
            .field("collection", &self.collection)
            .field("current", &self.current.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl core::fmt::Debug for CatalogSync {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.inner, f)
    }
}

impl CatalogSync {
    pub fn new(ctx: &StoreContext, catalog: SharedCatalog) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                documents: ctx.documents.clone(),
                collection: ctx.config.products_collection.clone(),
                catalog,
                next_id: AtomicU64::new(1),
                current: AtomicU64::new(0),
                active: Mutex::new(None),
            }),
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.inner.catalog
    }

    /// Open the realtime feed. `on_change` receives the current catalog immediately and again
    /// after every change.
    pub fn subscribe(&self, on_change: CatalogCallback) -> CatalogSubscription {
        self.inner.teardown();

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.current.store(id, Ordering::SeqCst);

        let weak = Arc::downgrade(&self.inner);
        let feed: FeedCallback = Arc::new(move |result| {
            if let Some(inner) = weak.upgrade() {
                inner.deliver(id, result, &on_change);
            }
        });

        tracing::debug!(subscription = id, collection = %self.inner.collection, "opening catalog feed");
        let query = Query::new().order_by("createdAt", Direction::Descending);
        let handle = self
            .inner
            .documents
            .subscribe(&self.inner.collection, query, feed);

        match self.inner.active.lock() {
            Ok(mut active) => *active = Some(handle),
            Err(poisoned) => *poisoned.into_inner() = Some(handle),
        }

        CatalogSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Stop whichever feed is live.
    pub fn unsubscribe(&self) {
        self.inner.teardown();
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.current.load(Ordering::SeqCst) != 0
    }
}

impl Drop for CatalogSync {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use storefront_backend::{InMemoryBackend, server_timestamp};
    use storefront_core::{ProductId, StoreConfig};

    fn rec(v: Value) -> storefront_backend::Record {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<CatalogUpdate>>>, CatalogCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |u| sink.lock().unwrap().push(u)))
    }

    #[tokio::test]
    async fn delivers_newest_first_and_tracks_changes() {
        let backend = InMemoryBackend::new();
        let ctx = backend.context(StoreConfig::default());
        backend
            .documents
            .set("products", "old", rec(json!({"name": "Old", "price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();

        let sync = CatalogSync::new(&ctx, SharedCatalog::new());
        let (seen, cb) = recorder();
        let _sub = sync.subscribe(cb);

        backend
            .documents
            .set("products", "new", rec(json!({"name": "New", "price": "2", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].products.len(), 1);
        let ids: Vec<_> = seen[1].products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(sync.catalog().current().revision(), seen[1].revision);
        assert!(sync.catalog().find(&ProductId::from("new")).is_some());
    }

    #[tokio::test]
    async fn resubscribing_replaces_the_previous_feed() {
        let backend = InMemoryBackend::new();
        let ctx = backend.context(StoreConfig::default());
        let sync = CatalogSync::new(&ctx, SharedCatalog::new());

        let (first, cb1) = recorder();
        let sub1 = sync.subscribe(cb1);
        let (second, cb2) = recorder();
        let _sub2 = sync.subscribe(cb2);

        assert!(!sub1.is_active());
        assert_eq!(backend.documents.feed_count(), 1);

        backend
            .documents
            .set("products", "p", rec(json!({"name": "P", "price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();

        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 2);

        // A stale receipt cannot tear down the live feed.
        sub1.unsubscribe();
        assert!(sync.is_subscribed());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let backend = InMemoryBackend::new();
        let ctx = backend.context(StoreConfig::default());
        let sync = CatalogSync::new(&ctx, SharedCatalog::new());
        let (seen, cb) = recorder();
        let sub = sync.subscribe(cb);

        sub.unsubscribe();
        sub.unsubscribe();
        backend
            .documents
            .set("products", "p", rec(json!({"name": "P", "price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(backend.documents.feed_count(), 0);
        assert!(!sync.is_subscribed());
    }

    #[tokio::test]
    async fn feed_errors_keep_the_previous_snapshot() {
        let backend = InMemoryBackend::new();
        let ctx = backend.context(StoreConfig::default());
        backend
            .documents
            .set("products", "a", rec(json!({"name": "A", "price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();
        let sync = CatalogSync::new(&ctx, SharedCatalog::new());
        let (seen, cb) = recorder();
        let _sub = sync.subscribe(cb);

        backend
            .documents
            .break_feed("products", BackendError::PermissionDenied("rules".into()));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(sync.catalog().current().len(), 1);
    }

    #[tokio::test]
    async fn malformed_products_are_skipped() {
        let backend = InMemoryBackend::new();
        let ctx = backend.context(StoreConfig::default());
        backend
            .documents
            .set("products", "bad", rec(json!({"price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();
        backend
            .documents
            .set("products", "ok", rec(json!({"name": "Ok", "price": "1", "createdAt": server_timestamp()})), false)
            .await
            .unwrap();

        let sync = CatalogSync::new(&ctx, SharedCatalog::new());
        let (seen, cb) = recorder();
        let _sub = sync.subscribe(cb);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].products.len(), 1);
        assert_eq!(seen[0].products[0].name, "Ok");
    }
}
