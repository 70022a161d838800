use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use storefront_events::{ListenerRegistry, SubscriptionHandle};

use super::r#trait::{
    Document, DocumentStore, FeedCallback, Query, Record, WriteOp, is_server_timestamp,
};
use crate::error::BackendError;

struct Feed {
    collection: String,
    query: Query,
    on_change: FeedCallback,
}

/// In-memory document store.
///
/// Intended for tests/dev. Not optimized for performance: every query is a full scan.
///
/// Besides the [`DocumentStore`] contract it offers instrumentation (write log, feed count)
/// and fault injection (failing reads/writes, feed errors).
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    feeds: ListenerRegistry<Arc<Feed>>,
    writes: Mutex<Vec<WriteOp>>,
    read_failure: Mutex<Option<BackendError>>,
    write_failure: Mutex<Option<BackendError>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            feeds: ListenerRegistry::new(),
            writes: Mutex::new(Vec::new()),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
            last_timestamp: Mutex::new(None),
        }
    }
}

impl core::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("feeds", &self.feeds.len())
            .finish_non_exhaustive()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document without recording a write (fixtures).
    ///
    /// Live feeds on the collection are notified as for a normal write.
    pub fn seed(&self, collection: &str, id: &str, record: Record) -> Result<(), BackendError> {
        self.apply_set(collection, id, record, false)?;
        self.notify(collection);
        Ok(())
    }

    /// Every `set`/`add` accepted so far, in commit order.
    pub fn writes(&self) -> Vec<WriteOp> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Number of merge-writes committed to a single document.
    pub fn merge_writes_to(&self, collection: &str, id: &str) -> usize {
        self.writes()
            .iter()
            .filter(|w| w.merge && w.collection == collection && w.id == id)
            .count()
    }

    /// Number of live realtime listeners.
    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    /// Make every subsequent read fail with `err` (`None` restores normal operation).
    pub fn fail_reads_with(&self, err: Option<BackendError>) {
        if let Ok(mut slot) = self.read_failure.lock() {
            *slot = err;
        }
    }

    /// Make every subsequent write fail with `err` (`None` restores normal operation).
    pub fn fail_writes_with(&self, err: Option<BackendError>) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = err;
        }
    }

    /// Push a feed error to every listener on `collection` (simulated outage).
    pub fn break_feed(&self, collection: &str, err: BackendError) {
        for feed in self.feeds.snapshot() {
            if feed.collection == collection {
                (feed.on_change)(Err(err.clone()));
            }
        }
    }

    fn injected(slot: &Mutex<Option<BackendError>>) -> Result<(), BackendError> {
        match slot.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            },
            Err(_) => Err(BackendError::Unavailable("lock poisoned".to_string())),
        }
    }

    /// Commit timestamps are strictly increasing so `createdAt` ordering is total.
    fn next_timestamp(&self) -> Value {
        let mut now = Utc::now();
        if let Ok(mut last) = self.last_timestamp.lock() {
            if let Some(prev) = *last {
                if now <= prev {
                    now = prev + Duration::microseconds(1);
                }
            }
            *last = Some(now);
        }
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn resolve_sentinels(&self, record: &mut Record) {
        let pending: Vec<String> = record
            .iter()
            .filter(|(_, v)| is_server_timestamp(v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in pending {
            let stamp = self.next_timestamp();
            record.insert(key, stamp);
        }
    }

    fn apply_set(
        &self,
        collection: &str,
        id: &str,
        mut record: Record,
        merge: bool,
    ) -> Result<(), BackendError> {
        if collection.is_empty() || id.is_empty() || id.contains('/') {
            return Err(BackendError::InvalidArgument(format!(
                "invalid document path '{collection}/{id}'"
            )));
        }
        self.resolve_sentinels(&mut record);

        let mut collections = self
            .collections
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        let docs = collections.entry(collection.to_string()).or_default();

        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) if merge => {
                for (field, value) in record {
                    existing.data.insert(field, value);
                }
            }
            Some(existing) => existing.data = record,
            None => docs.push(Document::new(id, record)),
        }
        Ok(())
    }

    fn record_write(&self, collection: &str, id: &str, merge: bool) {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(WriteOp {
                collection: collection.to_string(),
                id: id.to_string(),
                merge,
            });
        }
    }

    fn scan(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        let docs = collections.get(collection).cloned().unwrap_or_default();
        Ok(query.apply(docs))
    }

    /// Deliver fresh result sets to every feed on `collection`.
    ///
    /// Runs after the data lock is released, so listeners may read the store.
    fn notify(&self, collection: &str) {
        for feed in self.feeds.snapshot() {
            if feed.collection == collection {
                (feed.on_change)(self.scan(collection, &feed.query));
            }
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, BackendError> {
        Self::injected(&self.read_failure)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.data.clone()))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: Record,
        merge: bool,
    ) -> Result<(), BackendError> {
        Self::injected(&self.write_failure)?;
        self.apply_set(collection, id, record, merge)?;
        self.record_write(collection, id, merge);
        self.notify(collection);
        Ok(())
    }

    async fn add(&self, collection: &str, record: Record) -> Result<String, BackendError> {
        Self::injected(&self.write_failure)?;
        let id = Uuid::now_v7().simple().to_string();
        self.apply_set(collection, &id, record, false)?;
        self.record_write(collection, &id, false);
        self.notify(collection);
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        Self::injected(&self.write_failure)?;
        let removed = {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
            match collections.get_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|d| d.id != id);
                    docs.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError> {
        Self::injected(&self.read_failure)?;
        self.scan(collection, query)
    }

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        on_change: FeedCallback,
    ) -> SubscriptionHandle {
        let feed = Arc::new(Feed {
            collection: collection.to_string(),
            query,
            on_change,
        });
        let handle = self.feeds.register(feed.clone());

        // The current result set is delivered right away, as the managed backend does.
        (feed.on_change)(self.scan(collection, &feed.query));
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::{Direction, server_timestamp, to_record};
    use serde_json::json;

    fn rec(v: Value) -> Record {
        to_record(&v).unwrap()
    }

    #[tokio::test]
    async fn merge_write_preserves_other_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .set("nh_users", "u1", rec(json!({"email": "a@b.c", "cart": [1]})), false)
            .await
            .unwrap();
        store
            .set("nh_users", "u1", rec(json!({"cart": []})), true)
            .await
            .unwrap();

        let got = store.get("nh_users", "u1").await.unwrap().unwrap();
        assert_eq!(got.get("email"), Some(&json!("a@b.c")));
        assert_eq!(got.get("cart"), Some(&json!([])));
        assert_eq!(store.merge_writes_to("nh_users", "u1"), 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_the_body() {
        let store = InMemoryDocumentStore::new();
        store
            .set("c", "d", rec(json!({"a": 1, "b": 2})), false)
            .await
            .unwrap();
        store.set("c", "d", rec(json!({"a": 3})), false).await.unwrap();
        let got = store.get("c", "d").await.unwrap().unwrap();
        assert_eq!(got.get("b"), None);
    }

    #[tokio::test]
    async fn server_timestamps_are_resolved_and_increasing() {
        let store = InMemoryDocumentStore::new();
        let a = store
            .add("products", rec(json!({"createdAt": server_timestamp()})))
            .await
            .unwrap();
        let b = store
            .add("products", rec(json!({"createdAt": server_timestamp()})))
            .await
            .unwrap();

        let docs = store
            .query(
                "products",
                &Query::new().order_by("createdAt", Direction::Descending),
            )
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![b, a]);
        assert!(docs[0].data["createdAt"].is_string());
    }

    #[tokio::test]
    async fn subscribe_delivers_current_set_then_every_change() {
        let store = InMemoryDocumentStore::new();
        store.seed("products", "p1", rec(json!({"n": 1}))).unwrap();

        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = store.subscribe(
            "products",
            Query::new(),
            Arc::new(move |res| sink.lock().unwrap().push(res.unwrap().len())),
        );

        store.set("products", "p2", rec(json!({"n": 2})), false).await.unwrap();
        store.delete("products", "p1").await.unwrap();
        store.set("other", "x", rec(json!({})), false).await.unwrap();

        handle.unsubscribe();
        store.set("products", "p3", rec(json!({"n": 3})), false).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
        assert_eq!(store.feed_count(), 0);
    }

    #[tokio::test]
    async fn injected_write_failure_leaves_data_untouched() {
        let store = InMemoryDocumentStore::new();
        store.fail_writes_with(Some(BackendError::Unavailable("offline".into())));
        let err = store
            .set("c", "d", rec(json!({"a": 1})), true)
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Unavailable("offline".into()));
        assert!(store.writes().is_empty());

        store.fail_writes_with(None);
        assert!(store.get("c", "d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_paths_are_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = store.set("c", "a/b", Record::new(), false).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }
}
