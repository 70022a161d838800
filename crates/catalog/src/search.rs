//! Debounced catalog search.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::product::Product;
use crate::snapshot::{SharedCatalog, normalize_query};

/// Results of one settled search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    /// Normalized (trimmed, lower-cased) query.
    pub query: String,
    /// Revision of the snapshot the results were computed from.
    pub revision: u64,
    pub products: Vec<Product>,
}

pub type ResultsCallback = Arc<dyn Fn(SearchResults) + Send + Sync>;

/// Runs a catalog search once input has been quiet for `delay`.
///
/// Every [`submit`](Self::submit) cancels the pending search and restarts the timer, so only
/// the last query of a burst is evaluated. Results are computed against the snapshot current
/// when the timer fires, not when the keystroke happened.
///
/// Must be used from within a tokio runtime.
pub struct SearchDebouncer {
    catalog: SharedCatalog,
    delay: Duration,
    on_results: ResultsCallback,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(catalog: SharedCatalog, delay: Duration, on_results: ResultsCallback) -> Self {
        Self {
            catalog,
            delay,
            on_results,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn submit(&self, query: &str) {
        let query = normalize_query(query);
        let catalog = self.catalog.clone();
        let on_results = self.on_results.clone();
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let snapshot = catalog.current();
            let products = snapshot.search(&query);
            tracing::debug!(%query, hits = products.len(), "search settled");
            on_results(SearchResults {
                query,
                revision: snapshot.revision(),
                products,
            });
        });

        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending search, if any, without running it.
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(task) = pending.take() {
                task.abort();
            }
        }
    }

    /// Whether a search is waiting for its quiet period to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl core::fmt::Debug for SearchDebouncer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SearchDebouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Price, ProductId};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::from(id),
            name: name.to_string(),
            price: Price::from("2"),
            image_url: None,
            description: None,
            created_at: None,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<SearchResults>>>, ResultsCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |r| sink.lock().unwrap().push(r)))
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_query_of_a_burst_runs() {
        let catalog = SharedCatalog::with_products(vec![
            product("1", "Herbal tea"),
            product("2", "Hemp oil"),
        ]);
        let (seen, cb) = recorder();
        let debouncer = SearchDebouncer::new(catalog, Duration::from_millis(1000), cb);

        debouncer.submit("he");
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.submit(" HERB ");
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query, "herb");
        assert_eq!(seen[0].products.len(), 1);
        assert_eq!(seen[0].products[0].id, ProductId::from("1"));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn results_use_the_snapshot_current_when_the_timer_fires() {
        let catalog = SharedCatalog::new();
        let (seen, cb) = recorder();
        let debouncer = SearchDebouncer::new(catalog.clone(), Duration::from_millis(100), cb);

        debouncer.submit("jam");
        catalog.replace(vec![product("j", "Fig jam")]);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].revision, 1);
        assert_eq!(seen[0].products.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_search() {
        let (seen, cb) = recorder();
        let debouncer = SearchDebouncer::new(SharedCatalog::new(), Duration::from_millis(100), cb);

        debouncer.submit("x");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(!debouncer.is_pending());
    }
}
