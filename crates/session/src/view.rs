use std::sync::Mutex;

use tokio::sync::mpsc;

use storefront_catalog::{CatalogUpdate, Product, RenderSequencer, SearchResults, normalize_query};

/// What the product grid should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    pub revision: u64,
    /// Active search filter; empty shows everything.
    pub query: String,
    pub products: Vec<Product>,
}

/// Turns catalog deliveries and settled searches into [`CatalogView`]s.
///
/// A catalog delivery is re-filtered with the last settled query. Views built from a
/// snapshot older than the last one shown are dropped.
pub(crate) struct ViewPipeline {
    sequencer: RenderSequencer,
    query: Mutex<String>,
    tx: mpsc::UnboundedSender<CatalogView>,
}

impl ViewPipeline {
    pub(crate) fn new(tx: mpsc::UnboundedSender<CatalogView>) -> Self {
        Self {
            sequencer: RenderSequencer::new(),
            query: Mutex::new(String::new()),
            tx,
        }
    }

    fn active_query(&self) -> String {
        self.query.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub(crate) fn catalog_delivered(&self, update: CatalogUpdate) {
        let query = self.active_query();
        let needle = normalize_query(&query);
        let products = update
            .products
            .into_iter()
            .filter(|p| p.name_contains(&needle))
            .collect();
        self.show(CatalogView {
            revision: update.revision,
            query,
            products,
        });
    }

    pub(crate) fn search_settled(&self, results: SearchResults) {
        if let Ok(mut query) = self.query.lock() {
            query.clone_from(&results.query);
        }
        self.show(CatalogView {
            revision: results.revision,
            query: results.query,
            products: results.products,
        });
    }

    fn show(&self, view: CatalogView) {
        self.sequencer.commit(view.revision, || {
            if self.tx.send(view).is_err() {
                tracing::debug!("catalog view dropped; no renderer attached");
            }
        });
    }
}
