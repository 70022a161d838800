//! Last-delivered catalog snapshot, shared between the sync feed, search and the cart.

use std::sync::{Arc, RwLock};

use storefront_core::ProductId;

use crate::product::Product;

/// Immutable catalog snapshot: products in feed order (newest first) plus a revision.
///
/// Revision `0` is the empty snapshot held before the first delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    revision: u64,
    products: Arc<[Product]>,
}

impl CatalogSnapshot {
    pub fn new(revision: u64, products: Vec<Product>) -> Self {
        Self {
            revision,
            products: products.into(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products whose name contains `query` (trimmed, case-insensitive), in snapshot order.
    ///
    /// A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<Product> {
        let needle = normalize_query(query);
        self.products
            .iter()
            .filter(|p| p.name_contains(&needle))
            .cloned()
            .collect()
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Cloneable handle to the current [`CatalogSnapshot`].
///
/// Readers get a cheap clone of the snapshot and never observe a half-applied delivery.
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<CatalogSnapshot>>,
}

impl SharedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a fixed product list (tests, offline demos).
    pub fn with_products(products: Vec<Product>) -> Self {
        let catalog = Self::new();
        catalog.replace(products);
        catalog
    }

    pub fn current(&self) -> CatalogSnapshot {
        match self.inner.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Install a freshly delivered product list and return its revision.
    pub fn replace(&self, products: Vec<Product>) -> u64 {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let revision = guard.revision + 1;
        *guard = CatalogSnapshot::new(revision, products);
        revision
    }

    pub fn find(&self, id: &ProductId) -> Option<Product> {
        self.current().find(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Price;

    pub(crate) fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::from(id),
            name: name.to_string(),
            price: Price::from("1.00"),
            image_url: None,
            description: None,
            created_at: None,
        }
    }

    #[test]
    fn replace_bumps_revision_and_old_snapshots_stay_intact() {
        let catalog = SharedCatalog::new();
        assert_eq!(catalog.current().revision(), 0);

        catalog.replace(vec![product("a", "Apple")]);
        let before = catalog.current();
        let rev = catalog.replace(vec![product("b", "Banana")]);

        assert_eq!(rev, 2);
        assert_eq!(before.len(), 1);
        assert!(before.find(&ProductId::from("a")).is_some());
        assert!(catalog.find(&ProductId::from("a")).is_none());
    }

    #[test]
    fn search_trims_and_ignores_case() {
        let snap = CatalogSnapshot::new(
            1,
            vec![product("1", "Wild Honey"), product("2", "Jam"), product("3", "honeycomb")],
        );
        let hits: Vec<_> = snap.search("  HONEY ").into_iter().map(|p| p.id).collect();
        assert_eq!(hits, vec![ProductId::from("1"), ProductId::from("3")]);
        assert_eq!(snap.search("").len(), 3);
        assert!(snap.search("xyz").is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Search results are an order-preserving subset of the snapshot.
            #[test]
            fn search_is_an_ordered_subset(
                names in proptest::collection::vec("[A-Za-z ]{0,12}", 0..20),
                query in "[A-Za-z ]{0,4}"
            ) {
                let products: Vec<_> = names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| product(&i.to_string(), n))
                    .collect();
                let snap = CatalogSnapshot::new(1, products.clone());
                let hits = snap.search(&query);

                let needle = normalize_query(&query);
                let expected: Vec<_> = products
                    .into_iter()
                    .filter(|p| p.name.to_lowercase().contains(&needle))
                    .collect();
                prop_assert_eq!(hits, expected);
            }

            /// Changing the case of the query never changes the result.
            #[test]
            fn search_is_case_insensitive(
                names in proptest::collection::vec("[A-Za-z]{1,8}", 1..10),
                query in "[A-Za-z]{1,3}"
            ) {
                let products: Vec<_> = names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| product(&i.to_string(), n))
                    .collect();
                let snap = CatalogSnapshot::new(1, products);
                prop_assert_eq!(snap.search(&query.to_uppercase()), snap.search(&query.to_lowercase()));
            }
        }
    }
}
