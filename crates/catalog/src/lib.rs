//! `storefront-catalog`: the product catalog as the storefront sees it.
//!
//! - [`CatalogSync`] mirrors the products collection into a [`SharedCatalog`] snapshot
//! - [`SearchDebouncer`] filters that snapshot by name once typing settles
//! - [`RenderSequencer`] keeps late renders of old snapshots off the screen
//! - [`CatalogAdmin`] publishes products for identities holding `catalog.write`

pub mod admin;
pub mod product;
pub mod render;
pub mod search;
pub mod snapshot;
pub mod sync;

pub use admin::CatalogAdmin;
pub use product::{NewProduct, Product};
pub use render::RenderSequencer;
pub use search::{ResultsCallback, SearchDebouncer, SearchResults};
pub use snapshot::{CatalogSnapshot, SharedCatalog, normalize_query};
pub use sync::{CatalogCallback, CatalogSubscription, CatalogSync, CatalogUpdate};
