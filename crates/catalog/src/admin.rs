use std::sync::Arc;

use storefront_auth::{Identity, Permission, authorize};
use storefront_backend::{DocumentStore, StoreContext};
use storefront_core::{ProductId, StoreError, StoreResult};

use crate::product::NewProduct;

/// Catalog maintenance for operators holding `catalog.write`.
///
/// Access is decided by the role claims on the signed-in identity; the backend's security
/// rules are expected to enforce the same permission server-side.
pub struct CatalogAdmin {
    documents: Arc<dyn DocumentStore>,
    collection: String,
}

impl core::fmt::Debug for CatalogAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogAdmin")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl CatalogAdmin {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            documents: ctx.documents.clone(),
            collection: ctx.config.products_collection.clone(),
        }
    }

    /// Publish a new product. Its `createdAt` is assigned by the backend at commit time.
    pub async fn add_product(
        &self,
        identity: &Identity,
        product: NewProduct,
    ) -> StoreResult<ProductId> {
        authorize(identity, &Permission::catalog_write())?;
        product.validate()?;

        let name = product.name.trim().to_string();
        let id = self
            .documents
            .add(&self.collection, product.into_record())
            .await
            .map_err(StoreError::from)?;

        tracing::info!(product_id = %id, %name, user_id = %identity.user_id, "product added");
        Ok(ProductId::new(id))
    }
}
