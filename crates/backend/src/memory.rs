//! Fully in-memory backend (tests, demos, local development).

use std::sync::Arc;

use storefront_core::StoreConfig;

use crate::{
    InMemoryBlobStore, InMemoryDeviceStorage, InMemoryDocumentStore, InMemoryIdentityProvider,
    StoreContext,
};

/// Concrete handles to every in-memory collaborator.
///
/// Keep this around in tests to seed data, inject failures and inspect writes while the
/// code under test only sees the trait objects inside [`StoreContext`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    pub documents: Arc<InMemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub device: Arc<InMemoryDeviceStorage>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self, config: StoreConfig) -> StoreContext {
        StoreContext::new(
            config,
            self.documents.clone(),
            self.identity.clone(),
            self.blobs.clone(),
            self.device.clone(),
        )
    }
}
