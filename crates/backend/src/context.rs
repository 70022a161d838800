//! Explicit per-session context.
//!
//! One context exists per active browser tab/session. It carries the configuration and
//! the collaborator handles; components receive it at construction instead of reaching
//! for globals.

use std::sync::Arc;

use storefront_core::StoreConfig;

use crate::{BlobStore, DeviceStorage, DocumentStore, IdentityProvider};

#[derive(Clone)]
pub struct StoreContext {
    pub config: StoreConfig,
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub device: Arc<dyn DeviceStorage>,
}

impl StoreContext {
    pub fn new(
        config: StoreConfig,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        device: Arc<dyn DeviceStorage>,
    ) -> Self {
        Self {
            config,
            documents,
            identity,
            blobs,
            device,
        }
    }
}

impl core::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoreContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
