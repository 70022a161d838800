//! Object storage boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Reference to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    pub path: String,
}

/// Managed object storage.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<BlobRef, BackendError>;

    /// Public download URL of an uploaded object.
    async fn get_url(&self, blob: &BlobRef) -> Result<String, BackendError>;
}

#[async_trait::async_trait]
impl<B> BlobStore for Arc<B>
where
    B: BlobStore + ?Sized,
{
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<BlobRef, BackendError> {
        (**self).upload(path, bytes).await
    }

    async fn get_url(&self, blob: &BlobRef) -> Result<String, BackendError> {
        (**self).get_url(blob).await
    }
}

/// Object paths are relative, `/`-separated and free of empty or `..` segments.
pub fn validate_path(path: &str) -> Result<(), BackendError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.split('/').any(|seg| seg.is_empty() || seg == "..");
    if bad {
        Err(BackendError::InvalidArgument(format!("invalid object path '{path}'")))
    } else {
        Ok(())
    }
}

/// In-memory object store for tests/dev. URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<BlobRef, BackendError> {
        validate_path(path)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        objects.insert(path.to_string(), bytes);
        Ok(BlobRef {
            path: path.to_string(),
        })
    }

    async fn get_url(&self, blob: &BlobRef) -> Result<String, BackendError> {
        let exists = self
            .objects
            .read()
            .map(|o| o.contains_key(&blob.path))
            .unwrap_or(false);
        if !exists {
            return Err(BackendError::NotFound(blob.path.clone()));
        }
        Ok(format!("memory://blobs/{}", blob.path))
    }
}
