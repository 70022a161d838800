//! Device-local key/value storage (the browser's local storage, a desktop data dir, ...).
//!
//! Access is synchronous: the anonymous cart is persisted before `add`/`remove` return.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use crate::error::BackendError;

pub use file::FileDeviceStorage;
pub use in_memory::InMemoryDeviceStorage;

pub trait DeviceStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

impl<S> DeviceStorage for Arc<S>
where
    S: DeviceStorage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove(key)
    }
}

/// Keys become file names in some backends, so they are restricted to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), BackendError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(BackendError::InvalidArgument(format!(
            "invalid storage key '{key}'"
        )))
    }
}
