use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use super::{DeviceStorage, validate_key};
use crate::error::BackendError;

/// In-memory device storage for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDeviceStorage {
    entries: RwLock<HashMap<String, String>>,
    write_failure: Mutex<Option<BackendError>>,
}

impl InMemoryDeviceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `err` (quota exceeded, private mode, ...).
    pub fn fail_writes_with(&self, err: Option<BackendError>) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = err;
        }
    }

    fn check_write(&self) -> Result<(), BackendError> {
        match self.write_failure.lock() {
            Ok(slot) => slot.clone().map_or(Ok(()), Err),
            Err(_) => Err(BackendError::Unavailable("lock poisoned".to_string())),
        }
    }
}

impl DeviceStorage for InMemoryDeviceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        validate_key(key)?;
        let entries = self
            .entries
            .read()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        validate_key(key)?;
        self.check_write()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        validate_key(key)?;
        self.check_write()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = InMemoryDeviceStorage::new();
        assert_eq!(storage.get("nh_local_cart").unwrap(), None);
        storage.set("nh_local_cart", "[]").unwrap();
        assert_eq!(storage.get("nh_local_cart").unwrap().as_deref(), Some("[]"));
        storage.remove("nh_local_cart").unwrap();
        assert_eq!(storage.get("nh_local_cart").unwrap(), None);
    }

    #[test]
    fn rejects_unsafe_keys() {
        let storage = InMemoryDeviceStorage::new();
        assert!(storage.set("../etc/passwd", "x").is_err());
        assert!(storage.set(".hidden", "x").is_err());
    }

    #[test]
    fn injected_failure_blocks_writes_only() {
        let storage = InMemoryDeviceStorage::new();
        storage.set("k", "v").unwrap();
        storage.fail_writes_with(Some(BackendError::Io("quota exceeded".into())));
        assert!(storage.set("k", "w").is_err());
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}
