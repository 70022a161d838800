use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DeviceStorage, validate_key};
use crate::error::BackendError;

/// File-backed device storage: one `<key>.json` file per key under a data directory.
///
/// Writes go to a temporary sibling file first and are renamed into place, so a crash
/// never leaves a half-written cart behind.
#[derive(Debug, Clone)]
pub struct FileDeviceStorage {
    dir: PathBuf,
}

impl FileDeviceStorage {
    /// Use (and create if needed) `dir` as the storage root.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The per-user application data directory (`<data_dir>/storefront`).
    pub fn default_location() -> Result<Self, BackendError> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .ok_or_else(|| {
                BackendError::Io(
                    "failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share"
                        .to_string(),
                )
            })?;
        Self::open(base.join("storefront"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BackendError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DeviceStorage for FileDeviceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "storefront-device-{name}-{}",
            uuid::Uuid::now_v7().simple()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn values_survive_reopening() {
        let dir = scratch_dir("reopen");
        let storage = FileDeviceStorage::open(&dir).unwrap();
        storage.set("nh_local_cart", r#"[{"id":"a"}]"#).unwrap();

        let reopened = FileDeviceStorage::open(&dir).unwrap();
        assert_eq!(
            reopened.get("nh_local_cart").unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
        assert!(!dir.join("nh_local_cart.json.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_key_reads_as_none_and_removes_cleanly() {
        let dir = scratch_dir("missing");
        let storage = FileDeviceStorage::open(&dir).unwrap();
        assert_eq!(storage.get("absent").unwrap(), None);
        storage.remove("absent").unwrap();
        fs::remove_dir_all(&dir).unwrap();
    }
}
