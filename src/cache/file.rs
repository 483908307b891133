use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use super::backend::{CacheBackend, CacheEntry};
use super::clock::{Clock, SystemClock};
use super::error::CacheError;
use crate::util::fs::{remove_file_if_exists, write_atomic};

const ENTRY_EXTENSION: &str = "json";

/// Filesystem backend: one JSON envelope per key below `root`.
///
/// Keys containing `/` map to subfolders. Keys that would escape the root
/// are rejected.
pub struct FileCache {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    pub fn with_system_clock(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(SystemClock))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(CacheError::invalid_key(key));
        }
        Ok(self.root.join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

impl CacheBackend for FileCache {
    fn retrieve(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if entry.is_expired(self.clock.now()) {
            remove_file_if_exists(&path).map_err(|err| CacheError::io(&path, err))?;
            debug!(op = "file_cache.retrieve", key, result = "expired", "cache entry expired");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        expires: Option<OffsetDateTime>,
    ) -> Result<bool, CacheError> {
        let path = self.entry_path(key)?;
        let entry = CacheEntry::new(value, self.clock.now(), expires);
        let encoded = serde_json::to_vec(&entry)?;
        write_atomic(&path, &encoded).map_err(|err| CacheError::io(&path, err))?;
        Ok(true)
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.entry_path(key)?;
        remove_file_if_exists(&path).map_err(|err| CacheError::io(path, err))
    }

    fn flush(&self) -> Result<bool, CacheError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(err) => Err(CacheError::io(&self.root, err)),
        }
    }
}
