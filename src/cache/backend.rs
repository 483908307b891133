//! Key-value cache capability shared by the changes registry and the render cache.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::error::CacheError;

/// A stored value together with its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    #[serde(with = "time::serde::timestamp")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::timestamp::option", default)]
    pub expires: Option<OffsetDateTime>,
}

impl CacheEntry {
    pub fn new(value: Value, created: OffsetDateTime, expires: Option<OffsetDateTime>) -> Self {
        Self {
            value,
            created,
            expires,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// Backends evict expired entries themselves; callers never re-check expiry.
pub trait CacheBackend: Send + Sync {
    /// Entry with metadata, or `None` when missing or expired.
    fn retrieve(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.retrieve(key)?.map(|entry| entry.value))
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        expires: Option<OffsetDateTime>,
    ) -> Result<bool, CacheError>;

    /// Returns `false` when the key was not present.
    fn remove(&self, key: &str) -> Result<bool, CacheError>;

    fn flush(&self) -> Result<bool, CacheError>;
}
