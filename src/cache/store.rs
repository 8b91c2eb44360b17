//! Storage contract shared by the cache backends

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

use super::CacheKey;

/// Errors raised by a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing storage failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be encoded
    #[error("Failed to serialize cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Expiring key-value store for JSON payloads
///
/// Implementations must make `set_at` an atomic upsert with respect to the
/// key, and `sweep_expired_at` must only remove entries whose expiry is
/// strictly before `now`.
pub trait CacheStore: Send + Sync {
    /// Returns the live payload for `key`, deleting it if it has expired
    fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<Value>, CacheError>;

    /// Inserts or overwrites `key`, expiring `ttl_secs` after `now`
    fn set_at(
        &self,
        key: &CacheKey,
        payload: &Value,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    /// Deletes every entry whose key starts with `prefix`
    fn invalidate(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Deletes every entry with `expires_at < now`
    fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<usize, CacheError>;

    /// Deletes everything
    fn clear_all(&self) -> Result<usize, CacheError>;

    /// Number of stored entries, live or not yet swept
    fn len(&self) -> Result<usize, CacheError>;

    fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        self.get_at(key, Utc::now())
    }

    fn set(&self, key: &CacheKey, payload: &Value, ttl_secs: u64) -> Result<(), CacheError> {
        self.set_at(key, payload, ttl_secs, Utc::now())
    }

    fn sweep_expired(&self) -> Result<usize, CacheError> {
        self.sweep_expired_at(Utc::now())
    }
}

/// `now + ttl_secs`, saturating at the largest representable instant
pub(crate) fn expiry(now: DateTime<Utc>, ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_adds_seconds() {
        let now = Utc::now();
        assert_eq!(expiry(now, 60), now + Duration::seconds(60));
        assert_eq!(expiry(now, 0), now);
    }

    #[test]
    fn test_expiry_saturates() {
        let now = Utc::now();
        assert_eq!(expiry(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
