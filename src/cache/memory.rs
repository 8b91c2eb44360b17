//! In-process cache store
//!
//! Entries live in a `DashMap`, whose per-shard locking gives atomic upserts
//! and lets `retain` sweep without blocking unrelated keys for long.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use super::store::{expiry, CacheError, CacheStore};
use super::CacheKey;

#[derive(Debug, Clone)]
struct MemoryEntry {
    payload: Value,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Thread-safe cache store with per-entry TTL expiration
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_where<F>(&self, mut doomed: F) -> usize
    where
        F: FnMut(&str, &MemoryEntry) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            let drop_it = doomed(key, entry);
            if drop_it {
                removed += 1;
            }
            !drop_it
        });
        removed
    }
}

impl CacheStore for MemoryCacheStore {
    fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        if let Some(entry) = self.entries.get(key.as_str()) {
            if now < entry.expires_at {
                return Ok(Some(entry.payload.clone()));
            }
        }
        // Re-checked under the shard lock so a fresh overwrite survives
        self.entries
            .remove_if(key.as_str(), |_, entry| now >= entry.expires_at);
        Ok(None)
    }

    fn set_at(
        &self,
        key: &CacheKey,
        payload: &Value,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        self.entries.insert(
            key.as_str().to_string(),
            MemoryEntry {
                payload: payload.clone(),
                created_at: now,
                expires_at: expiry(now, ttl_secs),
            },
        );
        Ok(())
    }

    fn invalidate(&self, prefix: &str) -> Result<usize, CacheError> {
        Ok(self.remove_where(|key, _| key.starts_with(prefix)))
    }

    fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        Ok(self.remove_where(|_, entry| entry.expires_at < now))
    }

    fn clear_all(&self) -> Result<usize, CacheError> {
        Ok(self.remove_where(|_, _| true))
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.len())
    }
}
