//! Read-through caching around client operations
//!
//! [`with_cache`] wraps any envelope-producing future: a live entry for the
//! operation's key short-circuits the call, a miss runs it and stores the
//! result when (and only when) it succeeded. Cache store failures never fail
//! the call; they degrade to a miss or a skipped write.
//!
//! Entries are tagged with the credential fingerprint of the client that
//! wrote them. A store shared between clients with different hosts or tokens
//! keeps the same keys, but an entry written under other credentials is a
//! miss. Store calls run on the blocking pool since backends may touch disk.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheKey, CacheStore, Params};
use crate::envelope::Envelope;

/// Cache identity and lifetime of one read operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Logical operation name, the prefix of every key it writes
    pub endpoint: &'static str,
    pub ttl_secs: u64,
}

impl CachePolicy {
    pub const CHECK_AUTH: CachePolicy = CachePolicy::new("check_auth", 3600);
    pub const PRODUCTS: CachePolicy = CachePolicy::new("get_products", 1800);
    pub const PRODUCT: CachePolicy = CachePolicy::new("get_product", 3600);
    pub const COMMISSION: CachePolicy = CachePolicy::new("get_commission", 86400);
    pub const CATEGORIES: CachePolicy = CachePolicy::new("get_categories", 86400);
    // Orders change often
    pub const ORDERS: CachePolicy = CachePolicy::new("get_orders", 900);

    pub const fn new(endpoint: &'static str, ttl_secs: u64) -> Self {
        Self { endpoint, ttl_secs }
    }

    pub fn key(&self, params: Option<&Params>) -> CacheKey {
        CacheKey::new(self.endpoint, params)
    }
}

/// Stored form of a cached envelope
#[derive(Serialize, Deserialize)]
struct CachedResponse {
    scope: String,
    envelope: Envelope,
}

/// A cache store bound to one set of credentials
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    scope: String,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Binds `store` to `scope`, usually a credential fingerprint
    pub fn new(store: Arc<dyn CacheStore>, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Runs `op` against the store on the blocking pool
    async fn blocking<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CacheStore) -> Result<T, CacheError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))?
    }

    /// Live envelope for `key` written under this scope
    async fn lookup(&self, key: &CacheKey) -> Option<Envelope> {
        let read_key = key.clone();
        let payload = match self.blocking(move |store| store.get(&read_key)).await {
            Ok(payload) => payload?,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_value::<CachedResponse>(payload) {
            Ok(cached) if cached.scope != self.scope => {
                debug!(key = %key, "cache entry written under other credentials");
                None
            }
            Ok(cached) if cached.envelope.success() => Some(cached.envelope),
            Ok(_) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring undecodable cache entry");
                None
            }
        }
    }

    async fn save(&self, key: &CacheKey, envelope: &Envelope, ttl_secs: u64) {
        let cached = CachedResponse {
            scope: self.scope.clone(),
            envelope: envelope.clone(),
        };
        let payload: Value = match serde_json::to_value(&cached) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode envelope for cache");
                return;
            }
        };
        let write_key = key.clone();
        let result = self
            .blocking(move |store| store.set(&write_key, &payload, ttl_secs))
            .await;
        if let Err(e) = result {
            warn!(key = %key, error = %e, "cache write failed");
        }
    }

    /// Drops every entry under `prefix`, logging instead of failing
    pub async fn invalidate(&self, prefix: &str) {
        let owned = prefix.to_string();
        match self.blocking(move |store| store.invalidate(&owned)).await {
            Ok(removed) => info!(prefix, removed, "invalidated cache entries"),
            Err(e) => warn!(prefix, error = %e, "cache invalidation failed"),
        }
    }
}

/// Runs `operation` unless a live cached envelope exists for its key
///
/// With `force_refresh` the lookup is skipped but a successful result still
/// replaces the stored entry.
pub async fn with_cache<F, Fut>(
    cache: &ResponseCache,
    policy: CachePolicy,
    params: Option<&Params>,
    force_refresh: bool,
    operation: F,
) -> Envelope
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Envelope>,
{
    let key = policy.key(params);

    if !force_refresh {
        if let Some(hit) = cache.lookup(&key).await {
            debug!(key = %key, "cache hit");
            return hit;
        }
        debug!(key = %key, "cache miss");
    }

    let envelope = operation().await;
    if envelope.success() {
        cache.save(&key, &envelope, policy.ttl_secs).await;
    }
    envelope
}
