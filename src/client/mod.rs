//! Marketplace API client
//!
//! `WbClient` holds one [`Transport`] and one shared [`CacheStore`], bound to
//! the client's credential fingerprint through a [`ResponseCache`]. Resource
//! operations are grouped in the `auth`, `products`, `orders` and
//! `categories` modules as separate `impl WbClient` blocks; they all close
//! over the same transport and cache handles.
//!
//! Every operation returns an [`Envelope`]. Reads go through [`with_cache`]
//! and validate the payload inside the wrapped call, so a response that fails
//! validation is never cached. Writes are never cached and invalidate the
//! read keys they make stale.

mod auth;
mod cached;
mod categories;
mod filter;
mod orders;
mod products;

pub use cached::{with_cache, CachePolicy, ResponseCache};
pub use filter::Filter;

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::cache::{CacheStore, Params};
use crate::config::{ClientConfig, ConfigError};
use crate::envelope::Envelope;
use crate::error::ClientError;
use crate::schema::SchemaError;
use crate::transport::{Method, Transport};

/// Client for the marketplace API with read-through caching
#[derive(Clone)]
pub struct WbClient {
    transport: Transport,
    cache: ResponseCache,
}

impl std::fmt::Debug for WbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WbClient")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl WbClient {
    /// Creates a client from configuration and a cache backend
    pub fn new(config: ClientConfig, cache: Arc<dyn CacheStore>) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(Transport::new(config)?, cache))
    }

    /// Creates a client around an existing transport
    ///
    /// Cached entries are scoped to the transport's host and token.
    pub fn from_parts(transport: Transport, store: Arc<dyn CacheStore>) -> Self {
        let scope = transport.config().credential_fingerprint();
        Self {
            transport,
            cache: ResponseCache::new(store, scope),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.store()
    }

    /// GET `path` through the cache, validating the payload with `normalize`
    ///
    /// `key_params` identify the cache entry; `query` is what goes on the wire.
    async fn cached_get<N>(
        &self,
        policy: CachePolicy,
        key_params: &Params,
        path: &str,
        query: Option<&Params>,
        force_refresh: bool,
        normalize: N,
    ) -> Envelope
    where
        N: FnOnce(Option<&Value>) -> Result<Option<Value>, SchemaError>,
    {
        with_cache(&self.cache, policy, Some(key_params), force_refresh, || async {
            let envelope = self
                .transport
                .execute_as(policy.endpoint, Method::GET, path, query, None)
                .await;
            validated(envelope, normalize)
        })
        .await
    }
}

/// Applies `normalize` to a successful envelope's payload
///
/// A failed envelope passes through untouched; a normalization error becomes a
/// failed validation envelope that keeps the call's timing.
fn validated<N>(envelope: Envelope, normalize: N) -> Envelope
where
    N: FnOnce(Option<&Value>) -> Result<Option<Value>, SchemaError>,
{
    if !envelope.success() {
        return envelope;
    }
    match normalize(envelope.data()) {
        Ok(data) => envelope.map_data(data),
        Err(e) => {
            warn!(error = %e, "response failed validation");
            let failed = Envelope::from(ClientError::Validation(e));
            match envelope.execution_time() {
                Some(t) => failed.with_execution_time(t),
                None => failed,
            }
        }
    }
}

/// Payload that must be present for validation to proceed
fn require(raw: Option<&Value>) -> Result<&Value, SchemaError> {
    raw.ok_or_else(|| SchemaError::constraint("body", "must not be empty"))
}

/// Rejects ids that would escape their path segment
fn resource_id(id: &str) -> Result<&str, SchemaError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(SchemaError::constraint("id", "must be a non-empty path segment"));
    }
    Ok(id)
}
