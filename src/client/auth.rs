//! Credential check

use serde_json::json;

use super::{CachePolicy, WbClient};
use crate::cache::Params;
use crate::envelope::Envelope;

const AUTH_TEST_PATH: &str = "/api/v1/auth/test";

impl WbClient {
    /// Verifies the configured token against the API
    ///
    /// Succeeds with `{"valid": true}`; a rejected token yields an
    /// authentication failure envelope.
    pub async fn check_auth(&self, force_refresh: bool) -> Envelope {
        self.cached_get(
            CachePolicy::CHECK_AUTH,
            &Params::new(),
            AUTH_TEST_PATH,
            None,
            force_refresh,
            |_| Ok(Some(json!({"valid": true}))),
        )
        .await
    }
}
