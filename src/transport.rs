//! HTTP transport for the marketplace API
//!
//! `Transport::execute` builds the request, sends it with bounded retries on
//! connection-level failures, classifies the response status and parses the
//! JSON body. Every outcome, including exhausted retries, comes back as an
//! [`Envelope`].

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

pub use reqwest::Method;

use crate::cache::Params;
use crate::config::{ClientConfig, ConfigError};
use crate::envelope::Envelope;
use crate::error::ClientError;
use crate::stats::{NoopStats, StatsRecorder};

/// Longest response excerpt written to debug logs
const LOG_BODY_LIMIT: usize = 200;

/// Authenticated HTTP client bound to one API host
#[derive(Clone)]
pub struct Transport {
    http: Client,
    config: ClientConfig,
    stats: Arc<dyn StatsRecorder>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("config", &self.config).finish()
    }
}

impl Transport {
    /// Creates a transport after checking `config`
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            stats: Arc::new(NoopStats),
        })
    }

    /// Routes per-call observations to `stats`
    pub fn with_stats(mut self, stats: Arc<dyn StatsRecorder>) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for an endpoint path such as `/api/v1/orders`
    pub fn url(&self, endpoint: &str) -> String {
        let base = self.config.normalized_base_url();
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    /// Executes one logical API call
    ///
    /// Connection-level failures are retried up to `max_retries` attempts with
    /// `retry_delay` between them. HTTP error statuses and unparseable bodies
    /// are returned immediately.
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&Params>,
        body: Option<&Value>,
    ) -> Envelope {
        self.execute_as(endpoint, method, endpoint, params, body).await
    }

    /// Like [`execute`](Self::execute), recording stats under `operation`
    ///
    /// Resource paths embed ids, so callers pass a stable operation name to
    /// keep one stats row per logical call.
    pub async fn execute_as(
        &self,
        operation: &str,
        method: Method,
        endpoint: &str,
        params: Option<&Params>,
        body: Option<&Value>,
    ) -> Envelope {
        let started = Instant::now();
        let result = self.try_execute(method, endpoint, params, body).await;
        let elapsed = started.elapsed();
        self.stats.record(operation, result.is_ok(), elapsed);

        let envelope = match result {
            Ok((status, data)) => Envelope::ok(data, Some(status)),
            Err(err) => {
                debug!(endpoint, kind = ?err.kind(), error = %err, "request failed");
                Envelope::from(err)
            }
        };
        envelope.with_execution_time(elapsed.as_secs_f64())
    }

    async fn try_execute(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&Params>,
        body: Option<&Value>,
    ) -> Result<(u16, Option<Value>), ClientError> {
        let url = self.url(endpoint);
        let (status, text) = self.send_with_retries(&method, &url, params, body).await?;

        debug!(
            %method,
            %url,
            status = status.as_u16(),
            body = truncate(&text, LOG_BODY_LIMIT),
            "response received"
        );

        classify(status, &text)
    }

    async fn send_with_retries(
        &self,
        method: &Method,
        url: &str,
        params: Option<&Params>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String), ClientError> {
        let attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(method, url, params, body).await {
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) => {
                    if attempt >= attempts {
                        warn!(%url, attempts, error = %err, "giving up after connection failures");
                        return Err(ClientError::Connection {
                            attempts,
                            source: err,
                        });
                    }
                    warn!(%url, attempt, error = %err, "connection failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(ClientError::Unexpected(err.to_string())),
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        params: Option<&Params>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

/// Connection-level failures: DNS, connect, timeouts and dropped connections
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

/// Maps a status and body to a payload or a classified error
fn classify(status: StatusCode, body: &str) -> Result<(u16, Option<Value>), ClientError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Authentication);
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        });
    }
    if body.trim().is_empty() {
        return Ok((status.as_u16(), None));
    }
    serde_json::from_str(body)
        .map(|data| (status.as_u16(), Some(data)))
        .map_err(ClientError::ResponseFormat)
}

/// Pulls a human-readable message out of an error body
///
/// Looks for `{"error": {"message": ..}}`, `{"error": ".."}`, `{"message": ..}`
/// and `{"errorText": ..}` in that order, falling back to the raw text.
fn error_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return format!("API error: HTTP {}", status.as_u16());
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    let structured = match map.get("error") {
        Some(Value::Object(error)) => error.get("message").and_then(Value::as_str),
        Some(Value::String(message)) => Some(message.as_str()),
        _ => None,
    };
    structured
        .or_else(|| map.get("message").and_then(Value::as_str))
        .or_else(|| map.get("errorText").and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
