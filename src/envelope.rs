//! Uniform result type returned by every client operation
//!
//! An `Envelope` is either a success carrying an optional JSON payload or a
//! failure carrying an error message. Ordinary API failures never surface as
//! Rust errors to callers; they arrive as failed envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials were rejected (HTTP 401)
    Authentication,
    /// Network failure that persisted through every retry
    Connection,
    /// Remote returned a 4xx/5xx status other than 401
    Api,
    /// Response body was not valid JSON
    ResponseFormat,
    /// JSON did not match the expected record schema
    Validation,
    /// Anything else caught at the transport boundary
    Unexpected,
}

/// Result of a client call
///
/// Fields are private so that `success = true` always pairs with no error and
/// `success = false` always pairs with no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Envelope {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    status_code: Option<u16>,
    execution_time: Option<f64>,
}

impl Envelope {
    /// Successful result with the given payload
    pub fn ok(data: Option<Value>, status_code: Option<u16>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            kind: None,
            status_code,
            execution_time: None,
        }
    }

    /// Failed result
    pub fn failure(kind: ErrorKind, error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            kind: Some(kind),
            status_code,
            execution_time: None,
        }
    }

    /// Returns a copy stamped with the elapsed wall-clock time in seconds
    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = Some(seconds);
        self
    }

    /// Replaces the payload of a successful envelope, keeping status and timing
    ///
    /// Failed envelopes are returned untouched.
    pub fn map_data(mut self, data: Option<Value>) -> Self {
        if self.success {
            self.data = data;
        }
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn execution_time(&self) -> Option<f64> {
        self.execution_time
    }
}

/// Unchecked wire form, validated on the way into `Envelope`
#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    kind: Option<ErrorKind>,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    execution_time: Option<f64>,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        if raw.success && raw.error.is_some() {
            return Err("successful envelope must not carry an error".to_string());
        }
        if !raw.success && raw.data.is_some() {
            return Err("failed envelope must not carry data".to_string());
        }
        Ok(Self {
            success: raw.success,
            data: raw.data,
            error: raw.error,
            kind: raw.kind,
            status_code: raw.status_code,
            execution_time: raw.execution_time,
        })
    }
}
