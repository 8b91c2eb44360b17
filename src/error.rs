//! Failure kinds of the request pipeline
//!
//! Every variant is recovered at the transport or validation boundary and
//! turned into a failed [`Envelope`]; none of them reach callers as `Err`.

use thiserror::Error;

use crate::envelope::{Envelope, ErrorKind};
use crate::schema::SchemaError;

/// Errors that can occur while executing a client call
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API rejected the credentials (HTTP 401)
    #[error("Invalid API token")]
    Authentication,

    /// Network failure on every attempt
    #[error("Connection error: retries exhausted after {attempts} attempts ({source})")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a 4xx/5xx status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The API answered with a body that is not JSON
    #[error("Invalid JSON response: {0}")]
    ResponseFormat(#[source] serde_json::Error),

    /// The JSON did not match the expected record schema
    #[error("Validation error: {0}")]
    Validation(#[from] SchemaError),

    /// Anything the pipeline did not anticipate
    #[error("Request failed: {0}")]
    Unexpected(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Authentication => ErrorKind::Authentication,
            ClientError::Connection { .. } => ErrorKind::Connection,
            ClientError::Api { .. } => ErrorKind::Api,
            ClientError::ResponseFormat(_) => ErrorKind::ResponseFormat,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// HTTP-style status reported in the envelope
    pub fn status_code(&self) -> u16 {
        match self {
            ClientError::Authentication => 401,
            ClientError::Connection { .. } => 503,
            ClientError::Api { status, .. } => *status,
            ClientError::ResponseFormat(_) => 500,
            ClientError::Validation(_) => 422,
            ClientError::Unexpected(_) => 500,
        }
    }
}

impl From<ClientError> for Envelope {
    fn from(err: ClientError) -> Self {
        Envelope::failure(err.kind(), err.to_string(), Some(err.status_code()))
    }
}
