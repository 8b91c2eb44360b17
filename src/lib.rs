//! Wildberries seller API client
//!
//! A typed, cached client for the marketplace REST API. Every operation
//! returns an [`Envelope`]; reads are served from a TTL cache when possible
//! and validated before they are stored.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod stats;
pub mod sweep;
pub mod transport;

pub use client::WbClient;
pub use config::ClientConfig;
pub use envelope::{Envelope, ErrorKind};
pub use error::ClientError;
