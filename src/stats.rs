//! Per-endpoint request statistics
//!
//! The transport reports one observation per `execute` call. Recording is a
//! side channel only; nothing in the pipeline reads these numbers back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Sink for request observations
pub trait StatsRecorder: Send + Sync {
    fn record(&self, endpoint: &str, success: bool, response_time: Duration);
}

/// Discards every observation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsRecorder for NoopStats {
    fn record(&self, _endpoint: &str, _success: bool, _response_time: Duration) {}
}

/// Counters kept for one endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointStats {
    pub request_count: u64,
    pub success_count: u64,
    pub last_response_time: Option<Duration>,
    pub last_request_at: Option<DateTime<Utc>>,
}

/// Thread-safe in-process statistics table
#[derive(Debug, Default)]
pub struct InMemoryStats {
    endpoints: DashMap<String, EndpointStats>,
}

impl InMemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, endpoint: &str) -> Option<EndpointStats> {
        self.endpoints.get(endpoint).map(|s| s.clone())
    }

    /// All endpoints, sorted by name
    pub fn all(&self) -> Vec<(String, EndpointStats)> {
        let mut rows: Vec<_> = self
            .endpoints
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

impl StatsRecorder for InMemoryStats {
    fn record(&self, endpoint: &str, success: bool, response_time: Duration) {
        let mut stats = self.endpoints.entry(endpoint.to_string()).or_default();
        stats.request_count += 1;
        if success {
            stats.success_count += 1;
        }
        stats.last_response_time = Some(response_time);
        stats.last_request_at = Some(Utc::now());
    }
}
