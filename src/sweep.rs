//! Background cache sweeping
//!
//! Periodically deletes expired cache entries on a tokio interval. The sweep
//! only removes rows already past expiry, so it can run alongside normal
//! client traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::CacheStore;

/// Default interval between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of one sweep, sent to the handle's receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepMessage {
    /// Number of expired entries deleted
    Swept(usize),
    /// The store reported an error; the sweeper keeps running
    Failed(String),
}

/// Configuration for the sweeper
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval: Duration,
    /// Whether to sweep once immediately instead of waiting a full interval
    pub sweep_on_start: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            sweep_on_start: false,
        }
    }
}

/// Runs one sweep and reports its outcome
pub fn sweep_once(store: &dyn CacheStore) -> SweepMessage {
    match store.sweep_expired() {
        Ok(removed) => {
            info!(removed, "swept expired cache entries");
            SweepMessage::Swept(removed)
        }
        Err(e) => {
            warn!(error = %e, "cache sweep failed");
            SweepMessage::Failed(e.to_string())
        }
    }
}

/// Handle for controlling the background sweeper
pub struct SweepHandle {
    /// Channel for receiving sweep outcomes
    pub receiver: mpsc::Receiver<SweepMessage>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawns the sweeper task on the current tokio runtime
    pub fn spawn(store: Arc<dyn CacheStore>, config: SweepConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            if !config.sweep_on_start {
                // Skip the first tick (immediate)
                interval.tick().await;
            }

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let store = Arc::clone(&store);
                        let outcome = tokio::task::spawn_blocking(move || sweep_once(store.as_ref()))
                            .await
                            .unwrap_or_else(|e| SweepMessage::Failed(e.to_string()));
                        // Receiver may be gone; sweeping continues regardless
                        let _ = msg_tx.try_send(outcome);
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            receiver: msg_rx,
            shutdown_tx,
            task,
        }
    }

    /// Stops the sweeper and waits for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, MemoryCacheStore};
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;

    #[test]
    fn test_sweep_config_default() {
        let config = SweepConfig::default();
        assert_eq!(config.interval, Duration::from_secs(86400));
        assert!(!config.sweep_on_start);
    }

    #[test]
    fn test_sweep_once_reports_count() {
        let store = MemoryCacheStore::new();
        let past = Utc::now() - ChronoDuration::seconds(120);
        store.set_at(&CacheKey::new("old", None), &json!(1), 60, past).unwrap();
        store.set(&CacheKey::new("new", None), &json!(2), 60).unwrap();

        assert_eq!(sweep_once(&store), SweepMessage::Swept(1));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_runs_on_start_and_shuts_down() {
        let store = Arc::new(MemoryCacheStore::new());
        let past = Utc::now() - ChronoDuration::seconds(120);
        store.set_at(&CacheKey::new("old", None), &json!(1), 60, past).unwrap();

        let mut handle = SweepHandle::spawn(
            store.clone(),
            SweepConfig {
                interval: Duration::from_secs(3600),
                sweep_on_start: true,
            },
        );

        let message = tokio::time::timeout(Duration::from_secs(5), handle.receiver.recv())
            .await
            .expect("sweeper should report")
            .expect("channel open");
        assert_eq!(message, SweepMessage::Swept(1));
        assert!(store.is_empty().unwrap());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_waits_a_full_interval_by_default() {
        let store = Arc::new(MemoryCacheStore::new());
        let mut handle = SweepHandle::spawn(
            store,
            SweepConfig {
                interval: Duration::from_secs(3600),
                sweep_on_start: false,
            },
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.receiver.try_recv().is_err());

        handle.shutdown().await;
    }
}
