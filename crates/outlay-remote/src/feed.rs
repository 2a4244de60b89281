//! Polling change feed for the two collections.
//!
//! A side-channel trigger, not a source of truth: subscribers get told that
//! a collection changed remotely and are expected to re-fetch through their
//! normal read path. Detection compares a digest of each poll's response
//! body against the previous one, so the feed stays silent while offline
//! and while nothing changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use outlay_types::Collection;

use crate::gateway::DataGateway;

/// A row-level change notification for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
}

/// Handle for a running feed. Dropping it (or calling `stop`) cancels the
/// background task and ends delivery.
pub struct FeedHandle {
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns and owns the polling loop.
pub struct ChangeFeed;

impl ChangeFeed {
    /// Start watching both collections, delivering [`ChangeEvent`]s to the
    /// callback. Must be called within a tokio runtime.
    pub fn spawn<F>(gateway: Arc<DataGateway>, poll_interval: Duration, callback: F) -> FeedHandle
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let task = tokio::spawn(async move {
            let mut seen: HashMap<Collection, [u8; 32]> = HashMap::new();
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for collection in [Collection::Expenses, Collection::Categories] {
                    let body = match gateway.fetch_raw(collection) {
                        Ok(body) => body,
                        Err(e) => {
                            trace!(table = %collection, "feed poll failed: {}", e);
                            continue;
                        }
                    };
                    let fingerprint = digest(&body);
                    match seen.insert(collection, fingerprint) {
                        Some(previous) if previous != fingerprint => {
                            debug!(table = %collection, "remote change detected");
                            callback(ChangeEvent { collection });
                        }
                        // First successful poll primes the baseline
                        // without firing.
                        _ => {}
                    }
                }
            }
        });
        FeedHandle { task }
    }
}

fn digest(body: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_distinguishes_bodies() {
        let a = digest(r#"[{"id":"1"}]"#);
        let b = digest(r#"[{"id":"1"},{"id":"2"}]"#);
        assert_ne!(a, b);
        assert_eq!(a, digest(r#"[{"id":"1"}]"#));
    }
}
