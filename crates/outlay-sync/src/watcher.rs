//! Background connectivity watcher.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{ReplayReport, SyncEngine};
use crate::ports::RemoteGateway;

/// Handle for a running watcher. Dropping it (or calling `stop`) cancels
/// the background task.
pub struct WatcherHandle {
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Probes the remote endpoint on an interval and triggers a queue replay
/// on every offline-to-online transition (the connectivity-restore event).
pub struct ConnectivityWatcher;

impl ConnectivityWatcher {
    /// Start probing. Must be called within a tokio runtime.
    ///
    /// The watcher starts in the "offline" state, so if the service is
    /// reachable at the first probe a replay is triggered immediately —
    /// harmless when the queue is empty, exactly right after an offline
    /// restart.
    pub fn spawn<G>(engine: Arc<SyncEngine<G>>, probe_interval: Duration) -> WatcherHandle
    where
        G: RemoteGateway + 'static,
    {
        let task = tokio::spawn(async move {
            let mut was_online = false;
            let mut ticker = tokio::time::interval(probe_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let online = engine.probe();
                if online && !was_online {
                    info!("connectivity restored, replaying pending queue");
                    match engine.try_sync() {
                        Ok(ReplayReport::Completed { replayed }) => {
                            info!(replayed, "offline queue drained");
                        }
                        Ok(ReplayReport::Empty) | Ok(ReplayReport::AlreadyRunning) => {}
                        Ok(ReplayReport::Stopped { replayed, pending, fault }) => {
                            debug!(replayed, pending, "replay stopped, will retry: {}", fault);
                        }
                        Err(fault) => warn!("replay failed: {}", fault),
                    }
                }
                was_online = online;
            }
        });
        WatcherHandle { task }
    }
}
