//! Metrics and reporting for store and sync operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Operation counters (thread-safe).
///
/// Incremented by the store itself (enqueues) and by the sync layer
/// (refreshes, fallbacks, replays); reported by the `store` CLI command.
#[derive(Debug, Clone, Default)]
pub struct StoreMetrics {
    /// Cache snapshots replaced after a successful remote fetch
    cache_refreshes: Arc<AtomicU64>,
    /// Reads served from the cached snapshot after a remote failure
    cache_fallbacks: Arc<AtomicU64>,
    /// Mutations buffered into the pending queue
    ops_enqueued: Arc<AtomicU64>,
    /// Queued mutations applied remotely during replay
    ops_replayed: Arc<AtomicU64>,
    /// Replay passes that stopped at a failing entry
    replay_passes_failed: Arc<AtomicU64>,
}

impl StoreMetrics {
    pub fn record_cache_refresh(&self) {
        self.cache_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_fallback(&self) {
        self.cache_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_op_enqueued(&self) {
        self.ops_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_op_replayed(&self) {
        self.ops_replayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replay_pass_failed(&self) {
        self.replay_passes_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current counters.
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            cache_refreshes: self.cache_refreshes.load(Ordering::Relaxed),
            cache_fallbacks: self.cache_fallbacks.load(Ordering::Relaxed),
            ops_enqueued: self.ops_enqueued.load(Ordering::Relaxed),
            ops_replayed: self.ops_replayed.load(Ordering::Relaxed),
            replay_passes_failed: self.replay_passes_failed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.cache_refreshes.store(0, Ordering::Relaxed);
        self.cache_fallbacks.store(0, Ordering::Relaxed);
        self.ops_enqueued.store(0, Ordering::Relaxed);
        self.ops_replayed.store(0, Ordering::Relaxed);
        self.replay_passes_failed.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time counter values (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetricsSnapshot {
    pub cache_refreshes: u64,
    pub cache_fallbacks: u64,
    pub ops_enqueued: u64,
    pub ops_replayed: u64,
    pub replay_passes_failed: u64,
}

impl StoreMetricsSnapshot {
    /// Share of reads that had to fall back to the cache.
    pub fn fallback_rate(&self) -> f64 {
        let total = self.cache_refreshes + self.cache_fallbacks;
        if total == 0 {
            return 0.0;
        }
        self.cache_fallbacks as f64 / total as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Sync Metrics".to_string());
        lines.push("=".repeat(50));
        lines.push(format!("  Cache refreshes:   {}", self.cache_refreshes));
        lines.push(format!("  Cache fallbacks:   {}", self.cache_fallbacks));
        lines.push(format!(
            "  Fallback rate:     {:.1}%",
            self.fallback_rate() * 100.0
        ));
        lines.push(format!("  Ops enqueued:      {}", self.ops_enqueued));
        lines.push(format!("  Ops replayed:      {}", self.ops_replayed));
        lines.push(format!(
            "  Failed passes:     {}",
            self.replay_passes_failed
        ));
        lines.join("\n")
    }
}
