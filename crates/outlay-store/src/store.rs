//! The local durable store: read cache + pending-operation queue.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use outlay_types::{Fault, QueuedOperation};

use crate::metrics::StoreMetrics;
use crate::paths::{
    atomic_write, atomic_write_json, cache_dir, cache_snapshot_path, queue_dir, queue_log_path,
    validate_cache_key,
};

/// Filesystem-backed durable store.
///
/// Thread-safe: cache writes are whole-file atomic replaces, and all queue
/// file access is serialized behind an internal mutex. The cache region and
/// the queue region are independent; no operation touches both.
pub struct LocalStore {
    root: Arc<Path>,
    queue_lock: Mutex<()>,
    metrics: StoreMetrics,
}

impl LocalStore {
    /// Open (or create) a store rooted at the given directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Fault> {
        let root = root.as_ref().to_path_buf();
        for dir in [cache_dir(&root), queue_dir(&root)] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                Fault::storage(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(Self {
            root: Arc::from(root),
            queue_lock: Mutex::new(()),
            metrics: StoreMetrics::default(),
        })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Operation counters shared with the sync layer.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    // ==================== Cache Region ====================

    /// Replace the cached snapshot for a key wholesale.
    pub fn cache_set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Fault> {
        validate_cache_key(key)?;
        atomic_write_json(&cache_snapshot_path(&self.root, key), value)?;
        debug!(key, "cache snapshot replaced");
        Ok(())
    }

    /// Last cached snapshot for a key, or `None` if never cached.
    pub fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Fault> {
        validate_cache_key(key)?;
        let path = cache_snapshot_path(&self.root, key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .map_err(|e| Fault::storage(format!("failed to read {}: {}", path.display(), e)))?;
        let value = serde_json::from_str(&json).map_err(|e| {
            Fault::storage(format!("failed to parse snapshot {}: {}", path.display(), e))
        })?;
        Ok(Some(value))
    }

    // ==================== Queue Region ====================

    /// Append one entry to the pending-operation queue.
    pub fn queue_add(&self, entry: &QueuedOperation) -> Result<(), Fault> {
        let line = serde_json::to_string(entry)
            .map_err(|e| Fault::storage(format!("failed to serialize queue entry: {}", e)))?;
        let path = queue_log_path(&self.root);

        let _guard = self.queue_lock.lock();
        let repair_newline = !log_ends_with_newline(&path)
            .map_err(|e| Fault::storage(format!("failed to stat {}: {}", path.display(), e)))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Fault::storage(format!("failed to open {}: {}", path.display(), e)))?;
        let result = if repair_newline {
            // A previous append was cut short; isolate the torn fragment on
            // its own line so this entry stays parseable.
            file.write_all(b"\n")
        } else {
            Ok(())
        };
        result
            .and_then(|_| file.write_all(line.as_bytes()))
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.flush())
            .map_err(|e| Fault::storage(format!("failed to append to {}: {}", path.display(), e)))?;

        self.metrics.record_op_enqueued();
        debug!(id = %entry.id, table = %entry.table, "operation queued");
        Ok(())
    }

    /// All queued entries in replay order: `created_at` ascending, ties
    /// broken by insertion sequence (the append order of the log).
    pub fn queue_all(&self) -> Result<Vec<QueuedOperation>, Fault> {
        let _guard = self.queue_lock.lock();
        self.read_queue_locked()
    }

    /// Number of queued entries.
    pub fn queue_len(&self) -> Result<usize, Fault> {
        Ok(self.queue_all()?.len())
    }

    /// Remove the entire queue.
    pub fn queue_clear(&self) -> Result<(), Fault> {
        let _guard = self.queue_lock.lock();
        atomic_write(&queue_log_path(&self.root), b"")
    }

    /// Remove exactly the entries with the given ids, keeping the rest.
    ///
    /// This is how a replay pass clears its snapshot without racing a
    /// concurrent `queue_add`: entries appended after the snapshot was taken
    /// are not in the id set and survive the rewrite.
    pub fn queue_prune(&self, ids: &[String]) -> Result<(), Fault> {
        let _guard = self.queue_lock.lock();
        let remaining: Vec<String> = self
            .read_queue_locked()?
            .into_iter()
            .filter(|entry| !ids.contains(&entry.id))
            .map(|entry| serde_json::to_string(&entry).expect("entry serialized once already"))
            .collect();
        let mut contents = remaining.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        atomic_write(&queue_log_path(&self.root), contents.as_bytes())
    }

    /// Must be called with `queue_lock` held.
    fn read_queue_locked(&self) -> Result<Vec<QueuedOperation>, Fault> {
        let path = queue_log_path(&self.root);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Fault::storage(format!("failed to read {}: {}", path.display(), e)))?;

        let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut entries = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            match serde_json::from_str::<QueuedOperation>(line) {
                Ok(entry) => entries.push(entry),
                // A crash mid-append leaves one truncated line (the write
                // was never acknowledged). Drop it; keep everything intact.
                Err(e) => warn!("dropping unparseable queue entry at line {}: {}", i + 1, e),
            }
        }

        // The log is already in insertion order; a stable sort on the
        // timestamp keeps that order for ties.
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    // ==================== Introspection ====================

    /// Describe both regions for debugging.
    pub fn describe(&self) -> Result<StoreReport, Fault> {
        let mut cache = Vec::new();
        let dir = cache_dir(&self.root);
        if dir.exists() {
            let mut names: Vec<PathBuf> = std::fs::read_dir(&dir)
                .map_err(|e| Fault::storage(format!("failed to list {}: {}", dir.display(), e)))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
                .collect();
            names.sort();
            for path in names {
                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                let rows = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
                    .and_then(|v| v.as_array().map(|a| a.len()));
                cache.push(CacheEntryInfo { key, rows, bytes });
            }
        }
        Ok(StoreReport {
            root: self.root.to_path_buf(),
            cache,
            queue_len: self.queue_len()?,
        })
    }
}

/// Whether the queue log's last byte is a newline (vacuously true for a
/// missing or empty file).
fn log_ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// One cached snapshot, as seen on disk.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub key: String,
    /// Row count, when the snapshot is a JSON array.
    pub rows: Option<usize>,
    pub bytes: u64,
}

/// Snapshot of both store regions (for the `store` CLI command).
#[derive(Debug, Clone)]
pub struct StoreReport {
    pub root: PathBuf,
    pub cache: Vec<CacheEntryInfo>,
    pub queue_len: usize,
}

impl StoreReport {
    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Local store at {}", self.root.display()));
        lines.push("=".repeat(50));
        lines.push("Read cache:".to_string());
        if self.cache.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for entry in &self.cache {
            let rows = entry
                .rows
                .map(|n| format!("{} rows", n))
                .unwrap_or_else(|| "not an array".to_string());
            lines.push(format!("  {:<14} {:>10}  {} bytes", entry.key, rows, entry.bytes));
        }
        lines.push(format!("Pending queue:   {} entries", self.queue_len));
        lines.join("\n")
    }
}
