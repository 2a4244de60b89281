//! Path utilities for the store's on-disk layout.

use std::path::{Path, PathBuf};

use outlay_types::Fault;

/// Validate a cache key so it maps to a sane file name.
///
/// Keys are collection table names ("expenses", "categories"); anything
/// outside `[a-z0-9_-]` is rejected rather than escaped.
pub fn validate_cache_key(key: &str) -> Result<(), Fault> {
    if key.is_empty() {
        return Err(Fault::storage("cache key must not be empty"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(Fault::storage(format!("invalid cache key {:?}", key)));
    }
    Ok(())
}

/// Directory holding one snapshot file per cached collection.
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join("cache")
}

/// Snapshot file for a cache key.
pub fn cache_snapshot_path(root: &Path, key: &str) -> PathBuf {
    cache_dir(root).join(format!("{}.json", key))
}

/// Directory holding the pending-operation queue.
pub fn queue_dir(root: &Path) -> PathBuf {
    root.join("queue")
}

/// Append-only queue log (one JSON record per line).
pub fn queue_log_path(root: &Path) -> PathBuf {
    queue_dir(root).join("ops.jsonl")
}

/// Ensure all parent directories exist for a path.
pub fn ensure_parent_dirs(path: &Path) -> Result<(), Fault> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Fault::storage(format!(
                "failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Write a file atomically (write to .tmp, then rename).
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), Fault> {
    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|s| s.to_str()).unwrap_or("tmp")
    ));
    std::fs::write(&tmp_path, contents).map_err(|e| {
        Fault::storage(format!(
            "failed to write temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        Fault::storage(format!(
            "failed to rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })?;
    Ok(())
}

/// Write a JSON file atomically (compact format, no pretty printing).
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Fault> {
    let json = serde_json::to_vec(value)
        .map_err(|e| Fault::storage(format!("failed to serialize JSON: {}", e)))?;
    atomic_write(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cache_key() {
        assert!(validate_cache_key("expenses").is_ok());
        assert!(validate_cache_key("categories").is_ok());
        assert!(validate_cache_key("my_table-2").is_ok());
        assert!(validate_cache_key("").is_err());
        assert!(validate_cache_key("../escape").is_err());
        assert!(validate_cache_key("Has Spaces").is_err());
    }

    #[test]
    fn test_layout_is_split_into_two_regions() {
        let root = Path::new("/data/outlay");
        assert_eq!(
            cache_snapshot_path(root, "expenses"),
            Path::new("/data/outlay/cache/expenses.json")
        );
        assert_eq!(
            queue_log_path(root),
            Path::new("/data/outlay/queue/ops.jsonl")
        );
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("file.json");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        // No temp file left behind.
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
