//! outlay: an offline-first expense ledger client.
//!
//! The workspace is split by responsibility:
//!
//! - [`outlay_types`] - shared entity, queue, and fault types
//! - [`outlay_store`] - the local durable store (read cache + pending queue)
//! - [`outlay_remote`] - the remote data gateway (REST, identity, receipts,
//!   change feed)
//! - [`outlay_sync`] - the sync orchestrator, read-through reads, queue
//!   replay, and CSV export
//!
//! This crate re-exports them and ships the `outlay` CLI binary.

pub use outlay_remote;
pub use outlay_store;
pub use outlay_sync;
pub use outlay_types;

use std::path::PathBuf;

/// Default data directory (`<platform data dir>/outlay`), overridable with
/// the CLI's `--data-dir` flag.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("outlay")
}
