//! Offline-first synchronization core.
//!
//! This crate decides, per operation, whether to apply a mutation remotely
//! now or buffer it locally, and drains the buffer when connectivity
//! returns:
//!
//! - [`SyncEngine`] - the orchestrator: validate, attempt remotely, queue on
//!   transient failure, replay FIFO with stop-at-first-failure
//! - [`ReadThrough`] - collection reads that refresh the cached snapshot on
//!   success and fall back to it on failure
//! - [`export`] - monthly CSV report generation
//! - [`watcher`] - background connectivity probe that triggers replay on an
//!   offline-to-online transition
//!
//! The [`RemoteGateway`] trait is the seam to the remote service; the
//! production implementation lives in `outlay-remote`, tests substitute
//! their own.

pub mod engine;
pub mod export;
pub mod ports;
pub mod read_through;
pub mod watcher;

pub use engine::{ReceiptFile, ReplayReport, SyncEngine};
pub use ports::RemoteGateway;
pub use read_through::ReadThrough;
pub use watcher::{ConnectivityWatcher, WatcherHandle};
