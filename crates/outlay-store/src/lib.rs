//! Filesystem-backed durable store for offline operation.
//!
//! This crate owns all local persistent state, split into two independent
//! regions under one root directory:
//!
//! - **read cache** (`cache/<table>.json`): last-known-good snapshot per
//!   collection, replaced wholesale on every successful fetch
//! - **pending-operation queue** (`queue/ops.jsonl`): append-only log of
//!   mutations that could not be applied remotely, replayed in FIFO order
//!
//! The regions are never transactionally coupled to each other. Every write
//! is either a whole-file atomic replace (write to `.tmp`, then rename) or a
//! locked append, so a crash mid-write cannot corrupt the store structure.
//! The layout is plain JSON on disk, introspectable by table name.

pub mod metrics;
pub mod paths;
pub mod store;

pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use store::{CacheEntryInfo, LocalStore, StoreReport};
