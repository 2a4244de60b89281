//! Shared types for the outlay workspace.
//!
//! This crate provides foundational types used across multiple crates in the
//! workspace, breaking circular dependency chains:
//!
//! - [`entities`] - the `Expense` and `Category` records plus the draft
//!   (input) forms submitted by callers
//! - [`queue`] - the pending-operation record buffered while offline
//! - [`fault`] - the `Fault` taxonomy returned by gateway and store calls
//! - [`month`] - calendar-month window arithmetic for filtered fetches
//! - [`env_utils`] - typed environment variable parsing

pub mod entities;
pub mod env_utils;
pub mod fault;
pub mod month;
pub mod queue;

pub use entities::{Category, CategoryDraft, Expense, ExpenseDraft, DEFAULT_CURRENCY};
pub use fault::Fault;
pub use month::MonthWindow;
pub use queue::{Collection, OpKind, QueuedOperation};
