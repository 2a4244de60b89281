//! Fault taxonomy for gateway and store operations.
//!
//! Every fallible gateway or store call returns `Result<_, Fault>` and
//! callers pattern-match on the variant. How each variant is absorbed:
//!
//! - `Transient` never reaches the caller of a mutation or read: writes are
//!   queued for later replay, reads fall back to the cached snapshot.
//! - `Validation` is surfaced immediately, before any remote or queue
//!   interaction.
//! - `Storage` means the local store could not persist; it is logged and
//!   surfaced, since losing the ability to queue would be silent data loss.
//! - `Upload` is swallowed by the orchestrator: the expense is still saved,
//!   just without the receipt reference.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Fault {
    /// Network or remote-service unavailability, including timeouts.
    #[error("remote service unavailable: {0}")]
    Transient(String),

    /// Input rejected before any remote or queue interaction.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The local durable store could not complete an operation.
    #[error("local store failure: {0}")]
    Storage(String),

    /// Receipt upload failed; the expense itself is unaffected.
    #[error("receipt upload failed: {0}")]
    Upload(String),
}

impl Fault {
    /// Whether this fault is recoverable by queueing or cache fallback.
    pub fn is_transient(&self) -> bool {
        matches!(self, Fault::Transient(_))
    }

    pub fn transient(msg: impl std::fmt::Display) -> Self {
        Fault::Transient(msg.to_string())
    }

    pub fn validation(msg: impl std::fmt::Display) -> Self {
        Fault::Validation(msg.to_string())
    }

    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Fault::Storage(msg.to_string())
    }

    pub fn upload(msg: impl std::fmt::Display) -> Self {
        Fault::Upload(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Fault::transient("connection refused").is_transient());
        assert!(!Fault::validation("title is required").is_transient());
        assert!(!Fault::storage("disk full").is_transient());
        assert!(!Fault::upload("413 payload too large").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let fault = Fault::transient("connect timeout after 10s");
        assert_eq!(
            fault.to_string(),
            "remote service unavailable: connect timeout after 10s"
        );
    }
}
