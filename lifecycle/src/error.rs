//! Error types for lifecycle operations
//!
//! The taxonomy separates caller mistakes (validation), commit races
//! (conflict), counterpart issues (proof, not-yet-final), and fatal
//! conditions. Retryability is part of the contract: `is_retryable`
//! tells a caller whether re-invoking can ever succeed.

use crate::validator::Violation;
use thiserror::Error;

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum Error {
    /// Invariant violation, rejected before submission; never retried
    #[error("Validation failed: {0}")]
    Validation(#[from] Violation),

    /// Lost a compare-and-set race or attempted a transition from the wrong
    /// state; caller may retry against the new current version
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid signature or proof; local state unchanged, retryable once a
    /// valid proof is obtainable
    #[error("Proof rejected: {0}")]
    Proof(String),

    /// Counterpart has not reached a terminal state (or did not answer
    /// within the bounded wait); retry on backoff
    #[error("Not yet final: {0}")]
    NotYetFinal(String),

    /// Record does not exist (fatal for this call)
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// No reservation was ever earmarked for the trade (fatal)
    #[error("Unknown binding: {0}")]
    UnknownBinding(String),

    /// Trade correlation between records does not line up (fatal)
    #[error("Trade mismatch: {0}")]
    TradeMismatch(String),

    /// Trade ID already in use (fatal)
    #[error("Duplicate trade: {0}")]
    DuplicateTrade(String),

    /// Replay against a terminal record, reported distinctly from a
    /// first-time application (fatal)
    #[error("Already final: {0}")]
    AlreadyFinal(String),

    /// Request addressed to a different system or network (fatal)
    #[error("Misrouted request: {0}")]
    Misrouted(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether re-invoking the failed operation can ever succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Conflict(_) | Error::Proof(_) | Error::NotYetFinal(_)
        )
    }
}

impl From<record_store::Error> for Error {
    fn from(err: record_store::Error) -> Self {
        match err {
            record_store::Error::VersionConflict { .. } => Error::Conflict(err.to_string()),
            record_store::Error::Rejected(reason) => Error::Conflict(reason),
            record_store::Error::RecordNotFound(what) => Error::RecordNotFound(what),
            record_store::Error::Attestation(reason) => Error::Proof(reason),
            other => Error::Internal(other.to_string()),
        }
    }
}
