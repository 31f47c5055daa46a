//! Error types for the record store

use crate::types::LinearId;
use thiserror::Error;

/// Result type for record store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Record store errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Compare-and-set lost: the consumed version is no longer current
    #[error("Version conflict on {linear_id}: expected current version {expected}, found {actual}")]
    VersionConflict {
        /// Record whose current version moved
        linear_id: LinearId,
        /// Version the candidate consumed
        expected: u64,
        /// Actual current version
        actual: u64,
    },

    /// Transition rejected by the finality oracle
    #[error("Transition rejected: {0}")]
    Rejected(String),

    /// Attestation error (unknown attestor, bad signature)
    #[error("Attestation error: {0}")]
    Attestation(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
