//! Error types for cross-network messaging

use thiserror::Error;

/// Result type for cross-network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cross-network errors
#[derive(Error, Debug)]
pub enum Error {
    /// No transport registered for the named network
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// No response within the request timeout, after all attempts
    #[error("No response from {network} after {attempts} attempt(s)")]
    Timeout {
        /// Network that failed to respond
        network: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Transport-level failure (counterpart returned an error)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transport channel closed (counterpart gone)
    #[error("Network channel closed: {0}")]
    Closed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
