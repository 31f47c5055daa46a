//! Error types for the gateway

use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
///
/// Parse errors are the gateway's own (malformed values at the string
/// boundary); everything else passes through from the lifecycle layer with
/// its taxonomy intact.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request field
    #[error("Parse error: {0}")]
    Parse(String),

    /// Lifecycle operation failed
    #[error(transparent)]
    Lifecycle(#[from] lifecycle::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_errors_pass_through_verbatim() {
        let err: Error = lifecycle::Error::NotYetFinal("still earmarked".to_string()).into();
        assert_eq!(err.to_string(), "Not yet final: still earmarked");
    }
}
