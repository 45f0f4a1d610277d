//! Error types for plantworks-tools

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// Tool not found
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Arguments failed the contract's input schema
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Live source down and no usable mock
    #[error("tool '{tool}' unavailable: {reason}")]
    Unavailable {
        /// Tool name
        tool: String,
        /// Why every path failed
        reason: String,
    },

    /// Tool execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Credential for a live source is not configured
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Registration rejected
    #[error("registration error: {0}")]
    Registration(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
