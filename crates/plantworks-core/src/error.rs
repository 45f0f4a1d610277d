//! Error types for plantworks-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Session store failure
    #[error("session error: {0}")]
    Session(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] plantworks_llm::Error),

    /// Tool error
    #[error("tool error: {0}")]
    Tool(#[from] plantworks_tools::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
