//! Error types for the lookup service.

use serp_extract::ExtractError;

/// Top-level error type for the lookup service and its host bridge.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Extraction, store, or transport error from the core library.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A request was well-formed but its arguments were not usable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Host bridge protocol error.
    #[error("bridge error: {0}")]
    Bridge(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LookupError>;
