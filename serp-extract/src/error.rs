//! Error types for the serp-extract crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. "No results" is never an error; it is an
//! empty result list.

/// Errors that can occur during extraction, storage lookups, or page fetches.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The markup could not be parsed into anything extractable.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP request for markup failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// No live result is stored under the given ID.
    ///
    /// Expired and never-inserted IDs are reported identically.
    #[error("result not found: {0}")]
    NotFound(String),

    /// The result exists but has no link that can be fetched.
    #[error("result has no link: {0}")]
    NoLink(String),
}

/// Convenience type alias for serp-extract results.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse() {
        let err = ExtractError::Parse("markup contains no elements".into());
        assert_eq!(err.to_string(), "parse error: markup contains no elements");
    }

    #[test]
    fn display_config() {
        let err = ExtractError::Config("max_entries must be > 0".into());
        assert_eq!(err.to_string(), "config error: max_entries must be > 0");
    }

    #[test]
    fn display_http() {
        let err = ExtractError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_not_found() {
        let err = ExtractError::NotFound("result-1".into());
        assert_eq!(err.to_string(), "result not found: result-1");
    }

    #[test]
    fn display_no_link() {
        let err = ExtractError::NoLink("result-2".into());
        assert_eq!(err.to_string(), "result has no link: result-2");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtractError>();
    }
}
