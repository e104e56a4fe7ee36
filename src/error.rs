//! Error types for the metasearch crate.
//!
//! All errors use stable string messages suitable for display to users
//! and for embedding in a provider's response envelope. No API keys or
//! signed assertions appear in error messages.

/// Errors that can occur during aggregated search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request itself is invalid (blank query, bad parameter).
    #[error("validation error: {0}")]
    Validation(String),

    /// A credential is missing or malformed, or a token exchange failed.
    #[error("credential error: {0}")]
    Credential(String),

    /// An HTTP request to an upstream provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An upstream provider answered 429. Kept as a distinct variant so
    /// callers can tell throttling apart from other upstream failures.
    #[error("rate limited - too many requests")]
    RateLimited,

    /// Failed to parse an upstream provider's response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid aggregator configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for metasearch results.
pub type Result<T> = std::result::Result<T, SearchError>;
