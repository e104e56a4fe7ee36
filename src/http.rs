//! Shared HTTP client for upstream provider requests.
//!
//! One [`reqwest::Client`] is built at aggregator construction and shared
//! by every adapter, so in-flight fan-out requests multiplex over a single
//! connection pool.

use crate::config::SearchConfig;
use crate::error::SearchError;
use std::time::Duration;

/// Build a [`reqwest::Client`] configured for provider API calls.
///
/// The client has:
/// - Timeout from config
/// - A stable User-Agent identifying this aggregator
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        let config = SearchConfig::default();
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = SearchConfig {
            user_agent: Some("TestBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
