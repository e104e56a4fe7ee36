//! Aggregator configuration with env-based credential loading.
//!
//! [`SearchConfig`] carries provider credentials and request tunables.
//! Credentials arrive via environment variables (the binary loads a `.env`
//! file first); all of them are optional — an unconfigured provider either
//! degrades to an empty response (Google) or surfaces a credential error in
//! its envelope slot (Brave).

use crate::error::SearchError;

/// Configuration for the search aggregator.
///
/// Use [`Default::default()`] for tests and [`SearchConfig::from_env`] in
/// the binary.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Brave Search API subscription token (`BRAVE_API_KEY`).
    pub brave_api_key: Option<String>,
    /// Google Programmable Search engine ID (`GOOGLE_CX`).
    pub google_cx: Option<String>,
    /// Raw Google service-account JSON (`GOOGLE_SERVICE_ACCOUNT`).
    pub google_service_account: Option<String>,
    /// Results requested per provider per page.
    pub page_size: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// TTL for the in-memory web-envelope cache. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Custom User-Agent. `None` uses the crate's default identifier.
    pub user_agent: Option<String>,
}

/// User-Agent sent when none is configured. Marginalia in particular asks
/// automated clients to identify themselves.
pub const DEFAULT_USER_AGENT: &str =
    concat!("metasearch/", env!("CARGO_PKG_VERSION"));

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            brave_api_key: None,
            google_cx: None,
            google_service_account: None,
            page_size: 10,
            timeout_seconds: 10,
            cache_ttl_seconds: 300,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brave_api_key: non_empty_env("BRAVE_API_KEY"),
            google_cx: non_empty_env("GOOGLE_CX"),
            google_service_account: non_empty_env("GOOGLE_SERVICE_ACCOUNT"),
            page_size: parsed_env("SEARCH_PAGE_SIZE").unwrap_or(defaults.page_size),
            timeout_seconds: parsed_env("SEARCH_TIMEOUT_SECONDS")
                .unwrap_or(defaults.timeout_seconds),
            cache_ttl_seconds: parsed_env("SEARCH_CACHE_TTL_SECONDS")
                .unwrap_or(defaults.cache_ttl_seconds),
            user_agent: non_empty_env("SEARCH_USER_AGENT"),
        }
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `page_size` must be between 1 and 20 (providers cap at 10-20 per call)
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page_size == 0 || self.page_size > 20 {
            return Err(SearchError::Config(
                "page_size must be between 1 and 20".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The User-Agent to send on upstream requests.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert!(config.brave_api_key.is_none());
        assert!(config.google_cx.is_none());
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_page_size_rejected() {
        let config = SearchConfig {
            page_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn oversized_page_size_rejected() {
        let config = SearchConfig {
            page_size: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn default_user_agent_identifies_crate() {
        let config = SearchConfig::default();
        assert!(config.user_agent().starts_with("metasearch/"));
    }

    #[test]
    fn custom_user_agent_wins() {
        let config = SearchConfig {
            user_agent: Some("TestBot/1.0".into()),
            ..Default::default()
        };
        assert_eq!(config.user_agent(), "TestBot/1.0");
    }
}
