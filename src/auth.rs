//! Google service-account token manager.
//!
//! Google Programmable Search is authorised with OAuth2 bearer tokens
//! obtained by signing a JWT assertion with the service account's RSA key
//! and exchanging it at Google's token endpoint (the
//! `urn:ietf:params:oauth:grant-type:jwt-bearer` grant).
//!
//! One [`TokenManager`] is constructed at aggregator start and shared by
//! the web and image adapters. The cached token is guarded by an async
//! mutex held across the refresh, so concurrent callers racing past an
//! expired token await the single in-flight exchange instead of issuing
//! duplicates.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SearchError;

/// Google's OAuth2 token endpoint; also the `aud` claim of the assertion.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope granting Custom Search API access.
const SCOPE: &str = "https://www.googleapis.com/auth/cse";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before their stated expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime claimed in the signed assertion.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// The fields of a service-account key file this crate needs.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    client_email: String,
    #[serde(default)]
    private_key: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Process-lifetime cache of a service-account bearer token.
///
/// The raw service-account JSON is parsed on the refresh path so that a
/// malformed secret degrades only the Google slots of individual searches
/// rather than preventing startup.
pub struct TokenManager {
    raw_key: String,
    client: reqwest::Client,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
    /// Bypasses RSA signing so tests can drive the exchange without a
    /// real service-account key.
    #[cfg(test)]
    assertion_override: Option<String>,
}

impl TokenManager {
    /// Create a manager over the raw `GOOGLE_SERVICE_ACCOUNT` JSON.
    pub fn new(raw_key: String, client: reqwest::Client) -> Self {
        Self::with_endpoint(raw_key, client, TOKEN_URL.to_string())
    }

    /// Create a manager exchanging assertions at a custom endpoint.
    /// Intended for tests.
    pub fn with_endpoint(raw_key: String, client: reqwest::Client, token_url: String) -> Self {
        Self {
            raw_key,
            client,
            token_url,
            cached: Mutex::new(None),
            #[cfg(test)]
            assertion_override: None,
        }
    }

    /// Return a valid bearer token, refreshing if the cached one is
    /// missing or within [`REFRESH_MARGIN`] of expiry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Credential`] if the service-account secret
    /// is malformed or the token exchange fails. No retry is attempted;
    /// the failure is scoped to the search call that triggered it.
    pub async fn get_access_token(&self) -> Result<String, SearchError> {
        let mut slot = self.cached.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.exchange().await?;
        let access_token = token.access_token.clone();
        tracing::debug!(expires_in = token.expires_in, "service-account token refreshed");
        *slot = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn exchange(&self) -> Result<TokenResponse, SearchError> {
        let assertion = self.sign_assertion()?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::Credential(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .and_then(|d| d.as_str())
                        .map(str::to_owned)
                });
            return Err(SearchError::Credential(detail.unwrap_or_else(|| {
                format!("token exchange failed: {}", status.as_u16())
            })));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SearchError::Credential(format!("malformed token response: {e}")))
    }

    /// Build and sign the RS256 JWT-bearer assertion.
    fn sign_assertion(&self) -> Result<String, SearchError> {
        #[cfg(test)]
        if let Some(assertion) = &self.assertion_override {
            return Ok(assertion.clone());
        }

        let key: ServiceAccountKey = serde_json::from_str(&self.raw_key)
            .map_err(|_| SearchError::Credential("invalid Google service account JSON".into()))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(SearchError::Credential(
                "service account missing client_email or private_key".into(),
            ));
        }

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SearchError::Credential(format!("invalid service account private key: {e}")))?;

        let now = unix_now();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        // Header::new sets {"alg":"RS256","typ":"JWT"}; jsonwebtoken emits
        // unpadded base64url segments as the grant requires.
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| SearchError::Credential(format!("failed to sign assertion: {e}")))
    }

    #[cfg(test)]
    fn with_fixed_assertion(client: reqwest::Client, token_url: String, assertion: &str) -> Self {
        Self {
            raw_key: String::new(),
            client,
            token_url,
            cached: Mutex::new(None),
            assertion_override: Some(assertion.to_string()),
        }
    }

    #[cfg(test)]
    async fn seed(&self, access_token: &str, ttl: Duration) {
        let mut slot = self.cached.lock().await;
        *slot = Some(CachedToken {
            access_token: access_token.to_string(),
            expires_at: Instant::now() + ttl,
        });
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Points at a reserved port; tests that reach the network would fail
    // fast rather than hang.
    fn manager(raw_key: &str) -> TokenManager {
        TokenManager::with_endpoint(
            raw_key.to_string(),
            reqwest::Client::new(),
            "http://127.0.0.1:9/token".to_string(),
        )
    }

    #[tokio::test]
    async fn invalid_json_is_a_credential_error() {
        let manager = manager("not json");
        let err = manager.get_access_token().await.unwrap_err();
        assert!(err
            .to_string()
            .contains("invalid Google service account JSON"));
    }

    #[tokio::test]
    async fn missing_fields_rejected() {
        let manager = manager(r#"{"client_email":"","private_key":""}"#);
        let err = manager.get_access_token().await.unwrap_err();
        assert!(err
            .to_string()
            .contains("missing client_email or private_key"));
    }

    #[tokio::test]
    async fn malformed_private_key_rejected_before_any_network_call() {
        let manager =
            manager(r#"{"client_email":"svc@example.iam","private_key":"not a pem"}"#);
        let err = manager.get_access_token().await.unwrap_err();
        assert!(err.to_string().contains("private key"));
    }

    #[tokio::test]
    async fn fresh_cached_token_returned_without_exchange() {
        // The endpoint is unreachable, so an attempted exchange would error:
        // getting Ok back proves the cache short-circuited the refresh.
        let manager = manager("not json");
        manager.seed("cached-token", Duration::from_secs(3600)).await;
        let token = manager.get_access_token().await.expect("cache hit");
        assert_eq!(token, "cached-token");
    }

    #[tokio::test]
    async fn token_within_refresh_margin_triggers_refresh() {
        // 30s remaining is inside the 60s margin; the refresh path runs and
        // hits the invalid-JSON error instead of returning the stale token.
        let manager = manager("not json");
        manager.seed("stale-token", Duration::from_secs(30)).await;
        let result = manager.get_access_token().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh_outcome() {
        let manager = std::sync::Arc::new(manager("not json"));
        manager.seed("cached-token", Duration::from_secs(3600)).await;

        let a = manager.clone();
        let b = manager.clone();
        let (ra, rb) = tokio::join!(a.get_access_token(), b.get_access_token());
        assert_eq!(ra.expect("cache hit"), "cached-token");
        assert_eq!(rb.expect("cache hit"), "cached-token");
    }

    /// Minimal HTTP token endpoint that counts how many exchanges arrive.
    async fn stub_token_endpoint() -> (std::net::SocketAddr, std::sync::Arc<AtomicUsize>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub endpoint");
        let addr = listener.local_addr().expect("local addr");
        let exchanges = std::sync::Arc::new(AtomicUsize::new(0));

        let counter = std::sync::Arc::clone(&exchanges);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let body = r#"{"access_token":"fresh-token","expires_in":3600}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (addr, exchanges)
    }

    #[tokio::test]
    async fn expired_token_exchanged_exactly_once_for_concurrent_callers() {
        let (addr, exchanges) = stub_token_endpoint().await;

        let manager = std::sync::Arc::new(TokenManager::with_fixed_assertion(
            reqwest::Client::new(),
            format!("http://{addr}/token"),
            "signed-assertion",
        ));
        // 30s remaining is inside the 60s margin: every caller sees a
        // stale token and wants a refresh.
        manager.seed("stale-token", Duration::from_secs(30)).await;

        let a = manager.clone();
        let b = manager.clone();
        let c = manager.clone();
        let (ra, rb, rc) = tokio::join!(
            a.get_access_token(),
            b.get_access_token(),
            c.get_access_token()
        );
        assert_eq!(ra.expect("refreshed"), "fresh-token");
        assert_eq!(rb.expect("refreshed"), "fresh-token");
        assert_eq!(rc.expect("refreshed"), "fresh-token");

        // The first caller holds the cache lock across its exchange; the
        // others then hit the refreshed cache instead of exchanging again.
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }
}
