//! Marginalia adapter — small independent web index, no auth.
//!
//! Marginalia favours small, non-commercial sites, which makes it a
//! useful counterweight to the commercial indexes. It takes a 0-indexed
//! item offset and imposes no pagination ceiling we need to track.

use serde::Deserialize;
use url::Url;

use crate::adapter::ProviderAdapter;
use crate::error::SearchError;
use crate::paging::MARGINALIA_WEB;
use crate::types::{display_host, Provider, ProviderResponse, SearchResult};

const SEARCH_URL: &str = "https://api.marginalia.nu/public/search";

/// Marginalia search adapter.
pub struct MarginaliaSearch {
    client: reqwest::Client,
    page_size: u32,
}

impl MarginaliaSearch {
    pub fn new(client: reqwest::Client, page_size: u32) -> Self {
        Self { client, page_size }
    }
}

impl ProviderAdapter for MarginaliaSearch {
    async fn fetch_page(&self, query: &str, page: u32) -> Result<ProviderResponse, SearchError> {
        let index = MARGINALIA_WEB.offset_for(page, self.page_size);

        // The query travels as a path segment; Url handles the encoding.
        let mut url = Url::parse(SEARCH_URL)
            .map_err(|e| SearchError::Http(format!("Marginalia URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SearchError::Http("Marginalia URL cannot be a base".into()))?
            .push(query);
        url.query_pairs_mut()
            .append_pair("count", &self.page_size.to_string())
            .append_pair("index", &index.to_string());

        tracing::trace!(query, index, "Marginalia search");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Marginalia request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "Marginalia API error: {}",
                status.as_u16()
            )));
        }

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Marginalia response: {e}")))?;

        Ok(normalize(data, self.page_size))
    }

    fn provider(&self) -> Provider {
        Provider::Marginalia
    }
}

/// Map Marginalia's schema onto the canonical response shape.
fn normalize(data: ApiResponse, page_size: u32) -> ProviderResponse {
    let returned = data.results.len();

    let results: Vec<SearchResult> = data
        .results
        .into_iter()
        .map(|item| SearchResult {
            title: item.title.filter(|t| !t.is_empty()).unwrap_or_else(|| item.url.clone()),
            display_url: display_host(&item.url),
            url: item.url,
            snippet: item.description,
            source: Provider::Marginalia,
        })
        .collect();

    tracing::debug!(count = returned, "Marginalia results normalised");

    ProviderResponse {
        has_more: returned == page_size as usize,
        total_results: returned.to_string(),
        results,
        error: None,
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    results: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    title: Option<String>,
    url: String,
    #[serde(default)]
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_JSON: &str = r#"{
        "results": [
            {
                "title": "A handmade website",
                "url": "https://smallweb.example.org/garden",
                "description": "Notes on growing things."
            },
            {
                "url": "https://untitled.example.org/"
            }
        ]
    }"#;

    #[test]
    fn normalize_maps_fields() {
        let data: ApiResponse = serde_json::from_str(MOCK_JSON).expect("parse");
        let response = normalize(data, 10);

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].display_url, "smallweb.example.org");
        assert_eq!(response.results[0].source, Provider::Marginalia);
        // Missing title falls back to the URL.
        assert_eq!(response.results[1].title, "https://untitled.example.org/");
        assert_eq!(response.total_results, "2");
    }

    #[test]
    fn has_more_iff_full_page() {
        let data: ApiResponse = serde_json::from_str(MOCK_JSON).expect("parse");
        assert!(!normalize(data, 10).has_more);

        let data: ApiResponse = serde_json::from_str(MOCK_JSON).expect("parse");
        assert!(normalize(data, 2).has_more);
    }

    #[test]
    fn empty_response_is_valid() {
        let data: ApiResponse = serde_json::from_str("{}").expect("parse");
        let response = normalize(data, 10);
        assert!(response.results.is_empty());
        assert!(!response.has_more);
        assert_eq!(response.total_results, "0");
    }

    #[tokio::test]
    #[ignore] // Live test — run with `cargo test -- --ignored`.
    async fn live_marginalia_search() {
        let adapter = MarginaliaSearch::new(reqwest::Client::new(), 10);
        let response = adapter.fetch_page("wiki", 1).await.expect("live search");
        for result in &response.results {
            assert!(!result.url.is_empty());
        }
    }
}
