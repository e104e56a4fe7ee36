//! Brave Search adapters — commercial web index with API-key auth.
//!
//! Brave paginates at page granularity (`offset = page - 1`) and serves at
//! most ten pages of web results and three pages of images. Requests past
//! the window are answered locally with an empty response.

use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::error::SearchError;
use crate::paging::{BRAVE_IMAGES, BRAVE_WEB};
use crate::types::{display_host, ImageProvider, ImageResult, Provider, ProviderResponse, SearchResult};

const WEB_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const IMAGES_URL: &str = "https://api.search.brave.com/res/v1/images/search";

/// Images requested per page; Brave allows up to 20 per call.
const IMAGE_COUNT: u32 = 20;

/// Brave web search adapter.
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    page_size: u32,
}

impl BraveSearch {
    pub fn new(client: reqwest::Client, api_key: Option<String>, page_size: u32) -> Self {
        Self {
            client,
            api_key,
            page_size,
        }
    }
}

impl ProviderAdapter for BraveSearch {
    async fn fetch_page(&self, query: &str, page: u32) -> Result<ProviderResponse, SearchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SearchError::Credential("Brave API key not configured".into()));
        };

        if BRAVE_WEB.exhausted(page, self.page_size) {
            tracing::trace!(page, "Brave pagination window exhausted");
            return Ok(ProviderResponse::empty());
        }
        let offset = BRAVE_WEB.offset_for(page, self.page_size);

        tracing::trace!(query, offset, "Brave web search");

        let response = self
            .client
            .get(WEB_URL)
            .query(&[
                ("q", query.to_string()),
                ("count", self.page_size.to_string()),
                ("offset", offset.to_string()),
                ("result_filter", "web,news".to_string()),
            ])
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Brave request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned));
            return Err(SearchError::Http(
                message.unwrap_or_else(|| format!("Brave API error: {}", status.as_u16())),
            ));
        }

        let data: WebResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Brave response: {e}")))?;

        Ok(normalize_web(data, self.page_size, offset))
    }

    fn provider(&self) -> Provider {
        Provider::Brave
    }
}

/// Map Brave's web-search schema onto the canonical response shape.
fn normalize_web(data: WebResponse, page_size: u32, offset: u32) -> ProviderResponse {
    let web = data.web.unwrap_or_default();
    let returned = web.results.len();

    let results: Vec<SearchResult> = web
        .results
        .into_iter()
        .map(|item| SearchResult {
            display_url: item
                .meta_url
                .and_then(|m| m.hostname)
                .unwrap_or_else(|| display_host(&item.url)),
            title: item.title,
            url: item.url,
            snippet: item.description,
            source: Provider::Brave,
        })
        .collect();

    tracing::debug!(count = returned, "Brave results normalised");

    ProviderResponse {
        has_more: returned == page_size as usize && BRAVE_WEB.within_ceiling(offset),
        total_results: web.total.unwrap_or(returned as u64).to_string(),
        results,
        error: None,
    }
}

#[derive(Debug, Deserialize)]
struct WebResponse {
    web: Option<WebSection>,
}

#[derive(Debug, Default, Deserialize)]
struct WebSection {
    #[serde(default)]
    results: Vec<WebItem>,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WebItem {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    meta_url: Option<MetaUrl>,
}

#[derive(Debug, Deserialize)]
struct MetaUrl {
    hostname: Option<String>,
}

/// Brave image search adapter.
///
/// Unconfigured or failing image lookups yield an empty list at the
/// orchestrator; images are a best-effort enrichment, not a column of
/// their own.
pub struct BraveImages {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl BraveImages {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Fetch one page of image results.
    pub async fn fetch_images(&self, query: &str, page: u32) -> Result<Vec<ImageResult>, SearchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        if BRAVE_IMAGES.exhausted(page, IMAGE_COUNT) {
            return Ok(Vec::new());
        }
        let offset = BRAVE_IMAGES.offset_for(page, IMAGE_COUNT);

        tracing::trace!(query, offset, "Brave image search");

        let response = self
            .client
            .get(IMAGES_URL)
            .query(&[
                ("q", query.to_string()),
                ("count", IMAGE_COUNT.to_string()),
                ("offset", offset.to_string()),
            ])
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Brave images request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "Brave images error: {}",
                status.as_u16()
            )));
        }

        let data: ImagesResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Brave images response: {e}")))?;

        Ok(normalize_images(data))
    }
}

/// Map Brave's image schema, dropping entries without both URLs.
fn normalize_images(data: ImagesResponse) -> Vec<ImageResult> {
    data.results
        .into_iter()
        .filter_map(|item| {
            let thumb_src = item.thumbnail.and_then(|t| t.src);
            let props = item.properties;
            let full_src = props.as_ref().and_then(|p| p.url.clone());

            let thumbnail = thumb_src.clone().or_else(|| full_src.clone())?;
            let full = full_src.or(thumb_src)?;
            if thumbnail.is_empty() || full.is_empty() {
                return None;
            }

            Some(ImageResult {
                thumbnail,
                full,
                title: item.title.unwrap_or_default(),
                source_url: item.url.unwrap_or_default(),
                width: props.as_ref().and_then(|p| p.width),
                height: props.and_then(|p| p.height),
                source: ImageProvider::Brave,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    results: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    title: Option<String>,
    url: Option<String>,
    thumbnail: Option<Thumbnail>,
    properties: Option<ImageProperties>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageProperties {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_WEB_JSON: &str = r#"{
        "web": {
            "total": 4200,
            "results": [
                {
                    "title": "Rust Programming Language",
                    "url": "https://www.rust-lang.org/",
                    "description": "A language empowering everyone.",
                    "meta_url": {"hostname": "rust-lang.org"}
                },
                {
                    "title": "The Rust Book",
                    "url": "https://doc.rust-lang.org/book/",
                    "description": ""
                }
            ]
        }
    }"#;

    #[test]
    fn normalize_web_maps_fields() {
        let data: WebResponse = serde_json::from_str(MOCK_WEB_JSON).expect("parse");
        let response = normalize_web(data, 10, 0);

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].title, "Rust Programming Language");
        assert_eq!(response.results[0].display_url, "rust-lang.org");
        assert_eq!(response.results[0].source, Provider::Brave);
        // No meta_url hostname: derived from the URL.
        assert_eq!(response.results[1].display_url, "doc.rust-lang.org");
        assert_eq!(response.total_results, "4200");
    }

    #[test]
    fn has_more_requires_full_page() {
        let data: WebResponse = serde_json::from_str(MOCK_WEB_JSON).expect("parse");
        // 2 results against a page size of 10: nothing further.
        let response = normalize_web(data, 10, 0);
        assert!(!response.has_more);

        let data: WebResponse = serde_json::from_str(MOCK_WEB_JSON).expect("parse");
        // A full page below the ceiling keeps paginating.
        let response = normalize_web(data, 2, 0);
        assert!(response.has_more);
    }

    #[test]
    fn has_more_false_at_the_ceiling() {
        // Page 10 (offset 9) is the last servable page even when full.
        let data: WebResponse = serde_json::from_str(MOCK_WEB_JSON).expect("parse");
        let response = normalize_web(data, 2, 9);
        assert!(!response.has_more);
    }

    #[test]
    fn missing_web_section_is_empty() {
        let data: WebResponse = serde_json::from_str("{}").expect("parse");
        let response = normalize_web(data, 10, 0);
        assert!(response.results.is_empty());
        assert!(!response.has_more);
        assert_eq!(response.total_results, "0");
    }

    #[tokio::test]
    async fn exhausted_page_returns_empty_without_network() {
        // Client would fail on any real call; page 11 never reaches it.
        let adapter = BraveSearch::new(reqwest::Client::new(), Some("key".into()), 10);
        let response = adapter.fetch_page("cats", 11).await.expect("local answer");
        assert!(response.results.is_empty());
        assert!(!response.has_more);
        assert_eq!(response.total_results, "0");
    }

    #[tokio::test]
    async fn missing_api_key_is_a_credential_error() {
        let adapter = BraveSearch::new(reqwest::Client::new(), None, 10);
        let err = adapter.fetch_page("cats", 1).await.unwrap_err();
        assert!(err.to_string().contains("Brave API key not configured"));
    }

    const MOCK_IMAGES_JSON: &str = r#"{
        "results": [
            {
                "title": "A cat",
                "url": "https://example.com/cats",
                "thumbnail": {"src": "https://thumbs.example.com/cat.jpg"},
                "properties": {"url": "https://images.example.com/cat.jpg", "width": 800, "height": 600}
            },
            {
                "title": "No image data",
                "url": "https://example.com/empty"
            }
        ]
    }"#;

    #[test]
    fn images_filtered_to_complete_entries() {
        let data: ImagesResponse = serde_json::from_str(MOCK_IMAGES_JSON).expect("parse");
        let images = normalize_images(data);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].thumbnail, "https://thumbs.example.com/cat.jpg");
        assert_eq!(images[0].full, "https://images.example.com/cat.jpg");
        assert_eq!(images[0].width, Some(800));
        assert_eq!(images[0].source, ImageProvider::Brave);
    }

    #[test]
    fn image_thumbnail_and_full_cross_fall_back() {
        let json = r#"{"results": [{"thumbnail": {"src": "https://thumbs.example.com/only.jpg"}}]}"#;
        let data: ImagesResponse = serde_json::from_str(json).expect("parse");
        let images = normalize_images(data);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].full, "https://thumbs.example.com/only.jpg");
    }

    #[tokio::test]
    async fn images_without_key_degrade_to_empty() {
        let adapter = BraveImages::new(reqwest::Client::new(), None);
        let images = adapter.fetch_images("cats", 1).await.expect("degraded");
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn images_exhaust_after_page_3() {
        let adapter = BraveImages::new(reqwest::Client::new(), Some("key".into()));
        let images = adapter.fetch_images("cats", 4).await.expect("local answer");
        assert!(images.is_empty());
    }

    #[tokio::test]
    #[ignore] // Live test — run with `cargo test -- --ignored` and BRAVE_API_KEY set.
    async fn live_brave_search() {
        let key = std::env::var("BRAVE_API_KEY").ok();
        let adapter = BraveSearch::new(reqwest::Client::new(), key, 10);
        let response = adapter.fetch_page("rust programming", 1).await.expect("live search");
        assert!(!response.results.is_empty());
    }
}
