//! Google Programmable Search adapters — service-account OAuth.
//!
//! Google addresses results with a 1-indexed item offset (`start`) and
//! will not serve past `start = 91`, so roughly the first hundred results
//! are reachable. Both adapters share one [`TokenManager`] for bearer
//! tokens.

use std::sync::Arc;

use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::auth::TokenManager;
use crate::error::SearchError;
use crate::paging::{GOOGLE_IMAGES, GOOGLE_WEB};
use crate::types::{display_host, ImageProvider, ImageResult, Provider, ProviderResponse, SearchResult};

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Google caps `num` at 10 regardless of the configured page size.
const MAX_NUM: u32 = 10;

/// Response projection keeping payloads small.
const WEB_FIELDS: &str = "items(title,link,displayLink,snippet),searchInformation/totalResults";

/// Google Custom Search web adapter.
pub struct GoogleSearch {
    client: reqwest::Client,
    cx: String,
    tokens: Arc<TokenManager>,
    page_size: u32,
}

impl GoogleSearch {
    pub fn new(client: reqwest::Client, cx: String, tokens: Arc<TokenManager>, page_size: u32) -> Self {
        Self {
            client,
            cx,
            tokens,
            page_size,
        }
    }
}

impl ProviderAdapter for GoogleSearch {
    async fn fetch_page(&self, query: &str, page: u32) -> Result<ProviderResponse, SearchError> {
        if GOOGLE_WEB.exhausted(page, self.page_size) {
            tracing::trace!(page, "Google pagination window exhausted");
            return Ok(ProviderResponse::empty());
        }
        let start = GOOGLE_WEB.offset_for(page, self.page_size);
        let num = self.page_size.min(MAX_NUM);

        let access_token = self.tokens.get_access_token().await?;

        tracing::trace!(query, start, "Google web search");

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("cx", self.cx.clone()),
                ("q", query.to_string()),
                ("num", num.to_string()),
                ("start", start.to_string()),
                ("fields", WEB_FIELDS.to_string()),
            ])
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Google request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_owned)
                });
            return Err(SearchError::Http(
                message.unwrap_or_else(|| format!("Google API error: {}", status.as_u16())),
            ));
        }

        let data: WebResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Google response: {e}")))?;

        Ok(normalize_web(data, num, start))
    }

    fn provider(&self) -> Provider {
        Provider::Google
    }
}

/// Map Google's schema onto the canonical response shape.
fn normalize_web(data: WebResponse, num: u32, start: u32) -> ProviderResponse {
    let returned = data.items.len();

    let results: Vec<SearchResult> = data
        .items
        .into_iter()
        .map(|item| SearchResult {
            display_url: item
                .display_link
                .unwrap_or_else(|| display_host(&item.link)),
            title: item.title,
            url: item.link,
            snippet: item.snippet,
            source: Provider::Google,
        })
        .collect();

    let total: u64 = data
        .search_information
        .and_then(|info| info.total_results)
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    // More pages exist only while the upstream estimate extends past this
    // window, the window sits strictly below the start ceiling, and the
    // page came back full.
    let has_more = (u64::from(start) + returned as u64).saturating_sub(1) < total
        && GOOGLE_WEB.within_ceiling(start)
        && returned == num as usize;

    tracing::debug!(count = returned, total, "Google results normalised");

    ProviderResponse {
        results,
        has_more,
        total_results: total.to_string(),
        error: None,
    }
}

#[derive(Debug, Deserialize)]
struct WebResponse {
    #[serde(default)]
    items: Vec<WebItem>,
    #[serde(rename = "searchInformation")]
    search_information: Option<SearchInformation>,
}

#[derive(Debug, Deserialize)]
struct WebItem {
    title: String,
    link: String,
    #[serde(rename = "displayLink")]
    display_link: Option<String>,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchInformation {
    #[serde(rename = "totalResults")]
    total_results: Option<String>,
}

/// Google image search adapter (Custom Search with `searchType=image`).
pub struct GoogleImages {
    client: reqwest::Client,
    cx: String,
    tokens: Arc<TokenManager>,
}

impl GoogleImages {
    pub fn new(client: reqwest::Client, cx: String, tokens: Arc<TokenManager>) -> Self {
        Self { client, cx, tokens }
    }

    /// Fetch one page of image results.
    pub async fn fetch_images(&self, query: &str, page: u32) -> Result<Vec<ImageResult>, SearchError> {
        if GOOGLE_IMAGES.exhausted(page, MAX_NUM) {
            return Ok(Vec::new());
        }
        let start = GOOGLE_IMAGES.offset_for(page, MAX_NUM);

        let access_token = self.tokens.get_access_token().await?;

        tracing::trace!(query, start, "Google image search");

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("cx", self.cx.clone()),
                ("q", query.to_string()),
                ("searchType", "image".to_string()),
                ("num", MAX_NUM.to_string()),
                ("start", start.to_string()),
            ])
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Google images request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "Google images error: {}",
                status.as_u16()
            )));
        }

        let data: ImagesResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Google images response: {e}")))?;

        Ok(normalize_images(data))
    }
}

/// Map Google's image schema, dropping entries without both URLs.
fn normalize_images(data: ImagesResponse) -> Vec<ImageResult> {
    data.items
        .into_iter()
        .filter_map(|item| {
            let meta = item.image;
            let thumbnail = meta
                .as_ref()
                .and_then(|m| m.thumbnail_link.clone())
                .unwrap_or_else(|| item.link.clone());
            if thumbnail.is_empty() || item.link.is_empty() {
                return None;
            }

            Some(ImageResult {
                thumbnail,
                full: item.link,
                title: item.title.unwrap_or_default(),
                source_url: meta
                    .as_ref()
                    .and_then(|m| m.context_link.clone())
                    .unwrap_or_default(),
                width: meta.as_ref().and_then(|m| m.width),
                height: meta.and_then(|m| m.height),
                source: ImageProvider::Google,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    items: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    title: Option<String>,
    #[serde(default)]
    link: String,
    image: Option<ImageMeta>,
}

#[derive(Debug, Deserialize)]
struct ImageMeta {
    #[serde(rename = "thumbnailLink")]
    thumbnail_link: Option<String>,
    #[serde(rename = "contextLink")]
    context_link: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}
