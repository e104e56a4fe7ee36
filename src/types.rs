//! Canonical types for aggregated search results and provider identification.
//!
//! Every upstream provider's response is normalised into these shapes before
//! it leaves an adapter. Wire names are camelCase to match the JSON contract
//! consumed by the browser client.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A single web search result, normalised across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The title of the result page.
    pub title: String,
    /// Absolute URL of the result.
    pub url: String,
    /// Human-readable host, derived from `url` when the provider omits one.
    pub display_url: String,
    /// Text snippet summarising the page. May be empty.
    pub snippet: String,
    /// Which provider returned this result.
    pub source: Provider,
}

/// Web search providers the aggregator fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Brave Search API — commercial web index, API-key auth.
    Brave,
    /// Google Programmable Search — service-account OAuth.
    Google,
    /// Marginalia — small independent index, no auth.
    Marginalia,
}

impl Provider {
    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brave => "Brave",
            Self::Google => "Google",
            Self::Marginalia => "Marginalia",
        }
    }

    /// Lowercase key used in request parameters and response envelopes.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Brave => "brave",
            Self::Google => "google",
            Self::Marginalia => "marginalia",
        }
    }

    /// Parse a request-parameter key back to a provider.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "brave" => Some(Self::Brave),
            "google" => Some(Self::Google),
            "marginalia" => Some(Self::Marginalia),
            _ => None,
        }
    }

    /// All web providers, in merge-priority order.
    pub fn all() -> &'static [Provider] {
        &[Self::Brave, Self::Google, Self::Marginalia]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    Brave,
    Google,
}

impl ImageProvider {
    /// Parse the `imageSource` request parameter.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "brave" => Some(Self::Brave),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

impl fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brave => f.write_str("Brave"),
            Self::Google => f.write_str("Google"),
        }
    }
}

/// One provider's slot in a web search envelope.
///
/// `error` and a non-empty `results` list are mutually exclusive: a failed
/// adapter call produces `{error, results: []}` via [`ProviderResponse::failed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    /// Normalised results for the requested page, in upstream rank order.
    pub results: Vec<SearchResult>,
    /// Whether the provider has further pages below its pagination ceiling.
    pub has_more: bool,
    /// Upstream's own total-count estimate, stringified. `"0"` when unknown
    /// or the pagination ceiling has been exceeded.
    pub total_results: String,
    /// Present iff the adapter call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResponse {
    /// An empty, non-error response: zero results, no further pages.
    ///
    /// Used both for exhausted pagination windows and for providers that
    /// are not configured (silently degraded rather than erroring).
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            has_more: false,
            total_results: "0".to_string(),
            error: None,
        }
    }

    /// A synthetic failure slot carrying the adapter's error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            has_more: false,
            total_results: "0".to_string(),
            error: Some(message.into()),
        }
    }
}

/// Web search response envelope: one optional slot per requested provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnvelope {
    /// The 1-indexed page this envelope answers.
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brave: Option<ProviderResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<ProviderResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginalia: Option<ProviderResponse>,
}

impl SearchEnvelope {
    /// An envelope with no provider slots filled.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            brave: None,
            google: None,
            marginalia: None,
        }
    }

    /// Fill the slot belonging to `provider`.
    pub fn set(&mut self, provider: Provider, response: ProviderResponse) {
        match provider {
            Provider::Brave => self.brave = Some(response),
            Provider::Google => self.google = Some(response),
            Provider::Marginalia => self.marginalia = Some(response),
        }
    }

    /// Borrow the slot belonging to `provider`, if filled.
    pub fn get(&self, provider: Provider) -> Option<&ProviderResponse> {
        match provider {
            Provider::Brave => self.brave.as_ref(),
            Provider::Google => self.google.as_ref(),
            Provider::Marginalia => self.marginalia.as_ref(),
        }
    }
}

/// A single image search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    /// Thumbnail URL. Always non-empty (filtered at the adapter).
    pub thumbnail: String,
    /// Full-size image URL. Always non-empty (filtered at the adapter).
    pub full: String,
    pub title: String,
    /// Page the image was found on. May be empty.
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub source: ImageProvider,
}

/// Image search response envelope: a single merged list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEnvelope {
    pub images: Vec<ImageResult>,
    pub has_more: bool,
}

/// An external profile link attached to an infobox (official site,
/// social profiles, music databases).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLink {
    pub name: String,
    pub icon: String,
    pub url: String,
}

/// Encyclopedia knowledge panel for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infobox {
    pub title: String,
    /// Intro extract, plain text. At least 50 characters (shorter pages
    /// are treated as disambiguation stubs and skipped).
    pub description: String,
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    /// Canonical article URL. Omitted from the wire when unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub wikidata_id: Option<String>,
    /// Up to 6 external profile links. Best-effort: lookup failures leave
    /// this empty without discarding the rest of the infobox.
    pub links: Vec<ExternalLink>,
}

/// Infobox response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoboxEnvelope {
    pub infobox: Option<Infobox>,
}

/// Derive a human-readable display host from a result URL.
///
/// Falls back to the raw string when the URL does not parse as absolute
/// or has no host.
pub fn display_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_string())
}
