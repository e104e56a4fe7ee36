//! Wikipedia/Wikidata infobox lookup.
//!
//! A knowledge panel is assembled in three steps: a fuzzy title search, a
//! page-summary fetch for the first candidate that is not a disambiguation
//! stub, and a best-effort Wikidata drill-down for external profile links.
//! MediaWiki responses are irregular (pages keyed by numeric ID, claims
//! nested four levels deep), so this adapter walks `serde_json::Value`
//! rather than forcing the shapes into structs.

use serde_json::Value;
use url::Url;

use crate::error::SearchError;
use crate::types::{ExternalLink, Infobox};

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";

/// How many title candidates the fuzzy search may return.
const MAX_TITLE_CANDIDATES: u32 = 5;

/// Extracts shorter than this are treated as disambiguation/stub pages
/// and skipped in favour of the next candidate title.
const MIN_EXTRACT_CHARS: usize = 50;

/// At most this many external links are attached to an infobox.
const MAX_LINKS: usize = 6;

struct LinkProperty {
    prop: &'static str,
    name: &'static str,
    icon: &'static str,
    url_prefix: Option<&'static str>,
}

/// Wikidata properties rendered as external profile links.
const LINK_PROPERTIES: &[LinkProperty] = &[
    LinkProperty { prop: "P856", name: "Official website", icon: "\u{1F310}", url_prefix: None },
    LinkProperty { prop: "P2002", name: "Twitter", icon: "\u{1D54F}", url_prefix: Some("https://twitter.com/") },
    LinkProperty { prop: "P2003", name: "Instagram", icon: "\u{1F4F7}", url_prefix: Some("https://instagram.com/") },
    LinkProperty { prop: "P2013", name: "Facebook", icon: "\u{1F4D8}", url_prefix: Some("https://facebook.com/") },
    LinkProperty { prop: "P2397", name: "YouTube", icon: "\u{25B6}\u{FE0F}", url_prefix: Some("https://youtube.com/channel/") },
    LinkProperty { prop: "P4264", name: "LinkedIn", icon: "\u{1F4BC}", url_prefix: Some("https://linkedin.com/in/") },
    LinkProperty { prop: "P345", name: "IMDb", icon: "\u{1F3AC}", url_prefix: Some("https://imdb.com/name/") },
    LinkProperty { prop: "P1953", name: "Discogs", icon: "\u{1F4BF}", url_prefix: Some("https://discogs.com/artist/") },
    LinkProperty { prop: "P434", name: "MusicBrainz", icon: "\u{1F3B5}", url_prefix: Some("https://musicbrainz.org/artist/") },
    LinkProperty { prop: "P1902", name: "Spotify", icon: "\u{1F3A7}", url_prefix: Some("https://open.spotify.com/artist/") },
];

/// Wikipedia infobox adapter.
pub struct WikipediaInfobox {
    client: reqwest::Client,
}

impl WikipediaInfobox {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Look up a knowledge panel for `query`.
    ///
    /// Candidate titles are tried in relevance order; the first page whose
    /// intro extract clears [`MIN_EXTRACT_CHARS`] wins. `Ok(None)` when no
    /// candidate qualifies.
    pub async fn fetch(&self, query: &str) -> Result<Option<Infobox>, SearchError> {
        let titles = self.candidate_titles(query).await?;

        for title in titles {
            if let Some(infobox) = self.try_page(&title).await {
                return Ok(Some(infobox));
            }
        }
        Ok(None)
    }

    async fn candidate_titles(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let url = api_url(
            WIKIPEDIA_API,
            &[
                ("action", "opensearch"),
                ("format", "json"),
                ("search", query),
                ("limit", &MAX_TITLE_CANDIDATES.to_string()),
            ],
        )?;

        let data = self.get_json(url).await?;
        Ok(parse_titles(&data))
    }

    /// Fetch a page summary, or `None` when the page is missing, a stub,
    /// or the request fails — any of which falls through to the next
    /// candidate.
    async fn try_page(&self, title: &str) -> Option<Infobox> {
        let url = api_url(
            WIKIPEDIA_API,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "extracts|pageimages|info"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("exsentences", "4"),
                ("piprop", "thumbnail|original"),
                ("pithumbsize", "300"),
                ("inprop", "url"),
            ],
        )
        .ok()?;

        let data = self.get_json(url).await.ok()?;
        let mut infobox = summarize_page(&data)?;

        // Best-effort: a failed Wikidata drill-down keeps the summary.
        let (wikidata_id, links) = self.external_links(title).await;
        infobox.wikidata_id = wikidata_id;
        infobox.links = links;

        Some(infobox)
    }

    async fn external_links(&self, title: &str) -> (Option<String>, Vec<ExternalLink>) {
        let Some(wikidata_id) = self.wikidata_id(title).await else {
            return (None, Vec::new());
        };

        let links = match self.claims(&wikidata_id).await {
            Some(claims) => links_from_claims(&claims),
            None => Vec::new(),
        };
        (Some(wikidata_id), links)
    }

    async fn wikidata_id(&self, title: &str) -> Option<String> {
        let url = api_url(
            WIKIPEDIA_API,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "pageprops"),
                ("ppprop", "wikibase_item"),
            ],
        )
        .ok()?;

        let data = self.get_json(url).await.ok()?;
        first_page(&data)?
            .pointer("/pageprops/wikibase_item")?
            .as_str()
            .map(str::to_owned)
    }

    async fn claims(&self, wikidata_id: &str) -> Option<Value> {
        let url = api_url(
            WIKIDATA_API,
            &[
                ("action", "wbgetentities"),
                ("format", "json"),
                ("ids", wikidata_id),
                ("props", "claims|sitelinks"),
            ],
        )
        .ok()?;

        let data = self.get_json(url).await.ok()?;
        data.pointer(&format!("/entities/{wikidata_id}/claims"))
            .cloned()
    }

    async fn get_json(&self, url: Url) -> Result<Value, SearchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("Wikipedia request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SearchError::Http(format!(
                "Wikipedia API error: {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Wikipedia response: {e}")))
    }
}

fn api_url(base: &str, params: &[(&str, &str)]) -> Result<Url, SearchError> {
    let mut url =
        Url::parse(base).map_err(|e| SearchError::Http(format!("Wikipedia URL: {e}")))?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

/// Titles from an opensearch response: `[query, [titles], ...]`.
fn parse_titles(data: &Value) -> Vec<String> {
    data.get(1)
        .and_then(Value::as_array)
        .map(|titles| {
            titles
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// The single page object of a `action=query` response.
fn first_page(data: &Value) -> Option<&Value> {
    data.pointer("/query/pages")?
        .as_object()?
        .values()
        .next()
}

/// Build an infobox (sans Wikidata fields) from a page-summary response.
///
/// Missing pages and extracts below [`MIN_EXTRACT_CHARS`] yield `None`.
fn summarize_page(data: &Value) -> Option<Infobox> {
    let page = first_page(data)?;
    if page.get("missing").is_some() {
        return None;
    }

    let extract = page.get("extract")?.as_str()?;
    if extract.chars().count() < MIN_EXTRACT_CHARS {
        return None;
    }

    let str_at = |ptr: &str| page.pointer(ptr).and_then(Value::as_str).map(str::to_owned);
    let u32_at = |ptr: &str| {
        page.pointer(ptr)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };

    Some(Infobox {
        title: page
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        description: extract.to_string(),
        image: str_at("/thumbnail/source").or_else(|| str_at("/original/source")),
        image_width: u32_at("/thumbnail/width"),
        image_height: u32_at("/thumbnail/height"),
        url: str_at("/fullurl"),
        wikidata_id: None,
        links: Vec::new(),
    })
}

/// External profile links from a Wikidata claims object, capped at
/// [`MAX_LINKS`]. Non-string claim values (coordinates, dates) are skipped.
fn links_from_claims(claims: &Value) -> Vec<ExternalLink> {
    let mut links = Vec::new();

    for link in LINK_PROPERTIES {
        let Some(value) = claims
            .pointer(&format!("/{}/0/mainsnak/datavalue/value", link.prop))
            .and_then(Value::as_str)
        else {
            continue;
        };

        let mut url = match link.url_prefix {
            Some(prefix) => format!("{prefix}{value}"),
            None => value.to_string(),
        };
        if !url.starts_with("http") {
            url = format!("https://{url}");
        }

        links.push(ExternalLink {
            name: link.name.to_string(),
            icon: link.icon.to_string(),
            url,
        });
        if links.len() >= MAX_LINKS {
            break;
        }
    }

    links
}
