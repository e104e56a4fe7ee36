//! Fan-out aggregator: concurrent multi-provider search with settle-all
//! failure containment.
//!
//! All selected adapters are queried concurrently via
//! [`futures::future::join_all`]; each provider's slot in the envelope is
//! filled with its response or a synthetic error shape. One provider
//! failing never short-circuits its siblings.

use std::sync::Arc;

use crate::auth::TokenManager;
use crate::cache::{self, CacheKey};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::providers::{
    BraveImages, BraveSearch, GoogleImages, GoogleSearch, MarginaliaSearch, WikipediaInfobox,
};
use crate::types::{
    ImageEnvelope, ImageProvider, ImageResult, Infobox, Provider, ProviderResponse, SearchEnvelope,
};
use crate::adapter::ProviderAdapter;

use super::url_normalize::image_key;

/// The multi-provider search aggregator.
///
/// Owns the shared HTTP client, the Google token manager, every adapter,
/// and the envelope cache. Construct once at process start and share.
pub struct Aggregator {
    page_size: u32,
    brave: BraveSearch,
    google: Option<GoogleSearch>,
    marginalia: MarginaliaSearch,
    brave_images: BraveImages,
    google_images: Option<GoogleImages>,
    wikipedia: WikipediaInfobox,
    web_cache: Option<moka::future::Cache<CacheKey, SearchEnvelope>>,
}

impl Aggregator {
    /// Build an aggregator from configuration.
    ///
    /// Google adapters exist only when both `GOOGLE_CX` and the service
    /// account are configured; otherwise Google slots silently degrade to
    /// empty responses.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid tunables and
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let client = http::build_client(&config)?;

        let (google, google_images) = match (&config.google_cx, &config.google_service_account) {
            (Some(cx), Some(service_account)) => {
                let tokens = Arc::new(TokenManager::new(service_account.clone(), client.clone()));
                (
                    Some(GoogleSearch::new(
                        client.clone(),
                        cx.clone(),
                        Arc::clone(&tokens),
                        config.page_size,
                    )),
                    Some(GoogleImages::new(client.clone(), cx.clone(), tokens)),
                )
            }
            _ => {
                tracing::debug!("Google provider not configured; serving empty slots");
                (None, None)
            }
        };

        Ok(Self {
            page_size: config.page_size,
            brave: BraveSearch::new(client.clone(), config.brave_api_key.clone(), config.page_size),
            google,
            marginalia: MarginaliaSearch::new(client.clone(), config.page_size),
            brave_images: BraveImages::new(client.clone(), config.brave_api_key.clone()),
            google_images,
            wikipedia: WikipediaInfobox::new(client),
            web_cache: cache::build_cache(config.cache_ttl_seconds),
        })
    }

    /// Fan a web search out to the selected providers.
    ///
    /// Every requested provider gets a slot in the envelope: its results,
    /// or `{error, results: []}` when the adapter failed.
    ///
    /// # Errors
    ///
    /// Only [`SearchError::Validation`] for a blank query. Provider
    /// failures are contained in their slots.
    pub async fn search_web(
        &self,
        query: &str,
        page: u32,
        sources: &[Provider],
    ) -> Result<SearchEnvelope, SearchError> {
        let query = validated_query(query)?;
        let page = page.max(1);

        let cache_key = CacheKey::new(query, page, sources);
        if let Some(cache) = &self.web_cache {
            if let Some(envelope) = cache.get(&cache_key).await {
                tracing::debug!(page, "web envelope served from cache");
                return Ok(envelope);
            }
        }

        let tasks = sources.iter().map(|provider| {
            let provider = *provider;
            async move { (provider, self.fetch_provider(provider, query, page).await) }
        });
        let outcomes = futures::future::join_all(tasks).await;

        let mut envelope = SearchEnvelope::new(page);
        for (provider, outcome) in outcomes {
            let slot = match outcome {
                Ok(response) => {
                    tracing::debug!(%provider, count = response.results.len(), "provider returned results");
                    response
                }
                Err(err) => {
                    tracing::warn!(%provider, error = %err, "provider query failed");
                    ProviderResponse::failed(err.to_string())
                }
            };
            envelope.set(provider, slot);
        }

        if let Some(cache) = &self.web_cache {
            cache.insert(cache_key, envelope.clone()).await;
        }
        Ok(envelope)
    }

    async fn fetch_provider(
        &self,
        provider: Provider,
        query: &str,
        page: u32,
    ) -> Result<ProviderResponse, SearchError> {
        match provider {
            Provider::Brave => self.brave.fetch_page(query, page).await,
            Provider::Google => match &self.google {
                Some(google) => google.fetch_page(query, page).await,
                // Unconfigured is degradation, not failure.
                None => Ok(ProviderResponse::empty()),
            },
            Provider::Marginalia => self.marginalia.fetch_page(query, page).await,
        }
    }

    /// Image search: one provider when `source` is given, otherwise both
    /// merged (Brave first) and deduplicated by image URL.
    ///
    /// # Errors
    ///
    /// Only [`SearchError::Validation`] for a blank query. Provider
    /// failures degrade to empty lists.
    pub async fn search_images(
        &self,
        query: &str,
        page: u32,
        source: Option<ImageProvider>,
    ) -> Result<ImageEnvelope, SearchError> {
        let query = validated_query(query)?;
        let page = page.max(1);

        let envelope = match source {
            Some(ImageProvider::Brave) => ImageEnvelope {
                images: self.brave_images_or_empty(query, page).await,
                has_more: page < 3,
            },
            Some(ImageProvider::Google) => ImageEnvelope {
                images: self.google_images_or_empty(query, page).await,
                has_more: page < 10,
            },
            None => {
                let (brave, google) = tokio::join!(
                    self.brave_images_or_empty(query, page),
                    self.google_images_or_empty(query, page),
                );
                ImageEnvelope {
                    images: dedupe_images(brave.into_iter().chain(google).collect()),
                    has_more: page < 3,
                }
            }
        };
        Ok(envelope)
    }

    async fn brave_images_or_empty(&self, query: &str, page: u32) -> Vec<ImageResult> {
        self.brave_images
            .fetch_images(query, page)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Brave image search failed");
                Vec::new()
            })
    }

    async fn google_images_or_empty(&self, query: &str, page: u32) -> Vec<ImageResult> {
        let Some(google_images) = &self.google_images else {
            return Vec::new();
        };
        google_images
            .fetch_images(query, page)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Google image search failed");
                Vec::new()
            })
    }

    /// Knowledge-panel lookup. Upstream failures degrade to `None`.
    ///
    /// # Errors
    ///
    /// Only [`SearchError::Validation`] for a blank query.
    pub async fn infobox(&self, query: &str) -> Result<Option<Infobox>, SearchError> {
        let query = validated_query(query)?;

        match self.wikipedia.fetch(query).await {
            Ok(infobox) => Ok(infobox),
            Err(err) => {
                tracing::warn!(error = %err, "infobox lookup failed");
                Ok(None)
            }
        }
    }

    /// The configured per-provider page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

fn validated_query(query: &str) -> Result<&str, SearchError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(SearchError::Validation("query must not be empty".into()));
    }
    Ok(trimmed)
}

/// Dedup images by their full-size URL, first occurrence wins.
fn dedupe_images(images: Vec<ImageResult>) -> Vec<ImageResult> {
    let mut seen = std::collections::HashSet::with_capacity(images.len());
    images
        .into_iter()
        .filter(|img| seen.insert(image_key(&img.full)))
        .collect()
}
