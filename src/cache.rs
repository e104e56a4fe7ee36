//! In-memory TTL cache for web search envelopes.
//!
//! Keyed by the (lowercased query, page, provider set) triple. Uses
//! [`moka`] for async-friendly caching with automatic eviction. The cache
//! is owned by the aggregator instance rather than living in a module
//! static, so its lifecycle is explicit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::future::Cache;

use crate::types::{Provider, SearchEnvelope};

/// Maximum number of cached envelopes.
const MAX_CACHE_ENTRIES: u64 = 100;

/// Composite cache key: normalised query + page + provider set hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query string.
    query: String,
    page: u32,
    /// Hash of the sorted provider set, so different `source` selections
    /// produce different entries.
    sources_hash: u64,
}

impl CacheKey {
    /// Build a deterministic cache key. The provider list is sorted
    /// before hashing so selection order does not matter.
    pub fn new(query: &str, page: u32, sources: &[Provider]) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            page,
            sources_hash: hash_sources(sources),
        }
    }
}

/// Build the envelope cache, or `None` when caching is disabled.
pub fn build_cache(ttl_seconds: u64) -> Option<Cache<CacheKey, SearchEnvelope>> {
    if ttl_seconds == 0 {
        return None;
    }
    Some(
        Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build(),
    )
}

fn hash_sources(sources: &[Provider]) -> u64 {
    let mut sorted: Vec<&'static str> = sources.iter().map(Provider::key).collect();
    sorted.sort_unstable();
    let mut hasher = DefaultHasher::new();
    for key in sorted {
        key.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_deterministic_for_same_inputs() {
        let key1 = CacheKey::new("rust", 1, &[Provider::Brave, Provider::Google]);
        let key2 = CacheKey::new("rust", 1, &[Provider::Brave, Provider::Google]);
        assert_eq!(key1, key2);
    }

    #[test]
    fn key_normalises_query_case_and_whitespace() {
        let key1 = CacheKey::new("  RUST Programming ", 1, Provider::all());
        let key2 = CacheKey::new("rust programming", 1, Provider::all());
        assert_eq!(key1, key2);
    }

    #[test]
    fn key_distinguishes_pages() {
        let key1 = CacheKey::new("rust", 1, Provider::all());
        let key2 = CacheKey::new("rust", 2, Provider::all());
        assert_ne!(key1, key2);
    }

    #[test]
    fn key_ignores_provider_order() {
        let key1 = CacheKey::new("rust", 1, &[Provider::Google, Provider::Brave]);
        let key2 = CacheKey::new("rust", 1, &[Provider::Brave, Provider::Google]);
        assert_eq!(key1, key2);
    }

    #[test]
    fn key_distinguishes_provider_sets() {
        let key1 = CacheKey::new("rust", 1, &[Provider::Brave]);
        let key2 = CacheKey::new("rust", 1, &[Provider::Marginalia]);
        assert_ne!(key1, key2);
    }

    #[test]
    fn zero_ttl_disables_cache() {
        assert!(build_cache(0).is_none());
        assert!(build_cache(300).is_some());
    }

    #[tokio::test]
    async fn cache_round_trip() {
        let cache = build_cache(300).expect("cache enabled");
        let key = CacheKey::new("rust", 1, Provider::all());
        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), SearchEnvelope::new(1)).await;
        let hit = cache.get(&key).await.expect("cache hit");
        assert_eq!(hit.page, 1);
    }
}
