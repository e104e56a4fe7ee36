//! Trait definition for provider adapters.
//!
//! Each upstream search backend (Brave, Google, Marginalia) implements
//! [`ProviderAdapter`] to translate a canonical `(query, page)` request
//! into a provider-specific API call and map the response into a
//! [`ProviderResponse`].

use crate::error::SearchError;
use crate::types::{Provider, ProviderResponse};

/// A pluggable web-search provider adapter.
///
/// Implementors own their provider's quirks:
///
/// - Request construction, auth headers, and query encoding
/// - Offset translation and pagination-ceiling enforcement (via
///   [`crate::paging`])
/// - Response-schema normalisation into [`crate::types::SearchResult`]
/// - Error mapping, including the distinct rate-limit message
///
/// Zero results is a valid empty [`ProviderResponse`], never an error.
/// A page beyond the provider's pagination ceiling yields
/// [`ProviderResponse::empty`] without touching the network.
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
pub trait ProviderAdapter: Send + Sync {
    /// Fetch one page of normalised results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport failure, upstream non-2xx
    /// status, malformed response bodies, or missing credentials.
    fn fetch_page(
        &self,
        query: &str,
        page: u32,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, SearchError>> + Send;

    /// Which [`Provider`] this adapter wraps.
    fn provider(&self) -> Provider;
}
