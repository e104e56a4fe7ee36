//! Multi-provider meta-search aggregation.
//!
//! Fans a query out to several upstream search providers concurrently
//! (Brave, Google Programmable Search, Marginalia), normalises their
//! responses into one result shape, and returns an envelope with one slot
//! per provider. A failing provider fills its slot with an error message
//! instead of failing the whole request. Image search and a Wikipedia
//! knowledge-panel lookup ride on the same adapters.
//!
//! # Quick start
//!
//! ```no_run
//! use metasearch::{Aggregator, Provider, SearchConfig};
//!
//! # async fn run() -> Result<(), metasearch::SearchError> {
//! let aggregator = Aggregator::new(SearchConfig::from_env())?;
//! let envelope = aggregator.search_web("rust async runtime", 1, Provider::all()).await?;
//! if let Some(brave) = envelope.get(Provider::Brave) {
//!     for result in &brave.results {
//!         println!("{} - {}", result.title, result.url);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The `metasearch` binary wraps the same aggregator in an HTTP service;
//! see [`server`].

pub mod adapter;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod paging;
pub mod providers;
pub mod server;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::Aggregator;
pub use types::{
    ImageEnvelope, ImageProvider, ImageResult, Infobox, Provider, ProviderResponse,
    SearchEnvelope, SearchResult,
};

/// One-shot convenience: query every web provider with a fresh aggregator.
///
/// Long-lived callers should construct an [`Aggregator`] once and reuse it
/// so the HTTP connection pool, token cache, and envelope cache survive
/// between requests.
///
/// # Errors
///
/// Returns an error for invalid configuration or a blank query. Provider
/// failures are contained in their envelope slots.
pub async fn search(query: &str, page: u32, config: &SearchConfig) -> Result<SearchEnvelope> {
    let aggregator = Aggregator::new(config.clone())?;
    aggregator.search_web(query, page, Provider::all()).await
}
