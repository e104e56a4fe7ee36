//! Provider adapter implementations.
//!
//! Each module wraps one upstream backend behind
//! [`crate::adapter::ProviderAdapter`] (web search) or a provider-specific
//! image/infobox interface, owning that upstream's auth, pagination, and
//! response-schema quirks.

pub mod brave;
pub mod google;
pub mod marginalia;
pub mod wikipedia;

pub use brave::{BraveImages, BraveSearch};
pub use google::{GoogleImages, GoogleSearch};
pub use marginalia::MarginaliaSearch;
pub use wikipedia::WikipediaInfobox;
