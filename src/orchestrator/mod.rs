//! Search orchestration: concurrent fan-out, merge, dedup.
//!
//! This module fans queries out to the selected providers concurrently,
//! contains per-provider failures inside their envelope slots, and offers
//! the interleave/dedup engine used for compact merged views.

pub mod merge;
pub mod search;
pub mod url_normalize;

pub use search::Aggregator;
