//! Veracity Evidence Deduplicator
//!
//! Keeps the evidence pool free of near-duplicates.
//!
//! The deduplicator provides:
//! - Canonical URL keys (tracking parameters, fragments, case, trailing slashes)
//! - Filtering of search results whose URL was already processed
//! - Evidence deduplication by source URL and by batched statement similarity
//!
//! When the similarity capability fails, unresolved pairs are treated as
//! distinct and a fallback record is returned with the outcome.
//!
//! # Examples
//!
//! ```
//! use veracity_dedup::normalize_url;
//!
//! assert_eq!(
//!     normalize_url("https://Example.org/a/?utm_source=feed#top"),
//!     "https://example.org/a"
//! );
//! ```

#![warn(missing_docs)]

mod config;
mod deduplicator;
mod error;
pub mod url;

pub use crate::url::{normalize_url, UrlNormalizer};
pub use config::DedupConfig;
pub use deduplicator::{DedupOutcome, Deduplicator, DroppedDuplicate, DuplicateReason};
pub use error::DedupError;
