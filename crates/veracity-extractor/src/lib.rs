//! Veracity Extractor
//!
//! Turns fetched sources into deduplicated evidence items.
//!
//! # Overview
//!
//! Sources are processed in fixed-size windows. Every source in a window is
//! extracted concurrently and all results are awaited, successful or not.
//! A throttling failure anywhere in a window narrows every later window by
//! one (never below one). Successful candidates are deduplicated against
//! prior evidence and against evidence collected earlier in the same run.
//!
//! # Architecture
//!
//! ```text
//! FetchedSource[] → windows → EvidenceExtraction (retry, timeout) → Deduplicator → EvidenceItem[]
//! ```
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use veracity_dedup::{DedupConfig, Deduplicator};
//! use veracity_domain::{EvidenceCandidate, ExtractedEvidence, FetchedSource};
//! use veracity_extractor::{ExtractionOptions, ExtractorConfig, ParallelExtractor};
//! use veracity_llm::{MockExtraction, MockSimilarity};
//!
//! # tokio_test::block_on(async {
//! let mock = MockExtraction::new();
//! mock.set_default(Ok(ExtractedEvidence {
//!     candidates: vec![EvidenceCandidate::new("Alice founded Acme in 1999.")],
//!     tokens_used: 42,
//! }));
//! let dedup = Deduplicator::new(Arc::new(MockSimilarity::new()), DedupConfig::default()).unwrap();
//! let extractor = ParallelExtractor::new(Arc::new(mock), Arc::new(dedup), ExtractorConfig::default()).unwrap();
//!
//! let sources = vec![FetchedSource::fetched("https://example.org/acme", "Acme", "...")];
//! let outcome = extractor.extract(&sources, &ExtractionOptions::new("Acme founding"), &[]).await;
//!
//! assert_eq!(outcome.evidence_items.len(), 1);
//! assert_eq!(outcome.telemetry.tokens_used, 42);
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::ParallelExtractor;
pub use types::{ExtractionFailure, ExtractionOptions, ExtractionOutcome, ExtractionTelemetry};
