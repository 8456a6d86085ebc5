//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while building an extractor
///
/// Per-source failures are not errors: they are reported in the
/// extraction outcome and never abort sibling sources.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
