//! Deduplicator error types

use thiserror::Error;

/// Errors that can occur while building a deduplicator
#[derive(Error, Debug)]
pub enum DedupError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
