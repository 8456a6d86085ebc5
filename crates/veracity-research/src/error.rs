//! Error types for research runs

use thiserror::Error;
use veracity_dedup::DedupError;
use veracity_domain::CapabilityError;
use veracity_extractor::ExtractorError;
use veracity_verdict::VerdictError;

/// Errors that end a research run
///
/// Capability failures inside the loop are degraded to warnings and
/// fallbacks; only setup problems and unusable inputs surface here.
#[derive(Error, Debug)]
pub enum ResearchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required capability was not supplied
    #[error("Missing capability: {0}")]
    MissingCapability(&'static str),

    /// The input could not be classified
    #[error("Classification failed: {0}")]
    Classification(CapabilityError),

    /// Deduplicator setup failed
    #[error(transparent)]
    Dedup(#[from] DedupError),

    /// Extractor setup failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Calibration rejected its inputs
    #[error(transparent)]
    Verdict(#[from] VerdictError),
}
