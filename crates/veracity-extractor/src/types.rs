//! Request and response types for extraction

use serde::Serialize;
use veracity_domain::{AnalysisContext, ContextId, EvidenceItem, FallbackRecord, SourceId};

/// What one extraction call is looking for
#[derive(Debug, Clone, Default)]
pub struct ExtractionOptions {
    /// Research focus passed to the capability
    pub focus: String,

    /// Contexts the capability may attribute statements to
    pub contexts: Vec<AnalysisContext>,

    /// Context inherited by candidates that name none
    pub target_context_id: Option<ContextId>,
}

impl ExtractionOptions {
    /// Options for a focus with no context information
    pub fn new(focus: impl Into<String>) -> Self {
        Self {
            focus: focus.into(),
            ..Default::default()
        }
    }

    /// Restrict attribution to these contexts
    pub fn with_contexts(mut self, contexts: Vec<AnalysisContext>) -> Self {
        self.contexts = contexts;
        self
    }

    /// Set the fallback context
    pub fn targeting(mut self, context_id: Option<ContextId>) -> Self {
        self.target_context_id = context_id;
        self
    }
}

/// A source that produced no evidence because something failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionFailure {
    /// Source
    pub source_id: SourceId,

    /// Source URL
    pub url: String,

    /// Reason for failure
    pub reason: String,

    /// The failure carried a throttling signature
    pub throttled: bool,
}

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionTelemetry {
    /// Sources extracted successfully
    pub succeeded: usize,

    /// Sources that failed (including failed fetches)
    pub failed: usize,

    /// Failures that carried a throttling signature
    pub throttle_events: usize,

    /// Wall-clock time (milliseconds)
    pub elapsed_ms: u64,

    /// Concurrency width after the run
    pub final_concurrency: usize,

    /// Width used by each window, in order
    pub window_widths: Vec<usize>,

    /// Candidates dropped as duplicates
    pub duplicates_dropped: usize,

    /// Tokens reported by the capability
    pub tokens_used: u64,

    /// Items whose suggested context was unknown and got reattributed
    pub contexts_repaired: usize,
}

impl ExtractionTelemetry {
    /// Number of windows run
    pub fn windows(&self) -> usize {
        self.window_widths.len()
    }
}

/// Result of an extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// New, deduplicated evidence
    pub evidence_items: Vec<EvidenceItem>,

    /// Per-source failures
    pub failures: Vec<ExtractionFailure>,

    /// Run counters
    pub telemetry: ExtractionTelemetry,

    /// Defaults applied because a capability failed
    pub fallbacks: Vec<FallbackRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ExtractionOptions::new("court ruling")
            .with_contexts(vec![AnalysisContext::new("CTX_1", "Electoral", "TSE ruling")])
            .targeting(Some(ContextId::from("CTX_1")));
        assert_eq!(options.focus, "court ruling");
        assert_eq!(options.contexts.len(), 1);
        assert_eq!(options.target_context_id, Some(ContextId::from("CTX_1")));
    }

    #[test]
    fn test_window_count() {
        let telemetry = ExtractionTelemetry {
            window_widths: vec![5, 4, 1],
            ..Default::default()
        };
        assert_eq!(telemetry.windows(), 3);
    }
}
