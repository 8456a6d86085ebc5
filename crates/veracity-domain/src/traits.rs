//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between the engine and the outside
//! world. Every call returns either a structured result or an explicit
//! [`CapabilityError`]; implementations must never retry forever.
//! Test and replay implementations live in `veracity-llm`.

use crate::{
    AnalysisContext, CapabilityError, Claim, ClaimDirection, ClaimId, ContextRemap, EvidenceCandidate,
    EvidenceItem, FetchedPage, FetchedSource, GeneratedVerdicts, SearchFilters, SearchResult, Understanding,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Classifies raw input into claims and contexts
#[async_trait]
pub trait InputClassifier: Send + Sync {
    /// Decompose the input
    async fn classify_input(&self, input: &str) -> Result<Understanding, CapabilityError>;
}

/// Candidates returned for one source, with the tokens spent producing them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEvidence {
    /// Proposed statements
    pub candidates: Vec<EvidenceCandidate>,
    /// Tokens consumed by the call
    #[serde(default)]
    pub tokens_used: u64,
}

/// Extracts evidence statements from one fetched source
#[async_trait]
pub trait EvidenceExtraction: Send + Sync {
    /// Extract candidates relevant to `focus` and the given contexts
    async fn extract_evidence(
        &self,
        source: &FetchedSource,
        focus: &str,
        contexts: &[AnalysisContext],
    ) -> Result<ExtractedEvidence, CapabilityError>;
}

/// Produces raw per-claim and holistic verdicts
#[async_trait]
pub trait VerdictGeneration: Send + Sync {
    /// Generate verdicts from the accumulated evidence
    async fn generate_verdicts(
        &self,
        thesis: &str,
        claims: &[Claim],
        contexts: &[AnalysisContext],
        evidence: &[EvidenceItem],
    ) -> Result<GeneratedVerdicts, CapabilityError>;
}

/// Scores text similarity of statement pairs in one batch
#[async_trait]
pub trait TextSimilarity: Send + Sync {
    /// One score in [0, 1] per pair, in order
    async fn assess_text_similarity_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f64>, CapabilityError>;
}

/// Scores relevance of search results to a research focus
#[async_trait]
pub trait SearchRelevance: Send + Sync {
    /// One score in [0, 1] per result, in order
    async fn assess_search_relevance_batch(
        &self,
        focus: &str,
        results: &[SearchResult],
    ) -> Result<Vec<f64>, CapabilityError>;
}

/// A verdict whose polarity should be checked against its evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionQuery {
    /// Claim under review
    pub claim_id: ClaimId,
    /// Claim text
    pub claim_text: String,
    /// Verdict truth percentage
    pub truth_percentage: f64,
    /// Cited statements and their direction
    pub evidence: Vec<(String, ClaimDirection)>,
}

/// Which way the cited evidence points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidencePolarity {
    /// Evidence supports the claim
    True,
    /// Evidence refutes the claim
    False,
    /// Evidence is balanced or silent
    Neutral,
}

/// Result of a semantic direction check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionCheck {
    /// Claim reviewed
    pub claim_id: ClaimId,
    /// Whether verdict and evidence agree
    pub aligned: bool,
    /// Polarity of the cited evidence
    pub evidence_polarity: EvidencePolarity,
}

/// Semantic check of verdict polarity against cited evidence
#[async_trait]
pub trait DirectionValidation: Send + Sync {
    /// One check per query (missing entries are treated as unchecked)
    async fn validate_verdict_directions(
        &self,
        queries: &[DirectionQuery],
    ) -> Result<Vec<DirectionCheck>, CapabilityError>;
}

/// Web search provider
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run a query
    async fn search_web(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>, CapabilityError>;
}

/// Page fetcher and text extractor
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch a page
    async fn fetch_source(&self, url: &str) -> Result<FetchedPage, CapabilityError>;
}

/// Source reliability scoring
#[async_trait]
pub trait ReliabilityScorer: Send + Sync {
    /// Score in [0, 1], or `None` when the source is unknown
    async fn reliability_score(&self, url: &str) -> Option<f64>;
}

/// Mid-run context refinement (merge, rename, prune)
#[async_trait]
pub trait ContextRefinement: Send + Sync {
    /// Propose a remap; an empty remap changes nothing
    async fn refine_contexts(
        &self,
        contexts: &[AnalysisContext],
        claims: &[Claim],
        evidence: &[EvidenceItem],
    ) -> Result<ContextRemap, CapabilityError>;
}
