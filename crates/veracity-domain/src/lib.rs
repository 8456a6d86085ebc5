//! Veracity Domain Layer
//!
//! This crate contains the value types and capability contracts shared by
//! every other Veracity crate. It holds no I/O and no orchestration logic;
//! infrastructure lives behind the traits in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Claim**: An atomic, verifiable assertion decomposed from the input
//! - **Analysis Context**: A bounded analytical frame evidence and claims belong to
//! - **Evidence Item**: A statement extracted from a fetched source, with direction and provenance
//! - **Verdict**: A truth percentage and confidence, per claim, per context and per article
//! - **Fallback Record**: A documented default used when a capability failed
//!
//! ## Architecture
//!
//! - Pure data and invariants only
//! - External capabilities (search, fetch, LLM calls) are async traits
//! - Every capability failure is an explicit [`CapabilityError`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod evidence;
pub mod ids;
pub mod search;
pub mod traits;
pub mod understanding;
pub mod verdict;

// Re-exports for convenience
pub use claim::{enforce_central_invariant, Centrality, Claim, ClaimRole, ThesisRelevance};
pub use context::{AnalysisContext, ContextRemap, ContextStatus, RemapTarget};
pub use diagnostics::{FallbackRecord, ReportIntegrity, Warning, WarningKind};
pub use error::CapabilityError;
pub use evidence::{
    category, ClaimDirection, EvidenceBasis, EvidenceCandidate, EvidenceItem, FetchedSource, ProbativeValue,
    SourceAuthority,
};
pub use ids::{ClaimId, ContextId, EvidenceId, SourceId};
pub use search::{DateWindow, FetchedPage, SearchFilters, SearchResult};
pub use traits::{DirectionCheck, DirectionQuery, EvidencePolarity, ExtractedEvidence};
pub use understanding::Understanding;
pub use verdict::{
    AppliedCorrections, ClaimVerdict, ConfidenceTier, ContextAnswer, GeneratedVerdicts, HolisticVerdict, KeyFactor,
    RatingBand, VerdictSummary,
};
