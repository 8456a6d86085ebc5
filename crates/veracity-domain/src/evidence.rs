//! Evidence items and the sources they were extracted from

use crate::{ClaimId, ContextId, EvidenceId, SourceId};
use serde::{Deserialize, Serialize};

/// Well-known evidence categories used by the decision engine
pub mod category {
    /// Generic factual evidence
    pub const EVIDENCE: &str = "evidence";
    /// Statute, regulation or procedural rule
    pub const LEGAL_PROVISION: &str = "legal_provision";
    /// Criticism or controversy
    pub const CRITICISM: &str = "criticism";
    /// Expert or official statement
    pub const EXPERT_QUOTE: &str = "expert_quote";
    /// Statistics or measurements
    pub const STATISTIC: &str = "statistic";
}

/// Which way a statement bears on the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDirection {
    /// Supports the claim
    Supports,
    /// Contradicts the claim
    Contradicts,
    /// Neither
    #[default]
    Neutral,
}

/// How much a statement proves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbativeValue {
    /// Weak
    Low,
    /// Moderate
    #[default]
    Medium,
    /// Strong
    High,
}

/// What a statement rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceBasis {
    /// Documented record or measurement
    Documented,
    /// First-hand testimony
    Testimony,
    /// Analysis or inference
    Analysis,
    /// Opinion without stated basis
    Opinion,
    /// Not classified
    #[default]
    Unknown,
}

/// Who stands behind a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceAuthority {
    /// Court, regulator, statistics office
    Primary,
    /// Established reporting
    Secondary,
    /// Commentary, blogs
    Tertiary,
    /// Not classified
    #[default]
    Unknown,
}

/// An extracted statement with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Stable identifier
    pub id: EvidenceId,

    /// The extracted statement
    pub statement: String,

    /// Source the statement came from
    pub source_id: SourceId,

    /// URL of the source
    pub source_url: String,

    /// Title of the source
    #[serde(default)]
    pub source_title: String,

    /// Category (see [`category`])
    pub category: String,

    /// Direction relative to the claim
    #[serde(default)]
    pub claim_direction: ClaimDirection,

    /// Probative value
    #[serde(default)]
    pub probative_value: ProbativeValue,

    /// Evidence basis
    #[serde(default)]
    pub evidence_basis: EvidenceBasis,

    /// Source authority
    #[serde(default)]
    pub source_authority: SourceAuthority,

    /// Owning context, if any
    #[serde(default)]
    pub context_id: Option<ContextId>,

    /// Claims this statement is structurally linked to
    #[serde(default)]
    pub related_claim_ids: Vec<ClaimId>,
}

impl EvidenceItem {
    /// Whether the item is linked to a claim
    pub fn relates_to(&self, claim_id: &ClaimId) -> bool {
        self.related_claim_ids.contains(claim_id)
    }
}

/// A statement proposed by the extraction capability, before it becomes evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    /// The extracted statement
    pub statement: String,

    /// Category (see [`category`])
    #[serde(default = "default_category")]
    pub category: String,

    /// Direction relative to the claim
    #[serde(default)]
    pub claim_direction: ClaimDirection,

    /// Probative value
    #[serde(default)]
    pub probative_value: ProbativeValue,

    /// Evidence basis
    #[serde(default)]
    pub evidence_basis: EvidenceBasis,

    /// Source authority
    #[serde(default)]
    pub source_authority: SourceAuthority,

    /// Context suggested by the extractor
    #[serde(default)]
    pub context_id: Option<ContextId>,

    /// Claims the extractor linked the statement to
    #[serde(default)]
    pub related_claim_ids: Vec<ClaimId>,
}

fn default_category() -> String {
    category::EVIDENCE.to_string()
}

impl EvidenceCandidate {
    /// Create a supporting candidate in the generic evidence category
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            category: default_category(),
            claim_direction: ClaimDirection::Supports,
            probative_value: ProbativeValue::Medium,
            evidence_basis: EvidenceBasis::Unknown,
            source_authority: SourceAuthority::Unknown,
            context_id: None,
            related_claim_ids: Vec::new(),
        }
    }

    /// Turn the candidate into an evidence item attributed to `source`
    ///
    /// A candidate without a context inherits `fallback_context`.
    pub fn into_evidence(self, source: &FetchedSource, fallback_context: Option<&ContextId>) -> EvidenceItem {
        EvidenceItem {
            id: EvidenceId::generate(),
            statement: self.statement,
            source_id: source.id.clone(),
            source_url: source.url.clone(),
            source_title: source.title.clone(),
            category: self.category,
            claim_direction: self.claim_direction,
            probative_value: self.probative_value,
            evidence_basis: self.evidence_basis,
            source_authority: self.source_authority,
            context_id: self.context_id.or_else(|| fallback_context.cloned()),
            related_claim_ids: self.related_claim_ids,
        }
    }
}

/// A fetched URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedSource {
    /// Stable identifier
    pub id: SourceId,

    /// URL as discovered
    pub url: String,

    /// Canonical URL key (see the deduplicator)
    #[serde(default)]
    pub normalized_url: String,

    /// Page title
    #[serde(default)]
    pub title: String,

    /// Extracted page text (not part of the exposed contract)
    #[serde(default, skip_serializing)]
    pub text: String,

    /// Reliability score in [0, 1], when known
    #[serde(default)]
    pub reliability: Option<f64>,

    /// Whether the fetch succeeded
    pub fetch_success: bool,
}

impl FetchedSource {
    /// A successfully fetched page
    pub fn fetched(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: SourceId::generate(),
            url: url.into(),
            normalized_url: String::new(),
            title: title.into(),
            text: text.into(),
            reliability: None,
            fetch_success: true,
        }
    }

    /// A page that could not be fetched
    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            id: SourceId::generate(),
            url: url.into(),
            normalized_url: String::new(),
            title: String::new(),
            text: String::new(),
            reliability: None,
            fetch_success: false,
        }
    }

    /// Set the reliability score
    pub fn with_reliability(mut self, reliability: Option<f64>) -> Self {
        self.reliability = reliability;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_inherits_fallback_context() {
        let source = FetchedSource::fetched("https://example.org/a", "A", "text");
        let ctx = ContextId::from("CTX_1");
        let item = EvidenceCandidate::new("Statement").into_evidence(&source, Some(&ctx));
        assert_eq!(item.context_id, Some(ctx));
        assert_eq!(item.source_id, source.id);
        assert_eq!(item.source_url, "https://example.org/a");
        assert_eq!(item.category, category::EVIDENCE);
    }

    #[test]
    fn test_candidate_keeps_own_context() {
        let source = FetchedSource::fetched("https://example.org/a", "A", "text");
        let mut candidate = EvidenceCandidate::new("Statement");
        candidate.context_id = Some(ContextId::from("OWN"));
        let item = candidate.into_evidence(&source, Some(&ContextId::from("OTHER")));
        assert_eq!(item.context_id, Some(ContextId::from("OWN")));
    }

    #[test]
    fn test_candidate_default_category_from_json() {
        let candidate: EvidenceCandidate =
            serde_json::from_str(r#"{"statement": "x", "claim_direction": "contradicts"}"#).unwrap();
        assert_eq!(candidate.category, category::EVIDENCE);
        assert_eq!(candidate.claim_direction, ClaimDirection::Contradicts);
    }

    #[test]
    fn test_source_text_not_serialized() {
        let source = FetchedSource::fetched("https://example.org", "T", "long body");
        let json = serde_json::to_string(&source).unwrap();
        assert!(!json.contains("long body"));
    }
}
