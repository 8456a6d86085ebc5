//! Verdicts per claim, per context and for the whole article

use crate::{ClaimId, ContextId, EvidenceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seven-band truth scale, with the middle band split by confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum RatingBand {
    /// Highest band
    True,
    /// Second band
    MostlyTrue,
    /// Third band
    LeaningTrue,
    /// Middle band, balanced evidence
    Mixed,
    /// Middle band, insufficient evidence
    #[default]
    Unverified,
    /// Fifth band
    LeaningFalse,
    /// Sixth band
    MostlyFalse,
    /// Lowest band
    False,
}

impl RatingBand {
    /// Label as shown in reports
    pub fn label(&self) -> &'static str {
        match self {
            RatingBand::True => "TRUE",
            RatingBand::MostlyTrue => "MOSTLY-TRUE",
            RatingBand::LeaningTrue => "LEANING-TRUE",
            RatingBand::Mixed => "MIXED",
            RatingBand::Unverified => "UNVERIFIED",
            RatingBand::LeaningFalse => "LEANING-FALSE",
            RatingBand::MostlyFalse => "MOSTLY-FALSE",
            RatingBand::False => "FALSE",
        }
    }

    /// Position on the scale, 0 (FALSE) to 6 (TRUE); both middle labels share 3
    pub fn rank(&self) -> u8 {
        match self {
            RatingBand::False => 0,
            RatingBand::MostlyFalse => 1,
            RatingBand::LeaningFalse => 2,
            RatingBand::Mixed | RatingBand::Unverified => 3,
            RatingBand::LeaningTrue => 4,
            RatingBand::MostlyTrue => 5,
            RatingBand::True => 6,
        }
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Publication confidence tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    /// No usable sources
    Insufficient,
    /// Thin support
    Low,
    /// Adequate support
    Medium,
    /// Strong, consistent support
    High,
}

/// Which per-claim corrections have already been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppliedCorrections {
    /// Evidence weighting ran
    pub evidence_weighting: bool,
    /// Direction validation ran
    pub direction_validation: bool,
    /// Direction validation inverted the percentage
    pub direction_corrected: bool,
    /// Confidence-tier gating ran
    pub tier_gating: bool,
    /// Same-polarity context boost was applied
    pub context_boost: bool,
}

/// Per-claim verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    /// Claim the verdict is for
    pub claim_id: ClaimId,

    /// Truth percentage in [0, 100]
    pub truth_percentage: f64,

    /// Confidence in [0, 100]
    pub confidence: f64,

    /// Aggregation weight actually used (0 when excluded)
    #[serde(default)]
    pub evidence_weight: f64,

    /// Band label
    #[serde(default)]
    pub rating: RatingBand,

    /// Tests the logical opposite of the thesis
    #[serde(default)]
    pub is_counter_claim: bool,

    /// A prerequisite resolved below the MIXED threshold
    #[serde(default)]
    pub dependency_failed: bool,

    /// Prerequisites that failed
    #[serde(default)]
    pub failed_dependencies: Vec<ClaimId>,

    /// Evidence cited by the verdict
    #[serde(default)]
    pub cited_evidence: Vec<EvidenceId>,

    /// Confidence tier, once gated
    #[serde(default)]
    pub tier: Option<ConfidenceTier>,

    /// Whether the verdict may be published
    #[serde(default)]
    pub publishable: bool,

    /// Correction bookkeeping
    #[serde(default)]
    pub applied: AppliedCorrections,
}

impl ClaimVerdict {
    /// A raw, uncorrected verdict
    pub fn new(claim_id: impl Into<ClaimId>, truth_percentage: f64, confidence: f64) -> Self {
        Self {
            claim_id: claim_id.into(),
            truth_percentage,
            confidence,
            evidence_weight: 0.0,
            rating: RatingBand::Unverified,
            is_counter_claim: false,
            dependency_failed: false,
            failed_dependencies: Vec::new(),
            cited_evidence: Vec::new(),
            tier: None,
            publishable: false,
            applied: AppliedCorrections::default(),
        }
    }

    /// Attach cited evidence
    pub fn citing(mut self, evidence: impl IntoIterator<Item = EvidenceId>) -> Self {
        self.cited_evidence.extend(evidence);
        self
    }
}

/// An independently produced (holistic) score for a context or the article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolisticVerdict {
    /// Context the score is for; `None` for the article as a whole
    #[serde(default)]
    pub context_id: Option<ContextId>,

    /// Truth percentage in [0, 100]
    pub truth_percentage: f64,

    /// Confidence in [0, 100]
    pub confidence: f64,
}

/// Output of the external verdict-generation capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVerdicts {
    /// Raw per-claim verdicts
    pub claim_verdicts: Vec<ClaimVerdict>,

    /// Holistic per-context scores
    #[serde(default)]
    pub context_verdicts: Vec<HolisticVerdict>,

    /// Holistic article score
    #[serde(default)]
    pub article_verdict: Option<HolisticVerdict>,
}

/// One claim's contribution to an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    /// Contributing claim
    pub claim_id: ClaimId,

    /// Claim text
    pub text: String,

    /// Truth percentage used in the aggregate
    pub truth_percentage: f64,

    /// Share of the aggregate's total weight, in [0, 1]
    pub weight_share: f64,

    /// Whether the claim pulls the aggregate up (true) or down
    pub supports_thesis: bool,
}

/// Aggregated result for one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnswer {
    /// Context
    pub context_id: ContextId,

    /// Final truth percentage
    pub truth_percentage: f64,

    /// Aggregate confidence
    pub confidence: f64,

    /// Band label
    pub rating: RatingBand,

    /// Holistic score before anchoring
    pub holistic: Option<f64>,

    /// Weighted claims average
    pub claims_average: Option<f64>,

    /// Whether anchoring changed the score
    pub anchored: bool,

    /// Contributing claims, largest weight first
    pub key_factors: Vec<KeyFactor>,
}

/// Aggregated result for the whole article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictSummary {
    /// Final truth percentage
    pub truth_percentage: f64,

    /// Aggregate confidence
    pub confidence: f64,

    /// Band label
    pub rating: RatingBand,

    /// Holistic score before anchoring
    pub holistic: Option<f64>,

    /// Weighted claims average
    pub claims_average: Option<f64>,

    /// Whether anchoring changed the score
    pub anchored: bool,

    /// Contributing claims, largest weight first
    pub key_factors: Vec<KeyFactor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_labels() {
        assert_eq!(RatingBand::MostlyTrue.label(), "MOSTLY-TRUE");
        assert_eq!(RatingBand::Unverified.to_string(), "UNVERIFIED");
    }

    #[test]
    fn test_band_serde_matches_label() {
        let json = serde_json::to_string(&RatingBand::LeaningFalse).unwrap();
        assert_eq!(json, "\"LEANING-FALSE\"");
    }

    #[test]
    fn test_middle_labels_share_rank() {
        assert_eq!(RatingBand::Mixed.rank(), RatingBand::Unverified.rank());
        assert!(RatingBand::True.rank() > RatingBand::MostlyTrue.rank());
        assert_eq!(RatingBand::False.rank(), 0);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfidenceTier::High > ConfidenceTier::Medium);
        assert!(ConfidenceTier::Low > ConfidenceTier::Insufficient);
    }

    #[test]
    fn test_raw_verdict_defaults() {
        let v = ClaimVerdict::new("C1", 70.0, 80.0).citing([EvidenceId::from("E1")]);
        assert!(!v.applied.evidence_weighting);
        assert!(v.tier.is_none());
        assert_eq!(v.cited_evidence.len(), 1);
    }
}
