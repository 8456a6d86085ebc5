//! Confidence-tier gating
//!
//! Tiers never change a percentage. They only decide whether a verdict
//! may be published.

use crate::config::{CalibrationConfig, TierThreshold};
use crate::weighting::{EvidenceIndex, SourceQuality};
use veracity_domain::{Centrality, ClaimDirection, ClaimVerdict, ConfidenceTier};

/// Share of directional cited evidence that agrees with the verdict
///
/// A verdict at or above 50 agrees with supporting evidence, below 50
/// with contradicting evidence. Neutral items are ignored; with no
/// directional evidence the agreement is 0.
pub fn evidence_agreement(verdict: &ClaimVerdict, index: &EvidenceIndex<'_>) -> f64 {
    let expected = if verdict.truth_percentage >= 50.0 {
        ClaimDirection::Supports
    } else {
        ClaimDirection::Contradicts
    };
    let directional: Vec<ClaimDirection> = index
        .cited(verdict)
        .into_iter()
        .map(|item| item.claim_direction)
        .filter(|direction| *direction != ClaimDirection::Neutral)
        .collect();
    if directional.is_empty() {
        return 0.0;
    }
    directional.iter().filter(|d| **d == expected).count() as f64 / directional.len() as f64
}

fn meets(quality: &SourceQuality, agreement: f64, threshold: &TierThreshold) -> bool {
    quality.source_count >= threshold.min_sources
        && quality.effective_reliability >= threshold.min_quality
        && agreement >= threshold.min_agreement
}

/// Tier from source count, source quality and evidence agreement
pub fn tier_for(quality: &SourceQuality, agreement: f64, config: &CalibrationConfig) -> ConfidenceTier {
    if meets(quality, agreement, &config.high_tier) {
        ConfidenceTier::High
    } else if meets(quality, agreement, &config.medium_tier) {
        ConfidenceTier::Medium
    } else if quality.source_count >= 1 {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::Insufficient
    }
}

/// Attach tier and publishable flag; returns false when already gated
///
/// Centrally important claims are always publishable.
pub fn apply_gating(
    verdict: &mut ClaimVerdict,
    quality: &SourceQuality,
    agreement: f64,
    centrality: Option<Centrality>,
    config: &CalibrationConfig,
) -> bool {
    if verdict.applied.tier_gating {
        return false;
    }
    let tier = tier_for(quality, agreement, config);
    verdict.tier = Some(tier);
    verdict.publishable =
        matches!(tier, ConfidenceTier::High | ConfidenceTier::Medium) || centrality == Some(Centrality::High);
    verdict.applied.tier_gating = true;
    true
}
