//! Cross-claim aggregation and anchoring

use crate::band::{clamp_percentage, is_middle_band};
use crate::config::CalibrationConfig;
use std::cmp::Ordering;
use std::collections::HashMap;
use veracity_domain::{Centrality, Claim, ClaimId, ClaimVerdict, FallbackRecord, HolisticVerdict, KeyFactor};

/// Flag verdicts whose prerequisites resolved below the MIXED threshold
///
/// Flags are recomputed from scratch on every call. Returns the number of
/// verdicts flagged.
pub fn mark_dependency_failures(verdicts: &mut [ClaimVerdict], claims: &[Claim], config: &CalibrationConfig) -> usize {
    let truth_by_claim: HashMap<ClaimId, f64> = verdicts
        .iter()
        .map(|v| (v.claim_id.clone(), v.truth_percentage))
        .collect();
    let depends_on: HashMap<&ClaimId, &[ClaimId]> = claims.iter().map(|c| (&c.id, c.depends_on.as_slice())).collect();

    let mut flagged = 0;
    for verdict in verdicts.iter_mut() {
        let failed: Vec<ClaimId> = depends_on
            .get(&verdict.claim_id)
            .copied()
            .unwrap_or_default()
            .iter()
            .filter(|dep| {
                truth_by_claim
                    .get(*dep)
                    .is_some_and(|truth| *truth < config.bands.mixed_min)
            })
            .cloned()
            .collect();
        verdict.dependency_failed = !failed.is_empty();
        verdict.failed_dependencies = failed;
        if verdict.dependency_failed {
            flagged += 1;
        }
    }
    flagged
}

/// Aggregation weight: centrality multiplier × confidence / 100, or 0 when excluded
pub fn claim_weight(verdict: &ClaimVerdict, centrality: Centrality) -> f64 {
    if verdict.dependency_failed {
        return 0.0;
    }
    centrality.multiplier() * clamp_percentage(verdict.confidence) / 100.0
}

/// Value a claim contributes to an average
pub fn contribution(verdict: &ClaimVerdict, config: &CalibrationConfig) -> f64 {
    if verdict.is_counter_claim && config.invert_counter_claims {
        100.0 - verdict.truth_percentage
    } else {
        verdict.truth_percentage
    }
}

/// Weighted average over a set of claims
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedAverage {
    /// Weighted claims average; `None` when no claim carries weight
    pub average: Option<f64>,

    /// Sum of weights
    pub total_weight: f64,

    /// Centrality-weighted confidence of the non-excluded claims
    pub confidence: Option<f64>,

    /// Contributing claims, largest weight first
    pub key_factors: Vec<KeyFactor>,
}

/// Average `truth` (or `100 - truth` for counter-claims) by claim weight
pub fn weighted_average<'a>(
    entries: impl IntoIterator<Item = (&'a Claim, &'a ClaimVerdict)>,
    config: &CalibrationConfig,
) -> WeightedAverage {
    let mut contributions = Vec::new();
    let mut confidence_sum = 0.0;
    let mut multiplier_sum = 0.0;

    for (claim, verdict) in entries {
        if !verdict.dependency_failed {
            confidence_sum += claim.centrality.multiplier() * verdict.confidence;
            multiplier_sum += claim.centrality.multiplier();
        }
        let weight = claim_weight(verdict, claim.centrality);
        if weight > 0.0 {
            contributions.push((claim, contribution(verdict, config), weight));
        }
    }

    let total_weight: f64 = contributions.iter().map(|(_, _, w)| w).sum();
    let average = (total_weight > 0.0).then(|| {
        let sum: f64 = contributions.iter().map(|(_, value, w)| value * w).sum();
        clamp_percentage(sum / total_weight)
    });
    let confidence = (multiplier_sum > 0.0).then(|| clamp_percentage(confidence_sum / multiplier_sum));

    let mut key_factors: Vec<KeyFactor> = contributions
        .into_iter()
        .map(|(claim, value, weight)| KeyFactor {
            claim_id: claim.id.clone(),
            text: claim.text.clone(),
            truth_percentage: value,
            weight_share: weight / total_weight,
            supports_thesis: value >= 50.0,
        })
        .collect();
    key_factors.sort_by(|a, b| {
        b.weight_share
            .partial_cmp(&a.weight_share)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.claim_id.cmp(&b.claim_id))
    });

    WeightedAverage {
        average,
        total_weight,
        confidence,
        key_factors,
    }
}

/// Pull a holistic score toward the claims average when they diverge
///
/// Within the threshold the holistic score is returned unchanged. Beyond
/// it the result is `(1 - w) × holistic + w × claims`, rounded to the
/// nearest integer. Returns the score and whether anchoring applied.
pub fn anchor(holistic: f64, claims_average: f64, config: &CalibrationConfig) -> (f64, bool) {
    if (holistic - claims_average).abs() <= config.anchoring_threshold {
        return (holistic, false);
    }
    let w = config.anchoring_weight;
    let blended = (1.0 - w) * holistic + w * claims_average;
    (clamp_percentage(blended.round()), true)
}

/// Final score for one scope (a context or the article)
#[derive(Debug, Clone, PartialEq)]
pub struct Blended {
    /// Final truth percentage
    pub truth_percentage: f64,
    /// Final confidence
    pub confidence: f64,
    /// Holistic score before anchoring
    pub holistic: Option<f64>,
    /// Claims average
    pub claims_average: Option<f64>,
    /// Whether anchoring changed the score
    pub anchored: bool,
}

/// Combine a holistic score with the claims average
///
/// Missing inputs degrade to whichever side exists; with neither, the
/// score is a neutral 50 at zero confidence. Degradations are recorded
/// under `stage`.
pub fn blend(
    holistic: Option<&HolisticVerdict>,
    claims: &WeightedAverage,
    config: &CalibrationConfig,
    stage: &str,
    fallbacks: &mut Vec<FallbackRecord>,
) -> Blended {
    let holistic_truth = holistic.map(|h| clamp_percentage(h.truth_percentage));
    let (truth_percentage, anchored) = match (holistic_truth, claims.average) {
        (Some(h), Some(c)) => anchor(h, c, config),
        (Some(h), None) => {
            fallbacks.push(FallbackRecord::new(
                stage,
                "holistic score, unanchored",
                "no claim carries aggregation weight",
            ));
            (h, false)
        }
        (None, Some(c)) => (c, false),
        (None, None) => {
            fallbacks.push(FallbackRecord::new(
                stage,
                "neutral 50 at zero confidence",
                "no holistic score and no weighted claims",
            ));
            (50.0, false)
        }
    };

    let confidence = claims
        .confidence
        .or_else(|| holistic.map(|h| clamp_percentage(h.confidence)))
        .unwrap_or(0.0);

    Blended {
        truth_percentage,
        confidence,
        holistic: holistic_truth,
        claims_average: claims.average,
        anchored,
    }
}

/// Nudge a middle-band, non-counter claim upward; returns false when not applicable
///
/// Callers apply this only inside contexts whose claims average sits in a
/// true band.
pub fn boost_ambiguous(verdict: &mut ClaimVerdict, config: &CalibrationConfig) -> bool {
    if verdict.applied.context_boost
        || verdict.is_counter_claim
        || config.ambiguous_boost_points <= 0.0
        || !is_middle_band(verdict.truth_percentage, config)
    {
        return false;
    }
    verdict.truth_percentage = clamp_percentage(verdict.truth_percentage + config.ambiguous_boost_points);
    verdict.applied.context_boost = true;
    true
}
