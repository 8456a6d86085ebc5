//! Verdict direction validation
//!
//! A semantic check compares each verdict's polarity with the polarity of
//! the evidence it cites. Disagreements are always reported; with
//! auto-correction on, the percentage is inverted and held inside the
//! LEANING band on the evidence's side.

use crate::band::clamp_percentage;
use crate::config::CalibrationConfig;
use crate::weighting::EvidenceIndex;
use std::collections::HashMap;
use veracity_domain::{
    Claim, ClaimId, ClaimVerdict, DirectionCheck, DirectionQuery, EvidencePolarity, Warning, WarningKind,
};

/// Queries for every verdict not yet validated
pub fn build_queries(verdicts: &[ClaimVerdict], claims: &[Claim], index: &EvidenceIndex<'_>) -> Vec<DirectionQuery> {
    let texts: HashMap<&ClaimId, &str> = claims.iter().map(|c| (&c.id, c.text.as_str())).collect();
    verdicts
        .iter()
        .filter(|verdict| !verdict.applied.direction_validation)
        .map(|verdict| DirectionQuery {
            claim_id: verdict.claim_id.clone(),
            claim_text: texts.get(&verdict.claim_id).copied().unwrap_or_default().to_string(),
            truth_percentage: verdict.truth_percentage,
            evidence: index
                .cited(verdict)
                .into_iter()
                .map(|item| (item.statement.clone(), item.claim_direction))
                .collect(),
        })
        .collect()
}

/// Percentage after inverting toward the evidence's side
///
/// The inverted value is clamped into LEANING-TRUE or LEANING-FALSE, never
/// beyond. Neutral evidence gives no direction to correct toward.
pub fn corrected_percentage(truth: f64, polarity: EvidencePolarity, config: &CalibrationConfig) -> Option<f64> {
    let inverted = clamp_percentage(100.0 - truth);
    let (low, high) = match polarity {
        EvidencePolarity::True => config.bands.leaning_true_range(),
        EvidencePolarity::False => config.bands.leaning_false_range(),
        EvidencePolarity::Neutral => return None,
    };
    Some(inverted.clamp(low, high))
}

/// Apply checks to verdicts; returns the number of corrected verdicts
///
/// Verdicts without a matching check stay unvalidated.
pub fn apply_direction_checks(
    verdicts: &mut [ClaimVerdict],
    checks: &[DirectionCheck],
    config: &CalibrationConfig,
    warnings: &mut Vec<Warning>,
) -> usize {
    let by_claim: HashMap<&ClaimId, &DirectionCheck> = checks.iter().map(|c| (&c.claim_id, c)).collect();
    let mut corrected = 0;

    for verdict in verdicts.iter_mut().filter(|v| !v.applied.direction_validation) {
        let Some(check) = by_claim.get(&verdict.claim_id) else {
            continue;
        };
        verdict.applied.direction_validation = true;
        if check.aligned {
            continue;
        }

        let correction = if config.auto_correct_direction {
            corrected_percentage(verdict.truth_percentage, check.evidence_polarity, config)
        } else {
            None
        };

        match correction {
            Some(new_truth) => {
                warnings.push(Warning::new(
                    WarningKind::DirectionMismatch,
                    format!(
                        "Claim {}: verdict {:.0} contradicts {:?} evidence, corrected to {:.0}",
                        verdict.claim_id, verdict.truth_percentage, check.evidence_polarity, new_truth
                    ),
                ));
                verdict.truth_percentage = new_truth;
                verdict.applied.direction_corrected = true;
                corrected += 1;
            }
            None => warnings.push(Warning::new(
                WarningKind::DirectionMismatch,
                format!(
                    "Claim {}: verdict {:.0} disagrees with {:?} evidence (left unchanged)",
                    verdict.claim_id, verdict.truth_percentage, check.evidence_polarity
                ),
            )),
        }
    }

    corrected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(claim: &str, polarity: EvidencePolarity) -> DirectionCheck {
        DirectionCheck {
            claim_id: ClaimId::from(claim),
            aligned: false,
            evidence_polarity: polarity,
        }
    }

    #[test]
    fn test_inversion_stays_in_leaning_band() {
        let config = CalibrationConfig::default();
        assert_eq!(corrected_percentage(10.0, EvidencePolarity::True, &config), Some(71.0));
        assert_eq!(corrected_percentage(35.0, EvidencePolarity::True, &config), Some(65.0));
        assert_eq!(corrected_percentage(95.0, EvidencePolarity::False, &config), Some(29.0));
        assert_eq!(corrected_percentage(62.0, EvidencePolarity::False, &config), Some(38.0));
        assert_eq!(corrected_percentage(62.0, EvidencePolarity::Neutral, &config), None);
    }

    #[test]
    fn test_mismatch_corrected_and_warned() {
        let config = CalibrationConfig::default();
        let mut verdicts = vec![ClaimVerdict::new("C1", 85.0, 70.0), ClaimVerdict::new("C2", 80.0, 70.0)];
        let checks = vec![
            mismatch("C1", EvidencePolarity::False),
            DirectionCheck {
                claim_id: ClaimId::from("C2"),
                aligned: true,
                evidence_polarity: EvidencePolarity::True,
            },
        ];
        let mut warnings = Vec::new();

        let corrected = apply_direction_checks(&mut verdicts, &checks, &config, &mut warnings);
        assert_eq!(corrected, 1);
        assert_eq!(verdicts[0].truth_percentage, 29.0);
        assert!(verdicts[0].applied.direction_corrected);
        assert_eq!(verdicts[1].truth_percentage, 80.0);
        assert!(verdicts.iter().all(|v| v.applied.direction_validation));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DirectionMismatch);
    }

    #[test]
    fn test_mismatch_without_auto_correct_only_warns() {
        let config = CalibrationConfig {
            auto_correct_direction: false,
            ..CalibrationConfig::default()
        };
        let mut verdicts = vec![ClaimVerdict::new("C1", 85.0, 70.0)];
        let mut warnings = Vec::new();
        let corrected = apply_direction_checks(
            &mut verdicts,
            &[mismatch("C1", EvidencePolarity::False)],
            &config,
            &mut warnings,
        );
        assert_eq!(corrected, 0);
        assert_eq!(verdicts[0].truth_percentage, 85.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_validated_verdicts_skipped() {
        let config = CalibrationConfig::default();
        let mut verdict = ClaimVerdict::new("C1", 85.0, 70.0);
        verdict.applied.direction_validation = true;
        let mut verdicts = vec![verdict];
        let mut warnings = Vec::new();

        apply_direction_checks(&mut verdicts, &[mismatch("C1", EvidencePolarity::False)], &config, &mut warnings);
        assert_eq!(verdicts[0].truth_percentage, 85.0);
        assert!(warnings.is_empty());

        let index = EvidenceIndex::new(&[], &[]);
        assert!(build_queries(&verdicts, &[], &index).is_empty());
    }

    #[test]
    fn test_missing_check_leaves_verdict_unvalidated() {
        let config = CalibrationConfig::default();
        let mut verdicts = vec![ClaimVerdict::new("C1", 85.0, 70.0)];
        let mut warnings = Vec::new();
        apply_direction_checks(&mut verdicts, &[], &config, &mut warnings);
        assert!(!verdicts[0].applied.direction_validation);
    }
}
