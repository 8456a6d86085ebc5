//! Verdict calibration pipeline

use crate::aggregate::{blend, boost_ambiguous, claim_weight, mark_dependency_failures, weighted_average, Blended};
use crate::band::{checked_percentage, is_true_band, rate};
use crate::config::CalibrationConfig;
use crate::direction::{apply_direction_checks, build_queries};
use crate::error::VerdictError;
use crate::gating::{apply_gating, evidence_agreement};
use crate::weighting::{apply_evidence_weighting, source_quality, EvidenceIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use veracity_domain::traits::DirectionValidation;
use veracity_domain::{
    AnalysisContext, Claim, ClaimId, ClaimVerdict, ContextAnswer, EvidenceItem, FallbackRecord, FetchedSource,
    GeneratedVerdicts, HolisticVerdict, VerdictSummary, Warning,
};
use veracity_llm::with_retry;

/// Corrected verdicts and aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratedVerdicts {
    /// Per-claim verdicts, including excluded ones
    pub claim_verdicts: Vec<ClaimVerdict>,

    /// Per-context aggregates, in context order
    pub context_answers: Vec<ContextAnswer>,

    /// Article aggregate
    pub summary: VerdictSummary,

    /// Direction mismatches and similar
    pub warnings: Vec<Warning>,

    /// Defaults used in place of failed inputs
    pub fallbacks: Vec<FallbackRecord>,
}

/// Applies the per-claim correction pipeline, then aggregates
///
/// Per claim, in order: evidence weighting, direction validation,
/// confidence-tier gating. Each step is recorded on the verdict and
/// skipped when already applied, so calibrating calibrated verdicts
/// changes nothing.
pub struct VerdictCalibrator {
    config: CalibrationConfig,
    direction: Option<Arc<dyn DirectionValidation>>,
}

impl VerdictCalibrator {
    /// Create a calibrator without direction validation
    pub fn new(config: CalibrationConfig) -> Result<Self, VerdictError> {
        config.validate().map_err(VerdictError::InvalidConfig)?;
        Ok(Self {
            config,
            direction: None,
        })
    }

    /// Enable semantic direction validation
    pub fn with_direction_validation(mut self, validator: Arc<dyn DirectionValidation>) -> Self {
        self.direction = Some(validator);
        self
    }

    /// Get the calibration constants
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Calibrate raw verdicts against the evidence they cite
    ///
    /// Non-finite percentages or confidences fail the whole call.
    pub async fn calibrate(
        &self,
        generated: GeneratedVerdicts,
        claims: &[Claim],
        contexts: &[AnalysisContext],
        evidence: &[EvidenceItem],
        sources: &[FetchedSource],
    ) -> Result<CalibratedVerdicts, VerdictError> {
        let config = &self.config;
        let mut warnings = Vec::new();
        let mut fallbacks = Vec::new();

        let GeneratedVerdicts {
            claim_verdicts: mut verdicts,
            context_verdicts,
            article_verdict,
        } = generated;
        sanitize_verdicts(&mut verdicts)?;
        let context_verdicts = sanitize_holistic(context_verdicts)?;
        let article_verdict = article_verdict.map(sanitize_one).transpose()?;

        let claim_by_id: HashMap<&ClaimId, &Claim> = claims.iter().map(|c| (&c.id, c)).collect();
        for verdict in verdicts.iter_mut() {
            if let Some(claim) = claim_by_id.get(&verdict.claim_id) {
                verdict.is_counter_claim |= claim.is_counter_claim;
            }
        }

        let index = EvidenceIndex::new(evidence, sources);

        // 1. Evidence weighting
        let weighted = verdicts
            .iter_mut()
            .map(|verdict| {
                let quality = source_quality(verdict, &index, config);
                apply_evidence_weighting(verdict, &quality, config)
            })
            .filter(|applied| *applied)
            .count();
        debug!("Evidence weighting applied to {} verdicts", weighted);

        // 2. Direction validation
        self.validate_directions(&mut verdicts, claims, &index, &mut warnings, &mut fallbacks)
            .await;

        // 3. Confidence-tier gating
        for verdict in verdicts.iter_mut() {
            let quality = source_quality(verdict, &index, config);
            let agreement = evidence_agreement(verdict, &index);
            let centrality = claim_by_id.get(&verdict.claim_id).map(|c| c.centrality);
            apply_gating(verdict, &quality, agreement, centrality, config);
        }

        // 4. Dependencies
        let excluded = mark_dependency_failures(&mut verdicts, claims, config);
        if excluded > 0 {
            debug!("{} verdicts excluded by failed prerequisites", excluded);
        }

        // 5. Contexts
        let mut context_answers = Vec::with_capacity(contexts.len());
        for context in contexts {
            let members: Vec<usize> = verdicts
                .iter()
                .enumerate()
                .filter(|(_, v)| {
                    claim_by_id
                        .get(&v.claim_id)
                        .is_some_and(|c| c.context_id.as_ref() == Some(&context.id))
                })
                .map(|(i, _)| i)
                .collect();

            let before = weighted_average(pairs(&verdicts, &members, &claim_by_id), config);
            if before.average.is_some_and(|avg| is_true_band(avg, config)) {
                for &i in &members {
                    boost_ambiguous(&mut verdicts[i], config);
                }
            }

            let claims_average = weighted_average(pairs(&verdicts, &members, &claim_by_id), config);
            let holistic = context_verdicts
                .iter()
                .find(|h| h.context_id.as_ref() == Some(&context.id));
            let stage = format!("aggregate.context.{}", context.id);
            let blended = blend(holistic, &claims_average, config, &stage, &mut fallbacks);

            context_answers.push(ContextAnswer {
                context_id: context.id.clone(),
                truth_percentage: blended.truth_percentage,
                confidence: blended.confidence,
                rating: rate(blended.truth_percentage, blended.confidence, config),
                holistic: blended.holistic,
                claims_average: blended.claims_average,
                anchored: blended.anchored,
                key_factors: claims_average.key_factors,
            });
        }

        // 6. Final per-claim labels and weights
        for verdict in verdicts.iter_mut() {
            verdict.rating = rate(verdict.truth_percentage, verdict.confidence, config);
            verdict.evidence_weight = claim_by_id
                .get(&verdict.claim_id)
                .map(|c| claim_weight(verdict, c.centrality))
                .unwrap_or(0.0);
        }

        // 7. Article
        let all: Vec<usize> = (0..verdicts.len()).collect();
        let article_average = weighted_average(pairs(&verdicts, &all, &claim_by_id), config);
        let Blended {
            truth_percentage,
            confidence,
            holistic,
            claims_average,
            anchored,
        } = blend(
            article_verdict.as_ref(),
            &article_average,
            config,
            "aggregate.article",
            &mut fallbacks,
        );
        let summary = VerdictSummary {
            truth_percentage,
            confidence,
            rating: rate(truth_percentage, confidence, config),
            holistic,
            claims_average,
            anchored,
            key_factors: article_average.key_factors,
        };

        info!(
            "Calibrated {} verdicts: article {:.1} ({}), {} contexts, {} warnings, {} fallbacks",
            verdicts.len(),
            summary.truth_percentage,
            summary.rating,
            context_answers.len(),
            warnings.len(),
            fallbacks.len()
        );

        Ok(CalibratedVerdicts {
            claim_verdicts: verdicts,
            context_answers,
            summary,
            warnings,
            fallbacks,
        })
    }

    async fn validate_directions(
        &self,
        verdicts: &mut [ClaimVerdict],
        claims: &[Claim],
        index: &EvidenceIndex<'_>,
        warnings: &mut Vec<Warning>,
        fallbacks: &mut Vec<FallbackRecord>,
    ) {
        let Some(validator) = &self.direction else {
            return;
        };
        let queries = build_queries(verdicts, claims, index);
        if queries.is_empty() {
            return;
        }

        let result = with_retry(&self.config.direction_retry, self.config.direction_timeout(), || {
            validator.validate_verdict_directions(&queries)
        })
        .await;

        match result {
            Ok(checks) => {
                let corrected = apply_direction_checks(verdicts, &checks, &self.config, warnings);
                debug!("Direction validation: {} checked, {} corrected", checks.len(), corrected);
            }
            Err(err) => {
                warn!("Direction validation failed, verdicts left uncorrected: {}", err);
                fallbacks.push(FallbackRecord::new(
                    "verdict.direction",
                    "verdicts left uncorrected",
                    err.to_string(),
                ));
            }
        }
    }
}

/// Claim/verdict pairs for the given verdict positions, skipping unknown claims
fn pairs<'a>(
    verdicts: &'a [ClaimVerdict],
    positions: &'a [usize],
    claim_by_id: &'a HashMap<&'a ClaimId, &'a Claim>,
) -> impl Iterator<Item = (&'a Claim, &'a ClaimVerdict)> + 'a {
    positions.iter().filter_map(move |&i| {
        let verdict = &verdicts[i];
        claim_by_id.get(&verdict.claim_id).map(|claim| (*claim, verdict))
    })
}

fn sanitize_verdicts(verdicts: &mut [ClaimVerdict]) -> Result<(), VerdictError> {
    for verdict in verdicts.iter_mut() {
        verdict.truth_percentage =
            checked_percentage(verdict.truth_percentage, format!("claim {} truth", verdict.claim_id))?;
        verdict.confidence = checked_percentage(verdict.confidence, format!("claim {} confidence", verdict.claim_id))?;
    }
    Ok(())
}

fn sanitize_one(mut holistic: HolisticVerdict) -> Result<HolisticVerdict, VerdictError> {
    let scope = holistic
        .context_id
        .as_ref()
        .map(|id| format!("context {id}"))
        .unwrap_or_else(|| "article".to_string());
    holistic.truth_percentage = checked_percentage(holistic.truth_percentage, format!("{scope} holistic truth"))?;
    holistic.confidence = checked_percentage(holistic.confidence, format!("{scope} holistic confidence"))?;
    Ok(holistic)
}

fn sanitize_holistic(holistic: Vec<HolisticVerdict>) -> Result<Vec<HolisticVerdict>, VerdictError> {
    holistic.into_iter().map(sanitize_one).collect()
}
