//! End-to-end analysis: research loop, verdict generation, calibration

use crate::budget::BudgetStats;
use crate::config::BudgetConfig;
use crate::error::ResearchError;
use crate::orchestrator::ResearchOrchestrator;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use veracity_domain::traits::{InputClassifier, VerdictGeneration};
use veracity_domain::{
    AnalysisContext, Claim, ClaimId, ClaimVerdict, ContextAnswer, EvidenceItem, FallbackRecord, FetchedSource,
    GeneratedVerdicts, ReportIntegrity, Understanding, VerdictSummary, Warning, WarningKind,
};
use veracity_llm::with_retry;
use veracity_verdict::VerdictCalibrator;

/// Everything a run exposes to consumers
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Thesis under analysis
    pub thesis: String,
    /// Contexts after refinement
    pub contexts: Vec<AnalysisContext>,
    /// Claims after refinement
    pub claims: Vec<Claim>,
    /// Final per-claim verdicts
    pub claim_verdicts: Vec<ClaimVerdict>,
    /// Per-context answers
    pub context_answers: Vec<ContextAnswer>,
    /// Article-level summary
    pub summary: VerdictSummary,
    /// All evidence collected
    pub evidence: Vec<EvidenceItem>,
    /// All sources fetched or attempted
    pub sources: Vec<FetchedSource>,
    /// Warnings from every stage
    pub warnings: Vec<Warning>,
    /// Fallbacks from every stage
    pub fallbacks: Vec<FallbackRecord>,
    /// Queries sent to the search provider
    pub queries_run: Vec<String>,
    /// Whether the research budget was exhausted
    pub budget_exceeded: bool,
    /// Why the budget was exhausted
    pub budget_reason: Option<String>,
    /// Budget counters
    pub budget: BudgetStats,
    /// Integrity summary over warnings and fallbacks
    pub integrity: ReportIntegrity,
}

/// Composes research, verdict generation and calibration
pub struct AnalysisPipeline {
    classifier: Option<Arc<dyn InputClassifier>>,
    orchestrator: ResearchOrchestrator,
    verdicts: Arc<dyn VerdictGeneration>,
    calibrator: VerdictCalibrator,
    budget: BudgetConfig,
}

impl AnalysisPipeline {
    /// Create a pipeline with the default budget
    pub fn new(
        orchestrator: ResearchOrchestrator,
        verdicts: Arc<dyn VerdictGeneration>,
        calibrator: VerdictCalibrator,
    ) -> Self {
        Self {
            classifier: None,
            orchestrator,
            verdicts,
            calibrator,
            budget: BudgetConfig::default(),
        }
    }

    /// Classify raw input with `classifier` in [`AnalysisPipeline::analyze`]
    pub fn with_classifier(mut self, classifier: Arc<dyn InputClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Use this research budget
    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = budget;
        self
    }

    /// Classify `input`, then run the full analysis
    pub async fn analyze(&self, input: &str, as_of: NaiveDate) -> Result<AnalysisReport, ResearchError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(ResearchError::MissingCapability("classifier"))?;
        let config = self.orchestrator.config();

        let understanding = with_retry(&config.retry, config.assessment_timeout(), || {
            classifier.classify_input(input)
        })
        .await
        .map_err(ResearchError::Classification)?;

        self.run(understanding, as_of).await
    }

    /// Research `understanding`, generate verdicts and calibrate them
    ///
    /// A failed verdict generation does not fail the run: every claim is
    /// defaulted to 50% at zero confidence and the default is recorded.
    #[instrument(skip_all, fields(thesis = %understanding.thesis))]
    pub async fn run(&self, understanding: Understanding, as_of: NaiveDate) -> Result<AnalysisReport, ResearchError> {
        let mut state = self
            .orchestrator
            .research(understanding, self.budget.clone(), as_of)
            .await?;
        let config = self.orchestrator.config();

        let response = with_retry(&config.retry, config.assessment_timeout(), || {
            self.verdicts.generate_verdicts(
                &state.understanding.thesis,
                state.claims(),
                state.contexts(),
                &state.evidence,
            )
        })
        .await;

        let mut generated = match response {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Verdict generation failed: {}", e);
                state.fallbacks.push(FallbackRecord::new(
                    "verdict.generation",
                    "every claim defaulted to 50% at zero confidence",
                    e.to_string(),
                ));
                GeneratedVerdicts::default()
            }
        };

        let known: HashSet<&ClaimId> = state.claims().iter().map(|c| &c.id).collect();
        let mut present: HashSet<ClaimId> = HashSet::new();
        let mut duplicates = Vec::new();
        generated.claim_verdicts.retain(|v| {
            if !known.contains(&v.claim_id) {
                return false;
            }
            if present.insert(v.claim_id.clone()) {
                true
            } else {
                duplicates.push(v.claim_id.clone());
                false
            }
        });
        for claim_id in duplicates {
            warn!("Dropping duplicate verdict for claim {}", claim_id);
            state.fallbacks.push(FallbackRecord::new(
                "verdict.generation",
                "kept the first verdict for the claim",
                format!("duplicate verdict for claim {}", claim_id),
            ));
        }
        for claim in state.understanding.claims.iter().filter(|c| !present.contains(&c.id)) {
            generated.claim_verdicts.push(ClaimVerdict::new(claim.id.clone(), 50.0, 0.0));
            state.warnings.push(Warning::new(
                WarningKind::VerdictDefaulted,
                format!("No verdict for claim {}; defaulted to 50% at zero confidence", claim.id),
            ));
        }

        let calibrated = self
            .calibrator
            .calibrate(
                generated,
                state.claims(),
                state.contexts(),
                &state.evidence,
                &state.sources,
            )
            .await?;

        state.warnings.extend(calibrated.warnings);
        state.fallbacks.extend(calibrated.fallbacks);
        let integrity = ReportIntegrity::assess(&state.warnings, &state.fallbacks, state.claims().len());
        let budget = state.budget.stats();

        info!(
            "Analysis complete: {} ({:.1}%, confidence {:.1}), {} warnings, {} fallbacks",
            calibrated.summary.rating,
            calibrated.summary.truth_percentage,
            calibrated.summary.confidence,
            state.warnings.len(),
            state.fallbacks.len()
        );

        Ok(AnalysisReport {
            thesis: state.understanding.thesis,
            contexts: state.understanding.contexts,
            claims: state.understanding.claims,
            claim_verdicts: calibrated.claim_verdicts,
            context_answers: calibrated.context_answers,
            summary: calibrated.summary,
            evidence: state.evidence,
            sources: state.sources,
            warnings: state.warnings,
            fallbacks: state.fallbacks,
            queries_run: state.queries_run,
            budget_exceeded: budget.exceeded,
            budget_reason: budget.exceeded_reason.clone(),
            budget,
            integrity,
        })
    }
}
