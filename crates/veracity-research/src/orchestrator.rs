//! Research orchestrator
//!
//! Runs the bounded research loop: ask the decision engine for the next
//! action, search, fetch, extract, fold the results into the state, and
//! repeat until completion or budget exhaustion. Iterations are strictly
//! sequential; fetches and extractions within an iteration are concurrent.

use crate::config::{BudgetConfig, DecisionConfig, OrchestratorConfig};
use crate::decision::{decide, Decision, SearchAction};
use crate::error::ResearchError;
use crate::state::ResearchState;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use veracity_dedup::{DedupConfig, Deduplicator};
use veracity_domain::traits::{
    ContextRefinement, EvidenceExtraction, ReliabilityScorer, SearchRelevance, SourceFetcher, TextSimilarity,
    WebSearch,
};
use veracity_domain::{
    FallbackRecord, FetchedSource, SearchFilters, SearchResult, SourceId, Understanding, Warning, WarningKind,
};
use veracity_extractor::{ExtractionOptions, ExtractorConfig, ParallelExtractor};
use veracity_llm::{with_retry, with_timeout};

type Dedup = Deduplicator<dyn TextSimilarity>;
type Extractor = ParallelExtractor<dyn EvidenceExtraction, dyn TextSimilarity>;

/// External capabilities used by the research loop
#[derive(Clone)]
pub struct Capabilities {
    /// Web search provider
    pub search: Arc<dyn WebSearch>,
    /// Page fetcher
    pub fetcher: Arc<dyn SourceFetcher>,
    /// Evidence extraction
    pub extraction: Arc<dyn EvidenceExtraction>,
    /// Text similarity for deduplication
    pub similarity: Arc<dyn TextSimilarity>,
    /// Source reliability lookup (scores stay unknown without it)
    pub reliability: Option<Arc<dyn ReliabilityScorer>>,
    /// Search relevance filter (all results kept without it)
    pub relevance: Option<Arc<dyn SearchRelevance>>,
    /// Context refinement (contexts stay fixed without it)
    pub refinement: Option<Arc<dyn ContextRefinement>>,
}

impl Capabilities {
    /// Start assembling capabilities
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }
}

/// Builder for [`Capabilities`]
///
/// Search, fetcher, extraction and similarity are required.
#[derive(Default)]
pub struct CapabilitiesBuilder {
    search: Option<Arc<dyn WebSearch>>,
    fetcher: Option<Arc<dyn SourceFetcher>>,
    extraction: Option<Arc<dyn EvidenceExtraction>>,
    similarity: Option<Arc<dyn TextSimilarity>>,
    reliability: Option<Arc<dyn ReliabilityScorer>>,
    relevance: Option<Arc<dyn SearchRelevance>>,
    refinement: Option<Arc<dyn ContextRefinement>>,
}

impl CapabilitiesBuilder {
    /// Set the search provider
    pub fn search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Set the page fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the evidence extraction capability
    pub fn extraction(mut self, extraction: Arc<dyn EvidenceExtraction>) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Set the similarity capability
    pub fn similarity(mut self, similarity: Arc<dyn TextSimilarity>) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Set the reliability scorer
    pub fn reliability(mut self, reliability: Arc<dyn ReliabilityScorer>) -> Self {
        self.reliability = Some(reliability);
        self
    }

    /// Set the relevance filter
    pub fn relevance(mut self, relevance: Arc<dyn SearchRelevance>) -> Self {
        self.relevance = Some(relevance);
        self
    }

    /// Set the context refinement capability
    pub fn refinement(mut self, refinement: Arc<dyn ContextRefinement>) -> Self {
        self.refinement = Some(refinement);
        self
    }

    /// Finish, failing on the first missing required capability
    pub fn build(self) -> Result<Capabilities, ResearchError> {
        Ok(Capabilities {
            search: self.search.ok_or(ResearchError::MissingCapability("search"))?,
            fetcher: self.fetcher.ok_or(ResearchError::MissingCapability("fetcher"))?,
            extraction: self.extraction.ok_or(ResearchError::MissingCapability("extraction"))?,
            similarity: self.similarity.ok_or(ResearchError::MissingCapability("similarity"))?,
            reliability: self.reliability,
            relevance: self.relevance,
            refinement: self.refinement,
        })
    }
}

/// Drives research runs
pub struct ResearchOrchestrator {
    caps: Capabilities,
    config: OrchestratorConfig,
    decision: DecisionConfig,
    extractor: ExtractorConfig,
    dedup: DedupConfig,
}

impl ResearchOrchestrator {
    /// Create an orchestrator with default settings
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            config: OrchestratorConfig::default(),
            decision: DecisionConfig::default(),
            extractor: ExtractorConfig::default(),
            dedup: DedupConfig::default(),
        }
    }

    /// Use these orchestrator settings
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these decision thresholds
    pub fn with_decision(mut self, decision: DecisionConfig) -> Self {
        self.decision = decision;
        self
    }

    /// Use these extractor settings
    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }

    /// Use these deduplication settings
    pub fn with_dedup(mut self, dedup: DedupConfig) -> Self {
        self.dedup = dedup;
        self
    }

    /// Orchestrator settings in use
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Decision thresholds in use
    pub fn decision_config(&self) -> &DecisionConfig {
        &self.decision
    }

    /// Validate every configuration section
    pub fn validate(&self) -> Result<(), ResearchError> {
        self.config.validate().map_err(ResearchError::Config)?;
        self.decision.validate().map_err(ResearchError::Config)?;
        Ok(())
    }

    /// Run the research loop to completion or budget exhaustion
    ///
    /// Capability failures never end the run; they become warnings and
    /// fallback records on the returned state. Only invalid configuration
    /// is an error.
    #[instrument(skip_all, fields(thesis = %understanding.thesis))]
    pub async fn research(
        &self,
        understanding: Understanding,
        budget: BudgetConfig,
        as_of: NaiveDate,
    ) -> Result<ResearchState, ResearchError> {
        self.validate()?;
        budget.validate().map_err(ResearchError::Config)?;

        // Per-run instances: the extractor's width only shrinks within a run
        let dedup: Arc<Dedup> = Arc::new(Deduplicator::new(self.caps.similarity.clone(), self.dedup.clone())?);
        let extractor: Extractor =
            ParallelExtractor::new(self.caps.extraction.clone(), dedup.clone(), self.extractor.clone())?;

        let mut state = ResearchState::new(understanding, budget, as_of);
        info!(
            "Starting research: {} claims, {} contexts, budget {} iterations",
            state.claims().len(),
            state.contexts().len(),
            state.budget.config().max_iterations
        );

        loop {
            if state.budget.check_elapsed() || state.budget.is_exceeded() {
                let reason = state.budget.exceeded_reason().unwrap_or("budget exceeded").to_string();
                state.warnings.push(Warning::new(
                    WarningKind::BudgetExceeded,
                    format!("Research stopped early: {}", reason),
                ));
                break;
            }

            match decide(&state, &self.decision) {
                Decision::Complete(completion) => {
                    if !completion.coverage_met {
                        warn!("Research completed with unmet coverage: {}", completion.unmet.join("; "));
                        state.warnings.push(Warning::new(
                            WarningKind::CoverageUnmet,
                            format!("Coverage targets not met: {}", completion.unmet.join("; ")),
                        ));
                    }
                    break;
                }
                Decision::Search(action) => self.execute(&mut state, &action, &dedup, &extractor).await,
            }
        }

        if state.evidence.is_empty() {
            state
                .warnings
                .push(Warning::new(WarningKind::NoEvidence, "No evidence was extracted"));
        }

        info!(
            "Research finished: {} evidence items from {} sources\n{}",
            state.evidence.len(),
            state.sources.len(),
            state.budget.stats().summary()
        );
        Ok(state)
    }

    async fn execute(&self, state: &mut ResearchState, action: &SearchAction, dedup: &Dedup, extractor: &Extractor) {
        if let Some(mark) = &action.mark {
            state.apply_mark(mark);
        }
        state.iteration += 1;
        state.budget.record_iteration(action.rule.name());
        info!(
            "Iteration {}: {} ({} queries)",
            state.iteration,
            action.rule,
            action.queries.len()
        );

        let results = self.search(state, action).await;
        let results = self.filter_relevant(state, action, results).await;
        let fresh: Vec<SearchResult> = dedup
            .filter_duplicate_urls(results, &state.processed_urls)
            .into_iter()
            .take(self.config.max_sources_per_iteration)
            .collect();
        for result in &fresh {
            state.processed_urls.insert(dedup.normalize_url(&result.url));
        }

        if !fresh.is_empty() {
            self.gather(state, action, fresh, dedup, extractor).await;
        } else {
            debug!("No new sources for {}", action.rule);
        }

        if self.refinement_due(state) {
            self.refine(state).await;
        }
    }

    async fn search(&self, state: &mut ResearchState, action: &SearchAction) -> Vec<SearchResult> {
        let filters = SearchFilters {
            max_results: self.config.max_results_per_query,
            date_window: action.date_window,
        };

        let mut results = Vec::new();
        for query in &action.queries {
            state.queries_run.push(query.clone());
            let response = with_retry(&self.config.retry, self.config.search_timeout(), || {
                self.caps.search.search_web(query, &filters)
            })
            .await;

            match response {
                Ok(mut hits) => {
                    debug!("Query '{}' returned {} results", query, hits.len());
                    results.append(&mut hits);
                }
                Err(e) => {
                    warn!("Search failed for '{}': {}", query, e);
                    state.warnings.push(Warning::new(
                        WarningKind::SearchFailed,
                        format!("Search '{}' failed: {}", query, e),
                    ));
                }
            }
        }

        // Providers may ignore the date filter; undated results are kept
        if let Some(window) = action.date_window {
            let earliest = window.earliest(state.as_of);
            results.retain(|r| r.published.map_or(true, |date| date >= earliest));
        }
        results
    }

    async fn filter_relevant(
        &self,
        state: &mut ResearchState,
        action: &SearchAction,
        results: Vec<SearchResult>,
    ) -> Vec<SearchResult> {
        let Some(relevance) = &self.caps.relevance else {
            return results;
        };
        if results.is_empty() {
            return results;
        }

        let scored = with_retry(&self.config.retry, self.config.assessment_timeout(), || {
            relevance.assess_search_relevance_batch(&action.focus, &results)
        })
        .await;

        let reason = match scored {
            Ok(scores) if scores.len() == results.len() => {
                let threshold = self.config.relevance_threshold;
                let before = results.len();
                let kept: Vec<SearchResult> = results
                    .into_iter()
                    .zip(scores)
                    .filter(|(_, score)| *score >= threshold)
                    .map(|(result, _)| result)
                    .collect();
                debug!("Relevance filter kept {} of {} results", kept.len(), before);
                return kept;
            }
            Ok(scores) => format!("expected {} scores, got {}", results.len(), scores.len()),
            Err(e) => e.to_string(),
        };

        warn!("Relevance scoring failed, keeping all results: {}", reason);
        state.fallbacks.push(FallbackRecord::new(
            "research.relevance",
            "all search results kept",
            reason,
        ));
        results
    }

    async fn gather(
        &self,
        state: &mut ResearchState,
        action: &SearchAction,
        fresh: Vec<SearchResult>,
        dedup: &Dedup,
        extractor: &Extractor,
    ) {
        let fetched: Vec<(FetchedSource, Option<String>)> = stream::iter(&fresh)
            .map(|result| self.fetch_one(result, dedup))
            .buffered(self.config.fetch_concurrency)
            .collect()
            .await;

        let mut sources = Vec::with_capacity(fetched.len());
        let mut unfetched: HashSet<SourceId> = HashSet::new();
        for (source, failure) in fetched {
            if let Some(reason) = failure {
                state.warnings.push(Warning::new(
                    WarningKind::FetchFailed,
                    format!("Could not fetch {}: {}", source.url, reason),
                ));
                unfetched.insert(source.id.clone());
            }
            sources.push(source);
        }

        let options = ExtractionOptions::new(action.focus.clone())
            .with_contexts(state.contexts().to_vec())
            .targeting(action.target_context_id.clone());
        let outcome = extractor.extract(&sources, &options, &state.evidence).await;

        if outcome.telemetry.succeeded > 0 || outcome.telemetry.tokens_used > 0 {
            state.budget.record_llm_call(outcome.telemetry.tokens_used);
        }
        for failure in outcome.failures.iter().filter(|f| !unfetched.contains(&f.source_id)) {
            state.warnings.push(Warning::new(
                WarningKind::ExtractionFailed,
                format!("Extraction failed for {}: {}", failure.url, failure.reason),
            ));
        }

        if outcome.telemetry.contexts_repaired > 0 {
            state.warnings.push(Warning::new(
                WarningKind::InvariantRepaired,
                format!(
                    "{} evidence items named an unknown context and were reattributed",
                    outcome.telemetry.contexts_repaired
                ),
            ));
        }

        let mut items = outcome.evidence_items;
        if let Some(claim_id) = &action.target_claim_id {
            for item in items.iter_mut().filter(|item| item.related_claim_ids.is_empty()) {
                item.related_claim_ids.push(claim_id.clone());
            }
        }

        info!(
            "Iteration {} gathered {} evidence items from {} sources ({} duplicates dropped)",
            state.iteration,
            items.len(),
            sources.len(),
            outcome.telemetry.duplicates_dropped
        );
        state.fallbacks.extend(outcome.fallbacks);
        state.sources.extend(sources);
        state.evidence.extend(items);
    }

    async fn fetch_one(&self, result: &SearchResult, dedup: &Dedup) -> (FetchedSource, Option<String>) {
        let page = with_timeout(self.config.fetch_timeout(), self.caps.fetcher.fetch_source(&result.url)).await;

        let (mut source, failure) = match page {
            Ok(page) => {
                let title = if page.title.trim().is_empty() {
                    result.title.clone()
                } else {
                    page.title
                };
                (FetchedSource::fetched(&result.url, title, page.text), None)
            }
            Err(e) => {
                warn!("Fetch failed for {}: {}", result.url, e);
                (FetchedSource::failed(&result.url), Some(e.to_string()))
            }
        };
        source.normalized_url = dedup.normalize_url(&result.url);

        if source.fetch_success {
            if let Some(scorer) = &self.caps.reliability {
                let score = tokio::time::timeout(self.config.reliability_timeout(), scorer.reliability_score(&result.url))
                    .await
                    .ok()
                    .flatten()
                    .filter(|s| s.is_finite())
                    .map(|s| s.clamp(0.0, 1.0));
                source = source.with_reliability(score);
            }
        }
        (source, failure)
    }

    fn refinement_due(&self, state: &ResearchState) -> bool {
        self.caps.refinement.is_some()
            && self.config.refine_every > 0
            && state.iteration % self.config.refine_every == 0
    }

    async fn refine(&self, state: &mut ResearchState) {
        let Some(refinement) = &self.caps.refinement else {
            return;
        };

        let remap = with_retry(&self.config.retry, self.config.assessment_timeout(), || {
            refinement.refine_contexts(state.contexts(), state.claims(), &state.evidence)
        })
        .await;

        match remap {
            Ok(remap) if remap.is_empty() => debug!("Context refinement proposed no changes"),
            Ok(remap) => {
                state.reconcile(&remap);
            }
            Err(e) => {
                warn!("Context refinement failed: {}", e);
                state.fallbacks.push(FallbackRecord::new(
                    "research.context_refinement",
                    "contexts left unchanged",
                    e.to_string(),
                ));
            }
        }
    }
}
