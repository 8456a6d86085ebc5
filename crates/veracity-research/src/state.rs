//! Mutable state of one research run

use crate::budget::BudgetTracker;
use crate::config::BudgetConfig;
use crate::decision::SearchMark;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;
use veracity_domain::{
    enforce_central_invariant, AnalysisContext, Claim, ClaimId, ContextId, ContextRemap, EvidenceItem,
    FallbackRecord, FetchedSource, Understanding, Warning, WarningKind,
};

/// One-shot searches already performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchFlags {
    /// Criticism/controversy search
    pub contradiction: bool,
    /// Counter-claim search for an invertible claim
    pub inverse_claim: bool,
    /// Conflict-of-interest search on decision-makers
    pub decision_makers: bool,
    /// Cross-authority discovery for single-context inputs
    pub cross_context: bool,
    /// Date-windowed supplement for recency-sensitive claims
    pub recency_supplement: bool,
}

/// What a reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Contexts merged away or removed
    pub retired: usize,
    /// Contexts renamed
    pub renamed: usize,
    /// Contexts deleted for having no claims and no evidence
    pub pruned: usize,
    /// Claims whose context reference changed
    pub claims_moved: usize,
    /// Evidence items whose context reference changed
    pub evidence_moved: usize,
    /// Claims corrected by the central-claim invariant
    pub invariant_repairs: usize,
}

/// Aggregate root for one research run
///
/// Only the orchestrator mutates the state, between awaited stages.
#[derive(Debug, Clone)]
pub struct ResearchState {
    /// Claims, contexts and hints from upstream understanding
    pub understanding: Understanding,

    /// Evidence accumulated so far
    pub evidence: Vec<EvidenceItem>,

    /// Sources fetched so far (including failed fetches)
    pub sources: Vec<FetchedSource>,

    /// Reference date for date-windowed queries
    pub as_of: NaiveDate,

    /// Search iterations executed
    pub iteration: u32,

    /// One-shot search flags
    pub flags: SearchFlags,

    /// Central claims that already had their dedicated search
    pub central_claims_searched: HashSet<ClaimId>,

    /// Claims that already had a coverage-gap search
    pub gap_searched: HashSet<ClaimId>,

    /// Targeted searches per context
    pub context_attempts: HashMap<ContextId, u32>,

    /// Upstream-suggested queries consumed
    pub suggested_cursor: usize,

    /// Normalized URLs already fetched or queued
    pub processed_urls: HashSet<String>,

    /// Every query sent to the search provider, in order
    pub queries_run: Vec<String>,

    /// Warnings for the report
    pub warnings: Vec<Warning>,

    /// Fallbacks for the report
    pub fallbacks: Vec<FallbackRecord>,

    /// Resource budget
    pub budget: BudgetTracker,
}

impl ResearchState {
    /// Start a run from `understanding`
    ///
    /// Dangling context references are cleared and the central-claim
    /// invariant is enforced before anything else sees the claims.
    pub fn new(mut understanding: Understanding, budget: BudgetConfig, as_of: NaiveDate) -> Self {
        let mut warnings = Vec::new();

        let known: HashSet<ContextId> = understanding.contexts.iter().map(|c| c.id.clone()).collect();
        for claim in understanding.claims.iter_mut() {
            if claim.context_id.as_ref().is_some_and(|id| !known.contains(id)) {
                warnings.push(Warning::new(
                    WarningKind::InvariantRepaired,
                    format!("Claim {} referenced an unknown context; reference cleared", claim.id),
                ));
                claim.context_id = None;
            }
        }

        let repaired = enforce_central_invariant(&mut understanding.claims);
        if repaired > 0 {
            warnings.push(Warning::new(
                WarningKind::InvariantRepaired,
                format!("{} central claims forced to direct thesis relevance", repaired),
            ));
        }

        Self {
            understanding,
            evidence: Vec::new(),
            sources: Vec::new(),
            as_of,
            iteration: 0,
            flags: SearchFlags::default(),
            central_claims_searched: HashSet::new(),
            gap_searched: HashSet::new(),
            context_attempts: HashMap::new(),
            suggested_cursor: 0,
            processed_urls: HashSet::new(),
            queries_run: Vec::new(),
            warnings,
            fallbacks: Vec::new(),
            budget: BudgetTracker::new(budget),
        }
    }

    /// Current contexts
    pub fn contexts(&self) -> &[AnalysisContext] {
        &self.understanding.contexts
    }

    /// Current claims
    pub fn claims(&self) -> &[Claim] {
        &self.understanding.claims
    }

    /// Evidence items attributed to a context
    pub fn evidence_for_context(&self, context_id: &ContextId) -> usize {
        self.evidence
            .iter()
            .filter(|e| e.context_id.as_ref() == Some(context_id))
            .count()
    }

    /// Evidence items structurally linked to a claim
    pub fn evidence_for_claim(&self, claim_id: &ClaimId) -> usize {
        self.evidence.iter().filter(|e| e.relates_to(claim_id)).count()
    }

    /// Whether any evidence carries `category`
    pub fn has_category(&self, category: &str) -> bool {
        self.evidence.iter().any(|e| e.category == category)
    }

    /// Distinct evidence categories collected
    pub fn categories(&self) -> BTreeSet<&str> {
        self.evidence.iter().map(|e| e.category.as_str()).collect()
    }

    /// Whether date-windowed query variants apply
    pub fn recency_matters(&self) -> bool {
        self.understanding.time_sensitive || self.claims().iter().any(|c| c.recency_sensitive)
    }

    /// Apply the bookkeeping of an executed action
    pub fn apply_mark(&mut self, mark: &SearchMark) {
        match mark {
            SearchMark::CentralClaim(id) => {
                self.central_claims_searched.insert(id.clone());
            }
            SearchMark::RecencySupplement => self.flags.recency_supplement = true,
            SearchMark::ContextAttempt(id) => *self.context_attempts.entry(id.clone()).or_insert(0) += 1,
            SearchMark::Contradiction => self.flags.contradiction = true,
            SearchMark::InverseClaim => self.flags.inverse_claim = true,
            SearchMark::CrossContext => self.flags.cross_context = true,
            SearchMark::DecisionMakers => self.flags.decision_makers = true,
            SearchMark::SuggestedQueries { next_cursor } => {
                self.suggested_cursor = self.suggested_cursor.max(*next_cursor);
            }
            SearchMark::CoverageGap(id) => {
                self.gap_searched.insert(id.clone());
            }
        }
    }

    /// Apply a context remap atomically to contexts, claims and evidence
    ///
    /// Retired contexts disappear, references follow merges (or are
    /// cleared when the chain ends in a removal), contexts left with no
    /// claims and no evidence are pruned, and the central-claim invariant
    /// is re-applied.
    pub fn reconcile(&mut self, remap: &ContextRemap) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let contexts = &mut self.understanding.contexts;

        let before = contexts.len();
        contexts.retain(|c| !remap.is_retired(&c.id));
        report.retired = before - contexts.len();

        for context in contexts.iter_mut() {
            if let Some(name) = remap.renamed(&context.id) {
                context.name = name.to_string();
                report.renamed += 1;
            }
        }

        let surviving: HashSet<ContextId> = contexts.iter().map(|c| c.id.clone()).collect();
        let resolve = |current: &Option<ContextId>| -> Option<ContextId> {
            current
                .as_ref()
                .and_then(|id| remap.resolve(id))
                .filter(|id| surviving.contains(id))
        };

        for claim in self.understanding.claims.iter_mut() {
            let resolved = resolve(&claim.context_id);
            if resolved != claim.context_id {
                claim.context_id = resolved;
                report.claims_moved += 1;
            }
        }
        for item in self.evidence.iter_mut() {
            let resolved = resolve(&item.context_id);
            if resolved != item.context_id {
                item.context_id = resolved;
                report.evidence_moved += 1;
            }
        }
        self.context_attempts.retain(|id, _| surviving.contains(id));

        let referenced: HashSet<&ContextId> = self
            .understanding
            .claims
            .iter()
            .filter_map(|c| c.context_id.as_ref())
            .chain(self.evidence.iter().filter_map(|e| e.context_id.as_ref()))
            .collect();
        let before = self.understanding.contexts.len();
        self.understanding.contexts.retain(|c| referenced.contains(&c.id));
        report.pruned = before - self.understanding.contexts.len();

        report.invariant_repairs = enforce_central_invariant(&mut self.understanding.claims);
        if report.invariant_repairs > 0 {
            self.warnings.push(Warning::new(
                WarningKind::InvariantRepaired,
                format!(
                    "{} central claims forced to direct thesis relevance after reconciliation",
                    report.invariant_repairs
                ),
            ));
        }

        info!(
            "Contexts reconciled: {} retired, {} renamed, {} pruned, {} claims and {} evidence moved",
            report.retired, report.renamed, report.pruned, report.claims_moved, report.evidence_moved
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_domain::{Centrality, EvidenceCandidate, ThesisRelevance};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn understanding() -> Understanding {
        Understanding {
            thesis: "The ruling was lawful".to_string(),
            contexts: vec![
                AnalysisContext::new("CTX_A", "Electoral court", "TSE"),
                AnalysisContext::new("CTX_B", "Supreme court", "STF"),
                AnalysisContext::new("CTX_C", "Congress", "Chamber vote"),
            ],
            claims: vec![
                Claim::new("C1", "The court had jurisdiction").in_context("CTX_A"),
                Claim::new("C2", "The appeal was heard").in_context("CTX_B"),
            ],
            ..Default::default()
        }
    }

    fn evidence_in(context: &str) -> EvidenceItem {
        let source = FetchedSource::fetched("https://a.org", "A", "text");
        EvidenceCandidate::new("statement").into_evidence(&source, Some(&ContextId::from(context)))
    }

    #[test]
    fn test_new_clears_dangling_context_refs() {
        let mut input = understanding();
        input.claims.push(Claim::new("C3", "x").in_context("CTX_MISSING"));
        let state = ResearchState::new(input, BudgetConfig::default(), as_of());

        assert_eq!(state.claims()[2].context_id, None);
        assert_eq!(state.warnings.len(), 1);
        assert_eq!(state.warnings[0].kind, WarningKind::InvariantRepaired);
    }

    #[test]
    fn test_new_enforces_central_invariant() {
        let mut input = understanding();
        let mut claim = Claim::new("C9", "central").with_centrality(Centrality::High);
        claim.thesis_relevance = ThesisRelevance::Tangential;
        input.claims.push(claim);

        let state = ResearchState::new(input, BudgetConfig::default(), as_of());
        assert_eq!(state.claims()[2].thesis_relevance, ThesisRelevance::Direct);
    }

    #[test]
    fn test_merge_moves_references() {
        let mut state = ResearchState::new(understanding(), BudgetConfig::default(), as_of());
        state.evidence.push(evidence_in("CTX_B"));

        let report = state.reconcile(&ContextRemap::new().merge("CTX_B", "CTX_A"));

        assert_eq!(report.retired, 1);
        assert_eq!(report.claims_moved, 1);
        assert_eq!(report.evidence_moved, 1);
        assert_eq!(state.claims()[1].context_id, Some(ContextId::from("CTX_A")));
        assert_eq!(state.evidence[0].context_id, Some(ContextId::from("CTX_A")));
        assert_eq!(state.evidence_for_context(&ContextId::from("CTX_A")), 1);
    }

    #[test]
    fn test_removal_clears_references_and_prunes_empty() {
        let mut state = ResearchState::new(understanding(), BudgetConfig::default(), as_of());
        state.context_attempts.insert(ContextId::from("CTX_B"), 1);

        let report = state.reconcile(&ContextRemap::new().remove("CTX_B"));

        assert_eq!(state.claims()[1].context_id, None);
        assert!(state.context_attempts.is_empty());
        // CTX_C never had claims or evidence
        assert_eq!(report.pruned, 1);
        let ids: Vec<&str> = state.contexts().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CTX_A"]);
    }

    #[test]
    fn test_context_with_evidence_survives_pruning() {
        let mut state = ResearchState::new(understanding(), BudgetConfig::default(), as_of());
        state.evidence.push(evidence_in("CTX_C"));

        let report = state.reconcile(&ContextRemap::new().rename("CTX_C", "Chamber of Deputies"));

        assert_eq!(report.pruned, 0);
        assert_eq!(report.renamed, 1);
        assert_eq!(state.contexts()[2].name, "Chamber of Deputies");
    }

    #[test]
    fn test_apply_marks() {
        let mut state = ResearchState::new(understanding(), BudgetConfig::default(), as_of());
        state.apply_mark(&SearchMark::Contradiction);
        state.apply_mark(&SearchMark::ContextAttempt(ContextId::from("CTX_A")));
        state.apply_mark(&SearchMark::ContextAttempt(ContextId::from("CTX_A")));
        state.apply_mark(&SearchMark::SuggestedQueries { next_cursor: 2 });
        state.apply_mark(&SearchMark::SuggestedQueries { next_cursor: 1 });

        assert!(state.flags.contradiction);
        assert!(!state.flags.inverse_claim);
        assert_eq!(state.context_attempts.get(&ContextId::from("CTX_A")), Some(&2));
        assert_eq!(state.suggested_cursor, 2);
    }

    #[test]
    fn test_recency_matters() {
        let mut input = understanding();
        let state = ResearchState::new(input.clone(), BudgetConfig::default(), as_of());
        assert!(!state.recency_matters());

        input.claims[0].recency_sensitive = true;
        let state = ResearchState::new(input, BudgetConfig::default(), as_of());
        assert!(state.recency_matters());
    }
}
