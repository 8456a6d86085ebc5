//! Research decision engine
//!
//! `decide` is a pure function over [`ResearchState`]: it walks an ordered
//! table of named rules and returns the first action that matches, or
//! completion. It never mutates the state. Each action carries a
//! [`SearchMark`] that the orchestrator applies once the action has run.

use crate::config::DecisionConfig;
use crate::state::ResearchState;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use veracity_domain::{category, ClaimId, ContextId, DateWindow};

/// Named rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Central core claim with no linked evidence (side-check)
    CentralClaimEvidence,
    /// Recency-sensitive claim with no evidence (side-check)
    RecencySupplement,
    /// Context with fewer than two evidence items
    ContextCoverage,
    /// Declared legal framework without provision evidence
    LegalFramework,
    /// No generic evidence early in the run
    GenericEvidence,
    /// Criticism and controversy search
    Contradiction,
    /// Counter-claim search for an invertible claim
    InverseClaim,
    /// Cross-authority discovery for single-context inputs
    CrossContext,
    /// Conflict-of-interest search on decision-makers
    DecisionMakers,
    /// Upstream-suggested queries
    SuggestedQueries,
    /// Least-covered claim while completion conditions are unmet
    CoverageGap,
}

impl RuleId {
    /// Evaluation order: side-checks first, then the main guards
    pub const ORDER: [RuleId; 11] = [
        RuleId::CentralClaimEvidence,
        RuleId::RecencySupplement,
        RuleId::ContextCoverage,
        RuleId::LegalFramework,
        RuleId::GenericEvidence,
        RuleId::Contradiction,
        RuleId::InverseClaim,
        RuleId::CrossContext,
        RuleId::DecisionMakers,
        RuleId::SuggestedQueries,
        RuleId::CoverageGap,
    ];

    /// Stable tag used in budget stats and logs
    pub fn name(&self) -> &'static str {
        match self {
            RuleId::CentralClaimEvidence => "central_claim_evidence",
            RuleId::RecencySupplement => "recency_supplement",
            RuleId::ContextCoverage => "context_coverage",
            RuleId::LegalFramework => "legal_framework",
            RuleId::GenericEvidence => "generic_evidence",
            RuleId::Contradiction => "contradiction",
            RuleId::InverseClaim => "inverse_claim",
            RuleId::CrossContext => "cross_context",
            RuleId::DecisionMakers => "decision_makers",
            RuleId::SuggestedQueries => "suggested_queries",
            RuleId::CoverageGap => "coverage_gap",
        }
    }

    /// Evaluate this rule alone
    pub fn evaluate(&self, state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
        match self {
            RuleId::CentralClaimEvidence => central_claim_evidence(state, config),
            RuleId::RecencySupplement => recency_supplement(state, config),
            RuleId::ContextCoverage => context_coverage(state, config),
            RuleId::LegalFramework => legal_framework(state, config),
            RuleId::GenericEvidence => generic_evidence(state, config),
            RuleId::Contradiction => contradiction(state, config),
            RuleId::InverseClaim => inverse_claim(state, config),
            RuleId::CrossContext => cross_context(state, config),
            RuleId::DecisionMakers => decision_makers(state, config),
            RuleId::SuggestedQueries => suggested_queries(state, config),
            RuleId::CoverageGap => coverage_gap(state, config),
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bookkeeping an action applies to the state once executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMark {
    /// Central claim searched
    CentralClaim(ClaimId),
    /// Recency supplement performed
    RecencySupplement,
    /// One more targeted search for a context
    ContextAttempt(ContextId),
    /// Contradiction search performed
    Contradiction,
    /// Inverse-claim search performed
    InverseClaim,
    /// Cross-context discovery performed
    CrossContext,
    /// Decision-maker search performed
    DecisionMakers,
    /// Suggested queries consumed up to `next_cursor`
    SuggestedQueries {
        /// Index of the first unconsumed suggestion
        next_cursor: usize,
    },
    /// Coverage-gap search for a claim
    CoverageGap(ClaimId),
}

/// A search the orchestrator should run next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAction {
    /// Rule that produced the action
    pub rule: RuleId,
    /// What extraction should focus on
    pub focus: String,
    /// Queries to send to the search provider
    pub queries: Vec<String>,
    /// Evidence category sought, if specific
    pub category: Option<String>,
    /// Context new evidence is attributed to
    pub target_context_id: Option<ContextId>,
    /// Claim new evidence is linked to
    pub target_claim_id: Option<ClaimId>,
    /// Whether recency matters for this search
    pub recency_matters: bool,
    /// Provider-level date restriction
    pub date_window: Option<DateWindow>,
    /// Bookkeeping applied when the action runs
    pub mark: Option<SearchMark>,
}

/// Completion details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Every completion condition was met
    pub coverage_met: bool,
    /// Conditions still unmet, if any
    pub unmet: Vec<String>,
}

/// Outcome of one decision
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Run another search
    Search(SearchAction),
    /// Stop researching
    Complete(Completion),
}

/// Serializable form of a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContract {
    /// Whether research is complete
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Extraction focus
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Queries to run
    pub queries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Evidence category sought
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Context new evidence is attributed to
    pub target_context_id: Option<ContextId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Claim new evidence is linked to
    pub target_claim_id: Option<ClaimId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Present and true when recency matters
    pub recency_matters: Option<bool>,
}

impl Decision {
    /// Whether the decision ends research
    pub fn is_complete(&self) -> bool {
        matches!(self, Decision::Complete(_))
    }

    /// Render the output contract
    pub fn to_contract(&self) -> DecisionContract {
        match self {
            Decision::Complete(_) => DecisionContract {
                complete: true,
                focus: None,
                queries: None,
                category: None,
                target_context_id: None,
                target_claim_id: None,
                recency_matters: None,
            },
            Decision::Search(action) => DecisionContract {
                complete: false,
                focus: Some(action.focus.clone()),
                queries: Some(action.queries.clone()),
                category: action.category.clone(),
                target_context_id: action.target_context_id.clone(),
                target_claim_id: action.target_claim_id.clone(),
                recency_matters: action.recency_matters.then_some(true),
            },
        }
    }
}

/// Decide the next research step
pub fn decide(state: &ResearchState, config: &DecisionConfig) -> Decision {
    for rule in RuleId::ORDER {
        if let Some(action) = rule.evaluate(state, config) {
            debug!("Rule {} matched: {} queries", rule, action.queries.len());
            return Decision::Search(action);
        }
    }

    let unmet = unmet_conditions(state, config);
    Decision::Complete(Completion {
        coverage_met: unmet.is_empty(),
        unmet,
    })
}

/// Completion conditions not yet satisfied
pub fn unmet_conditions(state: &ResearchState, config: &DecisionConfig) -> Vec<String> {
    let mut unmet = Vec::new();

    let required = config.required_evidence(state.contexts().len());
    if state.evidence.len() < required {
        unmet.push(format!("evidence count {} below required {}", state.evidence.len(), required));
    }

    let categories = state.categories().len();
    if categories < config.min_categories {
        unmet.push(format!(
            "category diversity {} below required {}",
            categories, config.min_categories
        ));
    }

    if !state.flags.contradiction {
        unmet.push("contradiction search not performed".to_string());
    }

    if has_invertible_claim(state) && !state.flags.inverse_claim {
        unmet.push("inverse-claim search not performed".to_string());
    }

    for context in state.contexts() {
        if state.evidence_for_context(&context.id) == 0 {
            unmet.push(format!("context {} has no evidence", context.id));
        }
    }

    unmet
}

fn has_invertible_claim(state: &ResearchState) -> bool {
    state.claims().iter().any(|c| c.invertible)
}

/// Join the non-empty parts of a query
fn compose(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dedupe drafts and, when recency matters, append year-suffixed variants
fn finish_queries(state: &ResearchState, drafts: Vec<String>) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();
    for draft in drafts {
        if !draft.is_empty() && !queries.contains(&draft) {
            queries.push(draft);
        }
    }

    if state.recency_matters() {
        let year = state.as_of.year();
        let variants: Vec<String> = queries
            .iter()
            .map(|q| format!("{} {}", q, year))
            .filter(|v| !queries.contains(v))
            .collect();
        queries.extend(variants);
    }
    queries
}

fn action(state: &ResearchState, rule: RuleId, focus: impl Into<String>, drafts: Vec<String>) -> SearchAction {
    SearchAction {
        rule,
        focus: focus.into(),
        queries: finish_queries(state, drafts),
        category: None,
        target_context_id: None,
        target_claim_id: None,
        recency_matters: state.recency_matters(),
        date_window: None,
        mark: None,
    }
}

fn central_claim_evidence(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    let claim = state.claims().iter().find(|c| {
        c.is_central_core()
            && state.evidence_for_claim(&c.id) == 0
            && !state.central_claims_searched.contains(&c.id)
    })?;
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        category: Some(category::EVIDENCE.to_string()),
        target_context_id: claim.context_id.clone(),
        target_claim_id: Some(claim.id.clone()),
        mark: Some(SearchMark::CentralClaim(claim.id.clone())),
        ..action(
            state,
            RuleId::CentralClaimEvidence,
            claim.text.clone(),
            vec![compose(&[&claim.text, &entities]), compose(&[&claim.text, "evidence"])],
        )
    })
}

fn recency_supplement(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if state.flags.recency_supplement {
        return None;
    }
    let claim = state
        .claims()
        .iter()
        .find(|c| c.recency_sensitive && state.evidence_for_claim(&c.id) == 0)?;
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        target_context_id: claim.context_id.clone(),
        target_claim_id: Some(claim.id.clone()),
        recency_matters: true,
        date_window: Some(DateWindow::PastYear),
        mark: Some(SearchMark::RecencySupplement),
        ..action(
            state,
            RuleId::RecencySupplement,
            claim.text.clone(),
            vec![compose(&[&claim.text, "latest"]), compose(&[&claim.text, &entities])],
        )
    })
}

fn context_coverage(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    let context = state.contexts().iter().find(|c| {
        state.evidence_for_context(&c.id) < 2
            && state.context_attempts.get(&c.id).copied().unwrap_or(0) < config.max_context_attempts
    })?;
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        target_context_id: Some(context.id.clone()),
        mark: Some(SearchMark::ContextAttempt(context.id.clone())),
        ..action(
            state,
            RuleId::ContextCoverage,
            format!("{}: {}", context.name, context.subject),
            vec![
                compose(&[&context.name, &context.subject, &entities]),
                compose(&[&context.subject, &entities]),
            ],
        )
    })
}

fn legal_framework(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    let framework = state
        .understanding
        .legal_framework
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())?;
    if state.iteration != 0 || state.has_category(category::LEGAL_PROVISION) {
        return None;
    }
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        category: Some(category::LEGAL_PROVISION.to_string()),
        ..action(
            state,
            RuleId::LegalFramework,
            format!("Provisions of {}", framework),
            vec![compose(&[framework, &entities]), compose(&[framework, "text provisions"])],
        )
    })
}

fn generic_evidence(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if state.iteration >= 2 || state.has_category(category::EVIDENCE) {
        return None;
    }
    let thesis = &state.understanding.thesis;
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        category: Some(category::EVIDENCE.to_string()),
        ..action(
            state,
            RuleId::GenericEvidence,
            thesis.clone(),
            vec![compose(&[thesis, &entities]), compose(&[thesis, "facts"])],
        )
    })
}

fn contradiction(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if state.flags.contradiction {
        return None;
    }
    let thesis = &state.understanding.thesis;
    let entities = state.understanding.entity_terms(config.max_entity_terms);
    let subject = if entities.is_empty() { thesis.as_str() } else { entities.as_str() };

    Some(SearchAction {
        category: Some(category::CRITICISM.to_string()),
        mark: Some(SearchMark::Contradiction),
        ..action(
            state,
            RuleId::Contradiction,
            format!("Criticism of: {}", thesis),
            vec![compose(&[subject, "criticism"]), compose(&[subject, "controversy"])],
        )
    })
}

fn inverse_claim(state: &ResearchState, _config: &DecisionConfig) -> Option<SearchAction> {
    if state.flags.inverse_claim {
        return None;
    }
    let claim = state.claims().iter().find(|c| c.invertible)?;

    Some(SearchAction {
        target_context_id: claim.context_id.clone(),
        target_claim_id: Some(claim.id.clone()),
        mark: Some(SearchMark::InverseClaim),
        ..action(
            state,
            RuleId::InverseClaim,
            format!("Evidence against: {}", claim.text),
            vec![
                compose(&[&claim.text, "disputed"]),
                compose(&[&claim.text, "counter evidence"]),
            ],
        )
    })
}

fn cross_context(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if state.flags.cross_context || state.contexts().len() != 1 || state.iteration < 2 {
        return None;
    }
    let thesis = &state.understanding.thesis;
    let entities = state.understanding.entity_terms(config.max_entity_terms);

    Some(SearchAction {
        mark: Some(SearchMark::CrossContext),
        ..action(
            state,
            RuleId::CrossContext,
            format!("Other authorities on: {}", thesis),
            vec![
                compose(&[&entities, "other authorities ruling"]),
                compose(&[thesis, "other jurisdictions"]),
            ],
        )
    })
}

fn decision_makers(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if state.flags.decision_makers || !state.understanding.has_decision_makers() {
        return None;
    }
    let names = &state.understanding.decision_makers;
    let drafts = if names.is_empty() {
        let entities = state.understanding.entity_terms(config.max_entity_terms);
        let subject = if entities.is_empty() {
            state.understanding.thesis.as_str()
        } else {
            entities.as_str()
        };
        vec![compose(&[subject, "decision makers conflict of interest"])]
    } else {
        names
            .iter()
            .map(|name| compose(&[name, "conflict of interest"]))
            .collect()
    };

    Some(SearchAction {
        category: Some(category::CRITICISM.to_string()),
        mark: Some(SearchMark::DecisionMakers),
        ..action(state, RuleId::DecisionMakers, "Decision-maker conflicts of interest", drafts)
    })
}

fn suggested_queries(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if config.deterministic {
        return None;
    }
    let remaining = state.understanding.suggested_queries.get(state.suggested_cursor..)?;
    if remaining.is_empty() {
        return None;
    }
    let batch: Vec<String> = remaining.iter().take(config.suggested_per_action).cloned().collect();
    let next_cursor = state.suggested_cursor + batch.len();

    Some(SearchAction {
        mark: Some(SearchMark::SuggestedQueries { next_cursor }),
        ..action(state, RuleId::SuggestedQueries, state.understanding.thesis.clone(), batch)
    })
}

fn coverage_gap(state: &ResearchState, config: &DecisionConfig) -> Option<SearchAction> {
    if unmet_conditions(state, config).is_empty() {
        return None;
    }
    let claim = state
        .claims()
        .iter()
        .filter(|c| !state.gap_searched.contains(&c.id))
        .min_by_key(|c| state.evidence_for_claim(&c.id))?;

    Some(SearchAction {
        target_context_id: claim.context_id.clone(),
        target_claim_id: Some(claim.id.clone()),
        mark: Some(SearchMark::CoverageGap(claim.id.clone())),
        ..action(
            state,
            RuleId::CoverageGap,
            claim.text.clone(),
            vec![compose(&[&claim.text]), compose(&[&claim.text, "source"])],
        )
    })
}
