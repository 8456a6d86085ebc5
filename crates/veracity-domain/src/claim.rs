//! Claim module - atomic, independently verifiable assertions

use crate::{ClaimId, ContextId};
use serde::{Deserialize, Serialize};

/// What part of the input a claim plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRole {
    /// Who said something
    Attribution,
    /// Where something was reported
    Source,
    /// When something happened
    Timing,
    /// The substantive assertion itself
    Core,
}

/// How important a claim is to the overall thesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Centrality {
    /// Peripheral detail
    Low,
    /// Supporting assertion
    Medium,
    /// Load-bearing assertion
    High,
}

impl Centrality {
    /// Aggregation multiplier (high=3, medium=2, low=1)
    pub fn multiplier(&self) -> f64 {
        match self {
            Centrality::High => 3.0,
            Centrality::Medium => 2.0,
            Centrality::Low => 1.0,
        }
    }
}

/// Whether a claim tests the main thesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisRelevance {
    /// Directly tests the thesis
    Direct,
    /// Contextual only
    Tangential,
    /// Unrelated to the thesis
    Irrelevant,
}

/// An atomic assertion decomposed from the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Stable identifier
    pub id: ClaimId,

    /// The assertion text
    pub text: String,

    /// Role in the input
    pub role: ClaimRole,

    /// Importance to the thesis
    pub centrality: Centrality,

    /// Relation to the thesis
    pub thesis_relevance: ThesisRelevance,

    /// Prerequisite claims
    #[serde(default)]
    pub depends_on: Vec<ClaimId>,

    /// Owning context, if any
    #[serde(default)]
    pub context_id: Option<ContextId>,

    /// Truth of the claim depends on recent events
    #[serde(default)]
    pub recency_sensitive: bool,

    /// Comparative or otherwise invertible claim
    #[serde(default)]
    pub invertible: bool,

    /// Tests the logical opposite of the main thesis
    #[serde(default)]
    pub is_counter_claim: bool,
}

impl Claim {
    /// Create a core, direct claim with medium centrality
    pub fn new(id: impl Into<ClaimId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            role: ClaimRole::Core,
            centrality: Centrality::Medium,
            thesis_relevance: ThesisRelevance::Direct,
            depends_on: Vec::new(),
            context_id: None,
            recency_sensitive: false,
            invertible: false,
            is_counter_claim: false,
        }
    }

    /// Set the centrality (re-applies the central-claim invariant)
    pub fn with_centrality(mut self, centrality: Centrality) -> Self {
        self.centrality = centrality;
        self.enforce_central_invariant();
        self
    }

    /// Set the role
    pub fn with_role(mut self, role: ClaimRole) -> Self {
        self.role = role;
        self
    }

    /// Set the owning context
    pub fn in_context(mut self, context_id: impl Into<ContextId>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Add a prerequisite claim
    pub fn depending_on(mut self, claim_id: impl Into<ClaimId>) -> Self {
        self.depends_on.push(claim_id.into());
        self
    }

    /// Whether this is a load-bearing core assertion
    pub fn is_central_core(&self) -> bool {
        self.centrality == Centrality::High && self.role == ClaimRole::Core
    }

    /// Central claims must always test the thesis directly
    ///
    /// Returns true when the claim had to be corrected.
    pub fn enforce_central_invariant(&mut self) -> bool {
        if self.centrality == Centrality::High && self.thesis_relevance != ThesisRelevance::Direct {
            self.thesis_relevance = ThesisRelevance::Direct;
            return true;
        }
        false
    }
}

/// Re-apply the central-claim invariant to every claim; returns how many were corrected
pub fn enforce_central_invariant(claims: &mut [Claim]) -> usize {
    claims
        .iter_mut()
        .map(Claim::enforce_central_invariant)
        .filter(|corrected| *corrected)
        .count()
}
