//! Upstream understanding of the input, the starting point of a research run

use crate::{AnalysisContext, Claim};
use serde::{Deserialize, Serialize};

/// Claims and contexts decomposed from the input by the classification capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Understanding {
    /// The main thesis in one sentence
    pub thesis: String,

    /// Analytical contexts
    #[serde(default)]
    pub contexts: Vec<AnalysisContext>,

    /// Decomposed claims
    #[serde(default)]
    pub claims: Vec<Claim>,

    /// Declared legal or procedural framework, if any
    #[serde(default)]
    pub legal_framework: Option<String>,

    /// The input involves people or bodies who decided something
    #[serde(default)]
    pub involves_decision_makers: bool,

    /// Names of those decision-makers, when known
    #[serde(default)]
    pub decision_makers: Vec<String>,

    /// Entity terms used to sharpen queries
    #[serde(default)]
    pub key_entities: Vec<String>,

    /// Research queries suggested by the classifier
    #[serde(default)]
    pub suggested_queries: Vec<String>,

    /// The thesis as a whole is time-sensitive
    #[serde(default)]
    pub time_sensitive: bool,
}

impl Understanding {
    /// Whether decision-maker research applies
    pub fn has_decision_makers(&self) -> bool {
        self.involves_decision_makers || !self.decision_makers.is_empty()
    }

    /// Entity terms joined for use in a query
    pub fn entity_terms(&self, limit: usize) -> String {
        self.key_entities
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
