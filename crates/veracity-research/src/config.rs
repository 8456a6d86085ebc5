//! Configuration for research runs
//!
//! Defines the resource budget, decision thresholds and per-call timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use veracity_llm::RetryPolicy;

/// Resource ceilings for one research run
///
/// # Examples
///
/// ```
/// use veracity_research::BudgetConfig;
///
/// // Default configuration (balanced)
/// let config = BudgetConfig::default();
/// assert_eq!(config.max_iterations, 10);
///
/// // Deeper research
/// let config = BudgetConfig::thorough();
/// assert_eq!(config.max_iterations, 20);
///
/// // Fast, shallow research
/// let config = BudgetConfig::quick();
/// assert_eq!(config.max_iterations, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Search iterations before the loop stops
    /// Default: 10
    pub max_iterations: u32,

    /// Tokens spent on LLM calls before the loop stops
    /// Default: 200,000
    pub max_tokens: u64,

    /// Wall-clock ceiling (in seconds), if any
    /// Default: none
    pub max_elapsed_secs: Option<u64>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_tokens: 200_000,
            max_elapsed_secs: None,
        }
    }
}

impl BudgetConfig {
    /// Thorough preset (more iterations, larger token allowance)
    ///
    /// - Iterations: 20
    /// - Tokens: 500,000
    pub fn thorough() -> Self {
        Self {
            max_iterations: 20,
            max_tokens: 500_000,
            max_elapsed_secs: None,
        }
    }

    /// Quick preset (few iterations, two-minute ceiling)
    ///
    /// - Iterations: 4
    /// - Tokens: 50,000
    /// - Elapsed: 120 seconds
    pub fn quick() -> Self {
        Self {
            max_iterations: 4,
            max_tokens: 50_000,
            max_elapsed_secs: Some(120),
        }
    }

    /// Get the elapsed ceiling as Duration
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be greater than 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.max_elapsed_secs == Some(0) {
            return Err("max_elapsed_secs must be greater than 0 when set".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Thresholds used by the decision engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Evidence items required before completion, at minimum
    /// Default: 6
    pub base_min_evidence: usize,

    /// Source ceiling the evidence target is derived from
    /// Default: 16
    pub max_sources: usize,

    /// Distinct evidence categories required before completion
    /// Default: 2
    pub min_categories: usize,

    /// Targeted searches per context before giving up on it
    /// Default: 2
    pub max_context_attempts: u32,

    /// Entity terms appended to generated queries
    /// Default: 3
    pub max_entity_terms: usize,

    /// Upstream-suggested queries consumed per action
    /// Default: 2
    pub suggested_per_action: usize,

    /// Skip upstream-suggested queries so runs replay identically
    /// Default: false
    pub deterministic: bool,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            base_min_evidence: 6,
            max_sources: 16,
            min_categories: 2,
            max_context_attempts: 2,
            max_entity_terms: 3,
            suggested_per_action: 2,
            deterministic: false,
        }
    }
}

impl DecisionConfig {
    /// Default thresholds with suggested queries skipped
    pub fn deterministic() -> Self {
        Self {
            deterministic: true,
            ..Self::default()
        }
    }

    /// Evidence required for completion with `contexts` contexts
    ///
    /// `max(base_min, min(contexts × 3, 0.75 × max_sources))`, rounded up.
    pub fn required_evidence(&self, contexts: usize) -> usize {
        let per_context = (contexts * 3) as f64;
        let ceiling = 0.75 * self.max_sources as f64;
        (self.base_min_evidence as f64).max(per_context.min(ceiling)).ceil() as usize
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sources == 0 {
            return Err("max_sources must be greater than 0".to_string());
        }
        if self.max_context_attempts == 0 {
            return Err("max_context_attempts must be greater than 0".to_string());
        }
        if self.suggested_per_action == 0 {
            return Err("suggested_per_action must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Timeouts and widths for the orchestrator's external calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Timeout per search query (in seconds)
    pub search_timeout_secs: u64,

    /// Timeout per page fetch (in seconds)
    pub fetch_timeout_secs: u64,

    /// Timeout per reliability lookup (in seconds)
    pub reliability_timeout_secs: u64,

    /// Timeout for relevance scoring and context refinement (in seconds)
    pub assessment_timeout_secs: u64,

    /// Results requested per query
    pub max_results_per_query: usize,

    /// New sources fetched per iteration
    pub max_sources_per_iteration: usize,

    /// Concurrent page fetches
    pub fetch_concurrency: usize,

    /// Search results scoring below this are dropped (0.0-1.0)
    pub relevance_threshold: f64,

    /// Run context refinement every N iterations (0 disables)
    pub refine_every: u32,

    /// Retry policy for search, relevance and refinement calls
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 20,
            fetch_timeout_secs: 30,
            reliability_timeout_secs: 5,
            assessment_timeout_secs: 60,
            max_results_per_query: 8,
            max_sources_per_iteration: 6,
            fetch_concurrency: 4,
            relevance_threshold: 0.4,
            refine_every: 3,
            retry: RetryPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Get search timeout as Duration
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Get reliability timeout as Duration
    pub fn reliability_timeout(&self) -> Duration {
        Duration::from_secs(self.reliability_timeout_secs)
    }

    /// Get assessment timeout as Duration
    pub fn assessment_timeout(&self) -> Duration {
        Duration::from_secs(self.assessment_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.search_timeout_secs == 0
            || self.fetch_timeout_secs == 0
            || self.reliability_timeout_secs == 0
            || self.assessment_timeout_secs == 0
        {
            return Err("timeouts must be greater than 0".to_string());
        }
        if self.max_results_per_query == 0 || self.max_sources_per_iteration == 0 {
            return Err("result and source limits must be greater than 0".to_string());
        }
        if self.fetch_concurrency == 0 {
            return Err("fetch_concurrency must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err("relevance_threshold must be between 0.0 and 1.0".to_string());
        }
        self.retry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        let config = BudgetConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_tokens, 200_000);
        assert_eq!(config.max_elapsed(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_budget_presets() {
        let quick = BudgetConfig::quick();
        assert!(quick.max_iterations < BudgetConfig::default().max_iterations);
        assert_eq!(quick.max_elapsed(), Some(Duration::from_secs(120)));
        assert!(BudgetConfig::thorough().max_tokens > BudgetConfig::default().max_tokens);
    }

    #[test]
    fn test_invalid_budget() {
        let config = BudgetConfig {
            max_iterations: 0,
            ..BudgetConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_budget_toml_round_trip() {
        let config = BudgetConfig::quick();
        let toml_str = config.to_toml().unwrap();
        let parsed = BudgetConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_required_evidence() {
        let config = DecisionConfig::default();
        // Base minimum dominates for few contexts
        assert_eq!(config.required_evidence(1), 6);
        assert_eq!(config.required_evidence(3), 9);
        // Capped at 0.75 × max_sources
        assert_eq!(config.required_evidence(10), 12);

        let small = DecisionConfig {
            base_min_evidence: 2,
            max_sources: 5,
            ..DecisionConfig::default()
        };
        // 0.75 × 5 = 3.75, rounded up
        assert_eq!(small.required_evidence(4), 4);
    }

    #[test]
    fn test_deterministic_preset() {
        assert!(DecisionConfig::deterministic().deterministic);
        assert!(!DecisionConfig::default().deterministic);
    }

    #[test]
    fn test_orchestrator_durations() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search_timeout(), Duration::from_secs(20));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = OrchestratorConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: OrchestratorConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
