//! Budget tracking for research runs
//!
//! The tracker only signals: once a ceiling is reached it raises a sticky
//! exceeded flag, and the orchestrator checks that flag at iteration
//! boundaries. Nothing is cancelled mid-batch.

use crate::config::BudgetConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Counters for one research run
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    config: BudgetConfig,
    iterations: u32,
    iterations_by_tag: BTreeMap<String, u32>,
    llm_calls: u32,
    tokens_used: u64,
    started: Instant,
    exceeded: Option<String>,
}

impl BudgetTracker {
    /// Start tracking against `config`
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            iterations: 0,
            iterations_by_tag: BTreeMap::new(),
            llm_calls: 0,
            tokens_used: 0,
            started: Instant::now(),
            exceeded: None,
        }
    }

    /// Get the ceilings
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Record one search iteration under `tag`
    pub fn record_iteration(&mut self, tag: &str) {
        self.iterations += 1;
        *self.iterations_by_tag.entry(tag.to_string()).or_insert(0) += 1;
        if self.iterations >= self.config.max_iterations {
            self.mark_exceeded(format!("max iterations reached ({})", self.config.max_iterations));
        }
    }

    /// Record one LLM call and the tokens it used
    pub fn record_llm_call(&mut self, tokens: u64) {
        self.llm_calls += 1;
        self.tokens_used = self.tokens_used.saturating_add(tokens);
        self.check_token_budget();
    }

    /// Check the token ceiling; returns whether the budget is exceeded
    pub fn check_token_budget(&mut self) -> bool {
        if self.tokens_used >= self.config.max_tokens {
            self.mark_exceeded(format!(
                "token budget exhausted ({} of {})",
                self.tokens_used, self.config.max_tokens
            ));
        }
        self.is_exceeded()
    }

    /// Check the wall-clock ceiling; returns whether the budget is exceeded
    pub fn check_elapsed(&mut self) -> bool {
        if let Some(limit) = self.config.max_elapsed() {
            if self.elapsed() >= limit {
                self.mark_exceeded(format!("time budget exhausted ({}s)", limit.as_secs()));
            }
        }
        self.is_exceeded()
    }

    /// Raise the exceeded flag; the first reason is kept
    pub fn mark_exceeded(&mut self, reason: impl Into<String>) {
        if self.exceeded.is_none() {
            let reason = reason.into();
            tracing::warn!("Research budget exceeded: {}", reason);
            self.exceeded = Some(reason);
        }
    }

    /// Whether any ceiling was reached
    pub fn is_exceeded(&self) -> bool {
        self.exceeded.is_some()
    }

    /// Why the budget was exceeded
    pub fn exceeded_reason(&self) -> Option<&str> {
        self.exceeded.as_deref()
    }

    /// Iterations recorded so far
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Tokens recorded so far
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    /// Time since tracking started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> BudgetStats {
        BudgetStats {
            iterations: self.iterations,
            iterations_by_tag: self.iterations_by_tag.clone(),
            llm_calls: self.llm_calls,
            tokens_used: self.tokens_used,
            elapsed_ms: self.elapsed().as_millis() as u64,
            max_iterations: self.config.max_iterations,
            max_tokens: self.config.max_tokens,
            exceeded: self.is_exceeded(),
            exceeded_reason: self.exceeded.clone(),
        }
    }
}

/// Serializable snapshot of a [`BudgetTracker`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetStats {
    /// Search iterations run
    pub iterations: u32,

    /// Iterations per rule tag
    pub iterations_by_tag: BTreeMap<String, u32>,

    /// LLM calls recorded
    pub llm_calls: u32,

    /// Tokens recorded
    pub tokens_used: u64,

    /// Elapsed time (milliseconds)
    pub elapsed_ms: u64,

    /// Iteration ceiling
    pub max_iterations: u32,

    /// Token ceiling
    pub max_tokens: u64,

    /// Whether a ceiling was reached
    pub exceeded: bool,

    /// First reason a ceiling was reached
    pub exceeded_reason: Option<String>,
}

impl BudgetStats {
    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Research Budget Summary".to_string(),
            "=======================".to_string(),
            format!("Iterations: {}/{}", self.iterations, self.max_iterations),
            format!("LLM calls: {}", self.llm_calls),
            format!("Tokens: {}/{}", self.tokens_used, self.max_tokens),
            format!("Elapsed: {}ms", self.elapsed_ms),
        ];

        if !self.iterations_by_tag.is_empty() {
            lines.push(String::new());
            lines.push("Iterations by rule:".to_string());
            for (tag, count) in &self.iterations_by_tag {
                lines.push(format!("  {}: {}", tag, count));
            }
        }

        if let Some(reason) = &self.exceeded_reason {
            lines.push(String::new());
            lines.push(format!("Budget exceeded: {}", reason));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(max_iterations: u32, max_tokens: u64) -> BudgetTracker {
        BudgetTracker::new(BudgetConfig {
            max_iterations,
            max_tokens,
            max_elapsed_secs: None,
        })
    }

    #[test]
    fn test_iteration_ceiling() {
        let mut budget = tracker(3, 1_000);
        budget.record_iteration("contradiction");
        budget.record_iteration("contradiction");
        assert!(!budget.is_exceeded());

        budget.record_iteration("generic_evidence");
        assert!(budget.is_exceeded());
        assert_eq!(budget.exceeded_reason(), Some("max iterations reached (3)"));
    }

    #[test]
    fn test_token_ceiling() {
        let mut budget = tracker(10, 500);
        budget.record_llm_call(300);
        assert!(!budget.check_token_budget());
        budget.record_llm_call(250);
        assert!(budget.check_token_budget());
        assert_eq!(budget.tokens_used(), 550);
    }

    #[test]
    fn test_first_reason_is_sticky() {
        let mut budget = tracker(1, 100);
        budget.record_llm_call(100);
        budget.record_iteration("x");
        budget.mark_exceeded("manual stop");
        assert_eq!(budget.exceeded_reason(), Some("token budget exhausted (100 of 100)"));
    }

    #[test]
    fn test_elapsed_ceiling_unset() {
        let mut budget = tracker(10, 100);
        assert!(!budget.check_elapsed());
    }

    #[test]
    fn test_stats() {
        let mut budget = tracker(5, 1_000);
        budget.record_iteration("context_coverage");
        budget.record_iteration("context_coverage");
        budget.record_iteration("contradiction");
        budget.record_llm_call(120);

        let stats = budget.stats();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.iterations_by_tag.get("context_coverage"), Some(&2));
        assert_eq!(stats.llm_calls, 1);
        assert_eq!(stats.tokens_used, 120);
        assert!(!stats.exceeded);

        let summary = stats.summary();
        assert!(summary.contains("Iterations: 3/5"));
        assert!(summary.contains("context_coverage: 2"));
    }

    #[test]
    fn test_counters_are_monotonic() {
        let mut budget = tracker(100, u64::MAX);
        let mut last = 0;
        for _ in 0..20 {
            budget.record_iteration("x");
            budget.record_llm_call(u64::MAX / 4);
            assert!(budget.iterations() > last);
            last = budget.iterations();
        }
        assert_eq!(budget.tokens_used(), u64::MAX);
    }
}
