//! Deduplicator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use veracity_llm::RetryPolicy;

/// Configuration for evidence and URL deduplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Statement similarity at or above which two items are duplicates (0.0-1.0)
    pub similarity_threshold: f64,

    /// Maximum pairs per similarity call
    pub batch_size: usize,

    /// Query parameters always stripped from URLs
    pub tracking_params: Vec<String>,

    /// Query parameter prefixes stripped from URLs
    pub tracking_prefixes: Vec<String>,

    /// Retry policy for the similarity capability
    pub retry: RetryPolicy,

    /// Timeout for one similarity call (seconds)
    pub timeout_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            batch_size: 32,
            tracking_params: [
                "fbclid", "gclid", "dclid", "msclkid", "yclid", "igshid", "mc_cid", "mc_eid", "ref", "ref_src", "_ga",
                "_gl",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            tracking_prefixes: vec!["utm_".to_string()],
            retry: RetryPolicy::default(),
            timeout_secs: 30,
        }
    }
}

impl DedupConfig {
    /// Strict preset: lower threshold, catches looser paraphrases
    pub fn strict() -> Self {
        Self {
            similarity_threshold: 0.80,
            ..Self::default()
        }
    }

    /// Permissive preset: only near-verbatim statements collapse
    pub fn permissive() -> Self {
        Self {
            similarity_threshold: 0.95,
            retry: RetryPolicy::none(),
            ..Self::default()
        }
    }

    /// Similarity call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        self.retry.validate()
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
