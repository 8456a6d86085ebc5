//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;
use veracity_llm::RetryPolicy;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sources extracted concurrently per window at the start of a run
    pub initial_concurrency: usize,

    /// Maximum time for a single extraction call (seconds)
    pub extraction_timeout_secs: u64,

    /// Source text passed to extraction is cut to this many characters
    pub max_source_chars: usize,

    /// Retry policy for extraction calls (throttling is never retried)
    pub retry: RetryPolicy,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Retry policy as applied: throttling is left to the width ratchet
    pub fn effective_retry(&self) -> RetryPolicy {
        self.retry.clone().without_throttle_retry()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_concurrency == 0 {
            return Err("initial_concurrency must be greater than 0".to_string());
        }
        if self.max_source_chars == 0 {
            return Err("max_source_chars must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        self.retry.validate()
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            initial_concurrency: 3,
            extraction_timeout_secs: 120,
            max_source_chars: 50_000,
            retry: RetryPolicy::default().without_throttle_retry(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: wider windows, shorter timeouts, less text per source
    pub fn aggressive() -> Self {
        Self {
            initial_concurrency: 5,
            extraction_timeout_secs: 60,
            max_source_chars: 20_000,
            retry: RetryPolicy::none(),
        }
    }

    /// Lenient preset: narrow windows, longer timeouts, more text per source
    pub fn lenient() -> Self {
        Self {
            initial_concurrency: 2,
            extraction_timeout_secs: 300,
            max_source_chars: 100_000,
            retry: RetryPolicy::default().without_throttle_retry(),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_concurrency, 3);
    }

    #[test]
    fn test_aggressive_config_is_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_lenient_config_is_valid() {
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut config = ExtractorConfig::default();
        config.initial_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_throttle_retry_always_disabled() {
        let mut config = ExtractorConfig::default();
        config.retry.retry_throttled = true;
        assert!(!config.effective_retry().retry_throttled);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.initial_concurrency, parsed.initial_concurrency);
        assert_eq!(config.max_source_chars, parsed.max_source_chars);
        assert_eq!(config.extraction_timeout_secs, parsed.extraction_timeout_secs);
    }
}
