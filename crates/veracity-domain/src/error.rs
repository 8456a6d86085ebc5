//! Failure type shared by every external capability

use thiserror::Error;

/// Errors returned by external capabilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    /// The call did not finish within its timeout
    #[error("Capability timed out after {0} ms")]
    Timeout(u64),

    /// The provider signalled throttling (429/503, rate limit)
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Structured output could not be parsed
    #[error("Malformed output: {0}")]
    Malformed(String),

    /// Any other provider failure
    #[error("Capability failed: {0}")]
    Failed(String),

    /// The capability is not configured at all
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

impl CapabilityError {
    /// Transient errors may be retried or degraded to a default
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CapabilityError::Timeout(_) | CapabilityError::Throttled(_) | CapabilityError::Malformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CapabilityError::Timeout(100).is_transient());
        assert!(CapabilityError::Throttled("429".into()).is_transient());
        assert!(CapabilityError::Malformed("bad json".into()).is_transient());
        assert!(!CapabilityError::Failed("boom".into()).is_transient());
        assert!(!CapabilityError::Unavailable("search".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = CapabilityError::Timeout(1500);
        assert_eq!(err.to_string(), "Capability timed out after 1500 ms");
    }
}
