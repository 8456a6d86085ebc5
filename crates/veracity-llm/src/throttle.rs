//! Throttling-signature classification
//!
//! Providers report throttling inconsistently: some return a dedicated
//! status, others bury "429" or "rate limit" in a generic error message.
//! Everything that looks like throttling is normalised to
//! [`CapabilityError::Throttled`].

use regex::Regex;
use std::sync::LazyLock;
use veracity_domain::CapabilityError;

static THROTTLE_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(429|503)\b|rate[\s_-]?limit|too many requests|quota exceeded")
        .expect("throttle signature is a valid regex")
});

/// Whether a message carries a throttling signature
pub fn matches_signature(message: &str) -> bool {
    THROTTLE_SIGNATURE.is_match(message)
}

/// Whether the error means the provider is throttling us
pub fn is_throttling(err: &CapabilityError) -> bool {
    match err {
        CapabilityError::Throttled(_) => true,
        CapabilityError::Failed(msg) | CapabilityError::Unavailable(msg) => matches_signature(msg),
        _ => false,
    }
}

/// Re-tag generic failures that carry a throttling signature
pub fn classify(err: CapabilityError) -> CapabilityError {
    match err {
        CapabilityError::Failed(msg) | CapabilityError::Unavailable(msg) if matches_signature(&msg) => {
            CapabilityError::Throttled(msg)
        }
        other => other,
    }
}
