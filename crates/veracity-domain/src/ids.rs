//! Stable opaque identifiers for contexts, claims, evidence and sources
//!
//! Upstream-supplied identifiers (e.g. `"C1"`) are kept verbatim. Identifiers
//! created by the engine are UUIDv7 strings, so they sort chronologically.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh UUIDv7-based identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            /// Wrap an existing identifier string
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Identifier of an [`AnalysisContext`](crate::AnalysisContext)
    ContextId
);
opaque_id!(
    /// Identifier of a [`Claim`](crate::Claim)
    ClaimId
);
opaque_id!(
    /// Identifier of an [`EvidenceItem`](crate::EvidenceItem)
    EvidenceId
);
opaque_id!(
    /// Identifier of a [`FetchedSource`](crate::FetchedSource)
    SourceId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuid_strings() {
        let id = EvidenceId::generate();
        // UUID strings are 36 characters (8-4-4-4-12 with hyphens)
        assert_eq!(id.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_generated_ids_are_chronological() {
        let first = ClaimId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = ClaimId::generate();
        assert!(first < second, "Earlier UUIDv7 should sort before later UUIDv7");
    }

    #[test]
    fn test_upstream_ids_kept_verbatim() {
        let id = ClaimId::from("C1");
        assert_eq!(id.to_string(), "C1");
        assert_eq!(id, ClaimId::new("C1".to_string()));
    }

    #[test]
    fn test_serde_transparent() {
        let id = ContextId::from("CTX_A");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CTX_A\"");
        let back: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: id ordering matches the ordering of the wrapped strings
        #[test]
        fn test_id_ordering_property(a in "[A-Za-z0-9_]{1,12}", b in "[A-Za-z0-9_]{1,12}") {
            let id_a = SourceId::from(a.as_str());
            let id_b = SourceId::from(b.as_str());
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }
    }
}
