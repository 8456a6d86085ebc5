//! Warnings and fallback records surfaced with every report
//!
//! The engine never hides degraded results: each default it substitutes for a
//! failed capability result is recorded here, so consumers can judge report
//! integrity without re-deriving it.

use serde::{Deserialize, Serialize};

/// Class of a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A search query failed
    SearchFailed,
    /// A source could not be fetched
    FetchFailed,
    /// Evidence extraction failed for a source
    ExtractionFailed,
    /// Verdict polarity disagreed with its evidence
    DirectionMismatch,
    /// The research budget was exhausted
    BudgetExceeded,
    /// Research completed without meeting coverage targets
    CoverageUnmet,
    /// No evidence was extracted at all
    NoEvidence,
    /// A claim had no verdict and was defaulted
    VerdictDefaulted,
    /// A structural invariant had to be repaired
    InvariantRepaired,
}

/// A warning attached to the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Class
    pub kind: WarningKind,
    /// Human-readable detail
    pub message: String,
}

impl Warning {
    /// Create a warning
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A documented default used in place of a failed capability result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    /// Pipeline stage (e.g. "dedup.similarity", "verdict.direction")
    pub stage: String,
    /// What was used instead
    pub default_used: String,
    /// Why
    pub reason: String,
}

impl FallbackRecord {
    /// Create a fallback record
    pub fn new(stage: impl Into<String>, default_used: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            default_used: default_used.into(),
            reason: reason.into(),
        }
    }
}

/// Aggregate integrity signal derived from warnings and fallbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportIntegrity {
    /// Number of fallbacks applied
    pub fallback_count: usize,
    /// Number of warnings
    pub warning_count: usize,
    /// Claims whose verdict was defaulted
    pub defaulted_claims: usize,
    /// Claims in total
    pub total_claims: usize,
    /// Whether any result was degraded
    pub degraded: bool,
}

impl ReportIntegrity {
    /// Summarise warnings and fallbacks
    pub fn assess(warnings: &[Warning], fallbacks: &[FallbackRecord], total_claims: usize) -> Self {
        let defaulted_claims = warnings
            .iter()
            .filter(|w| w.kind == WarningKind::VerdictDefaulted)
            .count();
        let degraded = !fallbacks.is_empty()
            || defaulted_claims > 0
            || warnings.iter().any(|w| {
                matches!(
                    w.kind,
                    WarningKind::BudgetExceeded | WarningKind::NoEvidence | WarningKind::CoverageUnmet
                )
            });

        Self {
            fallback_count: fallbacks.len(),
            warning_count: warnings.len(),
            defaulted_claims,
            total_claims,
            degraded,
        }
    }

    /// Share of claims with a real (non-defaulted) verdict, in [0, 1]
    pub fn verdict_coverage(&self) -> f64 {
        if self.total_claims == 0 {
            return 1.0;
        }
        1.0 - self.defaulted_claims as f64 / self.total_claims as f64
    }
}
