//! Calibration constants

use serde::{Deserialize, Serialize};
use std::time::Duration;
use veracity_llm::RetryPolicy;

/// Lower cut points of the seven-band truth scale
///
/// Each field is the smallest percentage that still falls in the band.
/// Anything below `mostly_false_min` is FALSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandScale {
    /// TRUE from here up
    pub true_min: f64,
    /// MOSTLY-TRUE from here up
    pub mostly_true_min: f64,
    /// LEANING-TRUE from here up
    pub leaning_true_min: f64,
    /// MIXED / UNVERIFIED from here up
    pub mixed_min: f64,
    /// LEANING-FALSE from here up
    pub leaning_false_min: f64,
    /// MOSTLY-FALSE from here up
    pub mostly_false_min: f64,
}

impl Default for BandScale {
    fn default() -> Self {
        Self {
            true_min: 86.0,
            mostly_true_min: 72.0,
            leaning_true_min: 58.0,
            mixed_min: 43.0,
            leaning_false_min: 29.0,
            mostly_false_min: 15.0,
        }
    }
}

impl BandScale {
    /// Cut points from highest to lowest
    pub fn cut_points(&self) -> [f64; 6] {
        [
            self.true_min,
            self.mostly_true_min,
            self.leaning_true_min,
            self.mixed_min,
            self.leaning_false_min,
            self.mostly_false_min,
        ]
    }

    /// Cut points must lie in (0, 100] and be strictly descending
    pub fn validate(&self) -> Result<(), String> {
        let cuts = self.cut_points();
        if cuts.iter().any(|c| !c.is_finite() || *c <= 0.0 || *c > 100.0) {
            return Err("band cut points must be in (0, 100]".to_string());
        }
        if cuts.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err("band cut points must be strictly descending".to_string());
        }
        Ok(())
    }

    /// Inclusive range of the LEANING-TRUE band
    pub fn leaning_true_range(&self) -> (f64, f64) {
        (self.leaning_true_min, self.mostly_true_min - 1.0)
    }

    /// Inclusive range of the LEANING-FALSE band
    pub fn leaning_false_range(&self) -> (f64, f64) {
        (self.leaning_false_min, self.mixed_min - 1.0)
    }
}

/// Requirements for one confidence tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    /// Distinct cited sources
    pub min_sources: usize,
    /// Average effective source reliability (0.0-1.0)
    pub min_quality: f64,
    /// Share of directional evidence agreeing with the verdict (0.0-1.0)
    pub min_agreement: f64,
}

/// Configuration for verdict calibration and aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Seven-band scale
    pub bands: BandScale,

    /// In the middle band, confidence at or above this is MIXED, below is UNVERIFIED
    pub mixed_confidence_threshold: f64,

    /// Divergence between holistic and claims average that triggers anchoring
    pub anchoring_threshold: f64,

    /// Weight of the claims average in an anchored score (0.0-1.0)
    pub anchoring_weight: f64,

    /// Effective reliability of a source without a score (0.0-1.0)
    pub unknown_source_weight: f64,

    /// Confidence points removed when every cited source is unknown
    pub unknown_confidence_penalty: f64,

    /// Invert verdicts that disagree with their evidence
    pub auto_correct_direction: bool,

    /// HIGH tier requirements
    pub high_tier: TierThreshold,

    /// MEDIUM tier requirements
    pub medium_tier: TierThreshold,

    /// Points added to middle-band claims in a context leaning true
    pub ambiguous_boost_points: f64,

    /// Counter-claims contribute `100 - truth` to averages
    pub invert_counter_claims: bool,

    /// Timeout for the direction validation call (seconds)
    pub direction_timeout_secs: u64,

    /// Retry policy for the direction validation call
    pub direction_retry: RetryPolicy,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            bands: BandScale::default(),
            mixed_confidence_threshold: 60.0,
            anchoring_threshold: 15.0,
            anchoring_weight: 0.6,
            unknown_source_weight: 0.5,
            unknown_confidence_penalty: 20.0,
            auto_correct_direction: true,
            high_tier: TierThreshold {
                min_sources: 3,
                min_quality: 0.7,
                min_agreement: 0.8,
            },
            medium_tier: TierThreshold {
                min_sources: 2,
                min_quality: 0.5,
                min_agreement: 0.6,
            },
            ambiguous_boost_points: 5.0,
            invert_counter_claims: true,
            direction_timeout_secs: 60,
            direction_retry: RetryPolicy::default(),
        }
    }
}

impl CalibrationConfig {
    /// Strict preset: anchor earlier and harder, demand more for MIXED
    pub fn strict() -> Self {
        Self {
            mixed_confidence_threshold: 70.0,
            anchoring_threshold: 10.0,
            anchoring_weight: 0.75,
            unknown_source_weight: 0.4,
            unknown_confidence_penalty: 30.0,
            ambiguous_boost_points: 0.0,
            ..Self::default()
        }
    }

    /// Lenient preset: trust holistic scores more
    pub fn lenient() -> Self {
        Self {
            mixed_confidence_threshold: 50.0,
            anchoring_threshold: 25.0,
            anchoring_weight: 0.4,
            unknown_source_weight: 0.6,
            unknown_confidence_penalty: 10.0,
            ..Self::default()
        }
    }

    /// Get the direction validation timeout as a Duration
    pub fn direction_timeout(&self) -> Duration {
        Duration::from_secs(self.direction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.bands.validate()?;
        if !(0.0..=100.0).contains(&self.mixed_confidence_threshold) {
            return Err("mixed_confidence_threshold must be in [0, 100]".to_string());
        }
        if !(self.anchoring_threshold >= 0.0 && self.anchoring_threshold <= 100.0) {
            return Err("anchoring_threshold must be in [0, 100]".to_string());
        }
        if !(0.0..=1.0).contains(&self.anchoring_weight) {
            return Err("anchoring_weight must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.unknown_source_weight) {
            return Err("unknown_source_weight must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=100.0).contains(&self.unknown_confidence_penalty) {
            return Err("unknown_confidence_penalty must be in [0, 100]".to_string());
        }
        if !(0.0..=100.0).contains(&self.ambiguous_boost_points) {
            return Err("ambiguous_boost_points must be in [0, 100]".to_string());
        }
        for (name, tier) in [("high_tier", &self.high_tier), ("medium_tier", &self.medium_tier)] {
            if !(0.0..=1.0).contains(&tier.min_quality) || !(0.0..=1.0).contains(&tier.min_agreement) {
                return Err(format!("{} thresholds must be between 0.0 and 1.0", name));
            }
        }
        if self.high_tier.min_sources < self.medium_tier.min_sources {
            return Err("high_tier.min_sources must not be below medium_tier.min_sources".to_string());
        }
        if self.direction_timeout_secs == 0 {
            return Err("direction_timeout_secs must be greater than 0".to_string());
        }
        self.direction_retry.validate()
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
