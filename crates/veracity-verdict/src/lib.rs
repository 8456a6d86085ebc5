//! Veracity Verdict
//!
//! Corrects raw per-claim verdicts and aggregates them into context and
//! article scores.
//!
//! The calibrator provides:
//! - Evidence weighting by source reliability
//! - Semantic direction validation with bounded auto-correction
//! - Confidence-tier gating and publishability
//! - Dependency exclusion, weighted averaging and anchoring of holistic scores
//! - The seven-band rating scale
//!
//! # Examples
//!
//! ```
//! use veracity_domain::RatingBand;
//! use veracity_verdict::{anchor, rate, CalibrationConfig};
//!
//! let config = CalibrationConfig::default();
//! assert_eq!(rate(55.0, 80.0, &config), RatingBand::Mixed);
//! assert_eq!(rate(55.0, 40.0, &config), RatingBand::Unverified);
//!
//! // A holistic 90 against a claims average of 40 is pulled to 60
//! assert_eq!(anchor(90.0, 40.0, &config), (60.0, true));
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod band;
pub mod direction;
pub mod gating;
pub mod weighting;

mod calibrator;
mod config;
mod error;

#[cfg(test)]
mod tests;

pub use aggregate::{anchor, weighted_average, WeightedAverage};
pub use band::rate;
pub use calibrator::{CalibratedVerdicts, VerdictCalibrator};
pub use config::{BandScale, CalibrationConfig, TierThreshold};
pub use error::VerdictError;
