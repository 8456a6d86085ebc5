//! Verdict error types

use thiserror::Error;

/// Errors that can occur during calibration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerdictError {
    /// A percentage or confidence was NaN or infinite
    #[error("Non-finite value in {field}: {value}")]
    NonFinite {
        /// Where the value was found
        field: String,
        /// The offending value
        value: f64,
    },

    /// Configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
