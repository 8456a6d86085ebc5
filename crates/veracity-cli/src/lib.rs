//! Veracity CLI library.
//!
//! Command-line access to the engine: replaying recorded fixtures through
//! the full research and verdict pipeline, rating percentages on the band
//! scale, and managing the TOML configuration.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fixture;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use fixture::Fixture;
pub use output::Formatter;
