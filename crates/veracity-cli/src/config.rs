//! Configuration management for the CLI.
//!
//! One TOML file carries the output settings plus a section per engine
//! component. Missing sections and keys fall back to component defaults.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use veracity_dedup::DedupConfig;
use veracity_extractor::ExtractorConfig;
use veracity_research::{BudgetConfig, DecisionConfig, OrchestratorConfig};
use veracity_verdict::CalibrationConfig;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub settings: Settings,

    /// Research budget
    pub budget: BudgetConfig,

    /// Decision rule tuning
    pub decision: DecisionConfig,

    /// Research loop timeouts and fan-out
    pub orchestrator: OrchestratorConfig,

    /// Evidence extraction
    pub extractor: ExtractorConfig,

    /// Evidence deduplication
    pub dedup: DedupConfig,

    /// Verdict calibration
    pub calibration: CalibrationConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".veracity").join("config.toml"))
    }

    /// Load from `path`, or from the default path when none is given.
    ///
    /// A missing file yields the defaults. The loaded configuration is
    /// validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section, naming the section that failed.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("budget", self.budget.validate()),
            ("decision", self.decision.validate()),
            ("orchestrator", self.orchestrator.validate()),
            ("extractor", self.extractor.validate()),
            ("dedup", self.dedup.validate()),
            ("calibration", self.calibration.validate()),
        ];

        for (section, result) in checks {
            result.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
