//! Command implementations.
//!
//! Each command returns its rendered output; printing is left to `main`.

use crate::cli::{ConfigArgs, RateArgs, RunArgs};
use crate::config::Config;
use crate::error::Result;
use crate::fixture::Fixture;
use crate::output::{parse_percentage, Formatter};
use chrono::Utc;
use std::path::Path;
use tracing::info;
use veracity_verdict::rate;

/// Replay a fixture through research, verdict generation and calibration.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let fixture = Fixture::load(&args.fixture)?;

    let mut config = config.clone();
    if args.deterministic {
        config.decision.deterministic = true;
    }
    let as_of = args
        .as_of
        .or(fixture.as_of)
        .unwrap_or_else(|| Utc::now().date_naive());

    info!(
        "Replaying {} ({} claims, as of {})",
        args.fixture.display(),
        fixture.understanding.claims.len(),
        as_of
    );

    let pipeline = fixture.pipeline(&config)?;
    let report = pipeline.run(fixture.understanding, as_of).await?;
    formatter.format_report(&report)
}

/// Rate a truth percentage on the configured band scale.
pub fn execute_rate(args: RateArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let percentage = parse_percentage("percentage", args.percentage)?;
    let confidence = parse_percentage("confidence", args.confidence)?;
    let band = rate(percentage, confidence, &config.calibration);
    formatter.format_rating(percentage, confidence, band)
}

/// Show the effective configuration, print its path, or write the defaults.
pub fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<String> {
    if args.path {
        return Ok(path.display().to_string());
    }

    if args.init {
        if path.exists() {
            return Ok(formatter.warning(&format!("Config already exists at {}", path.display())));
        }
        Config::default().save_to(path)?;
        return Ok(formatter.success(&format!("Wrote default config to {}", path.display())));
    }

    formatter.format_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::fs;
    use tempfile::TempDir;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Table, false)
    }

    #[test]
    fn test_rate_uses_band_scale() {
        let args = RateArgs {
            percentage: 90.0,
            confidence: 100.0,
        };
        let output = execute_rate(args, &Config::default(), &formatter()).unwrap();
        assert!(output.starts_with("TRUE"));
    }

    #[test]
    fn test_rate_rejects_out_of_range() {
        let args = RateArgs {
            percentage: 120.0,
            confidence: 100.0,
        };
        assert!(execute_rate(args, &Config::default(), &formatter()).is_err());
    }

    #[test]
    fn test_config_init_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let init = || ConfigArgs { init: true, path: false };

        let first = execute_config(init(), &Config::default(), &path, &formatter()).unwrap();
        assert!(first.starts_with("✓"));
        assert!(path.exists());

        fs::write(&path, "[settings]\ncolor = false\n").unwrap();
        let second = execute_config(init(), &Config::default(), &path, &formatter()).unwrap();
        assert!(second.starts_with("⚠"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[settings]\ncolor = false\n");
    }

    #[test]
    fn test_config_path() {
        let path = Path::new("/tmp/veracity/config.toml");
        let args = ConfigArgs { init: false, path: true };
        let output = execute_config(args, &Config::default(), path, &formatter()).unwrap();
        assert_eq!(output, "/tmp/veracity/config.toml");
    }

    #[tokio::test]
    async fn test_run_missing_fixture() {
        let args = RunArgs {
            fixture: "/nonexistent/fixture.json".into(),
            deterministic: true,
            as_of: None,
        };
        let result = execute_run(args, &Config::default(), &formatter()).await;
        assert!(matches!(result, Err(crate::error::CliError::Fixture(_))));
    }
}
