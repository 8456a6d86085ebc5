//! Output formatting for the CLI.

use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use colored::*;
use serde_json::json;
use std::collections::HashMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use veracity_domain::RatingBand;
use veracity_research::AnalysisReport;

const MAX_TEXT_WIDTH: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a full analysis report.
    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_table(&self, report: &AnalysisReport) -> String {
        let summary = &report.summary;
        let mut sections = vec![
            format!("Thesis: {}", report.thesis),
            format!(
                "Verdict: {} ({:.1}%, confidence {:.1})",
                self.band(summary.rating),
                summary.truth_percentage,
                summary.confidence
            ),
        ];

        if report.claim_verdicts.is_empty() {
            sections.push(self.colorize("No claims analysed.", "yellow"));
        } else {
            let texts: HashMap<_, _> = report.claims.iter().map(|c| (&c.id, c.text.as_str())).collect();
            let mut builder = Builder::default();
            builder.push_record(["Claim", "Text", "Truth", "Confidence", "Rating", "Weight"]);
            for verdict in &report.claim_verdicts {
                let text = texts.get(&verdict.claim_id).copied().unwrap_or_default();
                builder.push_record([
                    verdict.claim_id.to_string(),
                    truncate(text, MAX_TEXT_WIDTH),
                    format!("{:.1}", verdict.truth_percentage),
                    format!("{:.1}", verdict.confidence),
                    self.band(verdict.rating),
                    format!("{:.2}", verdict.evidence_weight),
                ]);
            }
            sections.push(table(builder));
        }

        if !report.context_answers.is_empty() {
            let names: HashMap<_, _> = report.contexts.iter().map(|c| (&c.id, c.name.as_str())).collect();
            let mut builder = Builder::default();
            builder.push_record(["Context", "Name", "Truth", "Confidence", "Rating", "Anchored"]);
            for answer in &report.context_answers {
                builder.push_record([
                    answer.context_id.to_string(),
                    truncate(names.get(&answer.context_id).copied().unwrap_or_default(), MAX_TEXT_WIDTH),
                    format!("{:.1}", answer.truth_percentage),
                    format!("{:.1}", answer.confidence),
                    self.band(answer.rating),
                    if answer.anchored { "yes" } else { "no" }.to_string(),
                ]);
            }
            sections.push(table(builder));
        }

        sections.push(format!(
            "Evidence: {} items from {} sources, {} queries",
            report.evidence.len(),
            report.sources.len(),
            report.queries_run.len()
        ));
        sections.push(format!(
            "Budget: {}/{} iterations, {} tokens",
            report.budget.iterations, report.budget.max_iterations, report.budget.tokens_used
        ));
        if let Some(reason) = &report.budget_reason {
            sections.push(self.warning(&format!("Budget exhausted: {}", reason)));
        }

        for warning in &report.warnings {
            sections.push(self.warning(&warning.message));
        }
        for fallback in &report.fallbacks {
            sections.push(self.info(&format!(
                "Fallback at {}: {} ({})",
                fallback.stage, fallback.default_used, fallback.reason
            )));
        }

        if report.integrity.degraded {
            sections.push(self.warning(&format!(
                "Degraded report: {} of {} claims defaulted, {} fallbacks",
                report.integrity.defaulted_claims, report.integrity.total_claims, report.integrity.fallback_count
            )));
        } else {
            sections.push(self.success("Report complete"));
        }

        sections.join("\n")
    }

    /// Format a single band rating.
    pub fn format_rating(&self, truth_percentage: f64, confidence: f64, rating: RatingBand) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "truth_percentage": truth_percentage,
                "confidence": confidence,
                "rating": rating,
            }))?),
            OutputFormat::Table => Ok(format!(
                "{} ({:.1}%, confidence {:.1})",
                self.band(rating),
                truth_percentage,
                confidence
            )),
        }
    }

    /// Format the configuration.
    pub fn format_config(&self, config: &Config) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            OutputFormat::Table => config.to_toml(),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn band(&self, rating: RatingBand) -> String {
        let color = match rating {
            RatingBand::True | RatingBand::MostlyTrue => "green",
            RatingBand::LeaningTrue => "cyan",
            RatingBand::Mixed | RatingBand::Unverified => "yellow",
            RatingBand::LeaningFalse => "magenta",
            RatingBand::MostlyFalse | RatingBand::False => "red",
        };
        self.colorize(rating.label(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

/// Parse a truth percentage or confidence argument.
pub fn parse_percentage(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(CliError::InvalidInput(format!("{} must be between 0 and 100, got {}", name, value)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_rating(72.0, 80.0, RatingBand::MostlyTrue).unwrap();
        assert_eq!(output, "MOSTLY-TRUE (72.0%, confidence 80.0)");
    }

    #[test]
    fn test_rating_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_rating(50.0, 10.0, RatingBand::Unverified).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["rating"], "UNVERIFIED");
        assert_eq!(value["confidence"], 10.0);
    }

    #[test]
    fn test_config_table_is_toml() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_config(&Config::default()).unwrap();
        assert!(output.contains("[budget]"));
        assert!(output.contains("[calibration]"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 5), "ééééé");
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("percentage", 55.5).unwrap(), 55.5);
        assert!(parse_percentage("percentage", 100.1).is_err());
        assert!(parse_percentage("confidence", -1.0).is_err());
        assert!(parse_percentage("confidence", f64::NAN).is_err());
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
