//! Fixture replay through the command layer

use std::path::PathBuf;
use veracity_cli::cli::RunArgs;
use veracity_cli::config::OutputFormat;
use veracity_cli::{commands, Config, Formatter};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/permit.json")
}

fn config() -> Config {
    let mut config = Config::default();
    config.budget.max_iterations = 3;
    config.orchestrator.retry = veracity_llm::RetryPolicy::none();
    config
}

#[tokio::test]
async fn test_run_json_report() {
    let args = RunArgs {
        fixture: fixture_path(),
        deterministic: true,
        as_of: None,
    };
    let formatter = Formatter::new(OutputFormat::Json, false);

    let output = commands::execute_run(args, &config(), &formatter).await.unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["thesis"], "The permit was issued lawfully");
    assert_eq!(report["claim_verdicts"].as_array().unwrap().len(), 2);
    assert_eq!(report["evidence"].as_array().unwrap().len(), 1);
    assert_eq!(report["budget"]["max_iterations"], 3);
    let truth = report["summary"]["truth_percentage"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&truth));
}

#[tokio::test]
async fn test_run_table_report() {
    let args = RunArgs {
        fixture: fixture_path(),
        deterministic: true,
        as_of: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
    };
    let formatter = Formatter::new(OutputFormat::Table, false);

    let output = commands::execute_run(args, &config(), &formatter).await.unwrap();

    assert!(output.starts_with("Thesis: The permit was issued lawfully"));
    assert!(output.contains("The permit was issued"));
    assert!(output.contains("CTX_A"));
    assert!(output.contains("Evidence: 1 items from 1 sources"));
}
