//! Recorded capability responses for offline replay.
//!
//! A fixture holds a decomposed input plus everything the external
//! capabilities answered during a run. [`Fixture::pipeline`] wires those
//! answers into scripted capabilities so the engine replays the run
//! without network access.

use crate::config::Config;
use crate::error::{CliError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use veracity_domain::{
    CapabilityError, ClaimId, EvidenceCandidate, EvidencePolarity, ExtractedEvidence, GeneratedVerdicts,
    SearchResult, Understanding,
};
use veracity_llm::{
    MockDirectionValidator, MockExtraction, MockFetcher, MockReliability, MockRelevance, MockSearch, MockSimilarity,
    MockVerdicts,
};
use veracity_research::{AnalysisPipeline, Capabilities, ResearchOrchestrator};
use veracity_verdict::VerdictCalibrator;

/// A recorded run.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    /// Decomposed input
    pub understanding: Understanding,

    /// Reference date of the recording
    #[serde(default)]
    pub as_of: Option<NaiveDate>,

    /// Results for queries containing a term
    #[serde(default)]
    pub searches: Vec<SearchRule>,

    /// Results for every other query
    #[serde(default)]
    pub default_results: Vec<SearchResult>,

    /// Fetchable pages
    #[serde(default)]
    pub pages: Vec<PageRecord>,

    /// Extraction output per source URL
    #[serde(default)]
    pub extractions: Vec<ExtractionRecord>,

    /// Reliability by URL or host
    #[serde(default)]
    pub reliability: HashMap<String, f64>,

    /// Relevance by result URL; unlisted results score 1.0
    #[serde(default)]
    pub relevance: HashMap<String, f64>,

    /// Verdict generation output; absent means generation was unavailable
    #[serde(default)]
    pub verdicts: Option<GeneratedVerdicts>,

    /// Claims whose cited evidence points the other way
    #[serde(default)]
    pub direction_mismatches: Vec<DirectionRecord>,
}

/// Search results returned for any query containing `matches`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRule {
    /// Case-insensitive query term
    #[serde(rename = "match")]
    pub matches: String,

    /// Results to return
    pub results: Vec<SearchResult>,
}

/// A fetched page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRecord {
    /// Page URL
    pub url: String,

    /// Page title
    #[serde(default)]
    pub title: String,

    /// Page text
    pub text: String,
}

/// Candidates extracted from one source.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRecord {
    /// Source URL
    pub url: String,

    /// Extracted candidates
    pub candidates: Vec<EvidenceCandidate>,

    /// Tokens the extraction consumed
    #[serde(default)]
    pub tokens_used: u64,
}

/// A direction disagreement for one claim.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionRecord {
    /// Claim the check is for
    pub claim_id: ClaimId,

    /// Which way the cited evidence points
    pub evidence_polarity: EvidencePolarity,
}

impl Fixture {
    /// Load a fixture from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Fixture(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Parse a fixture from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        if fixture.understanding.thesis.trim().is_empty() {
            return Err(CliError::Fixture("understanding.thesis must not be empty".into()));
        }
        Ok(fixture)
    }

    /// Build a pipeline whose capabilities answer from this fixture.
    pub fn pipeline(&self, config: &Config) -> Result<AnalysisPipeline> {
        let search = MockSearch::new();
        for rule in &self.searches {
            search.add_rule(rule.matches.to_lowercase(), rule.results.clone());
        }
        search.set_default(self.default_results.clone());

        let fetcher = MockFetcher::new();
        for page in &self.pages {
            fetcher.add_page(&page.url, &page.title, &page.text);
        }

        let extraction = MockExtraction::new();
        for record in &self.extractions {
            extraction.add_response(
                &record.url,
                ExtractedEvidence {
                    candidates: record.candidates.clone(),
                    tokens_used: record.tokens_used,
                },
            );
        }

        let reliability = MockReliability::new();
        for (key, score) in &self.reliability {
            reliability.add_score(key, *score);
        }

        let relevance = MockRelevance::new();
        for (url, score) in &self.relevance {
            relevance.add_score(url, *score);
        }

        let caps = Capabilities::builder()
            .search(Arc::new(search))
            .fetcher(Arc::new(fetcher))
            .extraction(Arc::new(extraction))
            .similarity(Arc::new(MockSimilarity::new()))
            .reliability(Arc::new(reliability))
            .relevance(Arc::new(relevance))
            .build()?;

        let orchestrator = ResearchOrchestrator::new(caps)
            .with_config(config.orchestrator.clone())
            .with_decision(config.decision.clone())
            .with_extractor(config.extractor.clone())
            .with_dedup(config.dedup.clone());
        orchestrator.validate()?;

        let verdicts = match &self.verdicts {
            Some(verdicts) => MockVerdicts::new(verdicts.clone()),
            None => MockVerdicts::failing(CapabilityError::Unavailable("no verdicts recorded".into())),
        };

        let direction = MockDirectionValidator::new();
        for record in &self.direction_mismatches {
            direction.add_mismatch(record.claim_id.clone(), record.evidence_polarity);
        }
        let calibrator = VerdictCalibrator::new(config.calibration.clone())?.with_direction_validation(Arc::new(direction));

        Ok(AnalysisPipeline::new(orchestrator, Arc::new(verdicts), calibrator).with_budget(config.budget.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERMIT_FIXTURE: &str = include_str!("../tests/fixtures/permit.json");

    #[test]
    fn test_parse_fixture() {
        let fixture = Fixture::from_json(PERMIT_FIXTURE).unwrap();
        assert_eq!(fixture.understanding.claims.len(), 2);
        assert_eq!(fixture.as_of, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(fixture.searches[0].matches, "Permit");
        assert_eq!(fixture.extractions[0].tokens_used, 40);
        assert!(fixture.verdicts.is_some());
        assert!(fixture.direction_mismatches.is_empty());
    }

    #[test]
    fn test_empty_thesis_rejected() {
        let err = Fixture::from_json(r#"{"understanding": {"thesis": "  "}}"#).unwrap_err();
        assert!(matches!(err, CliError::Fixture(_)));
    }

    #[test]
    fn test_missing_understanding_rejected() {
        assert!(matches!(Fixture::from_json("{}"), Err(CliError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_replay_produces_report() {
        let fixture = Fixture::from_json(PERMIT_FIXTURE).unwrap();
        let mut config = Config::default();
        config.budget.max_iterations = 2;
        config.orchestrator.retry = veracity_llm::RetryPolicy::none();

        let pipeline = fixture.pipeline(&config).unwrap();
        let as_of = fixture.as_of.unwrap();
        let report = pipeline.run(fixture.understanding.clone(), as_of).await.unwrap();

        assert_eq!(report.claim_verdicts.len(), 2);
        assert_eq!(report.evidence.len(), 1);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.integrity.defaulted_claims, 0);
    }

    #[tokio::test]
    async fn test_replay_without_verdicts_defaults_claims() {
        let mut fixture = Fixture::from_json(PERMIT_FIXTURE).unwrap();
        fixture.verdicts = None;
        let mut config = Config::default();
        config.budget.max_iterations = 1;
        config.orchestrator.retry = veracity_llm::RetryPolicy::none();

        let report = fixture
            .pipeline(&config)
            .unwrap()
            .run(fixture.understanding.clone(), fixture.as_of.unwrap())
            .await
            .unwrap();

        assert_eq!(report.integrity.defaulted_claims, 2);
        assert!(report.fallbacks.iter().any(|f| f.stage == "verdict.generation"));
    }
}
