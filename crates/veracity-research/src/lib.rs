//! Veracity Research
//!
//! Bounded, iterative evidence research for a decomposed claim.
//!
//! # Overview
//!
//! A research run is responsible for:
//! - **Deciding**: Picking the next search from accumulated state with an ordered rule table
//! - **Gathering**: Searching, fetching and extracting evidence concurrently
//! - **Bounding**: Stopping cooperatively when the iteration, token or time budget runs out
//! - **Reconciling**: Applying context merges and removals atomically mid-run
//!
//! [`AnalysisPipeline`] then hands the evidence to verdict generation and
//! calibration and assembles the [`AnalysisReport`].
//!
//! # Decision Rules
//!
//! | Order | Rule | Fires when |
//! |-------|------|------------|
//! | side | `central_claim_evidence` | A central core claim has no linked evidence (once per claim) |
//! | side | `recency_supplement` | A recency-sensitive claim has no evidence (once per run) |
//! | 1 | `context_coverage` | A context has fewer than 2 evidence items (at most 2 attempts) |
//! | 2 | `legal_framework` | A framework is declared, no provisions yet, first iteration |
//! | 3 | `generic_evidence` | No generic evidence within the first 2 iterations |
//! | 4 | `contradiction` | Criticism search not yet run |
//! | 5 | `inverse_claim` | An invertible claim exists and its counter-search has not run |
//! | 6 | `cross_context` | Exactly one context, iteration 2 or later, not yet run |
//! | 7 | `decision_makers` | Decision-makers are involved and not yet searched |
//! | 8 | `suggested_queries` | Upstream suggestions remain (skipped in deterministic mode) |
//! | 9 | `coverage_gap` | Completion conditions unmet; least-covered claim, once per claim |
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use veracity_research::{Capabilities, ResearchOrchestrator, BudgetConfig};
//! use veracity_llm::{MockExtraction, MockFetcher, MockSearch, MockSimilarity};
//! use veracity_domain::Understanding;
//!
//! # tokio_test::block_on(async {
//! let caps = Capabilities::builder()
//!     .search(Arc::new(MockSearch::new()))
//!     .fetcher(Arc::new(MockFetcher::new()))
//!     .extraction(Arc::new(MockExtraction::new()))
//!     .similarity(Arc::new(MockSimilarity::new()))
//!     .build()
//!     .unwrap();
//!
//! let orchestrator = ResearchOrchestrator::new(caps);
//! let today = chrono::Utc::now().date_naive();
//! let state = orchestrator
//!     .research(Understanding::default(), BudgetConfig::quick(), today)
//!     .await
//!     .unwrap();
//!
//! println!("{}", state.budget.stats().summary());
//! # });
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [budget]
//! max_iterations = 10
//! max_tokens = 200000
//!
//! [decision]
//! base_min_evidence = 6
//! max_sources = 16
//! min_categories = 2
//! max_context_attempts = 2
//! deterministic = false
//!
//! [orchestrator]
//! search_timeout_secs = 20
//! fetch_timeout_secs = 30
//! fetch_concurrency = 4
//! relevance_threshold = 0.4
//! refine_every = 3
//! ```

#![warn(missing_docs)]

mod budget;
mod config;
pub mod decision;
mod error;
mod orchestrator;
mod pipeline;
mod state;

pub use budget::{BudgetStats, BudgetTracker};
pub use config::{BudgetConfig, DecisionConfig, OrchestratorConfig};
pub use decision::{decide, Completion, Decision, DecisionContract, RuleId, SearchAction, SearchMark};
pub use error::ResearchError;
pub use orchestrator::{Capabilities, CapabilitiesBuilder, ResearchOrchestrator};
pub use pipeline::{AnalysisPipeline, AnalysisReport};
pub use state::{ReconcileReport, ResearchState, SearchFlags};
