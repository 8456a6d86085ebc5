//! Veracity Capability Support Layer
//!
//! Shared plumbing for calling external capabilities, plus scripted
//! implementations of every capability trait from `veracity-domain`.
//!
//! # Modules
//!
//! - [`retry`]: bounded retry with jitter, each attempt racing a timeout
//! - [`throttle`]: throttling-signature classification (429/503, rate limit)
//! - [`mock`]: deterministic capability mocks for tests and offline replay
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use veracity_llm::retry::{with_retry, RetryPolicy};
//! use veracity_domain::CapabilityError;
//!
//! # tokio_test::block_on(async {
//! let result = with_retry(&RetryPolicy::none(), Duration::from_secs(1), || async {
//!     Ok::<_, CapabilityError>("done")
//! })
//! .await;
//! assert_eq!(result, Ok("done"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod mock;
pub mod retry;
pub mod throttle;

pub use mock::{
    MockClassifier, MockDirectionValidator, MockExtraction, MockFetcher, MockRefinement, MockReliability,
    MockRelevance, MockSearch, MockSimilarity, MockVerdicts,
};
pub use retry::{with_retry, with_timeout, RetryPolicy};
pub use throttle::is_throttling;
