//! Scripted capability implementations
//!
//! Deterministic stand-ins for every external capability, used by tests and
//! by offline fixture replay. None of them touch the network. Each mock is
//! cheap to clone; clones share scripts and counters through `Arc`.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use veracity_domain::traits::{
    ContextRefinement, DirectionValidation, EvidenceExtraction, InputClassifier, ReliabilityScorer, SearchRelevance,
    SourceFetcher, TextSimilarity, VerdictGeneration, WebSearch,
};
use veracity_domain::{
    AnalysisContext, CapabilityError, Claim, ClaimId, ContextRemap, DirectionCheck, DirectionQuery, EvidenceItem,
    EvidencePolarity, ExtractedEvidence, FetchedPage, FetchedSource, GeneratedVerdicts, SearchFilters, SearchResult,
    Understanding,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lowercased alphanumeric tokens of a text
fn tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Jaccard similarity of the token sets of two texts
fn jaccard(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let shared = left.iter().filter(|t| right.binary_search(t).is_ok()).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Scripted input classifier
#[derive(Debug, Clone)]
pub struct MockClassifier {
    understanding: Understanding,
}

impl MockClassifier {
    /// Always return `understanding`
    pub fn new(understanding: Understanding) -> Self {
        Self { understanding }
    }
}

#[async_trait]
impl InputClassifier for MockClassifier {
    async fn classify_input(&self, _input: &str) -> Result<Understanding, CapabilityError> {
        Ok(self.understanding.clone())
    }
}

/// Scripted web search
///
/// Lookup order: scripted failure for the exact query, then the first
/// registered substring rule (case-insensitive), then the default result list.
#[derive(Debug, Clone, Default)]
pub struct MockSearch {
    failures: Arc<Mutex<HashMap<String, CapabilityError>>>,
    rules: Arc<Mutex<Vec<(String, Vec<SearchResult>)>>>,
    default_results: Arc<Mutex<Vec<SearchResult>>>,
    calls: Arc<Mutex<Vec<(String, SearchFilters)>>>,
}

impl MockSearch {
    /// Create a search mock with no results
    pub fn new() -> Self {
        Self::default()
    }

    /// Results for any query containing `needle`
    pub fn add_rule(&self, needle: impl Into<String>, results: Vec<SearchResult>) {
        lock(&self.rules).push((needle.into().to_lowercase(), results));
    }

    /// Fail an exact query
    pub fn add_error(&self, query: impl Into<String>, err: CapabilityError) {
        lock(&self.failures).insert(query.into(), err);
    }

    /// Results for any unmatched query
    pub fn set_default(&self, results: Vec<SearchResult>) {
        *lock(&self.default_results) = results;
    }

    /// Number of searches run
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Queries run, in order
    pub fn queries(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(q, _)| q.clone()).collect()
    }

    /// Filters passed with each query, in order
    pub fn filters(&self) -> Vec<SearchFilters> {
        lock(&self.calls).iter().map(|(_, f)| f.clone()).collect()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search_web(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>, CapabilityError> {
        lock(&self.calls).push((query.to_string(), filters.clone()));

        if let Some(err) = lock(&self.failures).get(query) {
            return Err(err.clone());
        }

        let lowered = query.to_lowercase();
        let results = match lock(&self.rules).iter().find(|(needle, _)| lowered.contains(needle.as_str())) {
            Some((_, results)) => results.clone(),
            None => lock(&self.default_results).clone(),
        };

        Ok(results.into_iter().take(filters.max_results).collect())
    }
}

/// Scripted page fetcher
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, FetchedPage>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockFetcher {
    /// Create a fetcher that knows no pages
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` at `url`
    pub fn add_page(&self, url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) {
        let page = FetchedPage {
            title: title.into(),
            text: text.into(),
        };
        lock(&self.pages).insert(url.into(), page);
    }

    /// Number of fetches attempted
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch_source(&self, url: &str) -> Result<FetchedPage, CapabilityError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.pages)
            .get(url)
            .cloned()
            .ok_or_else(|| CapabilityError::Failed(format!("404 not found: {url}")))
    }
}

/// Scripted reliability scores, by exact URL or by host
#[derive(Debug, Clone, Default)]
pub struct MockReliability {
    scores: Arc<Mutex<HashMap<String, f64>>>,
}

impl MockReliability {
    /// Create a scorer that knows no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a URL or a host name
    pub fn add_score(&self, key: impl Into<String>, score: f64) {
        lock(&self.scores).insert(key.into(), score);
    }
}

#[async_trait]
impl ReliabilityScorer for MockReliability {
    async fn reliability_score(&self, url: &str) -> Option<f64> {
        let scores = lock(&self.scores);
        if let Some(score) = scores.get(url) {
            return Some(*score);
        }
        let host = url::Url::parse(url).ok()?.host_str()?.to_lowercase();
        let bare = host.strip_prefix("www.").unwrap_or(&host);
        scores.get(&host).or_else(|| scores.get(bare)).copied()
    }
}

/// Scripted evidence extraction
///
/// Responses are queued per source URL; the last queued response repeats.
/// Unknown URLs get the default response. An optional delay makes
/// concurrency observable through [`MockExtraction::peak_in_flight`].
#[derive(Debug, Clone)]
pub struct MockExtraction {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<ExtractedEvidence, CapabilityError>>>>>,
    default_response: Arc<Mutex<Result<ExtractedEvidence, CapabilityError>>>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockExtraction {
    fn default() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(Ok(ExtractedEvidence::default()))),
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockExtraction {
    /// Create an extractor that returns no candidates
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response for `url`
    pub fn add_response(&self, url: impl Into<String>, response: ExtractedEvidence) {
        lock(&self.scripts).entry(url.into()).or_default().push_back(Ok(response));
    }

    /// Queue a failure for `url`
    pub fn add_error(&self, url: impl Into<String>, err: CapabilityError) {
        lock(&self.scripts).entry(url.into()).or_default().push_back(Err(err));
    }

    /// Response for URLs without a script
    pub fn set_default(&self, response: Result<ExtractedEvidence, CapabilityError>) {
        *lock(&self.default_response) = response;
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> Result<ExtractedEvidence, CapabilityError> {
        let mut scripts = lock(&self.scripts);
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(CapabilityError::Failed("empty script".to_string()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(CapabilityError::Failed("empty script".to_string()))),
            None => lock(&self.default_response).clone(),
        }
    }
}

#[async_trait]
impl EvidenceExtraction for MockExtraction {
    async fn extract_evidence(
        &self,
        source: &FetchedSource,
        _focus: &str,
        _contexts: &[AnalysisContext],
    ) -> Result<ExtractedEvidence, CapabilityError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.next_response(&source.url);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// Similarity scored by token Jaccard overlap, or forced to fail
#[derive(Debug, Clone, Default)]
pub struct MockSimilarity {
    failure: Option<CapabilityError>,
    call_count: Arc<AtomicUsize>,
    pairs_scored: Arc<AtomicUsize>,
}

impl MockSimilarity {
    /// Jaccard-scoring similarity
    pub fn new() -> Self {
        Self::default()
    }

    /// A similarity service that always fails
    pub fn failing(err: CapabilityError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    /// Number of batch calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of pairs scored across all calls
    pub fn pairs_scored(&self) -> usize {
        self.pairs_scored.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextSimilarity for MockSimilarity {
    async fn assess_text_similarity_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f64>, CapabilityError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.pairs_scored.fetch_add(pairs.len(), Ordering::SeqCst);
        Ok(pairs.iter().map(|(a, b)| jaccard(a, b)).collect())
    }
}

/// Relevance scores per URL, defaulting to fully relevant
#[derive(Debug, Clone)]
pub struct MockRelevance {
    scores: Arc<Mutex<HashMap<String, f64>>>,
    default_score: f64,
    failure: Option<CapabilityError>,
}

impl Default for MockRelevance {
    fn default() -> Self {
        Self {
            scores: Arc::new(Mutex::new(HashMap::new())),
            default_score: 1.0,
            failure: None,
        }
    }
}

impl MockRelevance {
    /// Every result fully relevant
    pub fn new() -> Self {
        Self::default()
    }

    /// A relevance service that always fails
    pub fn failing(err: CapabilityError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    /// Score a result URL
    pub fn add_score(&self, url: impl Into<String>, score: f64) {
        lock(&self.scores).insert(url.into(), score);
    }
}

#[async_trait]
impl SearchRelevance for MockRelevance {
    async fn assess_search_relevance_batch(
        &self,
        _focus: &str,
        results: &[SearchResult],
    ) -> Result<Vec<f64>, CapabilityError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let scores = lock(&self.scores);
        Ok(results
            .iter()
            .map(|r| scores.get(&r.url).copied().unwrap_or(self.default_score))
            .collect())
    }
}

/// Direction checks per claim; unscripted claims are reported aligned
#[derive(Debug, Clone, Default)]
pub struct MockDirectionValidator {
    checks: Arc<Mutex<HashMap<ClaimId, DirectionCheck>>>,
    failure: Option<CapabilityError>,
    call_count: Arc<AtomicUsize>,
}

impl MockDirectionValidator {
    /// Every verdict aligned
    pub fn new() -> Self {
        Self::default()
    }

    /// A validator that always fails
    pub fn failing(err: CapabilityError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    /// Report a mismatch for `claim_id`; the evidence points the given way
    pub fn add_mismatch(&self, claim_id: impl Into<ClaimId>, evidence_polarity: EvidencePolarity) {
        let claim_id = claim_id.into();
        lock(&self.checks).insert(
            claim_id.clone(),
            DirectionCheck {
                claim_id,
                aligned: false,
                evidence_polarity,
            },
        );
    }

    /// Number of validation calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionValidation for MockDirectionValidator {
    async fn validate_verdict_directions(
        &self,
        queries: &[DirectionQuery],
    ) -> Result<Vec<DirectionCheck>, CapabilityError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let checks = lock(&self.checks);
        Ok(queries
            .iter()
            .map(|q| {
                checks.get(&q.claim_id).cloned().unwrap_or_else(|| DirectionCheck {
                    claim_id: q.claim_id.clone(),
                    aligned: true,
                    evidence_polarity: if q.truth_percentage >= 50.0 {
                        EvidencePolarity::True
                    } else {
                        EvidencePolarity::False
                    },
                })
            })
            .collect())
    }
}

/// Fixed verdict output
#[derive(Debug, Clone)]
pub struct MockVerdicts {
    response: Result<GeneratedVerdicts, CapabilityError>,
}

impl MockVerdicts {
    /// Always return `verdicts`
    pub fn new(verdicts: GeneratedVerdicts) -> Self {
        Self { response: Ok(verdicts) }
    }

    /// Always fail
    pub fn failing(err: CapabilityError) -> Self {
        Self { response: Err(err) }
    }
}

#[async_trait]
impl VerdictGeneration for MockVerdicts {
    async fn generate_verdicts(
        &self,
        _thesis: &str,
        _claims: &[Claim],
        _contexts: &[AnalysisContext],
        _evidence: &[EvidenceItem],
    ) -> Result<GeneratedVerdicts, CapabilityError> {
        self.response.clone()
    }
}

/// Context refinement that proposes queued remaps, then nothing
#[derive(Debug, Clone, Default)]
pub struct MockRefinement {
    remaps: Arc<Mutex<VecDeque<ContextRemap>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockRefinement {
    /// Refinement that never changes anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a remap for the next call
    pub fn add_remap(&self, remap: ContextRemap) {
        lock(&self.remaps).push_back(remap);
    }

    /// Number of refinement calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextRefinement for MockRefinement {
    async fn refine_contexts(
        &self,
        _contexts: &[AnalysisContext],
        _claims: &[Claim],
        _evidence: &[EvidenceItem],
    ) -> Result<ContextRemap, CapabilityError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.remaps).pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_domain::EvidenceCandidate;

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard("The court ruled", "the COURT ruled."), 1.0);
        assert_eq!(jaccard("", ""), 1.0);
        assert_eq!(jaccard("alpha beta", "gamma delta"), 0.0);
        assert!((jaccard("a b c d", "a b c e") - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_search_lookup_order() {
        let search = MockSearch::new();
        search.add_error("criticism outage", CapabilityError::Unavailable("down".into()));
        search.add_rule("criticism", vec![SearchResult::new("https://b.org", "B")]);
        search.set_default(vec![SearchResult::new("https://c.org", "C")]);
        let filters = SearchFilters::default();

        assert!(search.search_web("criticism outage", &filters).await.is_err());
        let hits = search.search_web("Vaccine Criticism 2025", &filters).await.unwrap();
        assert_eq!(hits[0].url, "https://b.org");
        let hits = search.search_web("anything", &filters).await.unwrap();
        assert_eq!(hits[0].url, "https://c.org");
        assert_eq!(search.call_count(), 3);
    }

    #[tokio::test]
    async fn test_search_respects_max_results() {
        let search = MockSearch::new();
        search.set_default((0..5).map(|i| SearchResult::new(format!("https://x.org/{i}"), "")).collect());
        let filters = SearchFilters {
            max_results: 2,
            date_window: None,
        };
        assert_eq!(search.search_web("q", &filters).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetcher_unknown_url_fails() {
        let fetcher = MockFetcher::new();
        fetcher.add_page("https://a.org", "A", "body");
        assert_eq!(fetcher.fetch_source("https://a.org").await.unwrap().text, "body");
        assert!(fetcher.fetch_source("https://b.org").await.is_err());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reliability_by_host() {
        let scorer = MockReliability::new();
        scorer.add_score("reuters.com", 0.9);
        assert_eq!(scorer.reliability_score("https://www.reuters.com/world/x").await, Some(0.9));
        assert_eq!(scorer.reliability_score("https://unknown.example/y").await, None);
    }

    #[tokio::test]
    async fn test_extraction_script_then_repeat() {
        let mock = MockExtraction::new();
        let source = FetchedSource::fetched("https://a.org", "A", "text");
        mock.add_error("https://a.org", CapabilityError::Malformed("bad".into()));
        mock.add_response(
            "https://a.org",
            ExtractedEvidence {
                candidates: vec![EvidenceCandidate::new("fact")],
                tokens_used: 10,
            },
        );

        assert!(mock.extract_evidence(&source, "f", &[]).await.is_err());
        assert_eq!(mock.extract_evidence(&source, "f", &[]).await.unwrap().tokens_used, 10);
        assert_eq!(mock.extract_evidence(&source, "f", &[]).await.unwrap().tokens_used, 10);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_similarity_failing() {
        let mock = MockSimilarity::failing(CapabilityError::Timeout(5));
        let pairs = vec![("a".to_string(), "a".to_string())];
        assert!(mock.assess_text_similarity_batch(&pairs).await.is_err());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.pairs_scored(), 0);
    }

    #[tokio::test]
    async fn test_direction_default_aligned() {
        let mock = MockDirectionValidator::new();
        mock.add_mismatch("C2", EvidencePolarity::False);
        let queries = vec![
            DirectionQuery {
                claim_id: "C1".into(),
                claim_text: "one".into(),
                truth_percentage: 80.0,
                evidence: vec![],
            },
            DirectionQuery {
                claim_id: "C2".into(),
                claim_text: "two".into(),
                truth_percentage: 80.0,
                evidence: vec![],
            },
        ];
        let checks = mock.validate_verdict_directions(&queries).await.unwrap();
        assert!(checks[0].aligned);
        assert!(!checks[1].aligned);
        assert_eq!(checks[1].evidence_polarity, EvidencePolarity::False);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let first = MockFetcher::new();
        let second = first.clone();
        let _ = first.fetch_source("https://a.org").await;
        assert_eq!(second.call_count(), 1);
    }
}
