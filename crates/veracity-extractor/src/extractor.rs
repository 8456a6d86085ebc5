//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::types::{ExtractionFailure, ExtractionOptions, ExtractionOutcome, ExtractionTelemetry};
use futures::future::join_all;
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use veracity_dedup::Deduplicator;
use veracity_domain::traits::{EvidenceExtraction, TextSimilarity};
use veracity_domain::{CapabilityError, ContextId, EvidenceItem, ExtractedEvidence, FetchedSource};
use veracity_llm::{is_throttling, with_retry};

/// Extracts evidence from sources in concurrent windows
///
/// One instance serves one research run. The window width starts at
/// `initial_concurrency` and drops by one after every window that saw a
/// throttling failure; it never grows back within the instance.
pub struct ParallelExtractor<E: ?Sized, S: ?Sized> {
    extraction: Arc<E>,
    dedup: Arc<Deduplicator<S>>,
    config: ExtractorConfig,
    width: AtomicUsize,
}

impl<E, S> ParallelExtractor<E, S>
where
    E: EvidenceExtraction + ?Sized,
    S: TextSimilarity + ?Sized,
{
    /// Create a new extractor
    pub fn new(extraction: Arc<E>, dedup: Arc<Deduplicator<S>>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let width = AtomicUsize::new(config.initial_concurrency);
        Ok(Self {
            extraction,
            dedup,
            config,
            width,
        })
    }

    /// Current window width
    pub fn current_concurrency(&self) -> usize {
        self.width.load(Ordering::SeqCst)
    }

    /// Extract evidence from `sources`
    ///
    /// New items are deduplicated against `existing` and against items
    /// collected earlier in this call. Sources whose fetch failed are
    /// reported as failures without calling the capability.
    pub async fn extract(
        &self,
        sources: &[FetchedSource],
        options: &ExtractionOptions,
        existing: &[EvidenceItem],
    ) -> ExtractionOutcome {
        let start = Instant::now();
        let mut outcome = ExtractionOutcome::default();
        let mut telemetry = ExtractionTelemetry::default();

        let (ready, unfetched): (Vec<&FetchedSource>, Vec<&FetchedSource>) =
            sources.iter().partition(|source| source.fetch_success);
        for source in unfetched {
            telemetry.failed += 1;
            outcome.failures.push(ExtractionFailure {
                source_id: source.id.clone(),
                url: source.url.clone(),
                reason: "source could not be fetched".to_string(),
                throttled: false,
            });
        }

        info!(
            "Starting extraction for '{}': {} sources, width {}",
            options.focus,
            ready.len(),
            self.current_concurrency()
        );

        let mut known: Vec<EvidenceItem> = existing.to_vec();
        let mut remaining: &[&FetchedSource] = &ready;
        while !remaining.is_empty() {
            let width = self.current_concurrency().max(1).min(remaining.len());
            let (window, rest) = remaining.split_at(width);
            remaining = rest;
            telemetry.window_widths.push(width);
            debug!("Window {}: {} sources", telemetry.window_widths.len(), width);

            let results = join_all(window.iter().map(|source| self.extract_one(source, options))).await;

            let mut throttled = false;
            let mut window_items = Vec::new();
            for (source, result) in window.iter().zip(results) {
                match result {
                    Ok(extracted) => {
                        telemetry.succeeded += 1;
                        telemetry.tokens_used += extracted.tokens_used;
                        for candidate in extracted.candidates {
                            if candidate.statement.trim().is_empty() {
                                continue;
                            }
                            let mut item = candidate.into_evidence(source, options.target_context_id.as_ref());
                            if repair_context(&mut item, options) {
                                telemetry.contexts_repaired += 1;
                            }
                            window_items.push(item);
                        }
                    }
                    Err(err) => {
                        let is_throttle = is_throttling(&err);
                        warn!(url = %source.url, throttled = is_throttle, "Extraction failed: {}", err);
                        telemetry.failed += 1;
                        if is_throttle {
                            telemetry.throttle_events += 1;
                            throttled = true;
                        }
                        outcome.failures.push(ExtractionFailure {
                            source_id: source.id.clone(),
                            url: source.url.clone(),
                            reason: err.to_string(),
                            throttled: is_throttle,
                        });
                    }
                }
            }

            if throttled {
                self.narrow();
            }

            let deduped = self.dedup.dedupe_items(window_items, &known).await;
            telemetry.duplicates_dropped += deduped.duplicates.len();
            outcome.fallbacks.extend(deduped.fallback);
            known.extend(deduped.kept.iter().cloned());
            outcome.evidence_items.extend(deduped.kept);
        }

        telemetry.final_concurrency = self.current_concurrency();
        telemetry.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extraction complete: {} items, {} succeeded, {} failed, {} throttled, width {}",
            outcome.evidence_items.len(),
            telemetry.succeeded,
            telemetry.failed,
            telemetry.throttle_events,
            telemetry.final_concurrency
        );

        outcome.telemetry = telemetry;
        outcome
    }

    /// Drop the window width by one, never below one
    fn narrow(&self) {
        let previous = self
            .width
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| Some(w.saturating_sub(1).max(1)))
            .unwrap_or_else(|w| w);
        info!(
            "Throttling detected, narrowing extraction width {} -> {}",
            previous,
            self.current_concurrency()
        );
    }

    async fn extract_one(
        &self,
        source: &FetchedSource,
        options: &ExtractionOptions,
    ) -> Result<ExtractedEvidence, CapabilityError> {
        let source = truncate_source(source, self.config.max_source_chars);
        let policy = self.config.effective_retry();
        with_retry(&policy, self.config.extraction_timeout(), || {
            self.extraction
                .extract_evidence(&source, &options.focus, &options.contexts)
        })
        .await
    }
}

/// Reattribute an item whose context is not among `options.contexts`.
///
/// The item falls back to the target context when that one is known,
/// otherwise to no context. Returns whether the item was changed.
fn repair_context(item: &mut EvidenceItem, options: &ExtractionOptions) -> bool {
    let is_known = |id: &ContextId| options.contexts.iter().any(|context| &context.id == id);
    match &item.context_id {
        Some(id) if !is_known(id) => {
            let fallback = options.target_context_id.clone().filter(|target| is_known(target));
            debug!(
                evidence = %item.id,
                "Unknown context {} reattributed to {:?}",
                id,
                fallback.as_ref().map(ContextId::as_str)
            );
            item.context_id = fallback;
            true
        }
        _ => false,
    }
}

/// Cut source text to `max_chars` characters
fn truncate_source(source: &FetchedSource, max_chars: usize) -> Cow<'_, FetchedSource> {
    match source.text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = source.clone();
            truncated.text.truncate(cut);
            Cow::Owned(truncated)
        }
        None => Cow::Borrowed(source),
    }
}
