//! Evidence and URL deduplication

use crate::url::UrlNormalizer;
use crate::{DedupConfig, DedupError};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use veracity_domain::traits::TextSimilarity;
use veracity_domain::{CapabilityError, EvidenceId, EvidenceItem, FallbackRecord, SearchResult};
use veracity_llm::with_retry;

/// Why an item was dropped
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "score")]
pub enum DuplicateReason {
    /// Same canonical source URL as a known item
    Url,
    /// Statement similarity at or above the threshold
    Similarity(f64),
}

/// A dropped item and the item it duplicated
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedDuplicate {
    /// The dropped item
    pub item: EvidenceItem,
    /// The surviving item it matched
    pub matched: EvidenceId,
    /// Why it was dropped
    pub reason: DuplicateReason,
}

/// Result of a deduplication pass
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Items that survived, in input order
    pub kept: Vec<EvidenceItem>,
    /// Items that were dropped
    pub duplicates: Vec<DroppedDuplicate>,
    /// Pairs the similarity service could not score (treated as distinct)
    pub unresolved_pairs: usize,
    /// Set when the similarity service failed
    pub fallback: Option<FallbackRecord>,
}

/// Collapse whitespace and case for exact-text comparison
fn text_key(statement: &str) -> String {
    statement
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deduplicates candidate URLs and extracted evidence
pub struct Deduplicator<S: ?Sized> {
    similarity: Arc<S>,
    config: DedupConfig,
    normalizer: UrlNormalizer,
}

impl<S: TextSimilarity + ?Sized> Deduplicator<S> {
    /// Create a deduplicator backed by a similarity capability
    pub fn new(similarity: Arc<S>, config: DedupConfig) -> Result<Self, DedupError> {
        config.validate().map_err(DedupError::Config)?;
        let normalizer = UrlNormalizer::from_config(&config);
        Ok(Self {
            similarity,
            config,
            normalizer,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Canonical key for a URL
    pub fn normalize_url(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    /// Drop search results whose canonical URL was already processed
    ///
    /// Results repeating a canonical URL within `candidates` are dropped too;
    /// the first occurrence wins.
    pub fn filter_duplicate_urls(
        &self,
        candidates: Vec<SearchResult>,
        processed: &HashSet<String>,
    ) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|candidate| {
                let key = self.normalize_url(&candidate.url);
                !processed.contains(&key) && seen.insert(key)
            })
            .collect()
    }

    /// Drop new items that duplicate known items or each other
    ///
    /// An item is a duplicate when its canonical source URL matches a known
    /// item (or a kept item from a different source), when its statement
    /// repeats a known or kept one verbatim (even from the same source), or
    /// when its similarity to any known or kept item from another source
    /// reaches the threshold. Items are
    /// considered in order, so the first of a duplicate group survives.
    /// Pairs the similarity service fails to score count as distinct.
    pub async fn dedupe_items(&self, new_items: Vec<EvidenceItem>, known: &[EvidenceItem]) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();
        if new_items.is_empty() {
            return outcome;
        }

        let batch = Batch::prepare(&self.normalizer, &new_items, known);
        let pending = batch.pending_pairs();
        let scores = self.score_pairs(&pending, &new_items, known, &mut outcome).await;

        let mut kept = vec![false; new_items.len()];
        for (i, item) in new_items.iter().enumerate() {
            match batch.duplicate_of(i, &kept, &scores, self.config.similarity_threshold) {
                Some((matched, reason)) => {
                    tracing::debug!(statement = %item.statement, ?reason, "Dropping duplicate evidence");
                    outcome.duplicates.push(DroppedDuplicate {
                        item: item.clone(),
                        matched,
                        reason,
                    });
                }
                None => kept[i] = true,
            }
        }

        outcome.kept = new_items
            .into_iter()
            .zip(kept)
            .filter_map(|(item, kept)| kept.then_some(item))
            .collect();
        outcome
    }

    async fn score_pairs(
        &self,
        pending: &[(usize, Target)],
        new_items: &[EvidenceItem],
        known: &[EvidenceItem],
        outcome: &mut DedupOutcome,
    ) -> HashMap<(usize, Target), f64> {
        let mut scores = HashMap::new();
        let mut last_error: Option<CapabilityError> = None;

        for chunk in pending.chunks(self.config.batch_size) {
            let pairs: Vec<(String, String)> = chunk
                .iter()
                .map(|(i, target)| {
                    let other = match target {
                        Target::Known(j) => &known[*j],
                        Target::New(k) => &new_items[*k],
                    };
                    (new_items[*i].statement.clone(), other.statement.clone())
                })
                .collect();

            let result = with_retry(&self.config.retry, self.config.timeout(), || {
                self.similarity.assess_text_similarity_batch(&pairs)
            })
            .await
            .and_then(|batch| {
                if batch.len() == pairs.len() {
                    Ok(batch)
                } else {
                    Err(CapabilityError::Malformed(format!(
                        "expected {} scores, got {}",
                        pairs.len(),
                        batch.len()
                    )))
                }
            });

            match result {
                Ok(batch) => {
                    for (key, score) in chunk.iter().zip(batch) {
                        if score.is_finite() {
                            scores.insert(*key, score.clamp(0.0, 1.0));
                        } else {
                            outcome.unresolved_pairs += 1;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(pairs = chunk.len(), error = %err, "Similarity batch failed, treating pairs as distinct");
                    outcome.unresolved_pairs += chunk.len();
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = last_error {
            outcome.fallback = Some(FallbackRecord::new(
                "dedup.similarity",
                "pairs treated as not duplicate",
                format!("{} unresolved pairs: {}", outcome.unresolved_pairs, err),
            ));
        }
        scores
    }
}

/// The other side of a scored pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Known(usize),
    New(usize),
}

/// Canonical keys for one deduplication pass
struct Batch<'a> {
    new_items: &'a [EvidenceItem],
    known: &'a [EvidenceItem],
    known_urls: HashMap<String, usize>,
    known_texts: HashMap<String, usize>,
    new_urls: Vec<String>,
    new_texts: Vec<String>,
}

impl<'a> Batch<'a> {
    fn prepare(normalizer: &UrlNormalizer, new_items: &'a [EvidenceItem], known: &'a [EvidenceItem]) -> Self {
        let mut known_urls = HashMap::new();
        let mut known_texts = HashMap::new();
        for (j, item) in known.iter().enumerate() {
            known_urls.entry(normalizer.normalize(&item.source_url)).or_insert(j);
            known_texts.entry(text_key(&item.statement)).or_insert(j);
        }
        Self {
            new_items,
            known,
            known_urls,
            known_texts,
            new_urls: new_items.iter().map(|item| normalizer.normalize(&item.source_url)).collect(),
            new_texts: new_items.iter().map(|item| text_key(&item.statement)).collect(),
        }
    }

    /// Pairs that need a service score; exact matches never do
    fn pending_pairs(&self) -> Vec<(usize, Target)> {
        let mut pending = Vec::new();
        for (i, item) in self.new_items.iter().enumerate() {
            if self.known_urls.contains_key(&self.new_urls[i]) || self.known_texts.contains_key(&self.new_texts[i]) {
                continue;
            }
            pending.extend((0..self.known.len()).map(|j| (i, Target::Known(j))));
            for k in 0..i {
                let other = &self.new_items[k];
                if other.source_id != item.source_id
                    && self.new_urls[k] != self.new_urls[i]
                    && self.new_texts[k] != self.new_texts[i]
                {
                    pending.push((i, Target::New(k)));
                }
            }
        }
        pending
    }

    fn duplicate_of(
        &self,
        i: usize,
        kept: &[bool],
        scores: &HashMap<(usize, Target), f64>,
        threshold: f64,
    ) -> Option<(EvidenceId, DuplicateReason)> {
        if let Some(&j) = self.known_urls.get(&self.new_urls[i]) {
            return Some((self.known[j].id.clone(), DuplicateReason::Url));
        }
        if let Some(&j) = self.known_texts.get(&self.new_texts[i]) {
            return Some((self.known[j].id.clone(), DuplicateReason::Similarity(1.0)));
        }
        for j in 0..self.known.len() {
            if let Some(&score) = scores.get(&(i, Target::Known(j))) {
                if score >= threshold {
                    return Some((self.known[j].id.clone(), DuplicateReason::Similarity(score)));
                }
            }
        }

        let item = &self.new_items[i];
        for k in (0..i).filter(|&k| kept[k]) {
            let other = &self.new_items[k];
            if self.new_texts[k] == self.new_texts[i] {
                return Some((other.id.clone(), DuplicateReason::Similarity(1.0)));
            }
            // Distinct statements from one source share its URL
            if other.source_id == item.source_id {
                continue;
            }
            if self.new_urls[k] == self.new_urls[i] {
                return Some((other.id.clone(), DuplicateReason::Url));
            }
            if let Some(&score) = scores.get(&(i, Target::New(k))) {
                if score >= threshold {
                    return Some((other.id.clone(), DuplicateReason::Similarity(score)));
                }
            }
        }
        None
    }
}
