//! Evidence weighting by source reliability

use crate::band::clamp_percentage;
use crate::config::CalibrationConfig;
use std::collections::{HashMap, HashSet};
use veracity_domain::{ClaimVerdict, EvidenceId, EvidenceItem, FetchedSource, SourceId};

/// Lookup tables for the evidence a verdict cites
pub struct EvidenceIndex<'a> {
    evidence: HashMap<&'a EvidenceId, &'a EvidenceItem>,
    sources: HashMap<&'a SourceId, &'a FetchedSource>,
}

impl<'a> EvidenceIndex<'a> {
    /// Index evidence by id and sources by id
    pub fn new(evidence: &'a [EvidenceItem], sources: &'a [FetchedSource]) -> Self {
        Self {
            evidence: evidence.iter().map(|item| (&item.id, item)).collect(),
            sources: sources.iter().map(|source| (&source.id, source)).collect(),
        }
    }

    /// Cited evidence that exists, in citation order
    pub fn cited(&self, verdict: &ClaimVerdict) -> Vec<&'a EvidenceItem> {
        verdict
            .cited_evidence
            .iter()
            .filter_map(|id| self.evidence.get(id).copied())
            .collect()
    }

    /// Reliability of a source, when scored
    pub fn reliability(&self, source_id: &SourceId) -> Option<f64> {
        self.sources
            .get(source_id)
            .and_then(|source| source.reliability)
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(0.0, 1.0))
    }
}

/// Reliability profile of the sources behind one verdict
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuality {
    /// Distinct cited sources
    pub source_count: usize,

    /// Cited sources without a reliability score
    pub unknown_count: usize,

    /// Average effective reliability (0.0-1.0)
    pub effective_reliability: f64,
}

impl SourceQuality {
    /// Share of cited sources that are unknown; 1.0 when nothing is cited
    pub fn unknown_share(&self) -> f64 {
        if self.source_count == 0 {
            1.0
        } else {
            self.unknown_count as f64 / self.source_count as f64
        }
    }
}

/// Profile the distinct sources cited by `verdict`
pub fn source_quality(verdict: &ClaimVerdict, index: &EvidenceIndex<'_>, config: &CalibrationConfig) -> SourceQuality {
    let mut seen = HashSet::new();
    let mut total = 0.0;
    let mut unknown_count = 0;
    for item in index.cited(verdict) {
        if !seen.insert(&item.source_id) {
            continue;
        }
        match index.reliability(&item.source_id) {
            Some(score) => total += score,
            None => {
                unknown_count += 1;
                total += config.unknown_source_weight;
            }
        }
    }

    let source_count = seen.len();
    let effective_reliability = if source_count == 0 {
        config.unknown_source_weight
    } else {
        total / source_count as f64
    };

    SourceQuality {
        source_count,
        unknown_count,
        effective_reliability,
    }
}

/// Pull the truth percentage toward 50 in proportion to source reliability
///
/// `truth' = 50 + (truth - 50) × reliability`. Confidence drops by the
/// configured penalty scaled by the unknown-source share. Returns false
/// when the verdict was already weighted.
pub fn apply_evidence_weighting(verdict: &mut ClaimVerdict, quality: &SourceQuality, config: &CalibrationConfig) -> bool {
    if verdict.applied.evidence_weighting {
        return false;
    }
    let truth = 50.0 + (verdict.truth_percentage - 50.0) * quality.effective_reliability;
    verdict.truth_percentage = clamp_percentage(truth);
    verdict.confidence =
        clamp_percentage(verdict.confidence - config.unknown_confidence_penalty * quality.unknown_share());
    verdict.applied.evidence_weighting = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use veracity_domain::EvidenceCandidate;

    fn cited_verdict(truth: f64, items: &[EvidenceItem]) -> ClaimVerdict {
        ClaimVerdict::new("C1", truth, 80.0).citing(items.iter().map(|item| item.id.clone()))
    }

    #[test]
    fn test_reliable_sources_keep_percentage() {
        let source = FetchedSource::fetched("https://court.gov/ruling", "Ruling", "text").with_reliability(Some(1.0));
        let item = EvidenceCandidate::new("The court ruled.").into_evidence(&source, None);
        let evidence = vec![item];
        let sources = vec![source];
        let index = EvidenceIndex::new(&evidence, &sources);
        let config = CalibrationConfig::default();

        let mut verdict = cited_verdict(90.0, &evidence);
        let quality = source_quality(&verdict, &index, &config);
        assert_eq!(quality.source_count, 1);
        assert_eq!(quality.unknown_count, 0);

        assert!(apply_evidence_weighting(&mut verdict, &quality, &config));
        assert_eq!(verdict.truth_percentage, 90.0);
        assert_eq!(verdict.confidence, 80.0);
    }

    #[test]
    fn test_weak_sources_pull_toward_middle() {
        let source = FetchedSource::fetched("https://blog.example/post", "Post", "text").with_reliability(Some(0.5));
        let item = EvidenceCandidate::new("Someone said so.").into_evidence(&source, None);
        let evidence = vec![item];
        let sources = vec![source];
        let index = EvidenceIndex::new(&evidence, &sources);
        let config = CalibrationConfig::default();

        let mut verdict = cited_verdict(90.0, &evidence);
        let quality = source_quality(&verdict, &index, &config);
        apply_evidence_weighting(&mut verdict, &quality, &config);
        assert_eq!(verdict.truth_percentage, 70.0);
    }

    #[test]
    fn test_unknown_sources_lower_confidence() {
        let known = FetchedSource::fetched("https://a.org", "A", "text").with_reliability(Some(0.9));
        let unknown = FetchedSource::fetched("https://b.org", "B", "text");
        let evidence = vec![
            EvidenceCandidate::new("First.").into_evidence(&known, None),
            EvidenceCandidate::new("Second.").into_evidence(&unknown, None),
        ];
        let sources = vec![known, unknown];
        let index = EvidenceIndex::new(&evidence, &sources);
        let config = CalibrationConfig::default();

        let mut verdict = cited_verdict(80.0, &evidence);
        let quality = source_quality(&verdict, &index, &config);
        assert_eq!(quality.source_count, 2);
        assert_eq!(quality.unknown_share(), 0.5);
        assert!((quality.effective_reliability - 0.7).abs() < 1e-9);

        apply_evidence_weighting(&mut verdict, &quality, &config);
        assert!((verdict.truth_percentage - 71.0).abs() < 1e-9);
        assert!((verdict.confidence - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncited_verdict_weighted_as_unknown() {
        let index = EvidenceIndex::new(&[], &[]);
        let config = CalibrationConfig::default();
        let mut verdict = ClaimVerdict::new("C1", 100.0, 50.0);
        let quality = source_quality(&verdict, &index, &config);
        assert_eq!(quality.unknown_share(), 1.0);

        apply_evidence_weighting(&mut verdict, &quality, &config);
        assert_eq!(verdict.truth_percentage, 75.0);
        assert_eq!(verdict.confidence, 30.0);
    }

    #[test]
    fn test_weighting_applied_once() {
        let index = EvidenceIndex::new(&[], &[]);
        let config = CalibrationConfig::default();
        let mut verdict = ClaimVerdict::new("C1", 100.0, 50.0);
        let quality = source_quality(&verdict, &index, &config);

        assert!(apply_evidence_weighting(&mut verdict, &quality, &config));
        let once = verdict.clone();
        assert!(!apply_evidence_weighting(&mut verdict, &quality, &config));
        assert_eq!(verdict, once);
    }
}
