//! Integration tests for the calibrator

#[cfg(test)]
mod tests {
    use crate::{CalibrationConfig, VerdictCalibrator, VerdictError};
    use proptest::prelude::*;
    use std::sync::Arc;
    use veracity_domain::{
        AnalysisContext, CapabilityError, Centrality, Claim, ClaimId, ClaimVerdict, EvidenceCandidate, EvidenceItem,
        EvidencePolarity, FetchedSource, GeneratedVerdicts, HolisticVerdict, RatingBand, WarningKind,
    };
    use veracity_llm::{MockDirectionValidator, RetryPolicy};

    fn evidence_from(url: &str, reliability: Option<f64>, statement: &str) -> (FetchedSource, EvidenceItem) {
        let source = FetchedSource::fetched(url, "title", "text").with_reliability(reliability);
        let item = EvidenceCandidate::new(statement).into_evidence(&source, None);
        (source, item)
    }

    fn calibrator() -> VerdictCalibrator {
        VerdictCalibrator::new(CalibrationConfig::default()).unwrap()
    }

    fn generated(verdicts: Vec<ClaimVerdict>) -> GeneratedVerdicts {
        GeneratedVerdicts {
            claim_verdicts: verdicts,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failed_prerequisite_excludes_dependent() {
        let claims = vec![
            Claim::new("C1", "The permit was issued"),
            Claim::new("C2", "The permit was issued legally")
                .with_centrality(Centrality::High)
                .depending_on("C1"),
        ];
        let verdicts = vec![ClaimVerdict::new("C1", 20.0, 80.0), ClaimVerdict::new("C2", 90.0, 80.0)];

        let result = calibrator()
            .calibrate(generated(verdicts), &claims, &[], &[], &[])
            .await
            .unwrap();

        assert_eq!(result.claim_verdicts.len(), 2);
        let c2 = &result.claim_verdicts[1];
        assert!(c2.dependency_failed);
        assert_eq!(c2.failed_dependencies, vec![ClaimId::from("C1")]);
        assert_eq!(c2.evidence_weight, 0.0);
        assert_eq!(result.summary.key_factors.len(), 1);
        assert_eq!(result.summary.key_factors[0].claim_id, ClaimId::from("C1"));
    }

    #[tokio::test]
    async fn test_holistic_anchored_to_claims_average() {
        let (source, item) = evidence_from("https://stats.gov/report", Some(1.0), "Output fell 3 percent.");
        let claims = vec![Claim::new("C1", "Output rose").with_centrality(Centrality::High)];
        let verdicts = vec![ClaimVerdict::new("C1", 40.0, 100.0).citing([item.id.clone()])];
        let input = GeneratedVerdicts {
            claim_verdicts: verdicts,
            context_verdicts: Vec::new(),
            article_verdict: Some(HolisticVerdict {
                context_id: None,
                truth_percentage: 90.0,
                confidence: 80.0,
            }),
        };

        let result = calibrator()
            .calibrate(input, &claims, &[], &[item], &[source])
            .await
            .unwrap();

        assert_eq!(result.summary.claims_average, Some(40.0));
        assert_eq!(result.summary.holistic, Some(90.0));
        assert!(result.summary.anchored);
        assert_eq!(result.summary.truth_percentage, 60.0);
        assert_eq!(result.summary.rating, RatingBand::LeaningTrue);
    }

    #[tokio::test]
    async fn test_single_claim_summary_equals_claim() {
        let (source, item) = evidence_from("https://court.gov/ruling", Some(1.0), "The court upheld the law.");
        let claims = vec![Claim::new("C1", "The law was upheld").with_centrality(Centrality::High)];
        let verdicts = vec![ClaimVerdict::new("C1", 83.0, 100.0).citing([item.id.clone()])];

        let result = calibrator()
            .calibrate(generated(verdicts), &claims, &[], &[item], &[source])
            .await
            .unwrap();

        assert_eq!(result.claim_verdicts[0].truth_percentage, 83.0);
        assert_eq!(result.summary.truth_percentage, 83.0);
        assert!(!result.summary.anchored);
        assert!(result.fallbacks.is_empty());
    }

    fn idempotence_fixture() -> (Vec<Claim>, Vec<AnalysisContext>, Vec<EvidenceItem>, Vec<FetchedSource>, Vec<ClaimVerdict>) {
        let (s1, e1) = evidence_from("https://a.gov/1", Some(0.9), "Statement one.");
        let (s2, e2) = evidence_from("https://b.org/2", Some(1.0), "Statement two.");
        let claims = vec![
            Claim::new("C1", "Core claim")
                .with_centrality(Centrality::High)
                .in_context("CTX_A"),
            Claim::new("C2", "Ambiguous claim").in_context("CTX_A"),
            {
                let mut counter = Claim::new("C3", "Opposite claim")
                    .with_centrality(Centrality::Low)
                    .in_context("CTX_A");
                counter.is_counter_claim = true;
                counter
            },
            Claim::new("C4", "Loose claim").with_centrality(Centrality::Low),
        ];
        let contexts = vec![AnalysisContext::new("CTX_A", "Main", "Main proceeding")];
        let verdicts = vec![
            ClaimVerdict::new("C1", 90.0, 90.0).citing([e1.id.clone()]),
            ClaimVerdict::new("C2", 50.0, 70.0).citing([e2.id.clone()]),
            ClaimVerdict::new("C3", 50.0, 60.0).citing([e2.id.clone()]),
            ClaimVerdict::new("C4", 80.0, 50.0),
        ];
        (claims, contexts, vec![e1, e2], vec![s1, s2], verdicts)
    }

    #[tokio::test]
    async fn test_corrections_applied_once() {
        let (claims, contexts, evidence, sources, verdicts) = idempotence_fixture();
        let validator = MockDirectionValidator::new();
        validator.add_mismatch("C4", EvidencePolarity::False);
        let calibrator = calibrator().with_direction_validation(Arc::new(validator.clone()));

        let first = calibrator
            .calibrate(generated(verdicts), &claims, &contexts, &evidence, &sources)
            .await
            .unwrap();

        let by_id = |id: &str| {
            first
                .claim_verdicts
                .iter()
                .find(|v| v.claim_id == ClaimId::from(id))
                .unwrap()
                .clone()
        };
        assert_eq!(by_id("C1").truth_percentage, 86.0);
        // Middle-band claim in a context leaning true is nudged up
        assert_eq!(by_id("C2").truth_percentage, 55.0);
        assert!(by_id("C2").applied.context_boost);
        // Counter-claims are exempt
        assert_eq!(by_id("C3").truth_percentage, 50.0);
        assert!(!by_id("C3").applied.context_boost);
        // 80 weighted to 65, then inverted into LEANING-FALSE
        assert_eq!(by_id("C4").truth_percentage, 35.0);
        assert!(by_id("C4").applied.direction_corrected);
        assert_eq!(first.warnings.len(), 1);
        assert_eq!(first.warnings[0].kind, WarningKind::DirectionMismatch);
        assert_eq!(validator.call_count(), 1);

        let second = calibrator
            .calibrate(
                generated(first.claim_verdicts.clone()),
                &claims,
                &contexts,
                &evidence,
                &sources,
            )
            .await
            .unwrap();

        assert_eq!(second.claim_verdicts, first.claim_verdicts);
        assert_eq!(second.context_answers, first.context_answers);
        assert_eq!(second.summary, first.summary);
        assert!(second.warnings.is_empty());
        assert_eq!(validator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_validator_failure_records_fallback() {
        let (claims, contexts, evidence, sources, verdicts) = idempotence_fixture();
        let mut config = CalibrationConfig::default();
        config.direction_retry = RetryPolicy::none();
        let calibrator = VerdictCalibrator::new(config)
            .unwrap()
            .with_direction_validation(Arc::new(MockDirectionValidator::failing(CapabilityError::Failed(
                "validator offline".into(),
            ))));

        let result = calibrator
            .calibrate(generated(verdicts), &claims, &contexts, &evidence, &sources)
            .await
            .unwrap();

        assert!(result.fallbacks.iter().any(|f| f.stage == "verdict.direction"));
        assert!(result.claim_verdicts.iter().all(|v| !v.applied.direction_validation));
        assert_eq!(result.claim_verdicts[3].truth_percentage, 65.0);
    }

    #[tokio::test]
    async fn test_context_without_inputs_defaults_neutral() {
        let contexts = vec![AnalysisContext::new("CTX_EMPTY", "Empty", "Nothing here")];
        let result = calibrator()
            .calibrate(GeneratedVerdicts::default(), &[], &contexts, &[], &[])
            .await
            .unwrap();

        assert_eq!(result.context_answers.len(), 1);
        assert_eq!(result.context_answers[0].truth_percentage, 50.0);
        assert_eq!(result.context_answers[0].confidence, 0.0);
        assert_eq!(result.context_answers[0].rating, RatingBand::Unverified);
        assert!(result.fallbacks.iter().any(|f| f.stage == "aggregate.context.CTX_EMPTY"));
    }

    #[tokio::test]
    async fn test_non_finite_input_fails() {
        let claims = vec![Claim::new("C1", "x")];
        let result = calibrator()
            .calibrate(
                generated(vec![ClaimVerdict::new("C1", f64::NAN, 50.0)]),
                &claims,
                &[],
                &[],
                &[],
            )
            .await;
        assert!(matches!(result, Err(VerdictError::NonFinite { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CalibrationConfig::default();
        config.bands.mixed_min = 60.0;
        assert!(matches!(
            VerdictCalibrator::new(config),
            Err(VerdictError::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_outputs_clamped(
            truths in proptest::collection::vec(-50.0f64..150.0, 1..5),
            conf in -20.0f64..120.0,
            holistic in -50.0f64..150.0,
        ) {
            let claims: Vec<Claim> = (0..truths.len())
                .map(|i| Claim::new(format!("C{i}"), "claim").in_context("CTX"))
                .collect();
            let verdicts = truths
                .iter()
                .enumerate()
                .map(|(i, t)| ClaimVerdict::new(format!("C{i}"), *t, conf))
                .collect();
            let input = GeneratedVerdicts {
                claim_verdicts: verdicts,
                context_verdicts: vec![HolisticVerdict {
                    context_id: Some("CTX".into()),
                    truth_percentage: holistic,
                    confidence: conf,
                }],
                article_verdict: None,
            };
            let contexts = vec![AnalysisContext::new("CTX", "Only", "Only context")];

            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let result = runtime
                .block_on(calibrator().calibrate(input, &claims, &contexts, &[], &[]))
                .unwrap();

            let in_range = |v: f64| (0.0..=100.0).contains(&v);
            for verdict in &result.claim_verdicts {
                prop_assert!(in_range(verdict.truth_percentage));
                prop_assert!(in_range(verdict.confidence));
            }
            prop_assert!(in_range(result.context_answers[0].truth_percentage));
            prop_assert!(in_range(result.summary.truth_percentage));
            prop_assert!(in_range(result.summary.confidence));
        }
    }
}
