//! Seven-band rating scale

use crate::config::CalibrationConfig;
use crate::error::VerdictError;
use veracity_domain::RatingBand;

/// Clamp a percentage into [0, 100]
pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Reject NaN and infinities, then clamp
pub fn checked_percentage(value: f64, field: impl Into<String>) -> Result<f64, VerdictError> {
    if !value.is_finite() {
        return Err(VerdictError::NonFinite {
            field: field.into(),
            value,
        });
    }
    Ok(clamp_percentage(value))
}

/// Band for a truth percentage
///
/// The middle band splits on confidence: MIXED when the evidence is
/// balanced (confidence at or above the threshold), UNVERIFIED otherwise.
pub fn rate(truth_percentage: f64, confidence: f64, config: &CalibrationConfig) -> RatingBand {
    let truth = clamp_percentage(truth_percentage);
    let bands = &config.bands;
    if truth >= bands.true_min {
        RatingBand::True
    } else if truth >= bands.mostly_true_min {
        RatingBand::MostlyTrue
    } else if truth >= bands.leaning_true_min {
        RatingBand::LeaningTrue
    } else if truth >= bands.mixed_min {
        if clamp_percentage(confidence) >= config.mixed_confidence_threshold {
            RatingBand::Mixed
        } else {
            RatingBand::Unverified
        }
    } else if truth >= bands.leaning_false_min {
        RatingBand::LeaningFalse
    } else if truth >= bands.mostly_false_min {
        RatingBand::MostlyFalse
    } else {
        RatingBand::False
    }
}

/// Whether a percentage falls in one of the three true bands
pub fn is_true_band(truth_percentage: f64, config: &CalibrationConfig) -> bool {
    truth_percentage >= config.bands.leaning_true_min
}

/// Whether a percentage falls in the middle band
pub fn is_middle_band(truth_percentage: f64, config: &CalibrationConfig) -> bool {
    truth_percentage >= config.bands.mixed_min && truth_percentage < config.bands.leaning_true_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_edges() {
        let config = CalibrationConfig::default();
        assert_eq!(rate(86.0, 50.0, &config), RatingBand::True);
        assert_eq!(rate(85.0, 50.0, &config), RatingBand::MostlyTrue);
        assert_eq!(rate(72.0, 50.0, &config), RatingBand::MostlyTrue);
        assert_eq!(rate(71.0, 50.0, &config), RatingBand::LeaningTrue);
        assert_eq!(rate(58.0, 50.0, &config), RatingBand::LeaningTrue);
        assert_eq!(rate(42.0, 50.0, &config), RatingBand::LeaningFalse);
        assert_eq!(rate(29.0, 50.0, &config), RatingBand::LeaningFalse);
        assert_eq!(rate(28.0, 50.0, &config), RatingBand::MostlyFalse);
        assert_eq!(rate(15.0, 50.0, &config), RatingBand::MostlyFalse);
        assert_eq!(rate(14.0, 50.0, &config), RatingBand::False);
    }

    #[test]
    fn test_middle_band_split_by_confidence() {
        let config = CalibrationConfig::default();
        assert_eq!(rate(55.0, 80.0, &config), RatingBand::Mixed);
        assert_eq!(rate(55.0, 40.0, &config), RatingBand::Unverified);
        assert_eq!(rate(55.0, 60.0, &config), RatingBand::Mixed);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let config = CalibrationConfig::default();
        assert_eq!(rate(140.0, 90.0, &config), RatingBand::True);
        assert_eq!(rate(-3.0, 90.0, &config), RatingBand::False);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            checked_percentage(f64::NAN, "truth"),
            Err(VerdictError::NonFinite { .. })
        ));
        assert!(checked_percentage(f64::INFINITY, "truth").is_err());
        assert_eq!(checked_percentage(120.0, "truth").unwrap(), 100.0);
    }

    fn middle_rank(band: RatingBand) -> u8 {
        match band {
            RatingBand::Unverified => 0,
            _ => 1,
        }
    }

    proptest! {
        #[test]
        fn prop_rank_monotonic_in_truth(a in -20.0f64..120.0, b in -20.0f64..120.0, conf in 0.0f64..100.0) {
            let config = CalibrationConfig::default();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rate(low, conf, &config).rank() <= rate(high, conf, &config).rank());
        }

        #[test]
        fn prop_middle_band_monotonic_in_confidence(truth in 43.0f64..58.0, a in 0.0f64..100.0, b in 0.0f64..100.0) {
            let config = CalibrationConfig::default();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(middle_rank(rate(truth, low, &config)) <= middle_rank(rate(truth, high, &config)));
        }

        #[test]
        fn prop_rating_is_deterministic(truth in 0.0f64..100.0, conf in 0.0f64..100.0) {
            let config = CalibrationConfig::default();
            prop_assert_eq!(rate(truth, conf, &config), rate(truth, conf, &config));
        }
    }
}
