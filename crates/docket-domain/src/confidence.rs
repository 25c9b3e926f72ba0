//! Confidence helpers
//!
//! Every confidence in Docket is a point value in `[0.0, 1.0]`. Values coming from
//! extraction or answers are clamped on the way in rather than rejected, so a
//! sloppy LLM score can never break the graph invariant.

/// Clamp a confidence into `[0.0, 1.0]`; NaN maps to `0.0`
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Mean of `1 - c` over the given confidences (0.0 for an empty input)
pub fn mean_uncertainty<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = confidences
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), c| (sum + (1.0 - clamp_confidence(c)), count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_confidence(1.5), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.7), 0.7);
    }

    #[test]
    fn test_mean_uncertainty() {
        assert_eq!(mean_uncertainty(Vec::<f64>::new()), 0.0);
        assert!((mean_uncertainty(vec![1.0, 0.5]) - 0.25).abs() < 1e-12);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn clamped_confidence_is_in_unit_interval(value in proptest::num::f64::ANY) {
                let c = clamp_confidence(value);
                prop_assert!((0.0..=1.0).contains(&c));
            }

            #[test]
            fn mean_uncertainty_is_in_unit_interval(values in prop::collection::vec(-2.0f64..2.0, 0..32)) {
                let u = mean_uncertainty(values);
                prop_assert!((0.0..=1.0).contains(&u));
            }
        }
    }
}
