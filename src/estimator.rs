//! Load estimation from a single velocity reading
//!
//! The active model converts the velocity of a set into the share of 1RM
//! it represents. From that share and the load lifted we get the estimated
//! 1RM, and from the 1RM the load for any target intensity:
//!
//! ```text
//! %1RM          = slope * velocity + intercept
//! 1RM           = load / (%1RM / 100)
//! target load   = 1RM * (target% / 100)
//! ```

use crate::error::EstimationError;
use crate::models::{CalculationInput, CalculationResult, RegressionCoefficients};
use tracing::debug;

/// Stateless converter from velocity readings to loads
pub struct LoadEstimator;

impl LoadEstimator {
    /// Estimate %1RM, 1RM and the load at the requested intensity.
    ///
    /// A %1RM outside `(0, 100]` is returned as computed; see
    /// [`CalculationResult::is_low_confidence`].
    pub fn estimate(
        input: &CalculationInput,
        coefficients: &RegressionCoefficients,
    ) -> Result<CalculationResult, EstimationError> {
        Self::validate_input(input)?;

        let percent1_rm = coefficients[input.exercise].predict(input.velocity);
        if percent1_rm == 0.0 {
            return Err(EstimationError::DivisionByZeroModel {
                exercise: input.exercise,
                velocity: input.velocity,
            });
        }

        let estimated_1rm = input.load / (percent1_rm / 100.0);
        let estimated_load = if input.target_percentage == 100.0 {
            estimated_1rm
        } else {
            estimated_1rm * (input.target_percentage / 100.0)
        };

        let result = CalculationResult {
            percent1_rm,
            estimated_1rm,
            estimated_load,
        };

        if result.is_low_confidence() {
            debug!(
                exercise = %input.exercise,
                velocity = input.velocity,
                percent1_rm,
                "Estimated intensity outside (0, 100]"
            );
        }

        Ok(result)
    }

    fn validate_input(input: &CalculationInput) -> Result<(), EstimationError> {
        let invalid = |parameter: &str, value: f64| EstimationError::InvalidInput {
            parameter: parameter.to_string(),
            value: value.to_string(),
        };

        if !input.load.is_finite() || input.load <= 0.0 {
            return Err(invalid("load", input.load));
        }
        if !input.velocity.is_finite() || input.velocity <= 0.0 {
            return Err(invalid("velocity", input.velocity));
        }
        if !input.target_percentage.is_finite()
            || input.target_percentage <= 0.0
            || input.target_percentage > 100.0
        {
            return Err(invalid("target_percentage", input.target_percentage));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, LinearModel};

    fn coefficients(model: LinearModel) -> RegressionCoefficients {
        RegressionCoefficients::new(model, model, model)
    }

    fn input(
        load: f64,
        velocity: f64,
        exercise: Exercise,
        target_percentage: f64,
    ) -> CalculationInput {
        CalculationInput {
            load,
            velocity,
            exercise,
            target_percentage,
        }
    }

    #[test]
    fn test_bench_press_reference_reading() {
        let coefficients = coefficients(LinearModel::new(-75.0, 150.0));
        let reading = input(100.0, 0.8, Exercise::BenchPress, 85.0);
        let result = LoadEstimator::estimate(&reading, &coefficients).unwrap();

        assert!((result.percent1_rm - 90.0).abs() < 1e-9);
        assert!((result.estimated_1rm - 111.11).abs() < 0.01);
        assert!((result.estimated_load - 94.44).abs() < 0.01);
        assert!(!result.is_low_confidence());
    }

    #[test]
    fn test_full_intensity_returns_one_rep_max() {
        let coefficients = coefficients(LinearModel::new(-60.0, 110.0));
        let reading = input(140.0, 0.45, Exercise::Squat, 100.0);
        let result = LoadEstimator::estimate(&reading, &coefficients).unwrap();

        assert_eq!(result.estimated_load, result.estimated_1rm);
    }

    #[test]
    fn test_uses_model_for_requested_exercise() {
        let coefficients = RegressionCoefficients::new(
            LinearModel::new(-50.0, 120.0),
            LinearModel::new(-60.0, 110.0),
            LinearModel::new(-40.0, 100.0),
        );

        let reading = input(200.0, 0.5, Exercise::Deadlift, 80.0);
        let result = LoadEstimator::estimate(&reading, &coefficients).unwrap();
        assert!((result.percent1_rm - 80.0).abs() < 1e-9);
        assert!((result.estimated_1rm - 250.0).abs() < 1e-9);
        assert!((result.estimated_load - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_percent_model_is_an_error() {
        // -50 * 2.0 + 100 = 0
        let coefficients = coefficients(LinearModel::new(-50.0, 100.0));
        let reading = input(100.0, 2.0, Exercise::Squat, 80.0);
        let result = LoadEstimator::estimate(&reading, &coefficients);

        assert_eq!(
            result,
            Err(EstimationError::DivisionByZeroModel {
                exercise: Exercise::Squat,
                velocity: 2.0
            })
        );
    }

    #[test]
    fn test_out_of_range_intensity_not_clamped() {
        let coefficients = coefficients(LinearModel::new(-50.0, 100.0));

        // Very fast rep: model goes negative
        let reading = input(60.0, 2.4, Exercise::BenchPress, 80.0);
        let result = LoadEstimator::estimate(&reading, &coefficients).unwrap();
        assert!((result.percent1_rm + 20.0).abs() < 1e-9);
        assert!(result.estimated_1rm < 0.0);
        assert!(result.is_low_confidence());
    }

    #[test]
    fn test_intensity_above_full_not_clamped() {
        // Grinding rep: -50 * 0.1 + 110 = 105 %1RM
        let coefficients = coefficients(LinearModel::new(-50.0, 110.0));
        let reading = input(63.0, 0.1, Exercise::BenchPress, 80.0);
        let result = LoadEstimator::estimate(&reading, &coefficients).unwrap();
        assert!((result.percent1_rm - 105.0).abs() < 1e-9);
        assert!((result.estimated_1rm - 60.0).abs() < 1e-9);
        assert!((result.estimated_load - 48.0).abs() < 1e-9);
        assert!(result.is_low_confidence());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let coefficients = coefficients(LinearModel::new(-75.0, 150.0));

        let cases = [
            (input(0.0, 0.8, Exercise::Squat, 85.0), "load"),
            (input(100.0, -0.1, Exercise::Squat, 85.0), "velocity"),
            (input(100.0, 0.8, Exercise::Squat, 0.0), "target_percentage"),
            (input(100.0, 0.8, Exercise::Squat, 101.0), "target_percentage"),
            (input(f64::INFINITY, 0.8, Exercise::Squat, 85.0), "load"),
        ];

        for (case, expected) in cases {
            match LoadEstimator::estimate(&case, &coefficients) {
                Err(EstimationError::InvalidInput { parameter, .. }) => {
                    assert_eq!(parameter, expected)
                }
                other => panic!("expected invalid {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let coefficients = coefficients(LinearModel::new(-57.345, 113.219));
        let reading = input(127.5, 0.613, Exercise::Squat, 72.5);

        let first = LoadEstimator::estimate(&reading, &coefficients).unwrap();
        for _ in 0..10 {
            let again = LoadEstimator::estimate(&reading, &coefficients).unwrap();
            assert_eq!(again.percent1_rm.to_bits(), first.percent1_rm.to_bits());
            assert_eq!(again.estimated_1rm.to_bits(), first.estimated_1rm.to_bits());
            assert_eq!(again.estimated_load.to_bits(), first.estimated_load.to_bits());
        }
    }
}
