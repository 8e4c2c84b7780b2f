//! Generic velocity models used until an athlete calibrates
//!
//! The values come from deployment configuration and are fixed for the
//! lifetime of the process. They are handed to the calibration store
//! explicitly rather than read from global state.

use crate::error::VbtError;
use crate::models::{Exercise, LinearModel, RegressionCoefficients};
use serde::{Deserialize, Serialize};

/// Population-average linear models (%1RM against mean concentric velocity)
const GENERIC_SQUAT: LinearModel = LinearModel {
    slope: -55.6,
    intercept: 116.7,
};
const GENERIC_BENCH_PRESS: LinearModel = LinearModel {
    slope: -60.0,
    intercept: 110.0,
};
const GENERIC_DEADLIFT: LinearModel = LinearModel {
    slope: -58.8,
    intercept: 108.8,
};

/// Immutable fallback model for every exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegressionCoefficients", into = "RegressionCoefficients")]
pub struct DefaultCoefficients {
    coefficients: RegressionCoefficients,
}

impl DefaultCoefficients {
    /// Wrap configured coefficients, rejecting values that would break the model.
    ///
    /// Every slope must be finite and non-positive and every intercept finite.
    pub fn new(coefficients: RegressionCoefficients) -> Result<Self, VbtError> {
        for (exercise, model) in coefficients.iter() {
            Self::validate_model(exercise, model)?;
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &RegressionCoefficients {
        &self.coefficients
    }

    pub fn model(&self, exercise: Exercise) -> &LinearModel {
        &self.coefficients[exercise]
    }

    fn validate_model(exercise: Exercise, model: &LinearModel) -> Result<(), VbtError> {
        if !model.slope.is_finite() || !model.intercept.is_finite() {
            return Err(VbtError::Configuration(format!(
                "default {} coefficients must be finite (slope={}, intercept={})",
                exercise, model.slope, model.intercept
            )));
        }
        if model.slope > 0.0 {
            return Err(VbtError::Configuration(format!(
                "default {} slope must not be positive, got {}",
                exercise, model.slope
            )));
        }
        Ok(())
    }
}

impl Default for DefaultCoefficients {
    fn default() -> Self {
        Self {
            coefficients: RegressionCoefficients::new(
                GENERIC_SQUAT,
                GENERIC_BENCH_PRESS,
                GENERIC_DEADLIFT,
            ),
        }
    }
}

impl TryFrom<RegressionCoefficients> for DefaultCoefficients {
    type Error = VbtError;

    fn try_from(coefficients: RegressionCoefficients) -> Result<Self, Self::Error> {
        Self::new(coefficients)
    }
}

impl From<DefaultCoefficients> for RegressionCoefficients {
    fn from(defaults: DefaultCoefficients) -> Self {
        defaults.coefficients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_are_valid() {
        let defaults = DefaultCoefficients::default();
        assert!(DefaultCoefficients::new(*defaults.coefficients()).is_ok());

        // Slower reps always map to a heavier share of 1RM
        for exercise in Exercise::ALL {
            let model = defaults.model(exercise);
            assert!(model.predict(0.3) > model.predict(0.8));
        }
    }

    #[test]
    fn test_positive_slope_rejected() {
        let mut coefficients = *DefaultCoefficients::default().coefficients();
        coefficients[Exercise::BenchPress].slope = 12.0;

        let err = DefaultCoefficients::new(coefficients).unwrap_err();
        assert!(matches!(err, VbtError::Configuration(msg) if msg.contains("Bench Press")));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut coefficients = *DefaultCoefficients::default().coefficients();
        coefficients[Exercise::Squat].intercept = f64::NAN;

        assert!(DefaultCoefficients::new(coefficients).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "Squat": {"slope": -50.0, "intercept": 115.0},
            "BenchPress": {"slope": 5.0, "intercept": 100.0},
            "Deadlift": {"slope": -55.0, "intercept": 105.0}
        }"#;
        assert!(serde_json::from_str::<DefaultCoefficients>(json).is_err());
    }
}
