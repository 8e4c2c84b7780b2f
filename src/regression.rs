//! Least-squares fitting of personalized velocity models
//!
//! Each exercise is calibrated with three sets at known intensities. A
//! straight line is fitted through the (velocity, %1RM) pairs and its slope
//! is forced to be non-positive: moving the bar faster never means lifting a
//! larger share of the 1RM.

use crate::error::RegressionError;
use crate::models::{CalibrationPoint, ExerciseCalibration, LinearModel, RegressionCoefficients};
use tracing::{debug, warn};

/// Denominators below this magnitude are treated as zero velocity variance
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Ordinary least-squares fitter for calibration points
pub struct RegressionEngine;

impl RegressionEngine {
    /// Fit `%1RM = slope * velocity + intercept` through three calibration points.
    ///
    /// Both coefficients are rounded to three decimals so that stored and
    /// recomputed models compare equal.
    ///
    /// # Errors
    /// * `InvalidPoint` if a velocity is not positive or a percentage is outside `(0, 100]`
    /// * `DegenerateModel` if every point has the same velocity
    pub fn fit(points: &[CalibrationPoint; 3]) -> Result<LinearModel, RegressionError> {
        Self::validate_points(points)?;

        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|p| p.velocity).sum();
        let sum_y: f64 = points.iter().map(|p| p.percentage).sum();
        let sum_xy: f64 = points.iter().map(|p| p.velocity * p.percentage).sum();
        let sum_xx: f64 = points.iter().map(|p| p.velocity * p.velocity).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if Self::velocities_identical(points) || denominator.abs() < DEGENERATE_EPSILON {
            return Err(RegressionError::DegenerateModel {
                velocity: points[0].velocity,
            });
        }

        let mut slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        if slope > 0.0 {
            warn!(
                fitted_slope = slope,
                "Calibration produced a positive slope, flipping its sign"
            );
            slope = -slope;
        }

        let model = LinearModel::new(round3(slope), round3(intercept));
        debug!(slope = model.slope, intercept = model.intercept, "Fitted velocity model");

        Ok(model)
    }

    /// Fit every exercise of a calibration.
    ///
    /// Fails on the first exercise that cannot be fitted, naming it in the error.
    pub fn fit_all(
        calibration: &ExerciseCalibration,
    ) -> Result<RegressionCoefficients, RegressionError> {
        calibration.try_map(|exercise, points| {
            Self::fit(points).map_err(|source| RegressionError::Exercise {
                exercise,
                source: Box::new(source),
            })
        })
    }

    fn validate_points(points: &[CalibrationPoint; 3]) -> Result<(), RegressionError> {
        for (index, point) in points.iter().enumerate() {
            if !point.velocity.is_finite() || point.velocity <= 0.0 {
                return Err(RegressionError::InvalidPoint {
                    index,
                    reason: format!("velocity must be positive, got {}", point.velocity),
                });
            }
            if !point.percentage.is_finite()
                || point.percentage <= 0.0
                || point.percentage > 100.0
            {
                return Err(RegressionError::InvalidPoint {
                    index,
                    reason: format!("percentage must be in (0, 100], got {}", point.percentage),
                });
            }
        }
        Ok(())
    }

    fn velocities_identical(points: &[CalibrationPoint; 3]) -> bool {
        points.iter().all(|p| p.velocity == points[0].velocity)
    }
}

/// Round to three decimal places
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
