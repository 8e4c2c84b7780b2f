//! Unified error hierarchy for vbtrs
//!
//! Each concern (model fitting, load estimation, persistence) has its own
//! error enum; `VbtError` wraps them for callers that handle everything in
//! one place.

use crate::models::{Exercise, UnknownExercise};
use thiserror::Error;

/// Top-level error type for all vbtrs operations
#[derive(Debug, Error)]
pub enum VbtError {
    /// Calibration could not be turned into a model
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    /// A reading could not be converted into loads
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    /// Key-value persistence errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Unsupported exercise name or code
    #[error(transparent)]
    UnknownExercise(#[from] UnknownExercise),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fitting a velocity model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    /// All calibration velocities are identical, so no line can be fitted
    #[error("Degenerate model: every calibration point has velocity {velocity} m/s")]
    DegenerateModel { velocity: f64 },

    /// A calibration point is outside the physical domain
    #[error("Invalid calibration point #{index}: {reason}")]
    InvalidPoint { index: usize, reason: String },

    /// Fitting failed for one exercise of a full calibration
    #[error("{exercise}: {source}")]
    Exercise {
        exercise: Exercise,
        #[source]
        source: Box<RegressionError>,
    },
}

impl RegressionError {
    /// True when the underlying cause is zero variance in velocity
    pub fn is_degenerate(&self) -> bool {
        match self {
            RegressionError::DegenerateModel { .. } => true,
            RegressionError::Exercise { source, .. } => source.is_degenerate(),
            RegressionError::InvalidPoint { .. } => false,
        }
    }
}

/// Errors raised while estimating loads from a reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    /// The model predicts exactly 0 %1RM, so the 1RM is undefined
    #[error("Division by zero: {exercise} model predicts 0 %1RM at {velocity} m/s")]
    DivisionByZeroModel { exercise: Exercise, velocity: f64 },

    /// Input outside the accepted domain
    #[error("Invalid input: {parameter}={value}")]
    InvalidInput { parameter: String, value: String },
}

/// Key-value persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend rejected a write
    #[error("Write failed for key '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    /// The backend could not be read
    #[error("Read failed for key '{key}': {reason}")]
    ReadFailed { key: String, reason: String },

    /// A stored value does not match the expected schema
    #[error("Malformed data under key '{key}': {reason}")]
    Malformed { key: String, reason: String },

    /// Backend could not be opened or initialised
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for vbtrs operations
pub type Result<T> = std::result::Result<T, VbtError>;

impl VbtError {
    /// Check if error is retryable.
    ///
    /// Model and estimation errors are deterministic; only IO at the
    /// persistence boundary can succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VbtError::Io(_) | VbtError::Persistence(PersistenceError::ReadFailed { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VbtError::Persistence(PersistenceError::Malformed { .. }) => ErrorSeverity::Warning,
            VbtError::Persistence(PersistenceError::WriteFailed { .. }) => ErrorSeverity::Warning,
            VbtError::Persistence(_) => ErrorSeverity::Error,
            VbtError::Regression(_) => ErrorSeverity::Error,
            VbtError::Estimation(EstimationError::InvalidInput { .. }) => ErrorSeverity::Warning,
            VbtError::Estimation(_) => ErrorSeverity::Error,
            VbtError::UnknownExercise(_) => ErrorSeverity::Warning,
            VbtError::Configuration(_) => ErrorSeverity::Critical,
            VbtError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VbtError::Regression(err) if err.is_degenerate() => {
                "Calibration velocities are all identical. Please record a new calibration \
                 at 90%, 85% and 75% of your 1RM."
                    .to_string()
            }
            VbtError::Regression(RegressionError::Exercise { exercise, source }) => {
                format!("Calibration for {} is invalid: {}", exercise, source)
            }
            VbtError::Estimation(EstimationError::DivisionByZeroModel { exercise, .. }) => {
                format!(
                    "The {} model predicts 0% of 1RM at this velocity, \
                     so no load can be estimated.",
                    exercise
                )
            }
            VbtError::Persistence(PersistenceError::WriteFailed { .. }) => {
                "Your calibration could not be saved. The computed values are still shown \
                 but will not be remembered."
                    .to_string()
            }
            VbtError::Persistence(PersistenceError::Malformed { .. }) => {
                "Stored calibration data is corrupted. Generic values will be used until \
                 you calibrate again."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = VbtError::Persistence(PersistenceError::WriteFailed {
            key: "vbt_regression_coefficients".to_string(),
            reason: "disk full".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = VbtError::Regression(RegressionError::DegenerateModel { velocity: 0.5 });
        assert_eq!(err.severity(), ErrorSeverity::Error);

        let err = VbtError::Configuration("bad slope".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err = VbtError::Estimation(EstimationError::DivisionByZeroModel {
            exercise: Exercise::Squat,
            velocity: 2.0,
        });
        assert!(!err.is_retryable());

        let err = VbtError::Io(std::io::Error::new(std::io::ErrorKind::Other, "busy"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_nested_degenerate_detection() {
        let err = RegressionError::Exercise {
            exercise: Exercise::Deadlift,
            source: Box::new(RegressionError::DegenerateModel { velocity: 0.4 }),
        };
        assert!(err.is_degenerate());
        assert!(err.to_string().starts_with("Deadlift:"));

        let err = VbtError::from(err);
        assert!(err.user_message().contains("identical"));
    }

    #[test]
    fn test_user_messages() {
        let err = VbtError::Estimation(EstimationError::DivisionByZeroModel {
            exercise: Exercise::BenchPress,
            velocity: 1.5,
        });
        assert!(err.user_message().contains("Bench Press"));

        let err = VbtError::from(PersistenceError::Malformed {
            key: "vbt_personalized_data".to_string(),
            reason: "missing field `Squat`".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("corrupted"));
    }
}
