//! Persistence of calibrations and the models derived from them
//!
//! The raw calibration and its fitted coefficients are stored under two keys
//! of a key-value backend and always move together: they are written as a
//! pair on save and removed as a pair on clear. Reads never fail the caller;
//! missing or corrupted data falls back to the generic model.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::defaults::DefaultCoefficients;
use crate::error::{PersistenceError, RegressionError};
use crate::models::{ExerciseCalibration, RegressionCoefficients};
use crate::regression::RegressionEngine;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

/// Key holding the raw calibration points
pub const CALIBRATION_KEY: &str = "vbt_personalized_data";

/// Key holding the fitted coefficients
pub const COEFFICIENTS_KEY: &str = "vbt_regression_coefficients";

/// Minimal string key-value backend
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

/// Outcome of reading a persisted record
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted<T> {
    /// Stored and parsed successfully
    Present(T),
    /// Nothing stored under the key
    Absent,
    /// Something is stored but it does not parse
    Malformed { reason: String },
}

impl<T> Persisted<T> {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Persisted::Malformed { .. })
    }
}

/// Result of saving a calibration
#[derive(Debug)]
pub struct SaveOutcome {
    /// Coefficients fitted from the calibration
    pub coefficients: RegressionCoefficients,

    /// Set when the backend rejected the write; the coefficients are still usable
    pub write_failure: Option<PersistenceError>,
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        self.write_failure.is_none()
    }
}

/// Whether the personalized or the generic model is in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationStatus {
    pub is_personalized: bool,
    pub message: String,
}

/// Stores per-exercise calibrations and serves the active model
pub struct CalibrationStore<S> {
    backend: S,
    defaults: DefaultCoefficients,
}

impl<S: KeyValueStore> CalibrationStore<S> {
    pub fn new(backend: S, defaults: DefaultCoefficients) -> Self {
        Self { backend, defaults }
    }

    pub fn defaults(&self) -> &DefaultCoefficients {
        &self.defaults
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Fit and persist a calibration.
    ///
    /// Every exercise is fitted before anything is written, so a degenerate
    /// calibration leaves the store untouched. If the backend cannot be read
    /// or rejects a write, the stored pair is left as it was and the failure
    /// is reported in the outcome alongside the freshly fitted coefficients.
    pub fn save(
        &mut self,
        calibration: &ExerciseCalibration,
    ) -> Result<SaveOutcome, RegressionError> {
        let coefficients = RegressionEngine::fit_all(calibration)?;

        let write_failure = self.write_pair(calibration, &coefficients).err();
        match &write_failure {
            None => info!("Saved personalized calibration"),
            Some(err) => warn!(error = %err, "Calibration fitted but not persisted"),
        }

        Ok(SaveOutcome {
            coefficients,
            write_failure,
        })
    }

    fn write_pair(
        &mut self,
        calibration: &ExerciseCalibration,
        coefficients: &RegressionCoefficients,
    ) -> Result<(), PersistenceError> {
        let calibration_json = serde_json::to_string(calibration)?;
        let coefficients_json = serde_json::to_string(coefficients)?;

        // Without the previous value a failed save could not be rolled back
        let previous = self.backend.get(CALIBRATION_KEY)?;

        self.backend.set(CALIBRATION_KEY, &calibration_json)?;

        if let Err(err) = self.backend.set(COEFFICIENTS_KEY, &coefficients_json) {
            self.restore_calibration(previous.as_deref());
            return Err(err);
        }

        Ok(())
    }

    fn restore_calibration(&mut self, previous: Option<&str>) {
        let restored = match previous {
            Some(value) => self.backend.set(CALIBRATION_KEY, value),
            None => self.backend.remove(CALIBRATION_KEY),
        };

        if let Err(err) = restored {
            // Coefficients no longer match the stored calibration; dropping
            // them makes the active model get refitted from the calibration.
            error!(error = %err, "Failed to restore previous calibration");
            if let Err(err) = self.backend.remove(COEFFICIENTS_KEY) {
                error!(error = %err, "Failed to drop stale coefficients");
            }
        }
    }

    /// Stored calibration, if any.
    ///
    /// Corrupted or unreadable data is logged and reported as absent.
    pub fn load(&self) -> Option<ExerciseCalibration> {
        match self.calibration_state() {
            Ok(Persisted::Present(calibration)) => Some(calibration),
            Ok(Persisted::Absent) => None,
            Ok(Persisted::Malformed { reason }) => {
                let err = PersistenceError::Malformed {
                    key: CALIBRATION_KEY.to_string(),
                    reason,
                };
                warn!(error = %err, "Ignoring malformed calibration");
                None
            }
            Err(err) => {
                warn!(error = %err, "Could not read calibration");
                None
            }
        }
    }

    /// Tagged read of the stored calibration
    pub fn calibration_state(&self) -> Result<Persisted<ExerciseCalibration>, PersistenceError> {
        self.read(CALIBRATION_KEY)
    }

    /// Tagged read of the stored coefficients
    pub fn coefficients_state(
        &self,
    ) -> Result<Persisted<RegressionCoefficients>, PersistenceError> {
        self.read(COEFFICIENTS_KEY)
    }

    /// Coefficients to estimate with: personalized when available, generic otherwise
    pub fn active_coefficients(&self) -> RegressionCoefficients {
        match self.coefficients_state() {
            Ok(Persisted::Present(coefficients)) => coefficients,
            Ok(Persisted::Absent) => self.refit_from_calibration(),
            Ok(Persisted::Malformed { reason }) => {
                let err = PersistenceError::Malformed {
                    key: COEFFICIENTS_KEY.to_string(),
                    reason,
                };
                warn!(error = %err, "Ignoring malformed coefficients, using defaults");
                *self.defaults.coefficients()
            }
            Err(err) => {
                warn!(error = %err, "Could not read coefficients, using defaults");
                *self.defaults.coefficients()
            }
        }
    }

    fn refit_from_calibration(&self) -> RegressionCoefficients {
        let Some(calibration) = self.load() else {
            return *self.defaults.coefficients();
        };

        match RegressionEngine::fit_all(&calibration) {
            Ok(coefficients) => {
                info!("Coefficients missing, refitted from stored calibration");
                coefficients
            }
            Err(err) => {
                warn!(error = %err, "Stored calibration cannot be fitted, using defaults");
                *self.defaults.coefficients()
            }
        }
    }

    pub fn has_personalized_model(&self) -> bool {
        self.load().is_some()
    }

    /// Remove the calibration and its coefficients.
    ///
    /// Coefficients go first: if removing the calibration then fails, the
    /// active model is refitted from the calibration that is still stored.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.backend.remove(COEFFICIENTS_KEY)?;
        self.backend.remove(CALIBRATION_KEY)?;
        info!("Cleared personalized calibration");
        Ok(())
    }

    pub fn status(&self) -> ConfigurationStatus {
        let is_personalized = self.has_personalized_model();
        let message = if is_personalized {
            "Using your personalized VBT values"
        } else {
            "You are using generic values"
        };

        ConfigurationStatus {
            is_personalized,
            message: message.to_string(),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Persisted<T>, PersistenceError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(Persisted::Absent);
        };

        Ok(match serde_json::from_str(&raw) {
            Ok(value) => Persisted::Present(value),
            Err(err) => Persisted::Malformed {
                reason: err.to_string(),
            },
        })
    }
}
