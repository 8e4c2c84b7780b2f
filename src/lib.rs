// Library interface for vbtrs modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod defaults;
pub mod error;
pub mod estimator;
pub mod logging;
pub mod models;
pub mod regression;
pub mod store;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use defaults::DefaultCoefficients;
pub use estimator::LoadEstimator;
pub use regression::RegressionEngine;
pub use store::{
    CalibrationStore, ConfigurationStatus, KeyValueStore, MemoryStore, Persisted, SaveOutcome,
    SqliteStore,
};
pub use zones::{IntensityLevel, VelocityZone, ZoneCalculator};
pub use error::{VbtError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
