use tempfile::tempdir;
use vbtrs::config::{AppConfig, StorageBackend, StorageSettings};
use vbtrs::error::{EstimationError, VbtError};
use vbtrs::{
    CalculationInput, CalibrationStore, DefaultCoefficients, Exercise, ExerciseCalibration,
    IntensityLevel, KeyValueStore, LinearModel, LoadEstimator, MemoryStore, RegressionCoefficients,
    SqliteStore, ZoneCalculator,
};

// Integration tests that exercise the calibrate -> persist -> estimate workflow

fn sample_calibration() -> ExerciseCalibration {
    ExerciseCalibration::from_velocities(
        [0.45, 0.52, 0.66],  // squat
        [0.8, 0.9, 1.0],     // bench press
        [0.30, 0.37, 0.50],  // deadlift
    )
}

fn bench_reading(target_percentage: f64) -> CalculationInput {
    CalculationInput {
        load: 100.0,
        velocity: 0.8,
        exercise: Exercise::BenchPress,
        target_percentage,
    }
}

#[test]
fn test_complete_sqlite_workflow() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("vbt.db");

    let saved = {
        let backend = SqliteStore::open(&db_path).unwrap();
        let mut store = CalibrationStore::new(backend, DefaultCoefficients::default());
        assert!(!store.status().is_personalized);

        let outcome = store.save(&sample_calibration()).unwrap();
        assert!(outcome.is_persisted());
        outcome.coefficients
    };

    // A new process sees the same calibration and model
    let backend = SqliteStore::open(&db_path).unwrap();
    let store = CalibrationStore::new(backend, DefaultCoefficients::default());
    assert_eq!(store.load(), Some(sample_calibration()));
    assert_eq!(store.active_coefficients(), saved);
    assert!(store.status().is_personalized);

    let bench = saved[Exercise::BenchPress];
    assert_eq!(bench.slope, -75.0);
    assert!((bench.intercept - 150.833).abs() < 1e-9);

    let coefficients = store.active_coefficients();
    let result = LoadEstimator::estimate(&bench_reading(85.0), &coefficients).unwrap();
    // 150.833 - 60 = 90.833 %1RM
    assert!((result.percent1_rm - 90.833).abs() < 1e-6);
    assert!((result.estimated_1rm - 100.0 / 0.90833).abs() < 1e-6);
}

#[test]
fn test_clear_returns_to_generic_model() {
    let defaults = DefaultCoefficients::default();
    let mut store = CalibrationStore::new(MemoryStore::new(), defaults);

    store.save(&sample_calibration()).unwrap();
    assert_ne!(store.active_coefficients(), *defaults.coefficients());

    store.clear().unwrap();
    assert!(!store.has_personalized_model());
    assert_eq!(store.active_coefficients(), *defaults.coefficients());
    assert!(store.status().message.contains("generic"));
}

#[test]
fn test_reference_estimate_with_supplied_coefficients() {
    let model = LinearModel::new(-75.0, 150.0);
    let coefficients = RegressionCoefficients::new(model, model, model);

    let result = LoadEstimator::estimate(&bench_reading(85.0), &coefficients).unwrap();
    assert!((result.percent1_rm - 90.0).abs() < 1e-9);
    assert!((result.estimated_1rm - 111.11).abs() < 0.01);
    assert!((result.estimated_load - 94.44).abs() < 0.01);
    assert_eq!(ZoneCalculator::intensity_level(result.percent1_rm), IntensityLevel::Maximal);

    let full = LoadEstimator::estimate(&bench_reading(100.0), &coefficients).unwrap();
    assert_eq!(full.estimated_load, full.estimated_1rm);
}

#[test]
fn test_configured_defaults_drive_estimates() {
    let model = LinearModel::new(-50.0, 100.0);
    let defaults =
        DefaultCoefficients::new(RegressionCoefficients::new(model, model, model)).unwrap();
    let store = CalibrationStore::new(MemoryStore::new(), defaults);

    // -50 * 2.0 + 100 = 0 %1RM
    let reading = CalculationInput {
        load: 80.0,
        velocity: 2.0,
        exercise: Exercise::Deadlift,
        target_percentage: 90.0,
    };
    let err = LoadEstimator::estimate(&reading, &store.active_coefficients()).unwrap_err();
    assert!(matches!(
        err,
        EstimationError::DivisionByZeroModel { exercise: Exercise::Deadlift, .. }
    ));
    assert!(VbtError::from(err).user_message().contains("Deadlift"));
}

#[test]
fn test_corrupted_coefficients_do_not_break_estimates() {
    let mut backend = MemoryStore::new();
    backend.set(vbtrs::store::COEFFICIENTS_KEY, "[1, 2, 3]").unwrap();
    let store = CalibrationStore::new(backend, DefaultCoefficients::default());

    let coefficients = store.active_coefficients();
    assert_eq!(coefficients, *DefaultCoefficients::default().coefficients());
    assert!(LoadEstimator::estimate(&bench_reading(80.0), &coefficients).is_ok());
}

#[test]
fn test_storage_settings_open_backends() {
    let temp_dir = tempdir().unwrap();

    let sqlite = StorageSettings {
        backend: StorageBackend::Sqlite,
        database_path: temp_dir.path().join("data").join("vbt.db"),
    };
    let mut store = CalibrationStore::new(sqlite.open().unwrap(), DefaultCoefficients::default());
    store.save(&sample_calibration()).unwrap();
    assert!(temp_dir.path().join("data").join("vbt.db").exists());

    let memory = StorageSettings {
        backend: StorageBackend::Memory,
        database_path: temp_dir.path().join("unused.db"),
    };
    let store = CalibrationStore::new(memory.open().unwrap(), AppConfig::default().defaults);
    assert!(!store.has_personalized_model());
}
