use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Barbell lifts supported by the velocity model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exercise {
    Squat,
    BenchPress,
    Deadlift,
}

impl Exercise {
    /// Every supported exercise, in display order
    pub const ALL: [Exercise; 3] = [Exercise::Squat, Exercise::BenchPress, Exercise::Deadlift];

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Exercise::Squat => "Squat",
            Exercise::BenchPress => "Bench Press",
            Exercise::Deadlift => "Deadlift",
        }
    }

    /// Numeric code used by older calculator front-ends (1-based)
    pub fn code(&self) -> u8 {
        match self {
            Exercise::Squat => 1,
            Exercise::BenchPress => 2,
            Exercise::Deadlift => 3,
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Raised when an exercise name or code does not map to a supported lift
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown exercise: {0}")]
pub struct UnknownExercise(pub String);

impl FromStr for Exercise {
    type Err = UnknownExercise;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "squat" => Ok(Exercise::Squat),
            "bench" | "bench-press" | "benchpress" | "bench_press" => Ok(Exercise::BenchPress),
            "deadlift" => Ok(Exercise::Deadlift),
            _ => Err(UnknownExercise(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Exercise {
    type Error = UnknownExercise;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Exercise::Squat),
            2 => Ok(Exercise::BenchPress),
            3 => Ok(Exercise::Deadlift),
            other => Err(UnknownExercise(other.to_string())),
        }
    }
}

/// One value per supported exercise.
///
/// Lookups are exhaustive, so there is no fallback value for an
/// unrecognised lift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PerExercise<T> {
    pub squat: T,
    pub bench_press: T,
    pub deadlift: T,
}

impl<T> PerExercise<T> {
    pub fn new(squat: T, bench_press: T, deadlift: T) -> Self {
        Self {
            squat,
            bench_press,
            deadlift,
        }
    }

    pub fn get(&self, exercise: Exercise) -> &T {
        match exercise {
            Exercise::Squat => &self.squat,
            Exercise::BenchPress => &self.bench_press,
            Exercise::Deadlift => &self.deadlift,
        }
    }

    pub fn get_mut(&mut self, exercise: Exercise) -> &mut T {
        match exercise {
            Exercise::Squat => &mut self.squat,
            Exercise::BenchPress => &mut self.bench_press,
            Exercise::Deadlift => &mut self.deadlift,
        }
    }

    /// Iterate `(exercise, value)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (Exercise, &T)> + '_ {
        Exercise::ALL.into_iter().map(move |exercise| (exercise, self.get(exercise)))
    }

    /// Apply a fallible function to every exercise, stopping at the first error
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Exercise, &T) -> Result<U, E>,
    ) -> Result<PerExercise<U>, E> {
        Ok(PerExercise {
            squat: f(Exercise::Squat, &self.squat)?,
            bench_press: f(Exercise::BenchPress, &self.bench_press)?,
            deadlift: f(Exercise::Deadlift, &self.deadlift)?,
        })
    }
}

impl<T> Index<Exercise> for PerExercise<T> {
    type Output = T;

    fn index(&self, exercise: Exercise) -> &T {
        self.get(exercise)
    }
}

impl<T> IndexMut<Exercise> for PerExercise<T> {
    fn index_mut(&mut self, exercise: Exercise) -> &mut T {
        self.get_mut(exercise)
    }
}

/// Linear velocity -> %1RM model: `%1RM = slope * velocity + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Predicted %1RM at the given mean concentric velocity (m/s)
    pub fn predict(&self, velocity: f64) -> f64 {
        self.slope * velocity + self.intercept
    }
}

/// Observed (velocity, %1RM) pair used to personalize the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Mean concentric velocity in m/s
    pub velocity: f64,

    /// Intensity of the calibration set as a percentage of 1RM
    pub percentage: f64,
}

impl CalibrationPoint {
    pub fn new(velocity: f64, percentage: f64) -> Self {
        Self { velocity, percentage }
    }
}

/// Intensities at which calibration sets are performed
pub const CALIBRATION_PERCENTAGES: [f64; 3] = [90.0, 85.0, 75.0];

/// Three calibration points for each exercise
pub type ExerciseCalibration = PerExercise<[CalibrationPoint; 3]>;

/// Fitted linear model for each exercise
pub type RegressionCoefficients = PerExercise<LinearModel>;

impl ExerciseCalibration {
    /// Build a calibration from velocities measured at 90%, 85% and 75% of 1RM
    pub fn from_velocities(squat: [f64; 3], bench_press: [f64; 3], deadlift: [f64; 3]) -> Self {
        let points = |velocities: [f64; 3]| -> [CalibrationPoint; 3] {
            std::array::from_fn(|i| {
                CalibrationPoint::new(velocities[i], CALIBRATION_PERCENTAGES[i])
            })
        };

        PerExercise::new(points(squat), points(bench_press), points(deadlift))
    }
}

/// A single velocity reading to convert into loads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInput {
    /// Load lifted in the reading (kg)
    pub load: f64,

    /// Mean concentric velocity of the reading (m/s)
    pub velocity: f64,

    pub exercise: Exercise,

    /// Intensity to prescribe a load for, as a percentage of 1RM
    pub target_percentage: f64,
}

/// Output of a load estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Estimated intensity of the reading
    #[serde(rename = "percent1Rm")]
    pub percent1_rm: f64,

    /// Estimated one-repetition maximum
    #[serde(rename = "estimated1RM")]
    pub estimated_1rm: f64,

    /// Load to lift at the requested target percentage
    pub estimated_load: f64,
}

impl CalculationResult {
    /// True when the estimated intensity falls outside `(0, 100]`.
    ///
    /// The numbers are still computed; callers decide how to present them.
    pub fn is_low_confidence(&self) -> bool {
        !(self.percent1_rm > 0.0 && self.percent1_rm <= 100.0)
    }
}
