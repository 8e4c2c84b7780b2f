use crate::models::Exercise;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative speed of a repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VelocityZone {
    Explosive,
    Fast,
    Moderate,
    Slow,
}

impl VelocityZone {
    /// Intensity range typically associated with this zone
    pub fn typical_range(&self) -> &'static str {
        match self {
            VelocityZone::Explosive => "30-50% 1RM",
            VelocityZone::Fast => "50-70% 1RM",
            VelocityZone::Moderate => "70-85% 1RM",
            VelocityZone::Slow => "85-100% 1RM",
        }
    }
}

impl fmt::Display for VelocityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VelocityZone::Explosive => "Explosive",
            VelocityZone::Fast => "Fast",
            VelocityZone::Moderate => "Moderate",
            VelocityZone::Slow => "Slow",
        };
        write!(f, "{}", name)
    }
}

/// Lower velocity bounds (m/s) of the explosive, fast and moderate zones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityThresholds {
    pub explosive: f64,
    pub fast: f64,
    pub moderate: f64,
}

/// Training intensity band for an estimated %1RM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityLevel {
    Maximal,
    High,
    ModerateHigh,
    Moderate,
    Low,
}

impl IntensityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            IntensityLevel::Maximal => "Maximal intensity",
            IntensityLevel::High => "High intensity",
            IntensityLevel::ModerateHigh => "Moderate-high intensity",
            IntensityLevel::Moderate => "Moderate intensity",
            IntensityLevel::Low => "Low intensity",
        }
    }

    /// Training focus and rep scheme usually prescribed at this level
    pub fn description(&self) -> &'static str {
        match self {
            IntensityLevel::Maximal => "Maximal strength - sets of 1-3 reps",
            IntensityLevel::High => "Strength - sets of 3-6 reps",
            IntensityLevel::ModerateHigh => "Hypertrophy/strength - sets of 6-10 reps",
            IntensityLevel::Moderate => "Hypertrophy - sets of 8-12 reps",
            IntensityLevel::Low => "Technique/warm-up - sets of 12+ reps",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classification of readings into velocity zones and intensity levels
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Zone boundaries for each exercise.
    ///
    /// - Squat: >= 0.8 explosive, >= 0.65 fast, >= 0.5 moderate
    /// - Bench press: >= 1.0 explosive, >= 0.75 fast, >= 0.6 moderate
    /// - Deadlift: >= 0.7 explosive, >= 0.55 fast, >= 0.4 moderate
    pub fn thresholds(exercise: Exercise) -> VelocityThresholds {
        match exercise {
            Exercise::Squat => VelocityThresholds {
                explosive: 0.8,
                fast: 0.65,
                moderate: 0.5,
            },
            Exercise::BenchPress => VelocityThresholds {
                explosive: 1.0,
                fast: 0.75,
                moderate: 0.6,
            },
            Exercise::Deadlift => VelocityThresholds {
                explosive: 0.7,
                fast: 0.55,
                moderate: 0.4,
            },
        }
    }

    pub fn velocity_zone(exercise: Exercise, velocity: f64) -> VelocityZone {
        let thresholds = Self::thresholds(exercise);

        if velocity >= thresholds.explosive {
            VelocityZone::Explosive
        } else if velocity >= thresholds.fast {
            VelocityZone::Fast
        } else if velocity >= thresholds.moderate {
            VelocityZone::Moderate
        } else {
            VelocityZone::Slow
        }
    }

    pub fn intensity_level(percent1_rm: f64) -> IntensityLevel {
        if percent1_rm >= 90.0 {
            IntensityLevel::Maximal
        } else if percent1_rm >= 80.0 {
            IntensityLevel::High
        } else if percent1_rm >= 70.0 {
            IntensityLevel::ModerateHigh
        } else if percent1_rm >= 60.0 {
            IntensityLevel::Moderate
        } else {
            IntensityLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_zone_boundaries() {
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Squat, 0.8), VelocityZone::Explosive);
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Squat, 0.79), VelocityZone::Fast);
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Squat, 0.5), VelocityZone::Moderate);
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Squat, 0.49), VelocityZone::Slow);
    }

    #[test]
    fn test_velocity_zone_depends_on_exercise() {
        // 0.7 m/s is explosive for a deadlift but only moderate for a bench press
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Deadlift, 0.7), VelocityZone::Explosive);
        assert_eq!(ZoneCalculator::velocity_zone(Exercise::Squat, 0.7), VelocityZone::Fast);
        assert_eq!(
            ZoneCalculator::velocity_zone(Exercise::BenchPress, 0.7),
            VelocityZone::Moderate
        );
        assert_eq!(VelocityZone::Slow.typical_range(), "85-100% 1RM");
    }

    #[test]
    fn test_intensity_levels() {
        assert_eq!(ZoneCalculator::intensity_level(95.0), IntensityLevel::Maximal);
        assert_eq!(ZoneCalculator::intensity_level(90.0), IntensityLevel::Maximal);
        assert_eq!(ZoneCalculator::intensity_level(85.0), IntensityLevel::High);
        assert_eq!(ZoneCalculator::intensity_level(70.0), IntensityLevel::ModerateHigh);
        assert_eq!(ZoneCalculator::intensity_level(65.0), IntensityLevel::Moderate);
        assert_eq!(ZoneCalculator::intensity_level(-5.0), IntensityLevel::Low);
        assert!(IntensityLevel::High.description().contains("3-6"));
    }
}
