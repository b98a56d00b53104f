//! Target-weight and goal-speed derivation.
//!
//! Given the goal and the current weight, these compute what the target and
//! speed steps offer the user and which values they accept.

use serde::Serialize;

use crate::error::ValidationError;

use super::model::GoalType;

/// Lowest target weight offered when losing.
pub const MIN_TARGET_WEIGHT_KG: f64 = 30.0;
/// Highest target weight offered when gaining.
pub const MAX_TARGET_WEIGHT_KG: f64 = 200.0;
/// Minimum distance between the current weight and a lose/gain target.
const TARGET_GAP_KG: f64 = 1.0;
/// Distance of the proposed target from the current weight.
const DEFAULT_TARGET_OFFSET_KG: f64 = 2.0;
/// Speed slider resolution: tenths of a kilogram.
const SPEED_STEPS_PER_KG: f64 = 10.0;

/// Inclusive range of target weights for a goal, with the proposed default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetRange {
    pub min_kg: f64,
    pub max_kg: f64,
    pub default_kg: f64,
}

impl TargetRange {
    /// Derive the range for `goal` from the current weight.
    ///
    /// Returns `EmptyTargetRange` when the current weight leaves no room on
    /// the goal's side (e.g. 30 kg and losing). No clamping is attempted.
    pub fn derive(goal: GoalType, weight_kg: f64) -> Result<Self, ValidationError> {
        let (min_kg, max_kg, proposed) = match goal {
            GoalType::Lose => (
                MIN_TARGET_WEIGHT_KG,
                weight_kg - TARGET_GAP_KG,
                weight_kg - DEFAULT_TARGET_OFFSET_KG,
            ),
            GoalType::Gain => (
                weight_kg + TARGET_GAP_KG,
                MAX_TARGET_WEIGHT_KG,
                weight_kg + DEFAULT_TARGET_OFFSET_KG,
            ),
            GoalType::Maintain => (weight_kg, weight_kg, weight_kg),
        };

        // Also rejects NaN weights.
        if !(min_kg <= max_kg) {
            return Err(ValidationError::EmptyTargetRange {
                goal: goal.to_string(),
                weight_kg,
            });
        }

        Ok(Self {
            min_kg,
            max_kg,
            default_kg: proposed.clamp(min_kg, max_kg),
        })
    }

    pub fn contains(&self, value_kg: f64) -> bool {
        value_kg >= self.min_kg && value_kg <= self.max_kg
    }

    /// Maintain goals collapse the range to the current weight.
    pub fn is_point(&self) -> bool {
        self.min_kg == self.max_kg
    }
}

/// Check an entered target weight against the goal and current weight.
pub fn validate_target_weight(
    goal: GoalType,
    weight_kg: f64,
    target_kg: f64,
) -> Result<f64, ValidationError> {
    let range = TargetRange::derive(goal, weight_kg)?;
    let strictly_on_side = match goal {
        GoalType::Lose => target_kg < weight_kg,
        GoalType::Gain => target_kg > weight_kg,
        GoalType::Maintain => target_kg == weight_kg,
    };
    if !range.contains(target_kg) || !strictly_on_side {
        return Err(ValidationError::TargetWeightOutOfRange {
            value: target_kg,
            min: range.min_kg,
            max: range.max_kg,
        });
    }
    Ok(target_kg)
}

/// Allowed weekly rate of change for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedDomain {
    /// Upper bound, inclusive. The lower bound is always exclusive zero.
    pub max_kg_per_week: f64,
    /// Speeds above this are flagged as fast.
    pub safe_threshold_kg_per_week: f64,
    /// Slider position when the step opens.
    pub default_kg_per_week: f64,
}

impl SpeedDomain {
    /// `None` for maintain: the speed is forced to zero and the step skipped.
    pub fn for_goal(goal: GoalType) -> Option<Self> {
        match goal {
            GoalType::Lose => Some(Self {
                max_kg_per_week: 1.0,
                safe_threshold_kg_per_week: 0.7,
                default_kg_per_week: 0.5,
            }),
            GoalType::Gain => Some(Self {
                max_kg_per_week: 0.5,
                safe_threshold_kg_per_week: 0.3,
                default_kg_per_week: 0.2,
            }),
            GoalType::Maintain => None,
        }
    }

    /// Check `(0, max]`, then round to slider resolution.
    pub fn validate(&self, speed: f64) -> Result<f64, ValidationError> {
        let rounded = round_to_step(speed);
        if !(speed > 0.0 && speed <= self.max_kg_per_week && rounded > 0.0) {
            return Err(ValidationError::SpeedOutOfRange {
                value: speed,
                max: self.max_kg_per_week,
            });
        }
        Ok(rounded)
    }
}

fn round_to_step(speed: f64) -> f64 {
    (speed * SPEED_STEPS_PER_KG).round() / SPEED_STEPS_PER_KG
}

/// Guidance shown next to the speed slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedAdvice {
    LoseSafe,
    LoseFast,
    GainSafe,
    GainFast,
    Maintain,
}

impl SpeedAdvice {
    pub fn for_speed(goal: GoalType, speed: f64) -> Self {
        let Some(domain) = SpeedDomain::for_goal(goal) else {
            return Self::Maintain;
        };
        let fast = speed > domain.safe_threshold_kg_per_week;
        match (goal, fast) {
            (GoalType::Gain, false) => Self::GainSafe,
            (GoalType::Gain, true) => Self::GainFast,
            (_, false) => Self::LoseSafe,
            (_, true) => Self::LoseFast,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LoseSafe => "Dễ dàng - Bền vững",
            Self::LoseFast => "Tốc độ cao - Cẩn trọng",
            Self::GainSafe => "An toàn - Tăng cơ bắp",
            Self::GainFast => "Tăng nhanh - Có thể tích mỡ",
            Self::Maintain => "Duy trì cân nặng",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::LoseFast | Self::GainFast)
    }
}
