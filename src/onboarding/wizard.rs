//! The onboarding wizard: draft, current step and navigation history.
//!
//! The wizard is pure local state. It validates each entered value, extends
//! the draft, and reports which single field changed so the caller can
//! mirror it remotely. Remote writes never feed back into the wizard.

use std::ops::RangeInclusive;

use serde_json::json;

use crate::error::{OnboardingError, ValidationError};

use super::model::{ActivityLevel, Character, Gender, GoalType, OnboardingDraft};
use super::state::OnboardingStep;
use super::targets::{validate_target_weight, SpeedDomain, TargetRange};

pub const AGE_RANGE: RangeInclusive<u32> = 16..=100;
pub const HEIGHT_RANGE_CM: RangeInclusive<f64> = 100.0..=220.0;
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 30.0..=150.0;

/// One value entered by the user on a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    Character(Character),
    Nickname(String),
    Gender(Gender),
    Age(u32),
    Height(f64),
    Weight(f64),
    ActivityLevel(ActivityLevel),
    Goal(GoalType),
    TargetWeight(f64),
    Speed(f64),
}

impl StepInput {
    /// The step that collects this kind of value.
    pub fn step(&self) -> OnboardingStep {
        match self {
            Self::Character(_) => OnboardingStep::Character,
            Self::Nickname(_) => OnboardingStep::Nickname,
            Self::Gender(_) => OnboardingStep::Gender,
            Self::Age(_) => OnboardingStep::Age,
            Self::Height(_) => OnboardingStep::Height,
            Self::Weight(_) => OnboardingStep::Weight,
            Self::ActivityLevel(_) => OnboardingStep::ActivityLevel,
            Self::Goal(_) => OnboardingStep::GoalType,
            Self::TargetWeight(_) => OnboardingStep::TargetWeight,
            Self::Speed(_) => OnboardingStep::Speed,
        }
    }
}

/// A single field written to the remote user record after an advance.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: &'static str,
    pub value: serde_json::Value,
}

impl FieldUpdate {
    fn new(field: &'static str, value: serde_json::Value) -> Self {
        Self { field, value }
    }
}

/// Outcome of a successful advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Advanced {
    pub from: OnboardingStep,
    pub to: OnboardingStep,
    /// Fields the advance wrote. One per step, except the maintain bypass,
    /// which also fills target weight and speed.
    pub updates: Vec<FieldUpdate>,
}

/// Local, authoritative onboarding state.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    step: OnboardingStep,
    draft: OnboardingDraft,
    history: Vec<(OnboardingStep, OnboardingDraft)>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    /// Target range offered on the target-weight step.
    pub fn target_range(&self) -> Result<TargetRange, ValidationError> {
        let (goal, weight) = self.goal_and_weight(OnboardingStep::TargetWeight)?;
        TargetRange::derive(goal, weight)
    }

    /// Speed domain offered on the speed step; `None` for maintain.
    pub fn speed_domain(&self) -> Option<SpeedDomain> {
        self.draft.goal().and_then(SpeedDomain::for_goal)
    }

    /// Validate `input` for the current step and move forward.
    ///
    /// On error nothing changes.
    pub fn advance(&mut self, input: StepInput) -> Result<Advanced, OnboardingError> {
        let given = input.step();
        if given != self.step {
            return Err(OnboardingError::StepMismatch {
                current: self.step,
                given,
            });
        }

        let (draft, updates) = self.apply(input)?;
        let from = self.step;
        let to = from
            .next_after(&draft)
            .filter(|next| from.can_transition_to(*next))
            .ok_or(OnboardingError::InvalidTransition {
                from,
                to: OnboardingStep::Complete,
            })?;

        let previous = std::mem::replace(&mut self.draft, draft);
        self.history.push((from, previous));
        self.step = to;

        tracing::debug!(from = %from, to = %to, fields = updates.len(), "Onboarding advanced");
        Ok(Advanced { from, to, updates })
    }

    /// Return to the previous step with the draft it had.
    pub fn back(&mut self) -> Result<OnboardingStep, OnboardingError> {
        let current = self.step;
        if !current.allows_back() {
            return Err(OnboardingError::InvalidTransition {
                from: current,
                to: OnboardingStep::Character,
            });
        }
        let (step, draft) = self
            .history
            .pop()
            .ok_or(OnboardingError::InvalidTransition {
                from: current,
                to: OnboardingStep::Character,
            })?;
        self.step = step;
        self.draft = draft;
        tracing::debug!(from = %current, to = %step, "Onboarding went back");
        Ok(step)
    }

    /// Move from Plan to Result once the payload has been handed off.
    ///
    /// The draft and history are discarded: the remote profile is the
    /// source of truth from here on.
    pub fn mark_submitted(&mut self) -> Result<OnboardingStep, OnboardingError> {
        self.transition(OnboardingStep::Plan, OnboardingStep::Result)?;
        self.draft = OnboardingDraft::default();
        self.history.clear();
        Ok(self.step)
    }

    /// Move from Result to Complete.
    pub fn mark_complete(&mut self) -> Result<OnboardingStep, OnboardingError> {
        self.transition(OnboardingStep::Result, OnboardingStep::Complete)?;
        Ok(self.step)
    }

    fn transition(
        &mut self,
        expected: OnboardingStep,
        to: OnboardingStep,
    ) -> Result<(), OnboardingError> {
        if self.step != expected || !self.step.can_transition_to(to) {
            return Err(OnboardingError::InvalidTransition {
                from: self.step,
                to,
            });
        }
        self.step = to;
        Ok(())
    }

    fn goal_and_weight(&self, step: OnboardingStep) -> Result<(GoalType, f64), ValidationError> {
        let goal = self.draft.goal().ok_or(ValidationError::MissingPrerequisite {
            step,
            field: "goal",
        })?;
        let weight = self
            .draft
            .weight_kg()
            .ok_or(ValidationError::MissingPrerequisite {
                step,
                field: "weight",
            })?;
        Ok((goal, weight))
    }

    fn apply(
        &self,
        input: StepInput,
    ) -> Result<(OnboardingDraft, Vec<FieldUpdate>), OnboardingError> {
        let draft = self.draft.clone();
        let (draft, update) = match input {
            StepInput::Character(character) => (
                draft.with_character(character),
                FieldUpdate::new("character", json!(character.id())),
            ),
            StepInput::Nickname(nickname) => {
                let nickname = nickname.trim().to_string();
                if nickname.is_empty() {
                    return Err(ValidationError::EmptyNickname.into());
                }
                let update = FieldUpdate::new("nickname", json!(nickname));
                (draft.with_nickname(nickname), update)
            }
            StepInput::Gender(gender) => (
                draft.with_gender(gender),
                FieldUpdate::new("gender", json!(gender.as_str())),
            ),
            StepInput::Age(age) => {
                if !AGE_RANGE.contains(&age) {
                    return Err(ValidationError::AgeOutOfRange {
                        value: age,
                        min: *AGE_RANGE.start(),
                        max: *AGE_RANGE.end(),
                    }
                    .into());
                }
                (draft.with_age(age), FieldUpdate::new("age", json!(age)))
            }
            StepInput::Height(height) => {
                if !HEIGHT_RANGE_CM.contains(&height) {
                    return Err(ValidationError::HeightOutOfRange {
                        value: height,
                        min: *HEIGHT_RANGE_CM.start(),
                        max: *HEIGHT_RANGE_CM.end(),
                    }
                    .into());
                }
                (draft.with_height(height), FieldUpdate::new("height", json!(height)))
            }
            StepInput::Weight(weight) => {
                if !WEIGHT_RANGE_KG.contains(&weight) {
                    return Err(ValidationError::WeightOutOfRange {
                        value: weight,
                        min: *WEIGHT_RANGE_KG.start(),
                        max: *WEIGHT_RANGE_KG.end(),
                    }
                    .into());
                }
                (draft.with_weight(weight), FieldUpdate::new("weight", json!(weight)))
            }
            StepInput::ActivityLevel(level) => (
                draft.with_activity_level(level),
                FieldUpdate::new("activityLevel", json!(level.as_str())),
            ),
            StepInput::Goal(goal) => {
                let update = FieldUpdate::new("goal", json!(goal.as_str()));
                let draft = draft.with_goal(goal);
                if goal == GoalType::Maintain {
                    // Bypass: target is the current weight, speed is zero.
                    let weight = draft.weight_kg().ok_or(ValidationError::MissingPrerequisite {
                        step: OnboardingStep::GoalType,
                        field: "weight",
                    })?;
                    let draft = draft.with_target_weight(weight).with_speed(0.0);
                    return Ok((
                        draft,
                        vec![
                            update,
                            FieldUpdate::new("targetWeight", json!(weight)),
                            FieldUpdate::new("weightSpeed", json!(0.0)),
                        ],
                    ));
                }
                (draft, update)
            }
            StepInput::TargetWeight(target) => {
                let (goal, weight) = self.goal_and_weight(OnboardingStep::TargetWeight)?;
                let target = validate_target_weight(goal, weight, target)?;
                (
                    draft.with_target_weight(target),
                    FieldUpdate::new("targetWeight", json!(target)),
                )
            }
            StepInput::Speed(speed) => {
                let speed = match self.speed_domain() {
                    Some(domain) => domain.validate(speed)?,
                    None => 0.0,
                };
                (
                    draft.with_speed(speed),
                    FieldUpdate::new("weightSpeed", json!(speed)),
                )
            }
        };
        Ok((draft, vec![update]))
    }
}
