//! Onboarding step machine: which attribute the user is entering.

use serde::{Deserialize, Serialize};

use super::model::{GoalType, OnboardingDraft};

/// The steps of the onboarding wizard.
///
/// Progresses linearly: Character → Nickname → Gender → Age → Height →
/// Weight → ActivityLevel → GoalType → TargetWeight → Speed → Plan →
/// Result → Complete. A maintain goal skips straight from GoalType to Plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Character,
    Nickname,
    Gender,
    Age,
    Height,
    Weight,
    ActivityLevel,
    GoalType,
    TargetWeight,
    Speed,
    Plan,
    Result,
    Complete,
}

impl OnboardingStep {
    /// Every step in wizard order.
    pub const ALL: [OnboardingStep; 13] = [
        Self::Character,
        Self::Nickname,
        Self::Gender,
        Self::Age,
        Self::Height,
        Self::Weight,
        Self::ActivityLevel,
        Self::GoalType,
        Self::TargetWeight,
        Self::Speed,
        Self::Plan,
        Self::Result,
        Self::Complete,
    ];

    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Character, Nickname)
                | (Nickname, Gender)
                | (Gender, Age)
                | (Age, Height)
                | (Height, Weight)
                | (Weight, ActivityLevel)
                | (ActivityLevel, GoalType)
                | (GoalType, TargetWeight)
                | (GoalType, Plan)
                | (TargetWeight, Speed)
                | (Speed, Plan)
                | (Plan, Result)
                | (Result, Complete)
        )
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Whether the user may navigate back from this step.
    ///
    /// Nothing precedes the first step, and once the plan has been submitted
    /// the remote profile is the source of truth.
    pub fn allows_back(&self) -> bool {
        !matches!(self, Self::Character | Self::Result | Self::Complete)
    }

    /// The step that follows `self`, given what has been collected so far.
    pub fn next_after(&self, draft: &OnboardingDraft) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Character => Some(Nickname),
            Nickname => Some(Gender),
            Gender => Some(Age),
            Age => Some(Height),
            Height => Some(Weight),
            Weight => Some(ActivityLevel),
            ActivityLevel => Some(GoalType),
            GoalType if draft.goal() == Some(super::model::GoalType::Maintain) => Some(Plan),
            GoalType => Some(TargetWeight),
            TargetWeight => Some(Speed),
            Speed => Some(Plan),
            Plan => Some(Result),
            Result => Some(Complete),
            Complete => None,
        }
    }

    /// Whether the step is shown to a user who picked `goal`.
    pub fn is_presented_for(&self, goal: GoalType) -> bool {
        !(goal == GoalType::Maintain && matches!(self, Self::TargetWeight | Self::Speed))
    }

    /// 1-based position of this step among the steps the user walks
    /// through, and their count. Without a goal yet, every step counts.
    pub fn progress(&self, goal: Option<GoalType>) -> (usize, usize) {
        let steps: Vec<OnboardingStep> = Self::ALL
            .into_iter()
            .filter(|step| !step.is_terminal() && goal.is_none_or(|g| step.is_presented_for(g)))
            .collect();
        let position = steps
            .iter()
            .position(|step| step == self)
            .map_or(steps.len(), |i| i + 1);
        (position, steps.len())
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::Character
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Character => "character",
            Self::Nickname => "nickname",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::ActivityLevel => "activity_level",
            Self::GoalType => "goal_type",
            Self::TargetWeight => "target_weight",
            Self::Speed => "speed",
            Self::Plan => "plan",
            Self::Result => "result",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OnboardingStep; 13] = OnboardingStep::ALL;

    #[test]
    fn linear_transitions_are_valid() {
        for pair in ALL.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} should transition to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!Gender.can_transition_to(Height));
        assert!(!Weight.can_transition_to(GoalType));
        assert!(!TargetWeight.can_transition_to(Plan));
        // Go backward
        assert!(!Age.can_transition_to(Gender));
        // Terminal
        assert!(!Complete.can_transition_to(Character));
        // Self-transition
        assert!(!Age.can_transition_to(Age));
    }

    #[test]
    fn maintain_bypass_is_the_only_skip() {
        use OnboardingStep::*;
        assert!(GoalType.can_transition_to(Plan));
        let mut skips = Vec::new();
        for (i, from) in ALL.iter().enumerate() {
            // Anything past the immediate successor is a skip.
            for to in ALL.iter().skip(i + 2) {
                if from.can_transition_to(*to) {
                    skips.push((*from, *to));
                }
            }
        }
        assert_eq!(skips, vec![(GoalType, Plan)]);
    }

    #[test]
    fn next_after_follows_goal() {
        let lose = OnboardingDraft::new().with_goal(GoalType::Lose);
        let maintain = OnboardingDraft::new().with_goal(GoalType::Maintain);

        assert_eq!(
            OnboardingStep::GoalType.next_after(&lose),
            Some(OnboardingStep::TargetWeight)
        );
        assert_eq!(
            OnboardingStep::GoalType.next_after(&maintain),
            Some(OnboardingStep::Plan)
        );
        assert_eq!(OnboardingStep::Complete.next_after(&lose), None);
    }

    #[test]
    fn next_after_walks_all_steps_for_lose() {
        let draft = OnboardingDraft::new().with_goal(GoalType::Lose);
        let mut current = OnboardingStep::default();
        let mut visited = vec![current];
        while let Some(next) = current.next_after(&draft) {
            assert!(current.can_transition_to(next));
            visited.push(next);
            current = next;
        }
        assert_eq!(visited, ALL.to_vec());
        assert!(current.is_terminal());
    }

    #[test]
    fn back_is_blocked_at_the_edges() {
        assert!(!OnboardingStep::Character.allows_back());
        assert!(!OnboardingStep::Result.allows_back());
        assert!(!OnboardingStep::Complete.allows_back());
        assert!(OnboardingStep::Plan.allows_back());
        assert!(OnboardingStep::Age.allows_back());
    }

    #[test]
    fn display_matches_serde() {
        for step in ALL {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {step:?}"
            );
        }
    }

    #[test]
    fn maintain_hides_target_and_speed() {
        for step in ALL {
            let hidden = matches!(step, OnboardingStep::TargetWeight | OnboardingStep::Speed);
            assert_eq!(step.is_presented_for(GoalType::Maintain), !hidden, "{step}");
            assert!(step.is_presented_for(GoalType::Lose));
            assert!(step.is_presented_for(GoalType::Gain));
        }
    }

    #[test]
    fn progress_counts_presented_steps() {
        assert_eq!(OnboardingStep::Character.progress(None), (1, 12));
        assert_eq!(OnboardingStep::Plan.progress(Some(GoalType::Lose)), (11, 12));
        assert_eq!(OnboardingStep::Plan.progress(Some(GoalType::Maintain)), (9, 10));
        assert_eq!(OnboardingStep::Result.progress(Some(GoalType::Maintain)), (10, 10));
        assert_eq!(OnboardingStep::Complete.progress(Some(GoalType::Gain)), (12, 12));
    }
}
