//! Onboarding data models: attribute enums and the accumulated draft.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Self-reported activity level, sent to the backend as a TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Heavy,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 4] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Heavy,
    ];

    /// The multiplier the profile-computation endpoint expects.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Heavy => 1.725,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sedentary => "Ít vận động",
            Self::Light => "Vận động nhẹ nhàng",
            Self::Moderate => "Vận động trung bình",
            Self::Heavy => "Năng vận động",
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown activity level: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Lose,
    Maintain,
    Gain,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lose => "lose",
            Self::Maintain => "maintain",
            Self::Gain => "gain",
        }
    }
}

impl std::fmt::Display for GoalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lose" => Ok(Self::Lose),
            "maintain" => Ok(Self::Maintain),
            "gain" => Ok(Self::Gain),
            other => Err(format!("unknown goal: {other}")),
        }
    }
}

/// Mascot the user picks as a companion. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Max,
    Mimi,
    Chuck,
    Ninja,
    Baby,
}

impl Character {
    pub const ALL: [Character; 5] = [
        Character::Max,
        Character::Mimi,
        Character::Chuck,
        Character::Ninja,
        Character::Baby,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Mimi => "mimi",
            Self::Chuck => "chuck",
            Self::Ninja => "ninja",
            Self::Baby => "baby",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Max => "Max",
            Self::Mimi => "Mimi",
            Self::Chuck => "Chef Chuck",
            Self::Ninja => "Lady Na",
            Self::Baby => "Baby Na",
        }
    }
}

/// The carousel opens on Chef Chuck.
impl Default for Character {
    fn default() -> Self {
        Self::Chuck
    }
}

impl std::fmt::Display for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Character {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("unknown character: {s}"))
    }
}

/// Attributes collected so far in one onboarding session.
///
/// Each field is written once, by its own step, in wizard order. The wizard
/// keeps earlier drafts in its history, so going back never needs to unset
/// anything. Outside the crate the draft is read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub(crate) character: Option<Character>,
    pub(crate) nickname: Option<String>,
    pub(crate) gender: Option<Gender>,
    pub(crate) age: Option<u32>,
    pub(crate) height_cm: Option<f64>,
    pub(crate) weight_kg: Option<f64>,
    pub(crate) activity_level: Option<ActivityLevel>,
    pub(crate) goal: Option<GoalType>,
    pub(crate) target_weight_kg: Option<f64>,
    pub(crate) weight_speed_kg_per_week: Option<f64>,
}

impl OnboardingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(&self) -> Option<Character> {
        self.character
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height_cm
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }

    pub fn activity_level(&self) -> Option<ActivityLevel> {
        self.activity_level
    }

    pub fn goal(&self) -> Option<GoalType> {
        self.goal
    }

    pub fn target_weight_kg(&self) -> Option<f64> {
        self.target_weight_kg
    }

    pub fn weight_speed_kg_per_week(&self) -> Option<f64> {
        self.weight_speed_kg_per_week
    }

    /// Whether every field required for submission is present.
    pub fn is_complete(&self) -> bool {
        self.character.is_some()
            && self.nickname.is_some()
            && self.gender.is_some()
            && self.age.is_some()
            && self.height_cm.is_some()
            && self.weight_kg.is_some()
            && self.activity_level.is_some()
            && self.goal.is_some()
            && self.target_weight_kg.is_some()
            && self.weight_speed_kg_per_week.is_some()
    }

    pub(crate) fn with_character(self, character: Character) -> Self {
        Self {
            character: Some(character),
            ..self
        }
    }

    pub(crate) fn with_nickname(self, nickname: String) -> Self {
        Self {
            nickname: Some(nickname),
            ..self
        }
    }

    pub(crate) fn with_gender(self, gender: Gender) -> Self {
        Self {
            gender: Some(gender),
            ..self
        }
    }

    pub(crate) fn with_age(self, age: u32) -> Self {
        Self {
            age: Some(age),
            ..self
        }
    }

    pub(crate) fn with_height(self, height_cm: f64) -> Self {
        Self {
            height_cm: Some(height_cm),
            ..self
        }
    }

    pub(crate) fn with_weight(self, weight_kg: f64) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            ..self
        }
    }

    pub(crate) fn with_activity_level(self, level: ActivityLevel) -> Self {
        Self {
            activity_level: Some(level),
            ..self
        }
    }

    pub(crate) fn with_goal(self, goal: GoalType) -> Self {
        Self {
            goal: Some(goal),
            ..self
        }
    }

    pub(crate) fn with_target_weight(self, target_weight_kg: f64) -> Self {
        Self {
            target_weight_kg: Some(target_weight_kg),
            ..self
        }
    }

    pub(crate) fn with_speed(self, speed: f64) -> Self {
        Self {
            weight_speed_kg_per_week: Some(speed),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_multipliers_match_backend_table() {
        assert_eq!(ActivityLevel::Sedentary.multiplier(), 1.2);
        assert_eq!(ActivityLevel::Light.multiplier(), 1.375);
        assert_eq!(ActivityLevel::Moderate.multiplier(), 1.55);
        assert_eq!(ActivityLevel::Heavy.multiplier(), 1.725);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" heavy ".parse::<ActivityLevel>().unwrap(), ActivityLevel::Heavy);
        assert_eq!("GAIN".parse::<GoalType>().unwrap(), GoalType::Gain);
        assert_eq!("ninja".parse::<Character>().unwrap(), Character::Ninja);
        assert!("robot".parse::<Character>().is_err());
        assert!("active".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for goal in [GoalType::Lose, GoalType::Maintain, GoalType::Gain] {
            let json = serde_json::to_string(&goal).unwrap();
            assert_eq!(format!("\"{goal}\""), json);
        }
        for c in Character::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(format!("\"{c}\""), json);
        }
    }

    #[test]
    fn default_character_is_chuck() {
        assert_eq!(Character::default(), Character::Chuck);
        assert_eq!(Character::Chuck.display_name(), "Chef Chuck");
    }

    #[test]
    fn setters_leave_other_fields_untouched() {
        let draft = OnboardingDraft::new()
            .with_gender(Gender::Male)
            .with_age(30);
        let next = draft.clone().with_height(180.0);

        assert_eq!(draft.height_cm(), None);
        assert_eq!(next.gender(), Some(Gender::Male));
        assert_eq!(next.age(), Some(30));
        assert_eq!(next.height_cm(), Some(180.0));
        assert!(!next.is_complete());
    }
}
