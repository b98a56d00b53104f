//! Submission adapter: turns a draft into the one outbound profile payload.

use serde::{Deserialize, Serialize};

use crate::remote::Identity;

use super::model::{Character, Gender, GoalType, OnboardingDraft};

/// Values substituted for numbers that are missing or not finite.
///
/// The profile endpoint rejects partial payloads, so a gap in the draft is
/// papered over with these rather than failing the submission.
pub mod fallback {
    pub const AGE: u32 = 20;
    pub const HEIGHT_CM: f64 = 160.0;
    pub const WEIGHT_KG: f64 = 50.0;
    pub const ACTIVITY_LEVEL: f64 = 1.2;
    pub const TARGET_WEIGHT_KG: f64 = 50.0;
    pub const WEIGHT_SPEED: f64 = 0.5;
    pub const NICKNAME: &str = "User";
}

/// Body of `POST /api/save-profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub firebase_id: String,
    pub email: String,
    pub nickname: String,
    pub character_id: Character,
    pub gender: Option<Gender>,
    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub activity_level: f64,
    pub goal_type: GoalType,
    pub target_weight: f64,
    pub weight_speed: f64,
}

/// Package a draft for submission, substituting fallbacks for gaps.
///
/// Pure: the same draft and identity always give the same payload. An
/// explicit zero speed (the maintain bypass) is kept as zero.
pub fn sanitize(draft: &OnboardingDraft, identity: &Identity) -> SubmissionPayload {
    let payload = SubmissionPayload {
        firebase_id: identity.user_id.clone(),
        email: identity.email.clone().unwrap_or_default(),
        nickname: draft
            .nickname()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(fallback::NICKNAME)
            .to_string(),
        character_id: draft.character().unwrap_or(Character::Mimi),
        gender: draft.gender(),
        age: draft.age().unwrap_or(fallback::AGE),
        height: finite_or(draft.height_cm(), fallback::HEIGHT_CM),
        weight: finite_or(draft.weight_kg(), fallback::WEIGHT_KG),
        activity_level: draft
            .activity_level()
            .map(|level| level.multiplier())
            .unwrap_or(fallback::ACTIVITY_LEVEL),
        goal_type: draft.goal().unwrap_or(GoalType::Maintain),
        target_weight: finite_or(draft.target_weight_kg(), fallback::TARGET_WEIGHT_KG),
        weight_speed: finite_or(draft.weight_speed_kg_per_week(), fallback::WEIGHT_SPEED),
    };

    if !draft.is_complete() {
        tracing::warn!(
            user_id = %identity.user_id,
            "Submitting incomplete onboarding draft; fallbacks applied"
        );
    }
    payload
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}
