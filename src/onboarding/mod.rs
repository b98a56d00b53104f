//! Onboarding flow: first-launch wizard that builds the nutrition profile.
//!
//! The user enters one attribute per step. Each step extends a typed draft;
//! the finished draft is sanitized into a single payload for the profile
//! service, whose computed plan is then fetched and summarized.

pub mod manager;
pub mod model;
pub mod result;
pub mod state;
pub mod submission;
pub mod targets;
pub mod wizard;

pub use manager::{launch_route, LaunchRoute, OnboardingManager, OnboardingStatus, SubmitOutcome};
pub use model::{ActivityLevel, Character, Gender, GoalType, OnboardingDraft};
pub use result::{BmiCategory, GoalSummary, NutritionPlan, ResultSummary};
pub use state::OnboardingStep;
pub use submission::{sanitize, SubmissionPayload};
pub use targets::{SpeedAdvice, SpeedDomain, TargetRange};
pub use wizard::{Advanced, FieldUpdate, StepInput, Wizard};
