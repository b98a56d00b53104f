//! Error types for the onboarding core.

use crate::onboarding::state::OnboardingStep;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A value entered on a step falls outside its domain.
///
/// Local and fully recoverable: the wizard does not change state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Nickname must not be empty")]
    EmptyNickname,

    #[error("Age {value} outside [{min}, {max}]")]
    AgeOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Height {value} cm outside [{min}, {max}]")]
    HeightOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Weight {value} kg outside [{min}, {max}]")]
    WeightOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Target weight {value} kg outside [{min}, {max}]")]
    TargetWeightOutOfRange { value: f64, min: f64, max: f64 },

    #[error("No valid target weight exists for {goal} from {weight_kg} kg")]
    EmptyTargetRange { goal: String, weight_kg: f64 },

    #[error("Speed {value} kg/week outside (0, {max}]")]
    SpeedOutOfRange { value: f64, max: f64 },

    #[error("Step {step} requires an earlier value that is missing: {field}")]
    MissingPrerequisite { step: OnboardingStep, field: &'static str },
}

impl ValidationError {
    /// Message shown to the user when a step refuses to advance.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyNickname => "Hãy đặt cho mình một biệt danh thật ngầu nhé!".to_string(),
            Self::AgeOutOfRange { min, max, .. } => {
                format!("Ứng dụng chỉ dành cho người dùng từ {min} đến {max} tuổi.")
            }
            Self::HeightOutOfRange { min, max, .. } => {
                format!("Vui lòng chọn chiều cao thực tế ({min}cm - {max}cm).")
            }
            Self::WeightOutOfRange { min, max, .. } => {
                format!("Vui lòng chọn cân nặng thực tế ({min}kg - {max}kg).")
            }
            Self::TargetWeightOutOfRange { min, max, .. } => {
                format!("Cân nặng mục tiêu phải nằm trong khoảng {min}kg - {max}kg.")
            }
            Self::EmptyTargetRange { .. } => {
                "Không có cân nặng mục tiêu phù hợp với lựa chọn này.".to_string()
            }
            Self::SpeedOutOfRange { max, .. } => {
                format!("Tốc độ phải lớn hơn 0 và không vượt quá {max} kg/tuần.")
            }
            Self::MissingPrerequisite { .. } => {
                "Vui lòng quay lại và hoàn thành các bước trước.".to_string()
            }
        }
    }
}

/// Failures talking to a remote collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{service} request failed: {reason}")]
    RequestFailed { service: String, reason: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },
}

/// Flow-level errors raised by the wizard and the manager.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        from: OnboardingStep,
        to: OnboardingStep,
    },

    #[error("Step {current} does not accept a {given} value")]
    StepMismatch {
        current: OnboardingStep,
        given: OnboardingStep,
    },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("No signed-in identity available")]
    MissingIdentity,

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
