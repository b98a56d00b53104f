//! Remote collaborators: the profile REST API and the user record store.
//!
//! Both are opaque services owned by someone else. The onboarding core only
//! talks to them through these traits.

pub mod firestore;
pub mod http;
pub mod memory;

pub use firestore::FirestoreUserStore;
pub use http::HttpProfileService;
pub use memory::{InMemoryProfileService, InMemoryUserStore};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RemoteError;
use crate::onboarding::result::NutritionPlan;
use crate::onboarding::submission::SubmissionPayload;

/// Field on the user record that gates the wizard at launch.
pub const ONBOARDING_FLAG_FIELD: &str = "isOnboardingCompleted";

/// The signed-in user as seen by the backend.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable user id issued by the auth provider.
    pub user_id: String,
    pub email: Option<String>,
    /// Bearer token for authenticated calls, if the session has one.
    pub id_token: Option<SecretString>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            id_token: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.id_token = Some(token);
        self
    }
}

/// Acknowledgement returned by `save-profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub daily_calorie: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
}

/// Profile storage and nutrition-plan computation.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Store the onboarding answers; the service computes the plan.
    async fn save_profile(
        &self,
        identity: &Identity,
        payload: &SubmissionPayload,
    ) -> Result<SaveReceipt, RemoteError>;

    /// Fetch the computed plan. `None` when the service has no profile.
    async fn get_profile(&self, identity: &Identity) -> Result<Option<NutritionPlan>, RemoteError>;
}

/// Per-user record holding mirrored onboarding fields and the launch flag.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Merge `fields` into the user's record. Writing the same values again
    /// leaves the record unchanged.
    async fn update_fields(
        &self,
        identity: &Identity,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError>;

    /// `None` when the record does not exist; `Some(false)` when it exists
    /// without the flag.
    async fn get_onboarding_flag(&self, identity: &Identity) -> Result<Option<bool>, RemoteError>;

    async fn set_onboarding_flag(
        &self,
        identity: &Identity,
        completed: bool,
    ) -> Result<(), RemoteError> {
        let mut fields = Map::new();
        fields.insert(ONBOARDING_FLAG_FIELD.to_string(), Value::Bool(completed));
        self.update_fields(identity, &fields).await
    }
}
