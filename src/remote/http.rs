//! Profile REST API client.
//!
//! `POST {base}/api/save-profile` stores the answers and computes the plan;
//! `GET {base}/api/get-profile/{uid}` returns `{success, data?, message?}`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::onboarding::result::NutritionPlan;
use crate::onboarding::submission::SubmissionPayload;

use super::{Identity, ProfileService, SaveReceipt};

const SERVICE: &str = "profile";

/// Envelope of `get-profile` responses.
#[derive(Debug, Deserialize)]
struct GetProfileResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// `ProfileService` over the backend's REST API.
pub struct HttpProfileService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProfileService {
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| RemoteError::RequestFailed {
            service: SERVICE.into(),
            reason: format!("Failed to build HTTP client: {e}"),
        })?;
        Ok(Self::with_client(&config.backend_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        identity: &Identity,
    ) -> reqwest::RequestBuilder {
        match identity.id_token {
            Some(ref token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        service: SERVICE.into(),
        status: status.as_u16(),
        body,
    })
}

fn request_failed(e: reqwest::Error) -> RemoteError {
    RemoteError::RequestFailed {
        service: SERVICE.into(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    async fn save_profile(
        &self,
        identity: &Identity,
        payload: &SubmissionPayload,
    ) -> Result<SaveReceipt, RemoteError> {
        tracing::debug!(user_id = %identity.user_id, "Sending save-profile");
        let request = self.client.post(self.api_url("save-profile")).json(payload);
        let resp = self
            .authorize(request, identity)
            .send()
            .await
            .map_err(request_failed)?;
        let resp = check_status(resp).await?;

        // The receipt is informational; an unexpected body is not a failure.
        let body = resp.text().await.map_err(request_failed)?;
        match serde_json::from_str::<SaveReceipt>(&body) {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::debug!("Unparsed save-profile response: {}", e);
                Ok(SaveReceipt::default())
            }
        }
    }

    async fn get_profile(&self, identity: &Identity) -> Result<Option<NutritionPlan>, RemoteError> {
        let url = self.api_url(&format!("get-profile/{}", identity.user_id));
        let resp = self
            .authorize(self.client.get(url), identity)
            .send()
            .await
            .map_err(request_failed)?;
        let resp = check_status(resp).await?;
        let envelope: GetProfileResponse =
            resp.json().await.map_err(|e| RemoteError::InvalidResponse {
                service: SERVICE.into(),
                reason: e.to_string(),
            })?;

        if !envelope.success {
            tracing::debug!(
                user_id = %identity.user_id,
                message = envelope.message.as_deref().unwrap_or(""),
                "Profile not available"
            );
            return Ok(None);
        }

        match envelope.data {
            Some(data) => NutritionPlan::from_remote(&data).map(Some),
            None => Ok(None),
        }
    }
}
