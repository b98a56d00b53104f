//! User record store over the Firestore REST API.
//!
//! Records live at `users/{uid}`. Partial writes use `PATCH` with an
//! `updateMask`, so only the named fields are touched.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};

use crate::config::ClientConfig;
use crate::error::{ConfigError, RemoteError};

use super::{Identity, UserRecordStore, ONBOARDING_FLAG_FIELD};

const SERVICE: &str = "firestore";
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreUserStore {
    base_url: String,
    project_id: String,
    client: reqwest::Client,
}

impl FirestoreUserStore {
    pub fn new(config: &ClientConfig) -> Result<Self, crate::error::Error> {
        let project_id =
            config
                .firestore_project
                .clone()
                .ok_or_else(|| ConfigError::MissingEnvVar("NUTRINANA_FIRESTORE_PROJECT".into()))?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| RemoteError::RequestFailed {
            service: SERVICE.into(),
            reason: format!("Failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id,
            client,
        })
    }

    /// Point the store at another endpoint (emulator or test server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn document_url(&self, user_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/users/{user_id}",
            self.base_url, self.project_id
        )
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

/// Encode a JSON value as a Firestore typed value.
pub(crate) fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": to_firestore_fields(map) } }),
    }
}

fn to_firestore_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

fn request_failed(e: reqwest::Error) -> RemoteError {
    RemoteError::RequestFailed {
        service: SERVICE.into(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl UserRecordStore for FirestoreUserStore {
    async fn update_fields(
        &self,
        identity: &Identity,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        let body = json!({ "fields": to_firestore_fields(fields) });

        let request = self
            .client
            .patch(self.document_url(&identity.user_id))
            .query(&mask)
            .json(&body);
        let resp = self
            .authorize(request, identity)
            .send()
            .await
            .map_err(request_failed)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                service: SERVICE.into(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn get_onboarding_flag(&self, identity: &Identity) -> Result<Option<bool>, RemoteError> {
        let request = self.client.get(self.document_url(&identity.user_id));
        let resp = self
            .authorize(request, identity)
            .send()
            .await
            .map_err(request_failed)?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                service: SERVICE.into(),
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = resp.json().await.map_err(|e| RemoteError::InvalidResponse {
            service: SERVICE.into(),
            reason: e.to_string(),
        })?;
        let flag = document
            .pointer(&format!("/fields/{ONBOARDING_FLAG_FIELD}/booleanValue"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Some(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_typed_values() {
        assert_eq!(to_firestore_value(&json!(25)), json!({"integerValue": "25"}));
        assert_eq!(to_firestore_value(&json!(165.5)), json!({"doubleValue": 165.5}));
        assert_eq!(to_firestore_value(&json!("lose")), json!({"stringValue": "lose"}));
        assert_eq!(to_firestore_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(
            to_firestore_value(&json!({"a": [1]})),
            json!({"mapValue": {"fields": {"a": {"arrayValue": {"values": [{"integerValue": "1"}]}}}}})
        );
    }

    #[test]
    fn document_url_targets_users_collection() {
        let config = ClientConfig {
            firestore_project: Some("demo".to_string()),
            ..ClientConfig::default()
        };
        let store = FirestoreUserStore::new(&config)
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            store.document_url("uid-1"),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/uid-1"
        );
    }

    #[test]
    fn missing_project_is_a_config_error() {
        assert!(FirestoreUserStore::new(&ClientConfig::default()).is_err());
    }
}
