//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::remote::Identity;

/// Backend the mobile build points at when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://192.168.1.3:8000";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the profile REST API (without the `/api` prefix).
    pub backend_url: String,
    /// Firestore project holding user records. `None` keeps records in memory.
    pub firestore_project: Option<String>,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Whether each step mirrors its field to the user record.
    pub mirror_fields: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            firestore_project: None,
            request_timeout: None,
            mirror_fields: true,
        }
    }
}

impl ClientConfig {
    /// Read configuration from `NUTRINANA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = std::env::var("NUTRINANA_BACKEND_URL")
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.backend_url);
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "NUTRINANA_BACKEND_URL".to_string(),
                message: format!("expected an http(s) URL, got {backend_url}"),
            });
        }

        let firestore_project = std::env::var("NUTRINANA_FIRESTORE_PROJECT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let request_timeout = match std::env::var("NUTRINANA_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "NUTRINANA_REQUEST_TIMEOUT_SECS".to_string(),
                    message: format!("not a whole number of seconds: {raw}"),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => defaults.request_timeout,
        };

        let mirror_fields = std::env::var("NUTRINANA_MIRROR_FIELDS")
            .map(|s| parse_switch(&s))
            .unwrap_or(defaults.mirror_fields);

        Ok(Self {
            backend_url,
            firestore_project,
            request_timeout,
            mirror_fields,
        })
    }
}

/// On unless the value says otherwise, case-insensitively.
fn parse_switch(raw: &str) -> bool {
    !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// The signed-in user, from `NUTRINANA_USER_ID`, `NUTRINANA_EMAIL` and
/// `NUTRINANA_ID_TOKEN`. `None` when no user id is set.
pub fn identity_from_env() -> Option<Identity> {
    let user_id = std::env::var("NUTRINANA_USER_ID")
        .ok()
        .filter(|s| !s.trim().is_empty())?;
    let mut identity = Identity::new(user_id.trim());
    if let Ok(email) = std::env::var("NUTRINANA_EMAIL") {
        identity = identity.with_email(email);
    }
    if let Ok(token) = std::env::var("NUTRINANA_ID_TOKEN") {
        identity = identity.with_token(SecretString::from(token));
    }
    Some(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_client() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://192.168.1.3:8000");
        assert!(config.request_timeout.is_none());
        assert!(config.firestore_project.is_none());
        assert!(config.mirror_fields);
    }

    #[test]
    fn switch_values_ignore_case() {
        for off in ["0", "false", "FALSE", "No", " off "] {
            assert!(!parse_switch(off), "{off:?} should turn the switch off");
        }
        for on in ["1", "true", "Yes", ""] {
            assert!(parse_switch(on), "{on:?} should leave the switch on");
        }
    }
}
