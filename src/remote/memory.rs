//! In-memory collaborators for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::RemoteError;
use crate::onboarding::result::NutritionPlan;
use crate::onboarding::submission::SubmissionPayload;

use super::{Identity, ProfileService, SaveReceipt, UserRecordStore, ONBOARDING_FLAG_FIELD};

fn unavailable(service: &str) -> RemoteError {
    RemoteError::RequestFailed {
        service: service.to_string(),
        reason: "service unavailable".to_string(),
    }
}

/// A user record: merged fields plus when it last changed.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub fields: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

/// User record store backed by a map. Can be switched into a failing mode.
#[derive(Default)]
pub struct InMemoryUserStore {
    records: RwLock<HashMap<String, StoredRecord>>,
    failing: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn record(&self, user_id: &str) -> Option<StoredRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("user-store"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRecordStore for InMemoryUserStore {
    async fn update_fields(
        &self,
        identity: &Identity,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.check()?;
        let mut records = self.records.write().await;
        let record = records
            .entry(identity.user_id.clone())
            .or_insert_with(|| StoredRecord {
                fields: Map::new(),
                updated_at: Utc::now(),
            });
        let mut changed = false;
        for (key, value) in fields {
            if record.fields.get(key) != Some(value) {
                record.fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        if changed {
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get_onboarding_flag(&self, identity: &Identity) -> Result<Option<bool>, RemoteError> {
        self.check()?;
        let records = self.records.read().await;
        Ok(records.get(&identity.user_id).map(|record| {
            record
                .fields
                .get(ONBOARDING_FLAG_FIELD)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        }))
    }
}

/// Profile service that records submissions and serves preset plans.
#[derive(Default)]
pub struct InMemoryProfileService {
    submissions: RwLock<Vec<SubmissionPayload>>,
    plans: RwLock<HashMap<String, NutritionPlan>>,
    failing: AtomicBool,
}

impl InMemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Plan returned by `get_profile` for `user_id`.
    pub async fn set_plan(&self, user_id: &str, plan: NutritionPlan) {
        self.plans.write().await.insert(user_id.to_string(), plan);
    }

    pub async fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions.read().await.clone()
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("profile"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileService for InMemoryProfileService {
    async fn save_profile(
        &self,
        _identity: &Identity,
        payload: &SubmissionPayload,
    ) -> Result<SaveReceipt, RemoteError> {
        self.check()?;
        self.submissions.write().await.push(payload.clone());
        Ok(SaveReceipt {
            message: Some("Success".to_string()),
            ..Default::default()
        })
    }

    async fn get_profile(&self, identity: &Identity) -> Result<Option<NutritionPlan>, RemoteError> {
        self.check()?;
        Ok(self.plans.read().await.get(&identity.user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn repeated_update_is_idempotent() {
        let store = InMemoryUserStore::new();
        let alice = Identity::new("alice");
        let update = fields(json!({"age": 25}));

        store.update_fields(&alice, &update).await.unwrap();
        let once = store.record("alice").await.unwrap();
        store.update_fields(&alice, &update).await.unwrap();
        let twice = store.record("alice").await.unwrap();

        assert_eq!(once.fields, twice.fields);
        assert_eq!(once.updated_at, twice.updated_at);
        assert_eq!(twice.fields.len(), 1);
    }

    #[tokio::test]
    async fn updates_merge_fields() {
        let store = InMemoryUserStore::new();
        let alice = Identity::new("alice");
        store.update_fields(&alice, &fields(json!({"age": 25}))).await.unwrap();
        store.update_fields(&alice, &fields(json!({"height": 165.0}))).await.unwrap();
        store.update_fields(&alice, &fields(json!({"age": 26}))).await.unwrap();

        let record = store.record("alice").await.unwrap();
        assert_eq!(record.fields["age"], 26);
        assert_eq!(record.fields["height"], 165.0);
    }

    #[tokio::test]
    async fn flag_reads_absent_missing_and_set() {
        let store = InMemoryUserStore::new();
        let bob = Identity::new("bob");
        assert_eq!(store.get_onboarding_flag(&bob).await.unwrap(), None);

        store.update_fields(&bob, &fields(json!({"age": 30}))).await.unwrap();
        assert_eq!(store.get_onboarding_flag(&bob).await.unwrap(), Some(false));

        store.set_onboarding_flag(&bob, true).await.unwrap();
        assert_eq!(store.get_onboarding_flag(&bob).await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn failing_store_errors_without_writing() {
        let store = InMemoryUserStore::new();
        store.set_failing(true);
        let carol = Identity::new("carol");
        assert!(store.update_fields(&carol, &fields(json!({"age": 40}))).await.is_err());
        store.set_failing(false);
        assert!(store.record("carol").await.is_none());
    }
}
