//! OnboardingManager: coordinates the local wizard with the remote profile
//! service and user record store.
//!
//! The wizard is authoritative. Remote writes are best-effort: they are
//! attempted after the local state has already moved, and their failures are
//! logged and swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Map;
use tokio::sync::RwLock;

use crate::error::{OnboardingError, ValidationError};
use crate::remote::{Identity, ProfileService, SaveReceipt, UserRecordStore};

use super::model::OnboardingDraft;
use super::result::ResultSummary;
use super::state::OnboardingStep;
use super::submission::{sanitize, SubmissionPayload};
use super::targets::{SpeedDomain, TargetRange};
use super::wizard::{Advanced, FieldUpdate, StepInput, Wizard};

/// Where the app should go at launch or after onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchRoute {
    SignIn,
    Onboarding,
    MainApp,
}

/// Decide whether a launching app enters the wizard.
///
/// A failed flag read routes to sign-in rather than guessing.
pub async fn launch_route(records: &dyn UserRecordStore, identity: Option<&Identity>) -> LaunchRoute {
    let Some(identity) = identity else {
        return LaunchRoute::SignIn;
    };
    match records.get_onboarding_flag(identity).await {
        Ok(Some(true)) => LaunchRoute::MainApp,
        Ok(Some(false)) | Ok(None) => LaunchRoute::Onboarding,
        Err(e) => {
            tracing::warn!(user_id = %identity.user_id, "Failed to read onboarding flag: {}", e);
            LaunchRoute::SignIn
        }
    }
}

/// Result of handing the draft to the profile service.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Exactly what was sent.
    pub payload: SubmissionPayload,
    /// `None` when the remote call failed; the flow moved on regardless.
    pub receipt: Option<SaveReceipt>,
    /// Step the wizard is on afterwards.
    pub step: OnboardingStep,
}

/// Clears the in-flight flag when the submission that set it ends.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives one onboarding session.
pub struct OnboardingManager {
    profiles: Arc<dyn ProfileService>,
    records: Arc<dyn UserRecordStore>,
    identity: Option<Identity>,
    wizard: RwLock<Wizard>,
    submitting: Arc<AtomicBool>,
    mirror_fields: bool,
}

impl OnboardingManager {
    pub fn new(
        profiles: Arc<dyn ProfileService>,
        records: Arc<dyn UserRecordStore>,
        identity: Option<Identity>,
    ) -> Self {
        Self {
            profiles,
            records,
            identity,
            wizard: RwLock::new(Wizard::new()),
            submitting: Arc::new(AtomicBool::new(false)),
            mirror_fields: true,
        }
    }

    /// Turn per-step mirroring of fields to the user record on or off.
    pub fn with_mirroring(mut self, enabled: bool) -> Self {
        self.mirror_fields = enabled;
        self
    }

    pub async fn current_step(&self) -> OnboardingStep {
        self.wizard.read().await.step()
    }

    /// Snapshot of the draft collected so far.
    pub async fn draft(&self) -> OnboardingDraft {
        self.wizard.read().await.draft().clone()
    }

    pub async fn target_range(&self) -> Result<TargetRange, ValidationError> {
        self.wizard.read().await.target_range()
    }

    pub async fn speed_domain(&self) -> Option<SpeedDomain> {
        self.wizard.read().await.speed_domain()
    }

    /// Whether a submission is currently in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validate and record one value, then mirror it remotely.
    ///
    /// Refused while a submission is in flight.
    pub async fn advance(&self, input: StepInput) -> Result<Advanced, OnboardingError> {
        let advanced = {
            let mut wizard = self.wizard.write().await;
            if self.is_submitting() {
                return Err(OnboardingError::SubmissionInFlight);
            }
            wizard.advance(input)?
        };
        self.mirror(&advanced.updates).await;
        Ok(advanced)
    }

    /// Go back one step. Refused while a submission is in flight.
    pub async fn back(&self) -> Result<OnboardingStep, OnboardingError> {
        let mut wizard = self.wizard.write().await;
        if self.is_submitting() {
            return Err(OnboardingError::SubmissionInFlight);
        }
        wizard.back()
    }

    /// Send the draft to the profile service and move to the result step.
    ///
    /// Only valid on the plan step. A remote failure is logged and the flow
    /// still moves on; the result step will show whatever the service has.
    pub async fn submit(&self) -> Result<SubmitOutcome, OnboardingError> {
        let identity = self.identity.as_ref().ok_or(OnboardingError::MissingIdentity)?;
        let _guard =
            InFlightGuard::acquire(&self.submitting).ok_or(OnboardingError::SubmissionInFlight)?;

        let payload = {
            let wizard = self.wizard.read().await;
            if wizard.step() != OnboardingStep::Plan {
                return Err(OnboardingError::InvalidTransition {
                    from: wizard.step(),
                    to: OnboardingStep::Result,
                });
            }
            sanitize(wizard.draft(), identity)
        };

        tracing::info!(
            user_id = %identity.user_id,
            goal = %payload.goal_type,
            "Submitting onboarding profile"
        );
        let receipt = match self.profiles.save_profile(identity, &payload).await {
            Ok(receipt) => {
                tracing::info!(
                    user_id = %identity.user_id,
                    daily_calorie = ?receipt.daily_calorie,
                    "Onboarding profile saved"
                );
                Some(receipt)
            }
            Err(e) => {
                tracing::warn!(user_id = %identity.user_id, "Failed to save onboarding profile: {}", e);
                None
            }
        };

        let step = {
            let mut wizard = self.wizard.write().await;
            match wizard.mark_submitted() {
                Ok(step) => step,
                Err(e) => {
                    tracing::warn!("Onboarding moved while submitting: {}", e);
                    wizard.step()
                }
            }
        };

        Ok(SubmitOutcome {
            payload,
            receipt,
            step,
        })
    }

    /// Fetch the computed plan for the result step.
    ///
    /// Returns `None` when the service has nothing, the call failed, or the
    /// flow left the result step while the request was outstanding.
    pub async fn fetch_result(&self) -> Result<Option<ResultSummary>, OnboardingError> {
        let identity = self.identity.as_ref().ok_or(OnboardingError::MissingIdentity)?;
        let step = self.current_step().await;
        if step != OnboardingStep::Result {
            return Err(OnboardingError::InvalidTransition {
                from: step,
                to: OnboardingStep::Result,
            });
        }

        let plan = match self.profiles.get_profile(identity).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(user_id = %identity.user_id, "Failed to fetch nutrition plan: {}", e);
                None
            }
        };

        if self.current_step().await != OnboardingStep::Result {
            tracing::debug!("Discarding nutrition plan for a result step that is gone");
            return Ok(None);
        }
        Ok(plan.as_ref().map(ResultSummary::from_plan))
    }

    /// Mark onboarding complete and route to the main app.
    ///
    /// Only valid on the result step (or again once complete). The flag
    /// write is best-effort; once past the step check the route is always
    /// `MainApp`.
    pub async fn finish(&self) -> Result<LaunchRoute, OnboardingError> {
        match self.current_step().await {
            OnboardingStep::Result => {}
            OnboardingStep::Complete => return Ok(LaunchRoute::MainApp),
            step => {
                return Err(OnboardingError::InvalidTransition {
                    from: step,
                    to: OnboardingStep::Complete,
                });
            }
        }

        match self.identity.as_ref() {
            Some(identity) => {
                if let Err(e) = self.records.set_onboarding_flag(identity, true).await {
                    tracing::warn!(
                        user_id = %identity.user_id,
                        "Failed to mark onboarding complete: {}",
                        e
                    );
                }
            }
            None => tracing::warn!("Finishing onboarding without a signed-in user"),
        }

        if let Err(e) = self.wizard.write().await.mark_complete() {
            tracing::debug!("Onboarding moved while finishing: {}", e);
        }
        Ok(LaunchRoute::MainApp)
    }

    /// Current onboarding status (for status displays).
    pub async fn get_status(&self) -> OnboardingStatus {
        let wizard = self.wizard.read().await;
        OnboardingStatus {
            step: wizard.step(),
            onboarding_completed: wizard.step().is_terminal(),
            submitting: self.is_submitting(),
            draft: wizard.draft().clone(),
        }
    }

    async fn mirror(&self, updates: &[FieldUpdate]) {
        if !self.mirror_fields || updates.is_empty() {
            return;
        }
        let Some(identity) = self.identity.as_ref() else {
            tracing::debug!(fields = updates.len(), "No signed-in user; skipping mirror write");
            return;
        };
        let fields: Map<String, serde_json::Value> = updates
            .iter()
            .map(|update| (update.field.to_string(), update.value.clone()))
            .collect();
        if let Err(e) = self.records.update_fields(identity, &fields).await {
            tracing::warn!(
                user_id = %identity.user_id,
                field = updates[0].field,
                "Failed to mirror onboarding fields: {}",
                e
            );
        }
    }
}

/// Snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub step: OnboardingStep,
    pub onboarding_completed: bool,
    pub submitting: bool,
    pub draft: OnboardingDraft,
}
