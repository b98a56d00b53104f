//! Onboarding flow tests against in-process collaborators.
//!
//! These exercise the manager's concurrency behavior: navigation and a
//! second submit while one is outstanding, and a plan fetch that outlives
//! its result step.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::timeout;

use nutrinana::error::{OnboardingError, RemoteError};
use nutrinana::onboarding::{
    ActivityLevel, Character, Gender, GoalType, LaunchRoute, NutritionPlan, OnboardingManager,
    OnboardingStep, StepInput, SubmissionPayload, launch_route,
};
use nutrinana::remote::{
    Identity, InMemoryProfileService, InMemoryUserStore, ProfileService, SaveReceipt,
    UserRecordStore,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Profile service whose calls block until the test releases them.
#[derive(Default)]
struct GatedProfiles {
    started: Notify,
    release: Notify,
    saves: AtomicUsize,
}

#[async_trait]
impl ProfileService for GatedProfiles {
    async fn save_profile(
        &self,
        _identity: &Identity,
        _payload: &SubmissionPayload,
    ) -> Result<SaveReceipt, RemoteError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(SaveReceipt::default())
    }

    async fn get_profile(&self, _identity: &Identity) -> Result<Option<NutritionPlan>, RemoteError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Some(NutritionPlan {
            nickname: Some("Bo".to_string()),
            bmi: Some(22.0),
            daily_calorie: Some(2100.0),
            ..Default::default()
        }))
    }
}

fn bob() -> Identity {
    Identity::new("bob-uid").with_email("bob@example.com")
}

async fn answer_profile(manager: &OnboardingManager, goal: GoalType) {
    for input in [
        StepInput::Character(Character::Ninja),
        StepInput::Nickname("  Bo ".to_string()),
        StepInput::Gender(Gender::Male),
        StepInput::Age(30),
        StepInput::Height(175.0),
        StepInput::Weight(70.0),
        StepInput::ActivityLevel(ActivityLevel::Light),
        StepInput::Goal(goal),
    ] {
        manager.advance(input).await.unwrap();
    }
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let profiles = Arc::new(GatedProfiles::default());
        let manager = Arc::new(OnboardingManager::new(
            profiles.clone(),
            Arc::new(InMemoryUserStore::new()),
            Some(bob()),
        ));
        answer_profile(&manager, GoalType::Maintain).await;
        assert_eq!(manager.current_step().await, OnboardingStep::Plan);

        let first = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.submit().await })
        };
        profiles.started.notified().await;

        assert!(manager.is_submitting());
        let second = manager.submit().await;
        assert!(matches!(second, Err(OnboardingError::SubmissionInFlight)));

        profiles.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.step, OnboardingStep::Result);
        assert_eq!(profiles.saves.load(Ordering::SeqCst), 1);
        assert!(!manager.is_submitting());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn navigation_is_refused_while_submitting() {
    timeout(TEST_TIMEOUT, async {
        let profiles = Arc::new(GatedProfiles::default());
        let manager = Arc::new(OnboardingManager::new(
            profiles.clone(),
            Arc::new(InMemoryUserStore::new()),
            Some(bob()),
        ));
        answer_profile(&manager, GoalType::Maintain).await;

        let first = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.submit().await })
        };
        profiles.started.notified().await;

        let back = manager.back().await;
        assert!(matches!(back, Err(OnboardingError::SubmissionInFlight)));
        let advance = manager.advance(StepInput::Goal(GoalType::Lose)).await;
        assert!(matches!(advance, Err(OnboardingError::SubmissionInFlight)));
        assert_eq!(manager.current_step().await, OnboardingStep::Plan);

        profiles.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.step, OnboardingStep::Result);
        assert_eq!(manager.current_step().await, OnboardingStep::Result);
        assert_eq!(profiles.saves.load(Ordering::SeqCst), 1);

        // The draft is gone, so there is nothing to submit again.
        assert!(manager.back().await.is_err());
        assert!(manager.submit().await.is_err());
        assert_eq!(profiles.saves.load(Ordering::SeqCst), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn late_plan_is_discarded_after_leaving_result() {
    timeout(TEST_TIMEOUT, async {
        let profiles = Arc::new(GatedProfiles::default());
        let manager = Arc::new(OnboardingManager::new(
            profiles.clone(),
            Arc::new(InMemoryUserStore::new()),
            Some(bob()),
        ));
        answer_profile(&manager, GoalType::Maintain).await;

        let submit = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.submit().await })
        };
        profiles.started.notified().await;
        profiles.release.notify_one();
        submit.await.unwrap().unwrap();
        assert_eq!(manager.current_step().await, OnboardingStep::Result);

        let fetch = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.fetch_result().await })
        };
        profiles.started.notified().await;
        assert_eq!(manager.finish().await.unwrap(), LaunchRoute::MainApp);
        profiles.release.notify_one();

        assert_eq!(fetch.await.unwrap().unwrap(), None);
        assert_eq!(manager.current_step().await, OnboardingStep::Complete);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn maintain_flow_skips_target_and_speed() {
    let profiles = Arc::new(InMemoryProfileService::new());
    let records = Arc::new(InMemoryUserStore::new());
    let manager = OnboardingManager::new(profiles.clone(), records.clone(), Some(bob()));

    assert_eq!(launch_route(&*records, Some(&bob())).await, LaunchRoute::Onboarding);
    answer_profile(&manager, GoalType::Maintain).await;
    assert_eq!(manager.current_step().await, OnboardingStep::Plan);

    // Back from the plan lands on the goal, not the skipped steps.
    assert_eq!(manager.back().await.unwrap(), OnboardingStep::GoalType);
    manager.advance(StepInput::Goal(GoalType::Maintain)).await.unwrap();

    let outcome = manager.submit().await.unwrap();
    assert_eq!(outcome.payload.nickname, "Bo");
    assert_eq!(outcome.payload.target_weight, 70.0);
    assert_eq!(outcome.payload.weight_speed, 0.0);
    assert_eq!(outcome.payload.activity_level, 1.375);
    assert_eq!(profiles.submissions().await.len(), 1);

    manager.finish().await.unwrap();
    assert_eq!(records.get_onboarding_flag(&bob()).await.unwrap(), Some(true));
    assert_eq!(launch_route(&*records, Some(&bob())).await, LaunchRoute::MainApp);
}

#[tokio::test]
async fn gain_flow_rejects_target_on_wrong_side() {
    let manager = OnboardingManager::new(
        Arc::new(InMemoryProfileService::new()),
        Arc::new(InMemoryUserStore::new()),
        Some(bob()),
    );
    answer_profile(&manager, GoalType::Gain).await;
    assert_eq!(manager.current_step().await, OnboardingStep::TargetWeight);

    let range = manager.target_range().await.unwrap();
    assert_eq!((range.min_kg, range.max_kg, range.default_kg), (71.0, 200.0, 72.0));

    let err = manager.advance(StepInput::TargetWeight(65.0)).await.unwrap_err();
    assert!(matches!(err, OnboardingError::Validation(_)));
    assert_eq!(manager.current_step().await, OnboardingStep::TargetWeight);

    manager.advance(StepInput::TargetWeight(75.0)).await.unwrap();
    let domain = manager.speed_domain().await.unwrap();
    assert_eq!(domain.default_kg_per_week, 0.2);
    assert!(manager.advance(StepInput::Speed(0.8)).await.is_err());
    manager.advance(StepInput::Speed(0.3)).await.unwrap();
    assert_eq!(manager.current_step().await, OnboardingStep::Plan);
}
