use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use nutrinana::config::{identity_from_env, ClientConfig};
use nutrinana::error::OnboardingError;
use nutrinana::onboarding::{
    launch_route, ActivityLevel, Character, Gender, GoalType, LaunchRoute, OnboardingManager,
    OnboardingStep, SpeedAdvice, StepInput,
};
use nutrinana::remote::{
    FirestoreUserStore, HttpProfileService, InMemoryUserStore, ProfileService, UserRecordStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ClientConfig::from_env()?;
    let identity = identity_from_env();

    eprintln!("🍌 NutriNana onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend_url);

    let profiles: Arc<dyn ProfileService> = Arc::new(HttpProfileService::new(&config)?);
    let records: Arc<dyn UserRecordStore> = match config.firestore_project {
        Some(ref project) => {
            eprintln!("   User records: Firestore ({project})");
            Arc::new(FirestoreUserStore::new(&config)?)
        }
        None => {
            eprintln!("   User records: in-memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    match launch_route(records.as_ref(), identity.as_ref()).await {
        LaunchRoute::SignIn => {
            eprintln!("Error: no signed-in user");
            eprintln!("  export NUTRINANA_USER_ID=<uid>");
            std::process::exit(1);
        }
        LaunchRoute::MainApp => {
            eprintln!("Onboarding already completed. Nothing to do.");
            return Ok(());
        }
        LaunchRoute::Onboarding => {}
    }

    let manager = OnboardingManager::new(profiles, records, identity)
        .with_mirroring(config.mirror_fields);
    eprintln!("   Type 'back' to return to the previous step.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let step = manager.current_step().await;
        let (position, total) = step.progress(manager.draft().await.goal());
        eprint!("[{position}/{total}] {}\n> ", prompt_for(step, &manager).await);

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();

        if line.eq_ignore_ascii_case("back") {
            if let Err(e) = manager.back().await {
                eprintln!("⚠️  {e}");
            }
            continue;
        }

        match step {
            OnboardingStep::Plan => {
                eprintln!("⏳ Đang lập kế hoạch...");
                match manager.submit().await {
                    Ok(outcome) if outcome.receipt.is_none() => {
                        eprintln!("⚠️  Không thể lưu hồ sơ lúc này; tiếp tục với dữ liệu hiện có.")
                    }
                    Ok(_) => {}
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
            OnboardingStep::Result => {
                match manager.fetch_result().await {
                    Ok(Some(summary)) => println!("\n{}\n", summary.render()),
                    Ok(None) => println!("\nChưa có dữ liệu kế hoạch.\n"),
                    Err(e) => eprintln!("❌ {e}"),
                }
                match manager.finish().await {
                    Ok(route) => {
                        tracing::info!(route = ?route, "Onboarding finished");
                        eprintln!("✅ Hoàn tất! Chào mừng bạn đến với NutriNana.");
                        break;
                    }
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
            OnboardingStep::Complete => break,
            _ => {
                let input = match parse_input(step, line, &manager).await {
                    Ok(input) => input,
                    Err(message) => {
                        eprintln!("⚠️  {message}");
                        continue;
                    }
                };
                match manager.advance(input).await {
                    Ok(_) => {}
                    Err(OnboardingError::Validation(e)) => eprintln!("⚠️  {}", e.user_message()),
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
        }
    }

    Ok(())
}

async fn prompt_for(step: OnboardingStep, manager: &OnboardingManager) -> String {
    match step {
        OnboardingStep::Character => {
            let options: Vec<String> = Character::ALL
                .iter()
                .map(|c| format!("{} ({})", c.id(), c.display_name()))
                .collect();
            format!(
                "Chọn bạn đồng hành [{}] (mặc định: {}):",
                options.join(", "),
                Character::default()
            )
        }
        OnboardingStep::Nickname => "Biệt danh của bạn là gì?".to_string(),
        OnboardingStep::Gender => "Giới tính của bạn? [male, female]".to_string(),
        OnboardingStep::Age => "Hiện tại bạn bao nhiêu tuổi?".to_string(),
        OnboardingStep::Height => "Chiều cao của bạn (cm)?".to_string(),
        OnboardingStep::Weight => "Cân nặng hiện tại (kg)?".to_string(),
        OnboardingStep::ActivityLevel => {
            let options: Vec<String> = ActivityLevel::ALL
                .iter()
                .map(|a| format!("{} ({})", a.as_str(), a.label()))
                .collect();
            format!("Mức độ vận động? [{}]", options.join(", "))
        }
        OnboardingStep::GoalType => "Mục tiêu của bạn? [lose, maintain, gain]".to_string(),
        OnboardingStep::TargetWeight => match manager.target_range().await {
            Ok(range) => format!(
                "Cân nặng mục tiêu (kg) [{} - {}] (mặc định: {}):",
                range.min_kg, range.max_kg, range.default_kg
            ),
            Err(e) => format!("{} Gõ 'back' để chọn lại.", e.user_message()),
        },
        OnboardingStep::Speed => match manager.speed_domain().await {
            Some(domain) => format!(
                "Tốc độ (kg/tuần) [0.1 - {}] (mặc định: {}):",
                domain.max_kg_per_week, domain.default_kg_per_week
            ),
            None => "Duy trì cân nặng.".to_string(),
        },
        OnboardingStep::Plan => "Nhấn Enter để lập kế hoạch.".to_string(),
        OnboardingStep::Result => "Nhấn Enter để xem kết quả và bắt đầu.".to_string(),
        OnboardingStep::Complete => "Hoàn tất.".to_string(),
    }
}

/// Turn a typed line into the value for `step`. Empty input takes the
/// step's default where it has one.
async fn parse_input(
    step: OnboardingStep,
    line: &str,
    manager: &OnboardingManager,
) -> Result<StepInput, String> {
    let number = |line: &str| -> Result<f64, String> {
        line.replace(',', ".")
            .parse::<f64>()
            .map_err(|_| format!("'{line}' không phải là số"))
    };

    match step {
        OnboardingStep::Character if line.is_empty() => Ok(StepInput::Character(Character::default())),
        OnboardingStep::Character => line.parse::<Character>().map(StepInput::Character),
        OnboardingStep::Nickname => Ok(StepInput::Nickname(line.to_string())),
        OnboardingStep::Gender => line.parse::<Gender>().map(StepInput::Gender),
        OnboardingStep::Age => line
            .parse::<u32>()
            .map(StepInput::Age)
            .map_err(|_| format!("'{line}' không phải là số tuổi")),
        OnboardingStep::Height => number(line).map(StepInput::Height),
        OnboardingStep::Weight => number(line).map(StepInput::Weight),
        OnboardingStep::ActivityLevel => line.parse::<ActivityLevel>().map(StepInput::ActivityLevel),
        OnboardingStep::GoalType => line.parse::<GoalType>().map(StepInput::Goal),
        OnboardingStep::TargetWeight if line.is_empty() => manager
            .target_range()
            .await
            .map(|range| StepInput::TargetWeight(range.default_kg))
            .map_err(|e| e.user_message()),
        OnboardingStep::TargetWeight => number(line).map(StepInput::TargetWeight),
        OnboardingStep::Speed => {
            let domain = manager.speed_domain().await;
            let speed = match (line.is_empty(), domain) {
                (true, Some(domain)) => domain.default_kg_per_week,
                (true, None) => 0.0,
                (false, _) => number(line)?,
            };
            if let Some(goal) = manager.draft().await.goal() {
                let advice = SpeedAdvice::for_speed(goal, speed);
                if advice.is_warning() {
                    eprintln!("⚠️  {}", advice.label());
                } else {
                    eprintln!("ℹ️  {}", advice.label());
                }
            }
            Ok(StepInput::Speed(speed))
        }
        OnboardingStep::Plan | OnboardingStep::Result | OnboardingStep::Complete => {
            Err(format!("Bước {step} không cần nhập giá trị"))
        }
    }
}
