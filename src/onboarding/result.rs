//! Result presenter: normalizes the computed profile and formats it.
//!
//! All numbers here are computed server-side. The only local logic is
//! bucketing BMI and picking the goal description.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::RemoteError;

/// Computed nutrition profile as returned by `get-profile`.
///
/// The backend returns raw column names (`BMI`, `DAILY_CALORIE`, ...) while
/// older payloads used lowercase keys. [`NutritionPlan::from_remote`]
/// folds both into these snake_case fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub character_id: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub goal_type: Option<String>,
    #[serde(default)]
    pub lifestyle_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub target_rate_kg_per_week: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bmi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bmr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tdee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_calorie: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_water_l: Option<f64>,
}

/// Alternate spellings mapped onto the canonical field names.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("weight", "weight_kg"),
    ("height", "height_cm"),
    ("target_weight", "target_weight_kg"),
    ("weight_speed", "target_rate_kg_per_week"),
    ("daily_water", "daily_water_l"),
    ("daily_calories", "daily_calorie"),
    ("goal", "goal_type"),
];

impl NutritionPlan {
    /// Normalize a remote profile record into the canonical shape.
    ///
    /// Keys are lowercased and aliased; when two spellings of one field are
    /// present the first non-null value wins.
    pub fn from_remote(record: &Value) -> Result<Self, RemoteError> {
        let object = record
            .as_object()
            .ok_or_else(|| RemoteError::InvalidResponse {
                service: "profile".to_string(),
                reason: "profile data is not an object".to_string(),
            })?;

        let mut normalized = Map::new();
        for (key, value) in object {
            let key = canonical_key(key);
            let keep_existing = normalized.get(&key).is_some_and(|v: &Value| !v.is_null());
            if !keep_existing {
                normalized.insert(key, value.clone());
            }
        }

        serde_json::from_value(Value::Object(normalized)).map_err(|e| RemoteError::InvalidResponse {
            service: "profile".to_string(),
            reason: e.to_string(),
        })
    }
}

fn canonical_key(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

/// Numbers arrive as JSON numbers or as strings (DECIMAL columns).
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// BMI band shown on the result screen.
///
/// Edges are half-open as observed: `[18.5, 24.9)` normal, `[24.9, 29.9)`
/// overweight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 24.9 {
            Self::Normal
        } else if bmi < 29.9 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Thiếu cân",
            Self::Normal => "Bình thường",
            Self::Overweight => "Thừa cân",
            Self::Obese => "Béo phì",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Heading and explanation for the calorie card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalSummary {
    pub title: &'static str,
    pub description: &'static str,
}

impl GoalSummary {
    /// Unknown or missing goals read as maintain.
    pub fn for_goal(goal: Option<&str>) -> Self {
        match goal {
            Some("lose") => Self {
                title: "Giảm cân",
                description: "Năng lượng nạp vào để giảm cân (calo thâm hụt = TDEE - 500)",
            },
            Some("gain") => Self {
                title: "Tăng cân",
                description: "Năng lượng nạp vào để tăng cân (calo dư thừa = TDEE + 500)",
            },
            _ => Self {
                title: "Duy trì cân nặng",
                description: "Năng lượng nạp vào để duy trì cân nặng (TDEE)",
            },
        }
    }
}

/// Read-only summary rendered after submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub nickname: Option<String>,
    pub daily_calorie: Option<f64>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub daily_water_l: Option<f64>,
    pub goal: GoalSummary,
}

impl ResultSummary {
    pub fn from_plan(plan: &NutritionPlan) -> Self {
        let bmi = plan.bmi.filter(|b| b.is_finite());
        Self {
            nickname: plan.nickname.clone(),
            daily_calorie: plan.daily_calorie,
            bmi,
            bmi_category: bmi.map(BmiCategory::from_bmi),
            daily_water_l: plan.daily_water_l,
            goal: GoalSummary::for_goal(plan.goal_type.as_deref()),
        }
    }

    /// Plain-text rendering for terminals and logs.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref name) = self.nickname {
            lines.push(format!("Xin chào, {name}!"));
        }
        lines.push(format!("{}: {}", self.goal.title, self.goal.description));
        match self.daily_calorie {
            Some(kcal) => lines.push(format!("Calo mỗi ngày: {kcal:.0} kcal")),
            None => lines.push("Calo mỗi ngày: --".to_string()),
        }
        match (self.bmi, self.bmi_category) {
            (Some(bmi), Some(category)) => lines.push(format!("BMI: {bmi:.1} ({category})")),
            _ => lines.push("BMI: --".to_string()),
        }
        match self.daily_water_l {
            Some(litres) => lines.push(format!("Nước mỗi ngày: {litres} L")),
            None => lines.push("Nước mỗi ngày: --".to_string()),
        }
        lines.join("\n")
    }
}
