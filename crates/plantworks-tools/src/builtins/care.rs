//! Care scheduling and symptom diagnosis

use super::plant_search::find_plant;
use super::{required_str, str_arg};
use crate::contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
use crate::error::Result;
use crate::registry::Tool;
use serde_json::{json, Value};

const CARE_LEVELS: [&str; 3] = ["easy", "intermediate", "advanced"];

// watering, fertilizing, pruning, inspection
fn base_schedule(level: &str) -> [&'static str; 4] {
    match level {
        "easy" => [
            "Every 7-10 days",
            "Monthly during growing season",
            "As needed",
            "Weekly",
        ],
        "advanced" => [
            "Based on soil moisture and weather",
            "Custom nutrient schedule",
            "Strategic pruning for optimal growth",
            "Daily monitoring",
        ],
        _ => [
            "Every 5-7 days, check soil moisture",
            "Bi-weekly during growing season",
            "Monthly maintenance",
            "Twice weekly",
        ],
    }
}

/// Weekly and seasonal care plan for a plant
pub struct PlantCareSchedulerTool {
    contract: ToolContract,
}

impl PlantCareSchedulerTool {
    /// Create the scheduler
    #[must_use]
    pub fn new() -> Self {
        let contract = ToolContract::new(
            "plant_care_scheduler",
            "Build a weekly and seasonal care schedule for a plant.",
            CapabilityKind::Mock,
        )
        .with_param(
            ParamSpec::required("plant_name", ParamKind::String, "Plant to schedule care for")
                .with_rule(ParamRule::NonEmpty),
        )
        .with_param(ParamSpec::optional("location", ParamKind::String, "Where the plant grows"))
        .with_param(
            ParamSpec::optional("care_level", ParamKind::String, "Desired care intensity")
                .with_rule(ParamRule::OneOf(CARE_LEVELS.iter().map(|s| (*s).to_string()).collect())),
        )
        .with_param(ParamSpec::optional("light", ParamKind::String, "Known light requirement"))
        .with_param(ParamSpec::optional("watering", ParamKind::String, "Known watering need"))
        .with_output_keys(&["plant_name", "care_level", "weekly_schedule", "seasonal_adjustments"]);
        Self { contract }
    }
}

impl Default for PlantCareSchedulerTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for PlantCareSchedulerTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let plant_name = required_str(&args, "plant_name")?;
        let record = find_plant(plant_name);

        let care_level = str_arg(&args, "care_level")
            .map(str::to_lowercase)
            .or_else(|| record.map(|r| r.care_level.to_string()))
            .unwrap_or_else(|| "intermediate".to_string());
        let [watering, fertilizing, pruning, inspection] = base_schedule(&care_level);

        // Plant-specific details beat the generic schedule
        let watering = str_arg(&args, "watering")
            .or(record.map(|r| r.watering))
            .unwrap_or(watering);
        let light = str_arg(&args, "light")
            .or(record.map(|r| r.light))
            .unwrap_or("Bright, indirect light");
        let soil = record.map_or("Well-draining potting mix", |r| r.soil);

        Ok(json!({
            "plant_name": plant_name,
            "scientific_name": record.map(|r| r.scientific_name),
            "location": str_arg(&args, "location"),
            "care_level": care_level,
            "weekly_schedule": {
                "watering": watering,
                "fertilizing": fertilizing,
                "pruning": pruning,
                "inspection": inspection,
            },
            "light": light,
            "soil": soil,
            "monthly_tasks": [
                "Check for pests and diseases",
                "Rotate plant for even growth",
                "Clean leaves if dusty",
                "Check soil drainage",
            ],
            "seasonal_adjustments": {
                "spring": "Increase watering and fertilizing as growth resumes",
                "summer": "Monitor for heat stress, increase humidity",
                "fall": "Reduce watering and fertilizing, prepare for dormancy",
                "winter": "Minimal watering, no fertilizing, watch for dry air",
            },
        }))
    }
}

struct Condition {
    symptom: &'static str,
    issues: &'static [&'static str],
    treatments: &'static [&'static str],
    confidence: f64,
}

const CONDITIONS: &[Condition] = &[
    Condition {
        symptom: "yellowing leaves",
        issues: &["Overwatering", "Nutrient deficiency", "Natural aging"],
        treatments: &["Reduce watering frequency", "Check soil drainage", "Apply balanced fertilizer"],
        confidence: 0.8,
    },
    Condition {
        symptom: "brown spots",
        issues: &["Fungal infection", "Bacterial spot", "Sunburn"],
        treatments: &["Remove affected leaves", "Improve air circulation", "Apply fungicide if needed"],
        confidence: 0.7,
    },
    Condition {
        symptom: "wilting",
        issues: &["Underwatering", "Root rot", "Heat stress"],
        treatments: &["Check soil moisture", "Inspect roots", "Provide shade during hot weather"],
        confidence: 0.75,
    },
    Condition {
        symptom: "white powder",
        issues: &["Powdery mildew"],
        treatments: &["Improve air circulation", "Apply neem oil", "Remove affected parts"],
        confidence: 0.9,
    },
    Condition {
        symptom: "small insects",
        issues: &["Aphids", "Spider mites", "Thrips"],
        treatments: &["Spray with water", "Apply insecticidal soap", "Introduce beneficial insects"],
        confidence: 0.8,
    },
];

const PREVENTION_TIPS: &[&str] = &[
    "Maintain proper watering schedule",
    "Ensure good air circulation",
    "Inspect plants regularly",
    "Quarantine new plants",
    "Keep growing area clean",
];

/// Rule-based symptom diagnosis
pub struct DiseaseIdentifierTool {
    contract: ToolContract,
}

impl DiseaseIdentifierTool {
    /// Create the identifier
    #[must_use]
    pub fn new() -> Self {
        let contract = ToolContract::new(
            "disease_identifier",
            "Diagnose likely diseases or pests from described symptoms.",
            CapabilityKind::Mock,
        )
        .with_param(
            ParamSpec::required("symptoms", ParamKind::String, "Observed symptoms")
                .with_rule(ParamRule::NonEmpty),
        )
        .with_param(ParamSpec::optional("plant_type", ParamKind::String, "Affected plant"))
        .with_output_keys(&["possible_issues", "recommended_treatments", "confidence"]);
        Self { contract }
    }
}

impl Default for DiseaseIdentifierTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for DiseaseIdentifierTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let symptoms = required_str(&args, "symptoms")?;
        let lowered = symptoms.to_lowercase();

        // Highest-confidence matching condition wins; ties keep the first
        let best = CONDITIONS
            .iter()
            .filter(|c| lowered.contains(c.symptom))
            .fold(None::<&Condition>, |best, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            });

        let (issues, treatments, confidence): (Vec<&str>, Vec<&str>, f64) = match best {
            Some(c) => (c.issues.to_vec(), c.treatments.to_vec(), c.confidence),
            None => (
                vec!["Unknown condition - requires expert diagnosis"],
                vec![
                    "Take clear photos of affected areas",
                    "Consult local extension service",
                    "Isolate plant if possible",
                    "Monitor for changes",
                ],
                0.3,
            ),
        };

        Ok(json!({
            "plant_type": str_arg(&args, "plant_type"),
            "symptoms": symptoms,
            "possible_issues": issues,
            "recommended_treatments": treatments,
            "prevention_tips": PREVENTION_TIPS,
            "confidence": confidence,
        }))
    }
}
