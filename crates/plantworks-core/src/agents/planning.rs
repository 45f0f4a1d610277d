//! Deterministic tool planning and argument binding

use super::{AgentKind, AgentRequest};
use plantworks_tools::builtins::clean_plant_query;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

static SYMPTOM_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(yellow\w*|brown\w*|spots?|spotted|wilt\w*|droop\w*|powder\w*|mildew|mold|mould|insects?|pests?|bugs?|aphids?|disease\w*|symptoms?|rot\w*|dying|sick)\b",
    )
    .expect("SYMPTOM_CUES is a compile-time constant")
});

static PRICE_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:under|below|less\s+than|max(?:imum)?|up\s+to)\s*\$?\s*(\d+(?:\.\d+)?)")
        .expect("PRICE_CAP is a compile-time constant")
});

static NATIVE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(trees?|shrubs?|bush(?:es)?|flowers?|wildflowers?)\b")
        .expect("NATIVE_TYPE is a compile-time constant")
});

static CARE_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(beginner|easy|low[- ]maintenance|intermediate|advanced|expert)\b")
        .expect("CARE_LEVEL is a compile-time constant")
});

/// One tool call chosen by the planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCall {
    /// Tool name
    pub tool: &'static str,
    /// Arguments known at planning time
    pub args: Value,
}

impl PlannedCall {
    fn new(tool: &'static str, args: Value) -> Self {
        Self { tool, args }
    }
}

/// Choose the tool calls for `kind` from the request
pub(super) fn plan(kind: AgentKind, request: &AgentRequest) -> Vec<PlannedCall> {
    let plant = request.effective_plant().map(str::to_string);
    let location = request.location.as_deref();
    let text = request.text.as_str();

    match kind {
        AgentKind::Identification => {
            let query = plant.unwrap_or_else(|| clean_plant_query(text));
            vec![PlannedCall::new(
                "plant_database_search",
                json!({"query": query, "limit": 3}),
            )]
        }
        AgentKind::Cultivation => {
            let mut calls = Vec::new();
            if let Some(plant) = &plant {
                calls.push(PlannedCall::new(
                    "plant_database_search",
                    json!({"query": plant, "limit": 1}),
                ));
                let mut args = object([("plant_name", json!(plant))]);
                insert_opt(&mut args, "location", location.map(Value::from));
                insert_opt(&mut args, "care_level", care_level(text).map(Value::from));
                calls.push(PlannedCall::new("plant_care_scheduler", Value::Object(args)));
            }
            if SYMPTOM_CUES.is_match(text) {
                let mut args = object([("symptoms", json!(text.trim()))]);
                insert_opt(&mut args, "plant_type", plant.as_deref().map(Value::from));
                calls.push(PlannedCall::new("disease_identifier", Value::Object(args)));
            }
            if let Some(location) = location {
                calls.push(PlannedCall::new(
                    "weather_lookup",
                    json!({"location": location, "days": 3}),
                ));
            }
            if calls.is_empty() {
                calls.push(PlannedCall::new(
                    "plant_database_search",
                    json!({"query": clean_plant_query(text), "limit": 1}),
                ));
            }
            calls
        }
        AgentKind::Locale => {
            let Some(location) = location else {
                return Vec::new();
            };
            let mut native = object([("location", json!(location))]);
            insert_opt(&mut native, "plant_type", native_type(text).map(Value::from));
            vec![
                PlannedCall::new("location_resolver", json!({"query": location})),
                PlannedCall::new("hardiness_zone_lookup", json!({"location": location})),
                PlannedCall::new("soil_analyzer", json!({"location": location})),
                PlannedCall::new("native_plant_finder", Value::Object(native)),
                PlannedCall::new("weather_lookup", json!({"location": location, "days": 3})),
            ]
        }
        AgentKind::Marketplace => {
            let plant = plant.unwrap_or_else(|| clean_plant_query(text));
            let mut search = object([("plant_name", json!(plant))]);
            insert_opt(&mut search, "location", location.map(Value::from));
            insert_opt(&mut search, "max_price", price_cap(text).map(Value::from));
            vec![
                PlannedCall::new("marketplace_search", Value::Object(search)),
                PlannedCall::new("price_comparator", json!({"plant_name": plant})),
                // seller_name is bound after the search
                PlannedCall::new("seller_verifier", json!({})),
            ]
        }
    }
}

/// Bind a dependent call's arguments from the payloads gathered so far
///
/// Returns `None` when the call needs an input that no predecessor supplied.
pub(super) fn bind_args(tool: &str, args: &Value, payloads: &HashMap<String, Value>) -> Option<Value> {
    let mut bound = args.as_object().cloned().unwrap_or_default();

    match tool {
        "hardiness_zone_lookup" | "soil_analyzer" | "native_plant_finder" | "weather_lookup" => {
            if let Some(place) = payloads.get("location_resolver") {
                if let Some(name) = place.get("resolved_name").and_then(Value::as_str) {
                    bound.insert("location".into(), json!(name));
                }
                for key in ["latitude", "longitude"] {
                    if let Some(v) = place.get(key).filter(|v| v.is_number()) {
                        bound.insert(key.into(), v.clone());
                    }
                }
            }
        }
        "plant_care_scheduler" => {
            let top = payloads
                .get("plant_database_search")
                .and_then(|p| p.get("results"))
                .and_then(Value::as_array)
                .and_then(|r| r.first());
            if let Some(top) = top {
                for key in ["light", "watering"] {
                    if let Some(v) = top.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()) {
                        bound.insert(key.into(), json!(v));
                    }
                }
            }
        }
        "price_comparator" => {
            products(payloads).filter(|p| !p.is_empty())?;
        }
        "seller_verifier" => {
            let seller = products(payloads)?
                .iter()
                .filter_map(|p| {
                    let seller = p.get("seller").and_then(Value::as_str)?;
                    let rating = p.get("rating").and_then(Value::as_f64).unwrap_or(0.0);
                    Some((seller, rating))
                })
                .max_by(|a, b| a.1.total_cmp(&b.1))?
                .0;
            bound.insert("seller_name".into(), json!(seller));
        }
        _ => {}
    }

    Some(Value::Object(bound))
}

fn products(payloads: &HashMap<String, Value>) -> Option<&Vec<Value>> {
    payloads
        .get("marketplace_search")
        .and_then(|p| p.get("products"))
        .and_then(Value::as_array)
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn price_cap(text: &str) -> Option<f64> {
    PRICE_CAP
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn native_type(text: &str) -> Option<&'static str> {
    let word = NATIVE_TYPE.captures(text)?.get(1)?.as_str().to_lowercase();
    Some(if word.starts_with("tree") {
        "trees"
    } else if word.starts_with("shrub") || word.starts_with("bush") {
        "shrubs"
    } else {
        "flowers"
    })
}

fn care_level(text: &str) -> Option<&'static str> {
    let word = CARE_LEVEL.captures(text)?.get(1)?.as_str().to_lowercase();
    Some(match word.as_str() {
        "intermediate" => "intermediate",
        "advanced" | "expert" => "advanced",
        _ => "easy",
    })
}
