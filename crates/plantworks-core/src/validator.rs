//! Structured Output Validator
//!
//! Turns a raw model completion into a [`StructuredPayload`]:
//!
//! 1. Extract the JSON object (plain, fenced, or embedded in prose)
//! 2. Normalize every field against the schema's field table, coercing
//!    numeric strings and scalar-for-list answers, defaulting optional fields
//!    and dropping unknown keys
//! 3. On any violation, re-prompt the model once with the violation list and
//!    re-check the answer without further retries
//!
//! A payload that is already valid never reaches the model.

use crate::schema::{FieldKind, SchemaId, StructuredPayload};
use plantworks_llm::{CompletionRequest, LlmProvider, Message};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```")
        .expect("FENCED_JSON is a compile-time constant")
});

const DEFAULT_REPAIR_TIMEOUT: Duration = Duration::from_secs(30);

/// A single schema violation
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Offending field (dotted path for listing entries)
    pub field: String,
    /// What is wrong with it
    pub problem: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn violation(field: impl Into<String>, problem: impl Into<String>) -> Violation {
    Violation {
        field: field.into(),
        problem: problem.into(),
    }
}

/// Validation failure after the single repair attempt
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Required fields still missing or invalid
    #[error("unrecoverable {schema} output, invalid fields: {fields:?}")]
    Unrecoverable {
        /// Schema being validated
        schema: SchemaId,
        /// Fields that failed
        fields: Vec<String>,
        /// Last raw output seen, kept for salvage
        raw: String,
    },
}

/// Successfully validated output
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOutput {
    /// The typed payload
    pub payload: StructuredPayload,
    /// Whether the repair prompt was needed
    pub repaired: bool,
}

/// Validator with a model handle for the repair prompt
#[derive(Clone)]
pub struct Validator {
    llm: Arc<dyn LlmProvider>,
    model: String,
    timeout: Duration,
}

impl Validator {
    /// Create a validator that repairs through `llm`
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            timeout: DEFAULT_REPAIR_TIMEOUT,
        }
    }

    /// Bound the repair call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate `raw` against `schema`, repairing once if needed
    #[instrument(skip(self, raw), fields(schema = %schema))]
    pub async fn validate(&self, raw: &str, schema: SchemaId) -> Result<ValidatedOutput, ValidationError> {
        let violations = match check(raw, schema) {
            Ok(payload) => {
                return Ok(ValidatedOutput {
                    payload,
                    repaired: false,
                })
            }
            Err(violations) => violations,
        };

        debug!(violations = violations.len(), "Output failed validation, requesting repair");
        let request = self.repair_request(raw, schema, &violations);

        let repaired = match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                warn!(error = %e, "Repair request failed");
                return Err(unrecoverable(schema, &violations, raw));
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Repair request timed out");
                return Err(unrecoverable(schema, &violations, raw));
            }
        };

        match check(&repaired, schema) {
            Ok(payload) => Ok(ValidatedOutput {
                payload,
                repaired: true,
            }),
            Err(remaining) => {
                warn!(violations = remaining.len(), "Repaired output still invalid");
                Err(unrecoverable(schema, &remaining, &repaired))
            }
        }
    }

    fn repair_request(&self, raw: &str, schema: SchemaId, violations: &[Violation]) -> CompletionRequest {
        let problems = violations
            .iter()
            .map(|v| format!("- {}", v))
            .collect::<Vec<_>>()
            .join("\n");

        let system = format!(
            "You fix JSON so it matches a schema. Reply with one JSON object and nothing else.\n\
             Schema \"{}\" fields:\n{}",
            schema,
            schema.field_guide()
        );
        let user = format!(
            "This output has problems:\n{}\n\nOriginal output:\n{}\n\nReturn the corrected JSON object.",
            problems, raw
        );

        CompletionRequest::new(&self.model)
            .with_message(Message::system(system))
            .with_message(Message::user(user))
            .with_temperature(0.0)
    }
}

fn unrecoverable(schema: SchemaId, violations: &[Violation], raw: &str) -> ValidationError {
    let mut fields: Vec<String> = violations.iter().map(|v| v.field.clone()).collect();
    fields.dedup();
    ValidationError::Unrecoverable {
        schema,
        fields,
        raw: raw.to_string(),
    }
}

/// Pull the first JSON object out of a completion
#[must_use]
pub fn extract_json(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str(trimmed) {
        return Some(map);
    }

    if let Some(caps) = FENCED_JSON.captures(trimmed) {
        if let Ok(Value::Object(map)) = serde_json::from_str(&caps[1]) {
            return Some(map);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Check without repair: the normalized payload, or every violation found
pub fn check(raw: &str, schema: SchemaId) -> Result<StructuredPayload, Vec<Violation>> {
    let object = extract_json(raw).ok_or_else(|| vec![violation("$", "no JSON object found")])?;

    let mut normalized = Map::new();
    let mut violations = Vec::new();

    for spec in schema.fields() {
        match object.get(spec.name).filter(|v| !v.is_null()) {
            None if spec.required => violations.push(violation(spec.name, "missing")),
            None => {
                normalized.insert(spec.name.to_string(), spec.kind.default_value());
            }
            Some(value) => match normalize(spec.name, spec.kind, value) {
                Ok(v) => {
                    // An empty list is a valid answer; an empty required string is not
                    if spec.required && matches!(spec.kind, FieldKind::Text) && is_blank(&v) {
                        violations.push(violation(spec.name, "must not be empty"));
                    } else {
                        normalized.insert(spec.name.to_string(), v);
                    }
                }
                // A present optional field with a bad value is a violation too
                Err(mut found) => violations.append(&mut found),
            },
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    StructuredPayload::from_data(schema, Value::Object(normalized))
        .map_err(|e| vec![violation("$", e.to_string())])
}

/// Best-effort payload: valid fields kept, defaults everywhere else
#[must_use]
pub fn salvage(raw: &str, schema: SchemaId) -> StructuredPayload {
    let Some(object) = extract_json(raw) else {
        return StructuredPayload::placeholder(schema);
    };

    let mut normalized = Map::new();
    for spec in schema.fields() {
        let value = object
            .get(spec.name)
            .filter(|v| !v.is_null())
            .and_then(|v| normalize(spec.name, spec.kind, v).ok())
            .unwrap_or_else(|| spec.kind.default_value());
        normalized.insert(spec.name.to_string(), value);
    }

    StructuredPayload::from_data(schema, Value::Object(normalized))
        .unwrap_or_else(|_| StructuredPayload::placeholder(schema))
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or strings such as "0.85", "$35" or "1,200"
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .trim()
            .parse()
            .ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn normalize(name: &str, kind: FieldKind, value: &Value) -> Result<Value, Vec<Violation>> {
    let one = |problem: &str| vec![violation(name, problem)];

    match kind {
        FieldKind::Text => as_text(value)
            .map(Value::String)
            .ok_or_else(|| one("must be a string")),
        FieldKind::OptionalText => match as_text(value) {
            Some(s) if s.is_empty() => Ok(Value::Null),
            Some(s) => Ok(Value::String(s)),
            None => Err(one("must be a string or null")),
        },
        FieldKind::Number { min, max } => match as_number(value) {
            Some(n) if n >= min && n <= max => Ok(serde_json::json!(n)),
            Some(_) => Err(one(&format!("must be between {} and {}", min, max))),
            None => Err(one("must be a number")),
        },
        FieldKind::TextList => match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| as_text(item).ok_or_else(|| one("must contain only strings")))
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
            scalar => as_text(scalar)
                .map(|s| Value::Array(vec![Value::String(s)]))
                .ok_or_else(|| one("must be a list of strings")),
        },
        FieldKind::TextMap => match value {
            Value::Object(map) => Ok(Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let text = as_text(v).unwrap_or_else(|| v.to_string());
                        (k.clone(), Value::String(text))
                    })
                    .collect(),
            )),
            _ => Err(one("must be an object")),
        },
        FieldKind::AnyMap => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(one("must be an object")),
        },
        FieldKind::Listings => {
            let items = match value {
                Value::Array(items) => items.as_slice(),
                Value::Object(_) => std::slice::from_ref(value),
                _ => return Err(one("must be a list of listings")),
            };
            let mut listings = Vec::with_capacity(items.len());
            let mut violations = Vec::new();
            for (i, item) in items.iter().enumerate() {
                match normalize_listing(&format!("{}[{}]", name, i), item) {
                    Ok(listing) => listings.push(listing),
                    Err(mut found) => violations.append(&mut found),
                }
            }
            if violations.is_empty() {
                Ok(Value::Array(listings))
            } else {
                Err(violations)
            }
        }
    }
}

fn normalize_listing(path: &str, item: &Value) -> Result<Value, Vec<Violation>> {
    let Value::Object(entry) = item else {
        return Err(vec![violation(path, "must be an object")]);
    };

    let mut violations = Vec::new();
    let mut text = |key: &str| {
        let found = entry.get(key).and_then(as_text).filter(|s| !s.is_empty());
        if found.is_none() {
            violations.push(violation(format!("{}.{}", path, key), "must be a non-empty string"));
        }
        found.unwrap_or_default()
    };
    let retailer = text("retailer");
    let affiliate_link = text("affiliate_link");

    let price = entry.get("price").and_then(as_number).filter(|p| *p >= 0.0);
    if price.is_none() {
        violations.push(violation(format!("{}.price", path), "must be a non-negative number"));
    }
    let rating = entry
        .get("seller_rating")
        .and_then(as_number)
        .filter(|r| (0.0..=5.0).contains(r));
    if rating.is_none() {
        violations.push(violation(format!("{}.seller_rating", path), "must be a number between 0 and 5"));
    }

    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(serde_json::json!({
        "retailer": retailer,
        "price": price.unwrap_or_default(),
        "affiliate_link": affiliate_link,
        "seller_rating": rating.unwrap_or_default(),
    }))
}
