//! Tool contracts
//!
//! A [`ToolContract`] is the typed agreement for one named capability: the
//! parameters it accepts (with a semantic type and an optional validation
//! rule each), the keys its payload must carry, and whether the capability
//! reaches an external source (`Live`) or serves canned data (`Mock`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Where a tool's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Calls an external source
    Live,
    /// Deterministic canned data
    Mock,
}

impl CapabilityKind {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// UTF-8 text
    String,
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// true / false
    Boolean,
    /// JSON object
    Object,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
        }
    }
}

/// Validation rule applied after the type check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRule {
    /// String must contain non-whitespace
    NonEmpty,
    /// Number must lie in `[min, max]`
    Range {
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },
    /// String must be one of the listed values (case-insensitive)
    OneOf(Vec<String>),
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Semantic type
    pub kind: ParamKind,
    /// Whether the parameter must be present
    pub required: bool,
    /// Human-readable description
    pub description: String,
    /// Optional validation rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ParamRule>,
}

impl ParamSpec {
    /// A required parameter
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
            rule: None,
        }
    }

    /// An optional parameter
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Attach a validation rule
    #[must_use]
    pub fn with_rule(mut self, rule: ParamRule) -> Self {
        self.rule = Some(rule);
        self
    }

    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        if !self.kind.accepts(value) {
            return Err(format!(
                "'{}' must be of type {}",
                self.name,
                self.kind.json_type()
            ));
        }

        match &self.rule {
            None => Ok(()),
            Some(ParamRule::NonEmpty) => match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(()),
                _ => Err(format!("'{}' must not be empty", self.name)),
            },
            Some(ParamRule::Range { min, max }) => match value.as_f64() {
                Some(n) if n >= *min && n <= *max => Ok(()),
                _ => Err(format!("'{}' must be between {} and {}", self.name, min, max)),
            },
            Some(ParamRule::OneOf(allowed)) => {
                let given = value.as_str().unwrap_or_default().to_lowercase();
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(&given)) {
                    Ok(())
                } else {
                    Err(format!("'{}' must be one of: {}", self.name, allowed.join(", ")))
                }
            }
        }
    }
}

/// Typed input/output agreement for one named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContract {
    /// Unique tool name (exact, case-sensitive)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Declared parameters, in order
    pub params: Vec<ParamSpec>,
    /// Keys every successful payload must contain
    pub output_keys: Vec<String>,
    /// Live or mock
    pub capability: CapabilityKind,
}

impl ToolContract {
    /// Create a contract with no parameters
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capability: CapabilityKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            output_keys: Vec::new(),
            capability,
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Declare the payload keys
    #[must_use]
    pub fn with_output_keys(mut self, keys: &[&str]) -> Self {
        self.output_keys = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    /// Same contract with a different capability kind
    #[must_use]
    pub fn as_kind(&self, capability: CapabilityKind) -> Self {
        Self {
            capability,
            ..self.clone()
        }
    }

    /// Validate arguments against the input schema
    ///
    /// Unknown keys are tolerated; explicit `null` counts as absent.
    pub fn validate_args(&self, args: &Value) -> Result<()> {
        let obj = args
            .as_object()
            .ok_or_else(|| Error::InvalidArgs(format!("{}: arguments must be an object", self.name)))?;

        let mut problems = Vec::new();
        for param in &self.params {
            match obj.get(&param.name).filter(|v| !v.is_null()) {
                None if param.required => {
                    problems.push(format!("missing required '{}'", param.name));
                }
                None => {}
                Some(value) => {
                    if let Err(problem) = param.check(value) {
                        problems.push(problem);
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidArgs(format!("{}: {}", self.name, problems.join("; "))))
        }
    }

    /// Declared output keys absent from `payload`
    #[must_use]
    pub fn missing_output_keys(&self, payload: &Value) -> Vec<String> {
        self.output_keys
            .iter()
            .filter(|k| payload.get(k.as_str()).map_or(true, Value::is_null))
            .cloned()
            .collect()
    }

    /// JSON schema for the parameters, as advertised to the model
    #[must_use]
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let Some(ParamRule::OneOf(values)) = &param.rule {
                prop["enum"] = json!(values);
            }
            properties.insert(param.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert to the model-facing tool definition
    #[must_use]
    pub fn to_llm_tool(&self) -> plantworks_llm::ToolDefinition {
        plantworks_llm::ToolDefinition::new(&self.name, &self.description, self.parameters_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_contract() -> ToolContract {
        ToolContract::new("weather_lookup", "Weather", CapabilityKind::Live)
            .with_param(
                ParamSpec::required("location", ParamKind::String, "Place name")
                    .with_rule(ParamRule::NonEmpty),
            )
            .with_param(
                ParamSpec::optional("days", ParamKind::Integer, "Forecast days")
                    .with_rule(ParamRule::Range { min: 1.0, max: 16.0 }),
            )
            .with_param(
                ParamSpec::optional("units", ParamKind::String, "Unit system")
                    .with_rule(ParamRule::OneOf(vec!["metric".into(), "imperial".into()])),
            )
            .with_output_keys(&["location", "current"])
    }

    #[test]
    fn test_valid_args() {
        let contract = weather_contract();
        assert!(contract.validate_args(&json!({"location": "Harrow"})).is_ok());
        assert!(contract
            .validate_args(&json!({"location": "Harrow", "days": 3, "units": "Metric"}))
            .is_ok());
        // null optional is treated as absent
        assert!(contract.validate_args(&json!({"location": "Harrow", "days": null})).is_ok());
    }

    #[test]
    fn test_invalid_args() {
        let contract = weather_contract();

        let err = contract.validate_args(&json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(ref m) if m.contains("missing required 'location'")));

        let err = contract.validate_args(&json!({"location": "  "})).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = contract
            .validate_args(&json!({"location": "Harrow", "days": 30}))
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 16"));

        let err = contract
            .validate_args(&json!({"location": "Harrow", "days": "3"}))
            .unwrap_err();
        assert!(err.to_string().contains("type integer"));

        let err = contract
            .validate_args(&json!({"location": "Harrow", "units": "kelvin"}))
            .unwrap_err();
        assert!(err.to_string().contains("one of"));

        assert!(contract.validate_args(&json!("Harrow")).is_err());
    }

    #[test]
    fn test_missing_output_keys() {
        let contract = weather_contract();
        assert!(contract
            .missing_output_keys(&json!({"location": "x", "current": {}}))
            .is_empty());
        assert_eq!(
            contract.missing_output_keys(&json!({"location": "x", "current": null})),
            vec!["current".to_string()]
        );
    }

    #[test]
    fn test_parameters_schema() {
        let schema = weather_contract().parameters_schema();
        assert_eq!(schema["required"], json!(["location"]));
        assert_eq!(schema["properties"]["days"]["type"], "integer");
        assert_eq!(schema["properties"]["units"]["enum"], json!(["metric", "imperial"]));
    }
}
