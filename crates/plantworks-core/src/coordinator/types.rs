//! Coordinator types

use crate::agents::{AgentKind, StructuredResult};
use crate::memory::{Part, SessionKey};
use plantworks_llm::MessageRole;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Name reported by the health surface
    #[serde(default = "default_name")]
    pub name: String,
    /// Minimum classification score for a label to be selected
    #[serde(default = "default_routing_threshold")]
    pub routing_threshold: f64,
    /// Model used for synthesis and repair
    #[serde(default = "default_model")]
    pub model: String,
    /// Timeout for each model call
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,
    /// Recent turns handed to specialists
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_name() -> String {
    "plantworks_main_agent".to_string()
}

fn default_routing_threshold() -> f64 {
    0.5
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    30_000
}

fn default_history_window() -> usize {
    6
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            routing_threshold: default_routing_threshold(),
            model: default_model(),
            llm_timeout_ms: default_llm_timeout_ms(),
            history_window: default_history_window(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the routing threshold
    #[must_use]
    pub fn with_routing_threshold(mut self, threshold: f64) -> Self {
        self.routing_threshold = threshold;
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the model call timeout
    #[must_use]
    pub fn with_llm_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.llm_timeout_ms = timeout_ms;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.routing_threshold) {
            return Err(crate::Error::Configuration(format!(
                "routing_threshold must be within [0, 1], got {}",
                self.routing_threshold
            )));
        }
        if self.llm_timeout_ms == 0 {
            return Err(crate::Error::Configuration(
                "llm_timeout_ms must be positive".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(crate::Error::Configuration("model must be set".to_string()));
        }
        Ok(())
    }
}

/// Errors surfaced by a turn
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The query had no text to route
    #[error("query is empty or cannot be routed")]
    EmptyOrUnroutable,

    /// The caller cancelled the turn; nothing was recorded
    #[error("turn cancelled")]
    Cancelled,

    /// Session store failure
    #[error("session error: {0}")]
    Session(String),
}

impl From<crate::Error> for CoordinatorError {
    fn from(e: crate::Error) -> Self {
        Self::Session(e.to_string())
    }
}

/// How results of several agents relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// One agent
    Single,
    /// Agents depend on each other and ran in stages
    Sequential,
    /// Independent agents ran concurrently
    ParallelMerge,
}

impl MergeStrategy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Sequential => "sequential",
            Self::ParallelMerge => "parallel-merge",
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification score for one label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Label
    pub agent: AgentKind,
    /// Score in `[0, 1]`
    pub score: f64,
}

/// Which agents handle a turn, and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Agents in dispatch order
    pub agents: Vec<AgentKind>,
    /// Merge strategy
    pub strategy: MergeStrategy,
    /// Per-label scores, in canonical label order
    pub scores: Vec<LabelScore>,
    /// No label reached the threshold and the default was used
    pub defaulted: bool,
}

/// An inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author role
    #[serde(default = "default_role")]
    pub role: MessageRole,
    /// Message parts
    pub parts: Vec<Part>,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

impl NewMessage {
    /// A user message with one text part
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Text parts joined with newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Session the turn was recorded in
    pub session: SessionKey,
    /// Routing decision
    pub routing: RoutingDecision,
    /// One result per dispatched agent, in dispatch order
    pub results: Vec<StructuredResult>,
    /// Location used for the turn
    pub resolved_location: Option<String>,
    /// Plant used for the turn
    pub resolved_plant: Option<String>,
    /// Assistant summary recorded in the session
    pub summary: String,
}

impl TurnResponse {
    /// Result of one agent, if it was dispatched
    #[must_use]
    pub fn result_for(&self, agent: AgentKind) -> Option<&StructuredResult> {
        self.results.iter().find(|r| r.agent == agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: CoordinatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.name, "plantworks_main_agent");
        assert_eq!(config.routing_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = CoordinatorConfig::default().with_routing_threshold(1.5);
        assert!(matches!(config.validate(), Err(crate::Error::Configuration(_))));
        let config = CoordinatorConfig::default().with_llm_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_message_text() {
        let message = NewMessage {
            role: MessageRole::User,
            parts: vec![Part::text("  hello "), Part::default(), Part::text("world")],
        };
        assert_eq!(message.text(), "hello\nworld");
        assert_eq!(NewMessage::user("   ").text(), "");
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&MergeStrategy::ParallelMerge).unwrap();
        assert_eq!(json, "\"parallel-merge\"");
    }
}
