//! Agent request/result types

use super::AgentKind;
use crate::schema::StructuredPayload;
use plantworks_tools::ToolInvocation;
use serde::{Deserialize, Serialize};

/// Lifecycle state of one specialist run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Not started
    Idle,
    /// Choosing tool calls
    Planning,
    /// Running tool waves
    ToolExecution,
    /// Asking the model for schema output
    Synthesizing,
    /// Finished with a validated payload
    Done,
    /// Finished without a validated payload
    Failed,
}

impl AgentState {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::ToolExecution => "tool_execution",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has ended
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor
    #[must_use]
    pub fn can_transition_to(&self, next: AgentState) -> bool {
        use AgentState::*;
        matches!(
            (self, next),
            (Idle, Planning)
                | (Planning, ToolExecution)
                | (ToolExecution, Synthesizing)
                | (Synthesizing, Done)
                | (Planning | ToolExecution | Synthesizing, Failed)
        )
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of an absorbed failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Live tool unavailable, mock answered
    ToolFallback,
    /// No path of the tool answered
    ToolFailure,
    /// A dependent call was not made because its input was unavailable
    ToolSkipped,
    /// Model output needed the repair prompt
    ValidationRepaired,
    /// Model output could not be repaired
    ValidationUnrecoverable,
    /// The model call failed
    LlmFailure,
    /// The model call timed out
    LlmTimeout,
}

/// One absorbed failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category
    pub kind: DiagnosticKind,
    /// Tool name, or the agent label for model failures
    pub source: String,
    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic
    #[must_use]
    pub fn new(kind: DiagnosticKind, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Input to [`super::SpecialistAgent::handle`]
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    /// The user's query text
    pub text: String,
    /// Plant name resolved by the coordinator
    pub plant_name: Option<String>,
    /// Location resolved by the coordinator
    pub location: Option<String>,
    /// Results of upstream agents in earlier dispatch stages
    pub upstream: Vec<StructuredResult>,
}

impl AgentRequest {
    /// Create a request for `text`
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the resolved plant name
    #[must_use]
    pub fn with_plant(mut self, plant_name: impl Into<String>) -> Self {
        self.plant_name = Some(plant_name.into());
        self
    }

    /// Set the resolved location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach upstream results
    #[must_use]
    pub fn with_upstream(mut self, upstream: Vec<StructuredResult>) -> Self {
        self.upstream = upstream;
        self
    }

    /// Plant name, preferring one identified upstream
    #[must_use]
    pub fn effective_plant(&self) -> Option<&str> {
        self.upstream
            .iter()
            .filter(|r| !r.degraded)
            .find_map(|r| r.payload.plant_name())
            .or(self.plant_name.as_deref())
    }
}

/// Validated output of one specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    /// Producing specialist
    pub agent: AgentKind,
    /// Final lifecycle state
    pub state: AgentState,
    /// Schema-tagged payload
    pub payload: StructuredPayload,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Whether any failure was absorbed
    pub degraded: bool,
    /// Short account of how the result was produced
    pub explanation: String,
    /// Absorbed failures
    pub diagnostics: Vec<Diagnostic>,
    /// Every tool call made
    pub tool_invocations: Vec<ToolInvocation>,
}

impl StructuredResult {
    /// Whether a diagnostic of `kind` was recorded
    #[must_use]
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}
