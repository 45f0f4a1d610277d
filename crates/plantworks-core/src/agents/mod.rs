//! Specialist Agents
//!
//! Four specialists share one lifecycle and differ only in their
//! [`AgentSpec`]: persona, tool subset, tool dependency edges and output
//! schema.
//!
//! ```text
//! ┌──────┐   ┌──────────┐   ┌───────────────┐   ┌──────────────┐   ┌──────┐
//! │ Idle │──▶│ Planning │──▶│ ToolExecution │──▶│ Synthesizing │──▶│ Done │
//! └──────┘   └──────────┘   └───────────────┘   └──────────────┘   └──────┘
//!                 │                 │                   │
//!                 └─────────────────┴───────────────────┴──▶ Failed
//! ```
//!
//! - Planning: a deterministic planner picks tool calls from the request
//! - ToolExecution: calls run in dependency waves, each wave concurrently
//! - Synthesizing: the model turns tool payloads into schema JSON, which the
//!   validator checks (and repairs once)

mod config;
mod execution;
mod planning;
mod specialist;
mod synthesis;
mod types;


pub use config::{AgentKind, AgentSpec, ToolEdge};
pub use planning::PlannedCall;
pub use specialist::SpecialistAgent;
pub use types::{AgentRequest, AgentState, Diagnostic, DiagnosticKind, StructuredResult};
