//! Specialist agent lifecycle

use super::execution::{execute, ToolRun};
use super::planning::plan;
use super::synthesis::build_request;
use super::{AgentKind, AgentRequest, AgentSpec, AgentState, Diagnostic, DiagnosticKind, StructuredResult};
use crate::memory::SessionView;
use crate::schema::StructuredPayload;
use crate::validator::{salvage, ValidationError, Validator};
use plantworks_llm::LlmProvider;
use plantworks_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Confidence for schemas that do not report their own
const BASE_CONFIDENCE: f64 = 0.9;

/// One of the four specialists
///
/// All variants share this type; behaviour differs only through the
/// [`AgentSpec`] table.
pub struct SpecialistAgent {
    spec: AgentSpec,
    registry: Arc<ToolRegistry>,
    llm: Arc<dyn LlmProvider>,
    validator: Validator,
    model: String,
    llm_timeout: Duration,
}

impl SpecialistAgent {
    /// Create a specialist
    #[must_use]
    pub fn new(
        spec: AgentSpec,
        registry: Arc<ToolRegistry>,
        llm: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        llm_timeout: Duration,
    ) -> Self {
        let model = model.into();
        let validator = Validator::new(llm.clone(), model.clone()).with_timeout(llm_timeout);
        Self {
            spec,
            registry,
            llm,
            validator,
            model,
            llm_timeout,
        }
    }

    /// Which specialist this is
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.spec.kind
    }

    /// Static definition
    #[must_use]
    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// Turn a request into a validated result
    ///
    /// Never fails: tool, model and validation failures are absorbed into a
    /// low-confidence result with diagnostics.
    #[instrument(skip(self, request, view), fields(agent = %self.spec.kind, session = %view.key))]
    pub async fn handle(&self, request: &AgentRequest, view: &SessionView) -> StructuredResult {
        let mut state = AgentState::Idle;

        transition(&mut state, AgentState::Planning, self.spec.kind);
        let calls = plan(self.spec.kind, request);
        debug!(calls = calls.len(), "Planned tool calls");

        transition(&mut state, AgentState::ToolExecution, self.spec.kind);
        let run = execute(&self.spec, &self.registry, calls).await;

        transition(&mut state, AgentState::Synthesizing, self.spec.kind);
        // Tools already ran; the model only writes the answer
        let completion = build_request(&self.spec, &self.model, request, view, &run.payloads);

        let raw = match tokio::time::timeout(self.llm_timeout, self.llm.complete(completion)).await {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                warn!(error = %e, "Synthesis call failed");
                let diagnostic = Diagnostic::new(DiagnosticKind::LlmFailure, self.spec.kind.as_str(), e.to_string());
                return self.failed(&mut state, run, StructuredPayload::placeholder(self.spec.schema()), diagnostic);
            }
            Err(_) => {
                let timeout_ms = self.llm_timeout.as_millis() as u64;
                warn!(timeout_ms, "Synthesis call timed out");
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::LlmTimeout,
                    self.spec.kind.as_str(),
                    format!("no completion within {}ms", timeout_ms),
                );
                return self.failed(&mut state, run, StructuredPayload::placeholder(self.spec.schema()), diagnostic);
            }
        };

        match self.validator.validate(&raw, self.spec.schema()).await {
            Ok(validated) => {
                let mut run = run;
                if validated.repaired {
                    run.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ValidationRepaired,
                        self.spec.kind.as_str(),
                        "output needed one repair",
                    ));
                }
                transition(&mut state, AgentState::Done, self.spec.kind);
                self.done(state, run, validated.payload)
            }
            Err(ValidationError::Unrecoverable { schema, fields, raw }) => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::ValidationUnrecoverable,
                    self.spec.kind.as_str(),
                    format!("invalid fields after repair: {}", fields.join(", ")),
                );
                self.failed(&mut state, run, salvage(&raw, schema), diagnostic)
            }
        }
    }

    fn done(&self, state: AgentState, run: ToolRun, payload: StructuredPayload) -> StructuredResult {
        let reported = match &payload {
            StructuredPayload::Identification(p) => p.confidence,
            _ => BASE_CONFIDENCE,
        };

        let (confidence, explanation) = if run.all_failed() {
            (0.0, format!("every tool call failed ({}); answer not grounded", run.failed))
        } else if run.failed > 0 {
            (
                reported * run.success_ratio(),
                format!("{} of {} tool calls failed", run.failed, run.attempted),
            )
        } else {
            (reported, format!("{} from {} tool calls", payload.headline(), run.attempted))
        };

        let degraded = run.failed > 0
            || run
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::ToolSkipped);

        info!(
            agent = %self.spec.kind,
            confidence,
            degraded,
            tools = run.attempted,
            "Specialist finished"
        );

        StructuredResult {
            agent: self.spec.kind,
            state,
            payload,
            confidence: confidence.clamp(0.0, 1.0),
            degraded,
            explanation,
            diagnostics: run.diagnostics,
            tool_invocations: run.invocations,
        }
    }

    fn failed(
        &self,
        state: &mut AgentState,
        mut run: ToolRun,
        payload: StructuredPayload,
        diagnostic: Diagnostic,
    ) -> StructuredResult {
        transition(state, AgentState::Failed, self.spec.kind);
        let explanation = format!("{} could not answer: {}", self.spec.kind.display_name(), diagnostic.message);
        run.diagnostics.push(diagnostic);

        StructuredResult {
            agent: self.spec.kind,
            state: *state,
            payload,
            confidence: 0.0,
            degraded: true,
            explanation,
            diagnostics: run.diagnostics,
            tool_invocations: run.invocations,
        }
    }
}

fn transition(state: &mut AgentState, next: AgentState, agent: AgentKind) {
    debug_assert!(state.can_transition_to(next), "{} -> {}", state, next);
    debug!(agent = %agent, from = %state, to = %next, "Agent state transition");
    *state = next;
}
