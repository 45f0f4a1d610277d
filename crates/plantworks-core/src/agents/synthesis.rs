//! Synthesis prompt construction

use super::{AgentRequest, AgentSpec};
use crate::memory::{SessionView, SCRATCH_LAST_AGENTS};
use plantworks_llm::{CompletionRequest, Message, MessageRole};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

const SYNTHESIS_TEMPERATURE: f32 = 0.2;
const SYNTHESIS_MAX_TOKENS: u32 = 1024;

/// Marker the prompt carries so the schema is recoverable from the request
pub(crate) const SCHEMA_MARKER: &str = "Output schema:";

fn system_prompt(spec: &AgentSpec) -> String {
    format!(
        "{persona}\n\n\
         {marker} {schema}\n\
         Fields:\n{guide}\n\n\
         Base your answer on the tool results provided. Reply with one JSON object \
         containing these fields and nothing else.",
        persona = spec.persona,
        marker = SCHEMA_MARKER,
        schema = spec.schema(),
        guide = spec.schema().field_guide(),
    )
}

fn user_prompt(request: &AgentRequest, view: &SessionView, payloads: &HashMap<String, Value>) -> String {
    let mut sections = Vec::new();

    if !view.recent_turns.is_empty() {
        let history = view
            .recent_turns
            .iter()
            .map(|turn| {
                let who = match turn.role {
                    MessageRole::User => "user",
                    _ => "assistant",
                };
                format!("{}: {}", who, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Conversation so far:\n{}", history));
    }

    let context: BTreeMap<&str, &Value> = view
        .scratch
        .iter()
        .filter(|(k, _)| k.as_str() != SCRATCH_LAST_AGENTS)
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    if !context.is_empty() {
        sections.push(format!("Known context: {}", to_json(&context)));
    }

    if let Some(plant) = request.effective_plant() {
        sections.push(format!("Plant: {}", plant));
    }
    if let Some(location) = &request.location {
        sections.push(format!("Location: {}", location));
    }

    for upstream in &request.upstream {
        sections.push(format!(
            "{} result: {}",
            upstream.agent.display_name(),
            upstream.payload.to_data()
        ));
    }

    // Sorted so the prompt is stable across runs
    let ordered: BTreeMap<&str, &Value> = payloads.iter().map(|(k, v)| (k.as_str(), v)).collect();
    if ordered.is_empty() {
        sections.push("Tool results: none available".to_string());
    } else {
        for (tool, payload) in ordered {
            sections.push(format!("Tool {}: {}", tool, payload));
        }
    }

    sections.push(format!("Question: {}", request.text.trim()));
    sections.join("\n\n")
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Build the synthesis request
pub(super) fn build_request(
    spec: &AgentSpec,
    model: &str,
    request: &AgentRequest,
    view: &SessionView,
    payloads: &HashMap<String, Value>,
) -> CompletionRequest {
    CompletionRequest::new(model)
        .with_message(Message::system(system_prompt(spec)))
        .with_message(Message::user(user_prompt(request, view, payloads)))
        .with_temperature(SYNTHESIS_TEMPERATURE)
        .with_max_tokens(SYNTHESIS_MAX_TOKENS)
}
