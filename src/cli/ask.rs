//! One-shot question from the terminal

use anyhow::Context;
use plantworks_core::{AgentState, NewMessage, TurnResponse};
use std::fmt::Write as _;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Run one turn and print it; Ctrl+C cancels the turn
pub async fn run(query: &str, session: Option<String>, user: &str, json: bool) -> anyhow::Result<()> {
    let (config, coordinator) = crate::server::init_coordinator()?;
    let session = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling turn");
            interrupt.cancel();
        }
    });

    let response = coordinator
        .run_with_cancellation(&config.app_name, user, &session, NewMessage::user(query), cancel)
        .await
        .context("Turn failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render(&response));
    }
    Ok(())
}

/// Human-readable rendering of a turn
fn render(response: &TurnResponse) -> String {
    let mut out = String::new();
    let agents: Vec<&str> = response.routing.agents.iter().map(|a| a.as_str()).collect();
    let _ = writeln!(
        out,
        "Routed to {} ({})",
        agents.join(", "),
        response.routing.strategy
    );
    if let Some(location) = &response.resolved_location {
        let _ = writeln!(out, "Location: {}", location);
    }
    if let Some(plant) = &response.resolved_plant {
        let _ = writeln!(out, "Plant: {}", plant);
    }
    out.push('\n');

    for result in &response.results {
        let marker = match (result.state, result.degraded) {
            (AgentState::Done, false) => "✅",
            (AgentState::Done, true) => "⚠️ ",
            _ => "❌",
        };
        let _ = writeln!(
            out,
            "{} {} (confidence {:.2})",
            marker,
            result.agent.display_name(),
            result.confidence
        );
        if result.state == AgentState::Done {
            let _ = writeln!(out, "   {}", result.payload.headline());
        } else {
            let _ = writeln!(out, "   {}", result.explanation);
        }
        for diagnostic in &result.diagnostics {
            let _ = writeln!(out, "   - {}: {}", diagnostic.source, diagnostic.message);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantworks_core::{
        AgentKind, MergeStrategy, RoutingDecision, SchemaId, SessionKey, StructuredPayload,
        StructuredResult,
    };

    #[test]
    fn test_render_failed_agent() {
        let response = TurnResponse {
            session: SessionKey::new("plantworks", "cli", "s-1"),
            routing: RoutingDecision {
                agents: vec![AgentKind::Marketplace],
                strategy: MergeStrategy::Single,
                scores: vec![],
                defaulted: false,
            },
            results: vec![StructuredResult {
                agent: AgentKind::Marketplace,
                state: AgentState::Failed,
                payload: StructuredPayload::placeholder(SchemaId::Marketplace),
                confidence: 0.0,
                degraded: true,
                explanation: "The Merchant could not answer: model timed out".to_string(),
                diagnostics: vec![],
                tool_invocations: vec![],
            }],
            resolved_location: Some("Harrow".to_string()),
            resolved_plant: None,
            summary: String::new(),
        };

        let text = render(&response);
        assert!(text.starts_with("Routed to marketplace (single)"));
        assert!(text.contains("Location: Harrow"));
        assert!(!text.contains("Plant:"));
        assert!(text.contains("❌ The Merchant (confidence 0.00)"));
        assert!(text.contains("model timed out"));
    }
}
