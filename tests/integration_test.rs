//! Integration tests for Plantworks
//!
//! These tests verify the integration between different crates:
//! - plantworks-llm: mock provider driving synthesis
//! - plantworks-tools: plant tool registry in offline mode
//! - plantworks-core: specialists, session store and coordinator

use plantworks_core::{
    AgentKind, AgentRequest, AgentSpec, AgentState, Coordinator, CoordinatorConfig, MemoryStore,
    MergeStrategy, NewMessage, SessionKey, SessionStore, SessionView, SpecialistAgent,
};
use plantworks_llm::{CompletionRequest, MockProvider};
use plantworks_tools::{register_plant_tools, RegistryConfig, ToolCredentials, ToolRegistry, ToolSource};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn offline_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(RegistryConfig::offline());
    register_plant_tools(&mut registry, &ToolCredentials::default()).unwrap();
    Arc::new(registry)
}

fn reply(request: &CompletionRequest) -> plantworks_llm::Result<String> {
    let system = request.system_prompt().unwrap_or_default();
    let body = if system.contains("Output schema: identification") {
        json!({"plant_name": "Lavandula angustifolia", "confidence": 0.8})
    } else if system.contains("Output schema: cultivation") {
        json!({
            "plant_name": "Lavandula angustifolia",
            "watering_schedule": "Sparingly once established",
            "light_requirements": "Full sun"
        })
    } else if system.contains("Output schema: locale") {
        json!({
            "recommended_plants": ["Lavender", "Rosemary"],
            "hardiness_zone": "9a",
            "location": "Leeds"
        })
    } else {
        json!({"listings": []})
    };
    Ok(body.to_string())
}

// ============================================================================
// Tool Registry Integration Tests
// ============================================================================

#[tokio::test]
async fn test_every_specialist_tool_is_registered() {
    let registry = offline_registry();

    for kind in AgentKind::ALL {
        for tool in AgentSpec::for_kind(kind).tools {
            assert!(registry.has(tool), "{} is missing {}", kind, tool);
        }
    }
}

#[tokio::test]
async fn test_offline_registry_serves_mocks() {
    let registry = offline_registry();

    let outcome = registry
        .invoke("hardiness_zone_lookup", json!({"location": "Leeds", "latitude": 53.8, "longitude": -1.55}))
        .await
        .unwrap();
    assert_eq!(outcome.source, ToolSource::Mock);

    let again = registry
        .invoke("hardiness_zone_lookup", json!({"location": "Leeds", "latitude": 53.8, "longitude": -1.55}))
        .await
        .unwrap();
    assert_eq!(outcome.payload, again.payload);
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_dispatch() {
    let registry = offline_registry();
    let result = registry
        .invoke("plant_database_search", json!({"limit": 3}))
        .await;
    assert!(matches!(result, Err(plantworks_tools::Error::InvalidArgs(_))));
}

// ============================================================================
// Specialist Integration Tests
// ============================================================================

#[tokio::test]
async fn test_specialist_runs_tools_then_synthesizes() {
    let llm = MockProvider::new().with_handler(reply);
    let agent = SpecialistAgent::new(
        AgentSpec::for_kind(AgentKind::Locale),
        offline_registry(),
        Arc::new(llm.clone()),
        "test-model".to_string(),
        Duration::from_secs(5),
    );
    let view = SessionView::empty(SessionKey::new("plantworks", "u", "s"));

    let result = agent
        .handle(&AgentRequest::new("what grows well here").with_location("Leeds"), &view)
        .await;

    assert_eq!(result.state, AgentState::Done);
    assert_eq!(result.payload.hardiness_zone(), Some("9a"));
    assert!(result.tool_invocations.iter().any(|i| i.tool == "location_resolver"));
    assert_eq!(llm.request_count(), 1);

    // The model saw the tool results
    let prompt = &llm.requests()[0];
    let user = prompt.messages.last().unwrap();
    assert!(user.content.contains("Tool location_resolver:"));
}

// ============================================================================
// Coordinator Integration Tests
// ============================================================================

#[tokio::test]
async fn test_parallel_merge_turn() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(
        CoordinatorConfig::default(),
        offline_registry(),
        Arc::new(MockProvider::new().with_handler(reply)),
        store.clone(),
    )
    .unwrap();

    let response = coordinator
        .run(
            "plantworks",
            "u-1",
            "s-1",
            NewMessage::user("how often should I water lavender given the local climate in Leeds"),
        )
        .await
        .unwrap();

    assert_eq!(response.routing.strategy, MergeStrategy::ParallelMerge);
    assert!(response.result_for(AgentKind::Cultivation).is_some());
    assert!(response.result_for(AgentKind::Locale).is_some());
    assert_eq!(response.resolved_location.as_deref(), Some("Leeds"));
    assert!(response.summary.contains("The Ecologist"));
    assert!(response.summary.contains("The Gardener"));
}

#[tokio::test]
async fn test_sessions_are_isolated_per_user() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(
        CoordinatorConfig::default(),
        offline_registry(),
        Arc::new(MockProvider::new().with_handler(reply)),
        store.clone(),
    )
    .unwrap();

    coordinator
        .run("plantworks", "alice", "s-1", NewMessage::user("what is the soil like in Leeds"))
        .await
        .unwrap();
    coordinator
        .run("plantworks", "bob", "s-1", NewMessage::user("What is lavender?"))
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
    let bob = store
        .get(&SessionKey::new("plantworks", "bob", "s-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob.turns.len(), 2);
    assert!(!bob.scratch.contains_key("last_location"));
}
