//! Integration tests for the plant tool registry, run fully offline

use plantworks_tools::{
    register_plant_tools, Error, RegistryConfig, ToolCredentials, ToolRegistry, ToolSource,
};
use serde_json::{json, Value};

fn offline_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new(RegistryConfig::offline());
    register_plant_tools(&mut registry, &ToolCredentials::default()).unwrap();
    registry
}

fn sample_args(tool: &str) -> Value {
    match tool {
        "plant_database_search" => json!({"query": "monstera"}),
        "location_resolver" => json!({"query": "Kenton, Harrow"}),
        "weather_lookup" | "hardiness_zone_lookup" | "soil_analyzer" | "native_plant_finder" => {
            json!({"location": "Harrow"})
        }
        "plant_care_scheduler" => json!({"plant_name": "Monstera deliciosa"}),
        "disease_identifier" => json!({"symptoms": "yellowing leaves"}),
        "marketplace_search" | "price_comparator" => json!({"plant_name": "monstera"}),
        "seller_verifier" => json!({"seller_name": "Bloomscape"}),
        other => panic!("no sample arguments for {other}"),
    }
}

#[tokio::test]
async fn every_tool_serves_its_declared_keys() {
    let registry = offline_registry();

    for name in registry.list_names() {
        let outcome = registry
            .invoke(name, sample_args(name))
            .await
            .unwrap_or_else(|e| panic!("{name} failed: {e}"));
        let contract = registry.resolve(name).unwrap();
        assert!(
            contract.missing_output_keys(&outcome.payload).is_empty(),
            "{name} payload is missing declared keys"
        );
    }
}

#[tokio::test]
async fn offline_live_tools_are_served_by_mocks() {
    let registry = offline_registry();

    let outcome = registry
        .invoke("weather_lookup", json!({"location": "Seattle"}))
        .await
        .unwrap();
    assert_eq!(outcome.source, ToolSource::Mock);
    assert_eq!(outcome.fallback_reason.as_deref(), Some("live tools disabled"));
}

#[tokio::test]
async fn missing_credentials_fall_back_to_mock() {
    let mut registry = ToolRegistry::new(RegistryConfig::default());
    register_plant_tools(&mut registry, &ToolCredentials::default()).unwrap();

    let outcome = registry
        .invoke("plant_database_search", json!({"query": "snake plant"}))
        .await
        .unwrap();
    assert_eq!(outcome.source, ToolSource::Mock);
    assert!(outcome
        .fallback_reason
        .unwrap()
        .contains("missing credential"));
    assert_eq!(outcome.payload["results"][0]["scientific_name"], "Dracaena trifasciata");
}

#[tokio::test]
async fn mock_payloads_are_deterministic() {
    let registry = offline_registry();

    for name in ["soil_analyzer", "weather_lookup", "location_resolver"] {
        let first = registry.invoke(name, sample_args(name)).await.unwrap();
        let second = registry.invoke(name, sample_args(name)).await.unwrap();
        assert_eq!(first.payload, second.payload, "{name} is not deterministic");
    }
}

#[tokio::test]
async fn invalid_arguments_are_rejected() {
    let registry = offline_registry();

    let err = registry
        .invoke("weather_lookup", json!({"location": "Harrow", "days": 40}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgs(_)));

    let err = registry
        .invoke("plant_care_scheduler", json!({"plant_name": "rose", "care_level": "expert"}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("one of"));

    let err = registry.invoke("marketplace_search", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("missing required 'plant_name'"));
}

#[test]
fn unknown_tools_are_not_found() {
    let registry = offline_registry();
    assert!(matches!(registry.resolve("plant_search"), Err(Error::NotFound(_))));

    let err = tokio_test::block_on(registry.invoke("teleporter", json!({}))).unwrap_err();
    assert!(matches!(err, Error::NotFound(name) if name == "teleporter"));
}

#[test]
fn llm_tool_definitions_follow_contracts() {
    let registry = offline_registry();
    let tools = registry.to_llm_tools(&["hardiness_zone_lookup", "no_such_tool"]);

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "hardiness_zone_lookup");
    assert_eq!(tools[0].parameters["required"], json!(["location"]));
}
