use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use plantworks_core::{CoordinatorConfig, MemoryStore};
use plantworks_llm::{CompletionRequest, MockProvider};
use plantworks_tools::{register_plant_tools, RegistryConfig, ToolCredentials, ToolRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;

fn identification_reply(_request: &CompletionRequest) -> plantworks_llm::Result<String> {
    Ok(r#"{"plant_name": "Monstera deliciosa", "common_names": ["Swiss cheese plant"], "confidence": 0.9}"#.to_string())
}

fn app_with(llm: MockProvider, turn_timeout: Duration) -> Router {
    let mut registry = ToolRegistry::new(RegistryConfig::offline());
    register_plant_tools(&mut registry, &ToolCredentials::default()).unwrap();
    let coordinator = Coordinator::new(
        CoordinatorConfig::default(),
        Arc::new(registry),
        Arc::new(llm),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    router(Arc::new(coordinator), "plantworks", turn_timeout)
}

fn app() -> Router {
    app_with(
        MockProvider::new().with_handler(identification_reply),
        Duration::from_secs(30),
    )
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["coordinator"], "plantworks_main_agent");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_session() {
    let response = app()
        .oneshot(post("/sessions", json!({"user_id": "u-1", "session_id": "s-1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["app_name"], "plantworks");
    assert_eq!(body["data"]["session_id"], "s-1");
}

#[tokio::test]
async fn test_create_session_generates_id() {
    let response = app()
        .oneshot(post("/sessions", json!({"user_id": "u-1"})))
        .await
        .unwrap();

    let body = json_body(response).await;
    let id = body["data"]["session_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_run_turn() {
    let response = app()
        .oneshot(post(
            "/run",
            json!({
                "user_id": "u-1",
                "session_id": "s-1",
                "new_message": {"role": "user", "parts": [{"text": "What is Monstera deliciosa?"}]}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let turn = &body["data"];
    assert_eq!(turn["routing"]["agents"], json!(["identification"]));
    assert_eq!(turn["routing"]["strategy"], "single");
    assert_eq!(turn["resolved_plant"], "Monstera deliciosa");
    assert_eq!(turn["results"][0]["state"], "done");
}

#[tokio::test]
async fn test_run_text_shorthand() {
    let response = app()
        .oneshot(post(
            "/run",
            json!({"user_id": "u-1", "session_id": "s-1", "text": "What is Monstera deliciosa?"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_query_is_unprocessable() {
    let response = app()
        .oneshot(post("/run", json!({"user_id": "u-1", "session_id": "s-1", "text": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_slow_turn_times_out() {
    let slow = MockProvider::new()
        .with_handler(identification_reply)
        .with_delay(Duration::from_secs(5));
    let response = app_with(slow, Duration::from_millis(50))
        .oneshot(post(
            "/run",
            json!({"user_id": "u-1", "session_id": "s-1", "text": "What is Monstera deliciosa?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        ApiError(CoordinatorError::EmptyOrUnroutable).status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(ApiError(CoordinatorError::Cancelled).status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(
        ApiError(CoordinatorError::Session("disk full".into())).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_plant_rag_retrieves_catalogue_passages() {
    let llm = MockProvider::new();
    let response = app_with(llm.clone(), Duration::from_secs(30))
        .oneshot(post(
            "/api/plant_rag",
            json!({"question": "How much light does a monstera need?", "top_k": 2}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let answers = body["data"]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["plant"], "Monstera deliciosa");
    assert!(answers[0]["info"].as_str().unwrap().contains("indirect light"));
    // Retrieval never runs a turn
    assert_eq!(llm.request_count(), 0);
}

#[tokio::test]
async fn test_plant_rag_rejects_empty_question() {
    let response = app()
        .oneshot(post("/api/plant_rag", json!({"question": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);

    let response = app()
        .oneshot(post("/api/plant_rag", json!({"question": "triffid"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["answers"], json!([]));
}
