//! HTTP surface integration tests with a scripted reasoning engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use mantle_agent::AppState;
use mantle_agent::llm::{EngineReply, ReasoningEngine};
use mantle_agent::server::router;
use mantle_agent::session::SessionRegistry;
use mantle_agent::storage::MemoryStorage;

/// Engine that echoes the prompt it received, so responses reveal the
/// conversation context the workflow assembled.
#[derive(Default)]
struct EchoEngine {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ReasoningEngine for EchoEngine {
    async fn run(&self, prompt: &str) -> anyhow::Result<EngineReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EngineReply {
            answer: format!("Answer based on: {prompt}"),
            invocations: vec![],
        })
    }
}

struct FailingEngine;

#[async_trait::async_trait]
impl ReasoningEngine for FailingEngine {
    async fn run(&self, _prompt: &str) -> anyhow::Result<EngineReply> {
        anyhow::bail!("model unavailable")
    }
}

fn test_server(engine: Arc<dyn ReasoningEngine>) -> TestServer {
    let registry = Arc::new(SessionRegistry::new(engine, Arc::new(MemoryStorage::new())));
    TestServer::new(router(AppState { registry })).expect("failed to build test server")
}

#[tokio::test]
async fn test_ask_generates_session_id() {
    let server = test_server(Arc::new(EchoEngine::default()));

    let response = server
        .post("/ask")
        .json(&json!({ "query": "What is Mantle?" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let session_id = body["session_id"].as_str().unwrap();
    assert!(Uuid::parse_str(session_id).is_ok());
    assert!(!body["response"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_follow_up_sees_prior_turn() {
    let server = test_server(Arc::new(EchoEngine::default()));

    let first = server
        .post("/ask")
        .json(&json!({ "query": "What is Mantle?" }))
        .await;
    first.assert_status_ok();
    let session_id = first.json::<serde_json::Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let second = server
        .post("/ask")
        .json(&json!({
            "query": "What did I just ask?",
            "session_id": session_id
        }))
        .await;
    second.assert_status_ok();

    // The follow-up answer must reference the prior query content.
    let answer = second.json::<serde_json::Value>()["response"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(answer.contains("What is Mantle?"));
}

#[tokio::test]
async fn test_repeated_query_is_served_from_cache() {
    let engine = Arc::new(EchoEngine::default());
    let server = test_server(Arc::clone(&engine) as Arc<dyn ReasoningEngine>);

    let first = server
        .post("/ask")
        .json(&json!({ "query": "Q", "session_id": "fixed" }))
        .await;
    let second = server
        .post("/ask")
        .json(&json!({ "query": "Q", "session_id": "fixed" }))
        .await;

    assert_eq!(
        first.json::<serde_json::Value>()["response"],
        second.json::<serde_json::Value>()["response"]
    );
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_and_delete_sessions() {
    let server = test_server(Arc::new(EchoEngine::default()));

    server
        .post("/ask")
        .json(&json!({ "query": "hi", "session_id": "s1" }))
        .await
        .assert_status_ok();

    let sessions = server.get("/sessions").await;
    sessions.assert_status_ok();
    let body: serde_json::Value = sessions.json();
    assert!(
        body["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s == "s1")
    );

    let deleted = server.delete("/session/s1").await;
    deleted.assert_status_ok();
    assert_eq!(
        deleted.json::<serde_json::Value>()["message"],
        "Session s1 deleted."
    );

    let sessions = server.get("/sessions").await;
    let body: serde_json::Value = sessions.json();
    assert!(body["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_session_is_404() {
    let server = test_server(Arc::new(EchoEngine::default()));

    let response = server.delete("/session/never-created").await;
    response.assert_status_not_found();
    assert_eq!(
        response.json::<serde_json::Value>()["detail"],
        "Session not found."
    );
}

#[tokio::test]
async fn test_missing_query_is_a_client_error() {
    let server = test_server(Arc::new(EchoEngine::default()));

    let response = server.post("/ask").json(&json!({ "session_id": "s1" })).await;
    assert!(response.status_code().is_client_error());

    // The malformed request never reached the registry.
    let sessions = server.get("/sessions").await;
    let body: serde_json::Value = sessions.json();
    assert!(body["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_engine_failure_surfaces_as_server_error() {
    let server = test_server(Arc::new(FailingEngine));

    let response = server.post("/ask").json(&json!({ "query": "hi" })).await;
    assert!(response.status_code().is_server_error());
    assert!(response.text().contains("model unavailable"));
}
