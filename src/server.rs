//! HTTP front end over the session registry.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;

/// Per-request cap. Generous because one request may cover several model
/// turns plus nested tool calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask_question))
        .route("/sessions", get(list_sessions))
        .route("/session/{id}", delete(delete_session))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the ask API.
#[derive(Debug, Deserialize)]
struct AskRequest {
    /// User query text.
    query: String,
    /// Optional session ID (generates a fresh one if not provided).
    #[serde(default)]
    session_id: Option<String>,
}

/// Response from the ask API.
#[derive(Debug, Serialize)]
struct AskResponse {
    /// Effective session ID for this conversation.
    session_id: String,
    /// Answer text.
    response: String,
}

/// POST /ask - Process a user query within its session.
async fn ask_question(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    tracing::info!(
        query = %req.query,
        session_id = ?req.session_id,
        "Received ask request"
    );

    let (session_id, workflow) = state.registry.get_or_create(req.session_id.as_deref());

    match workflow.run(&req.query, true).await {
        Ok(response) => Ok(Json(AskResponse {
            session_id,
            response: response.content,
        })),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Engine run failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process query: {e}"),
            ))
        }
    }
}

/// Session list payload.
#[derive(Debug, Serialize)]
struct SessionsResponse {
    sessions: Vec<String>,
}

/// GET /sessions - List all active sessions.
async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.registry.list(),
    })
}

/// DELETE /session/{id} - Delete a session.
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if state.registry.delete(&id) {
        Ok(Json(
            serde_json::json!({ "message": format!("Session {id} deleted.") }),
        ))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": "Session not found." })),
        ))
    }
}
