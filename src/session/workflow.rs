//! Per-session conversational workflow.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::events::RunResponse;
use crate::llm::ReasoningEngine;
use crate::storage::SessionStorage;

/// One completed conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// User query, verbatim.
    pub query: String,
    /// Answer text produced for the query.
    pub response: String,
}

/// Serializable workflow state: conversation history plus the response
/// cache. Both are append-only and keep insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Ordered conversation history.
    pub history: Vec<Turn>,
    /// Cached responses, keyed by exact query string.
    pub responses: Vec<Turn>,
}

/// The per-session orchestration unit.
///
/// Owns the conversation history and response cache for one session and
/// delegates synthesis to the bound reasoning engine. All side effects are
/// session-scoped.
pub struct SessionWorkflow {
    session_id: String,
    engine: Arc<dyn ReasoningEngine>,
    storage: Arc<dyn SessionStorage>,
    state: RwLock<WorkflowState>,
}

impl std::fmt::Debug for SessionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap();
        f.debug_struct("SessionWorkflow")
            .field("session_id", &self.session_id)
            .field("history_len", &state.history.len())
            .field("cache_len", &state.responses.len())
            .finish()
    }
}

impl SessionWorkflow {
    /// Construct a workflow bound to `session_id`, restoring any persisted
    /// state from the storage collaborator.
    pub fn new(
        session_id: impl Into<String>,
        engine: Arc<dyn ReasoningEngine>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let session_id = session_id.into();

        let state = match storage.get(&session_id) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Stored session state was unreadable, starting fresh"
                );
                WorkflowState::default()
            }),
            Ok(None) => WorkflowState::default(),
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to load session state, starting fresh"
                );
                WorkflowState::default()
            }
        };

        Self {
            session_id,
            engine,
            storage,
            state: RwLock::new(state),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the number of completed turns.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.state.read().unwrap().history.len()
    }

    /// Process one query to completion.
    ///
    /// With `use_cache`, a query that exactly matches a cached entry is
    /// answered from the cache with no engine delegation and no history
    /// mutation. Otherwise the query is extended with the conversation
    /// context, delegated to the engine, and the new turn is appended to
    /// both history and cache.
    ///
    /// # Errors
    ///
    /// Engine failure is not recovered here; it propagates to the caller.
    pub async fn run(&self, query: &str, use_cache: bool) -> anyhow::Result<RunResponse> {
        tracing::info!(session_id = %self.session_id, query = %query, "Processing query");

        if use_cache {
            let state = self.state.read().unwrap();
            if let Some(cached) = state.responses.iter().find(|t| t.query == query) {
                tracing::info!(session_id = %self.session_id, "Found cached response");
                return Ok(RunResponse::completed(cached.response.clone()));
            }
        }

        let prompt = {
            let state = self.state.read().unwrap();
            build_extended_prompt(&state.history, query)
        };

        let reply = self.engine.run(&prompt).await?;

        tracing::debug!(
            session_id = %self.session_id,
            invocation_count = reply.invocations.len(),
            "Engine run finished"
        );

        let snapshot = {
            let mut state = self.state.write().unwrap();
            let turn = Turn {
                query: query.to_string(),
                response: reply.answer.clone(),
            };
            state.history.push(turn.clone());
            state.responses.push(turn);
            state.clone()
        };
        self.persist(&snapshot);

        Ok(RunResponse::completed(reply.answer))
    }

    /// Best-effort state write; the in-memory session stays authoritative.
    fn persist(&self, state: &WorkflowState) {
        match serde_json::to_string(state) {
            Ok(raw) => {
                if let Err(e) = self.storage.put(&self.session_id, &raw) {
                    tracing::warn!(
                        session_id = %self.session_id,
                        error = %e,
                        "Failed to persist session state"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "Failed to serialize session state"
                );
            }
        }
    }
}

/// Join prior turns as alternating `User:` / `Agent:` lines, followed by the
/// new query. With no history, the extended prompt is the bare query.
fn build_extended_prompt(history: &[Turn], query: &str) -> String {
    if history.is_empty() {
        return query.to_string();
    }

    let context = history
        .iter()
        .map(|t| format!("User: {}\nAgent: {}", t.query, t.response))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{context}\nUser: {query}\nAgent:")
}
