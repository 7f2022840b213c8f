//! Run lifecycle event types.
//!
//! A workflow run produces exactly one [`RunResponse`] today, tagged with the
//! terminal [`RunEvent`]. The shape is kept as an explicit event-tagged value
//! so callers can distinguish completion kinds if intermediate states are
//! ever added.

use serde::{Deserialize, Serialize};

/// Terminal event tag attached to a [`RunResponse`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    /// The workflow processed the query to completion.
    WorkflowCompleted,
}

/// A single response produced by a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    /// Answer text, as produced by the reasoning engine (or the cache).
    pub content: String,
    /// Terminal event tag.
    pub event: RunEvent,
}

impl RunResponse {
    /// Build a completed response wrapping the given text.
    #[must_use]
    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            event: RunEvent::WorkflowCompleted,
        }
    }
}

/// Record of a single tool call made by the reasoning engine during a run.
///
/// Invocation records are transient: they exist for observability while the
/// run is in flight and may be embedded into the answer text, but are never
/// persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Registered tool name.
    pub name: String,
    /// Arguments the model supplied, as parsed JSON.
    pub arguments: serde_json::Value,
    /// Result text handed back to the model.
    pub result: String,
}
