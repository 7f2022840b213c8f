//! Reasoning engine adapter.
//!
//! This module binds a hosted OpenAI-compatible chat model to the Mantle
//! expert persona and the registered tool set.
//!
//! # Overview
//!
//! The [`ChatDriver`] trait defines the wire-level completion interface. The
//! [`Orchestrator`] builds on top of a driver to run the tool loop and
//! produce a final synthesized answer, exposed to the session layer through
//! the [`ReasoningEngine`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use mantle_agent::llm::{LlmSettings, Orchestrator};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o".to_string(),
//!     provider: Provider::OpenAI,
//! };
//! let engine = Orchestrator::new(settings, tools);
//! let reply = engine.run("What is Mantle?").await?;
//! ```

pub mod chat_completions;
pub mod orchestrator;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use orchestrator::Orchestrator;
pub use provider::Provider;

use crate::events::ToolInvocation;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o`).
    pub model: String,
    /// Provider type (auto-detected from `base_url` if not specified).
    pub provider: Provider,
}

/// A message in a conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
    /// Optional tool call ID (for tool responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Optional tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Tool response.
    Tool,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
}

/// Request to a chat driver.
#[derive(Debug)]
pub struct LlmRequest {
    /// Conversation messages in OpenAI wire format.
    pub messages: Vec<serde_json::Value>,
    /// Available tools in OpenAI function schema format.
    pub tools: Vec<serde_json::Value>,
}

/// One completion turn from a chat driver.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    /// Assistant text, if any was produced this turn.
    pub content: Option<String>,
    /// Tool calls requested by the model this turn.
    pub tool_calls: Vec<ToolCall>,
}

/// Trait for wire-level chat completion drivers.
#[async_trait::async_trait]
pub trait ChatDriver: Send + Sync {
    /// Run a single (non-streaming) completion request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// parsed.
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<ChatOutcome>;
}

/// Final output of a reasoning engine run.
#[derive(Debug, Clone)]
pub struct EngineReply {
    /// Synthesized answer text. Opaque to callers; may contain markdown and
    /// an embedded tool-call trace.
    pub answer: String,
    /// Tool calls made while producing the answer, in execution order.
    pub invocations: Vec<ToolInvocation>,
}

/// The seam between the session layer and the hosted model.
///
/// Implemented by [`Orchestrator`] in production and by scripted engines in
/// tests.
#[async_trait::async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Synthesize an answer for the given extended prompt.
    ///
    /// # Errors
    ///
    /// Engine failure is not recovered here; it propagates to the caller.
    async fn run(&self, prompt: &str) -> anyhow::Result<EngineReply>;
}
