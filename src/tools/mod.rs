//! Tool descriptors and dispatch.
//!
//! The reasoning engine sees a closed set of tools, each described by a
//! name, a description, and a JSON input schema. Dispatch is by name through
//! [`ToolRegistry::call_tool`]; there is no runtime introspection.
//!
//! # Tools
//!
//! - [`SearchTool`]: Tavily web search (top-k links)
//! - [`CrawlTool`]: page fetch and text extraction
//! - [`web3`]: on-chain queries against the Mantle RPC endpoint

pub mod crawl;
pub mod search;
pub mod web3;

pub use crawl::CrawlTool;
pub use search::SearchTool;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;

/// An external capability the reasoning engine may invoke mid-answer.
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Registered tool name, matching `^[a-zA-Z0-9_-]+$`.
    fn name(&self) -> &str;
    /// One-line description shown to the model.
    fn description(&self) -> &str;
    /// JSON schema of the tool's arguments object.
    fn schema(&self) -> serde_json::Value;
    /// Execute the tool. Implementations absorb collaborator failures and
    /// return descriptive text; an `Err` here means the arguments themselves
    /// were unusable.
    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String>;
}

/// Closed registry of tool descriptors, dispatched by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, returning the extended registry.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Registered tool names, in stable order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Render all descriptors in OpenAI function schema format.
    #[must_use]
    pub fn openai_tools_json(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    }
                })
            })
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown tool name or unusable arguments; the
    /// caller converts this into result text for the model rather than
    /// aborting the run.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow!("unknown tool: {name}"))?;
        tool.call(arguments).await
    }
}

/// Extract a required string argument from a tool arguments object.
pub(crate) fn required_str_arg<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("missing required argument: {key}"))
}
