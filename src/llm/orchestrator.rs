//! Reasoning orchestrator with tool loop execution.
//!
//! The orchestrator manages the complete lifecycle of one engine run:
//! 1. Send the persona prompt and the extended user prompt to the model
//! 2. Execute any tool calls the model requests via the tool registry
//! 3. Feed tool results back to the model
//! 4. Repeat until the model produces a final answer
//!
//! # Example
//!
//! ```rust,ignore
//! use mantle_agent::llm::{Orchestrator, LlmSettings};
//!
//! let settings = LlmSettings { /* ... */ };
//! let orchestrator = Orchestrator::new(settings, tools);
//! let reply = orchestrator.run("What is the latest Mantle block?").await?;
//! ```

use std::sync::Arc;

use uuid::Uuid;

use crate::events::ToolInvocation;
use crate::tools::ToolRegistry;

use super::{
    ChatCompletionsDriver, ChatDriver, EngineReply, LlmRequest, LlmSettings, Message, MessageRole,
    ReasoningEngine,
};

/// Maximum number of tool loop iterations to prevent infinite loops.
const MAX_TOOL_ITERATIONS: usize = 10;

/// Persona description for the hosted model.
const PERSONA_DESCRIPTION: &str =
    "Specialist AI agent for 'Mantle Ecosystem' technical questions";

/// Persona instructions. These are configuration for the hosted model, not
/// mechanically enforced constraints.
const PERSONA_INSTRUCTIONS: &[&str] = &[
    "You are a Mantle Ecosystem expert. Respond ONLY to Mantle-related questions.",
    "For a given query, search for the top 3 links.",
    "Then read each URL and scrape them for information; if a URL isn't available, ignore it.",
    "Analyze gathered information and prepare a comprehensive reply.",
    "For technical questions, reference official docs.",
    "Always include relevant code samples from Mantle's GitHub.",
    "Reject non-Mantle questions politely but firmly.",
    "For blockchain-related queries, use the on-chain tools to fetch data.",
    "For general queries like 'what was the last question?', provide context-aware answers without violating the Mantle focus.",
    "Format your answers as markdown.",
];

/// Reasoning engine adapter binding the hosted model to the Mantle persona
/// and the registered tool set.
#[derive(Clone)]
pub struct Orchestrator {
    settings: LlmSettings,
    tools: Arc<ToolRegistry>,
    driver: Arc<dyn ChatDriver>,
    show_tool_calls: bool,
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("tools", &self.tools)
            .finish()
    }
}

impl Orchestrator {
    /// Create a new orchestrator with the given settings and tool registry.
    #[must_use]
    pub fn new(settings: LlmSettings, tools: Arc<ToolRegistry>) -> Self {
        let driver: Arc<dyn ChatDriver> = Arc::new(ChatCompletionsDriver::new(settings.clone()));
        Self {
            settings,
            tools,
            driver,
            show_tool_calls: true,
        }
    }

    /// Replace the wire driver. Used by tests to script model turns.
    #[must_use]
    pub fn with_driver(mut self, driver: Arc<dyn ChatDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Control whether the tool-call trace is embedded in the answer text.
    #[must_use]
    pub fn with_show_tool_calls(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }

    /// Get the LLM settings.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Build the system prompt: persona description, instructions, and the
    /// current date.
    fn system_prompt() -> String {
        let mut prompt = String::from(PERSONA_DESCRIPTION);
        prompt.push_str("\n\nInstructions:\n");
        for instruction in PERSONA_INSTRUCTIONS {
            prompt.push_str("- ");
            prompt.push_str(instruction);
            prompt.push('\n');
        }
        prompt.push_str(&format!(
            "\nThe current date is {}.",
            chrono::Utc::now().format("%Y-%m-%d")
        ));
        prompt
    }

    /// Render the tool-call trace block embedded in answers when
    /// `show_tool_calls` is enabled.
    fn trace_block(invocations: &[ToolInvocation]) -> String {
        let mut block = String::new();
        for inv in invocations {
            let args = inv
                .arguments
                .as_object()
                .map(|o| {
                    o.iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            block.push_str(&format!("> Running: {}({args})\n", inv.name));
        }
        block
    }
}

#[async_trait::async_trait]
impl ReasoningEngine for Orchestrator {
    #[allow(clippy::too_many_lines)]
    async fn run(&self, prompt: &str) -> anyhow::Result<EngineReply> {
        let request_id = Uuid::new_v4().to_string();
        let tools = self.tools.openai_tools_json();

        tracing::info!(
            request_id = %request_id,
            prompt_length = prompt.len(),
            tool_count = tools.len(),
            "Starting engine run"
        );

        let initial = vec![
            Message {
                role: MessageRole::System,
                content: Self::system_prompt(),
                tool_call_id: None,
                tool_calls: None,
            },
            Message {
                role: MessageRole::User,
                content: prompt.to_string(),
                tool_call_id: None,
                tool_calls: None,
            },
        ];

        let mut message_json: Vec<serde_json::Value> = initial
            .iter()
            .map(|m| serde_json::to_value(m).unwrap_or_default())
            .collect();

        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut iteration = 0;

        let answer = loop {
            if iteration >= MAX_TOOL_ITERATIONS {
                tracing::error!(
                    request_id = %request_id,
                    iteration = iteration,
                    "Maximum tool loop iterations exceeded"
                );
                anyhow::bail!("maximum tool loop iterations exceeded");
            }
            iteration += 1;

            let req = LlmRequest {
                messages: message_json.clone(),
                tools: tools.clone(),
            };

            tracing::debug!(
                request_id = %request_id,
                iteration = iteration,
                message_count = req.messages.len(),
                "Sending completion request"
            );

            let outcome = self.driver.complete(req).await?;

            if outcome.tool_calls.is_empty() {
                break outcome.content.unwrap_or_default();
            }

            // Record the assistant turn that requested the tool calls.
            message_json.push(serde_json::json!({
                "role": "assistant",
                "content": outcome.content.clone().map_or(serde_json::Value::Null, serde_json::Value::String),
                "tool_calls": outcome.tool_calls.iter().map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": tc.call_type,
                        "function": {
                            "name": tc.function.name,
                            "arguments": tc.function.arguments
                        }
                    })
                }).collect::<Vec<_>>()
            }));

            // Execute each tool call and feed the result back.
            for tool_call in &outcome.tool_calls {
                let tool_name = &tool_call.function.name;
                let arguments: serde_json::Value =
                    serde_json::from_str(&tool_call.function.arguments)
                        .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

                tracing::info!(
                    request_id = %request_id,
                    iteration = iteration,
                    tool_id = %tool_call.id,
                    tool_name = %tool_name,
                    "Executing tool call"
                );

                // Tool failures never abort the run; the failure text is
                // handed back for the model to incorporate.
                let content = match self.tools.call_tool(tool_name, arguments.clone()).await {
                    Ok(result) => {
                        tracing::info!(
                            request_id = %request_id,
                            tool_id = %tool_call.id,
                            tool_name = %tool_name,
                            result_length = result.len(),
                            "Tool call succeeded"
                        );
                        result
                    }
                    Err(e) => {
                        tracing::error!(
                            request_id = %request_id,
                            tool_id = %tool_call.id,
                            tool_name = %tool_name,
                            error = %e,
                            "Tool call failed"
                        );
                        format!("Error: {e}")
                    }
                };

                invocations.push(ToolInvocation {
                    name: tool_name.clone(),
                    arguments,
                    result: content.clone(),
                });

                message_json.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tool_call.id,
                    "content": content
                }));
            }
        };

        tracing::info!(
            request_id = %request_id,
            iterations = iteration,
            invocation_count = invocations.len(),
            answer_length = answer.len(),
            "Engine run complete"
        );

        let answer = if self.show_tool_calls && !invocations.is_empty() {
            format!("{}\n{answer}", Self::trace_block(&invocations))
        } else {
            answer
        };

        Ok(EngineReply {
            answer,
            invocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::{ChatOutcome, Provider, ToolCall, ToolCallFunction};
    use crate::tools::Tool;

    fn test_settings() -> LlmSettings {
        LlmSettings {
            base_url: "http://localhost".to_string(),
            api_key: None,
            model: "test".to_string(),
            provider: Provider::Generic,
        }
    }

    /// Driver that answers from a fixed script of turns.
    struct ScriptedDriver {
        turns: Vec<ChatOutcome>,
        cursor: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChatDriver for ScriptedDriver {
        async fn complete(&self, _req: LlmRequest) -> anyhow::Result<ChatOutcome> {
            let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
            Ok(self.turns.get(idx).cloned().unwrap_or_default())
        }
    }

    #[derive(Debug)]
    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }
        async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
            Ok(format!("echoed {args}"))
        }
    }

    fn tool_call(name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: "call-1".to_string(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.to_string(),
                arguments: args.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let driver = Arc::new(ScriptedDriver {
            turns: vec![ChatOutcome {
                content: Some("Mantle is an L2.".to_string()),
                tool_calls: vec![],
            }],
            cursor: AtomicUsize::new(0),
        });
        let engine = Orchestrator::new(test_settings(), Arc::new(ToolRegistry::new()))
            .with_driver(driver);

        let reply = engine.run("What is Mantle?").await.unwrap();
        assert_eq!(reply.answer, "Mantle is an L2.");
        assert!(reply.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_tool_loop_records_invocations() {
        let driver = Arc::new(ScriptedDriver {
            turns: vec![
                ChatOutcome {
                    content: None,
                    tool_calls: vec![tool_call("echo", r#"{"q":"hi"}"#)],
                },
                ChatOutcome {
                    content: Some("done".to_string()),
                    tool_calls: vec![],
                },
            ],
            cursor: AtomicUsize::new(0),
        });
        let tools = Arc::new(ToolRegistry::new().with_tool(Arc::new(EchoTool)));
        let engine = Orchestrator::new(test_settings(), tools)
            .with_driver(driver)
            .with_show_tool_calls(false);

        let reply = engine.run("use the tool").await.unwrap();
        assert_eq!(reply.answer, "done");
        assert_eq!(reply.invocations.len(), 1);
        assert_eq!(reply.invocations[0].name, "echo");
        assert!(reply.invocations[0].result.contains("echoed"));
    }

    #[tokio::test]
    async fn test_unknown_tool_degrades_to_error_text() {
        let driver = Arc::new(ScriptedDriver {
            turns: vec![
                ChatOutcome {
                    content: None,
                    tool_calls: vec![tool_call("missing", "{}")],
                },
                ChatOutcome {
                    content: Some("recovered".to_string()),
                    tool_calls: vec![],
                },
            ],
            cursor: AtomicUsize::new(0),
        });
        let engine = Orchestrator::new(test_settings(), Arc::new(ToolRegistry::new()))
            .with_driver(driver)
            .with_show_tool_calls(false);

        let reply = engine.run("q").await.unwrap();
        assert_eq!(reply.answer, "recovered");
        assert!(reply.invocations[0].result.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_trace_block_embedded_when_enabled() {
        let driver = Arc::new(ScriptedDriver {
            turns: vec![
                ChatOutcome {
                    content: None,
                    tool_calls: vec![tool_call("echo", r#"{"q":"hi"}"#)],
                },
                ChatOutcome {
                    content: Some("answer".to_string()),
                    tool_calls: vec![],
                },
            ],
            cursor: AtomicUsize::new(0),
        });
        let tools = Arc::new(ToolRegistry::new().with_tool(Arc::new(EchoTool)));
        let engine = Orchestrator::new(test_settings(), tools).with_driver(driver);

        let reply = engine.run("q").await.unwrap();
        assert!(reply.answer.contains("> Running: echo("));
        assert!(reply.answer.ends_with("answer"));
    }
}
