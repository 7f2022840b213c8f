//! OpenAI Chat Completions API driver.
//!
//! This module implements the [`ChatDriver`] trait against
//! `/v1/chat/completions`, one blocking completion per call. Each query is
//! processed to completion before a response is produced, so there is no
//! streaming path here.

use std::time::Duration;

use anyhow::Context;

use super::{ChatDriver, ChatOutcome, LlmRequest, LlmSettings, ToolCall, ToolCallFunction};

/// Timeout for a single completion request. Model calls are unbounded
/// network operations; the cap keeps a stuck request from wedging a worker.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, settings }
    }
}

#[async_trait::async_trait]
impl ChatDriver for ChatCompletionsDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<ChatOutcome> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": req.messages,
            "tools": if req.tools.is_empty() { serde_json::Value::Null } else { serde_json::Value::Array(req.tools) }
        });

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned error status")?;

        let v: serde_json::Value = resp
            .json()
            .await
            .context("chat completion response was not valid JSON")?;

        let message = &v["choices"][0]["message"];

        let content = message
            .get("content")
            .and_then(|x| x.as_str())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        let tool_calls = message
            .get("tool_calls")
            .and_then(|x| x.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|tc| {
                        let id = tc.get("id")?.as_str()?.to_string();
                        let function = tc.get("function")?;
                        let name = function.get("name")?.as_str()?.to_string();
                        let arguments = function
                            .get("arguments")
                            .and_then(|x| x.as_str())
                            .unwrap_or("{}")
                            .to_string();
                        Some(ToolCall {
                            id,
                            call_type: "function".to_string(),
                            function: ToolCallFunction { name, arguments },
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ChatOutcome {
            content,
            tool_calls,
        })
    }
}
