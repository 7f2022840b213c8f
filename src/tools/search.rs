//! Web search tool backed by the Tavily API.

use std::time::Duration;

use async_trait::async_trait;

use super::{Tool, required_str_arg};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Search the web and return the top-k results as titled links.
///
/// Failures never propagate to the engine; they degrade to descriptive text
/// the model can fold into its answer.
pub struct SearchTool {
    http: reqwest::Client,
    api_key: Option<String>,
    max_results: usize,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("max_results", &self.max_results)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl SearchTool {
    /// Create a search tool. `api_key` may be absent; calls then degrade to
    /// an unconfigured-search message.
    #[must_use]
    pub fn new(api_key: Option<String>, max_results: usize) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            max_results,
        }
    }

    async fn search(&self, query: &str) -> String {
        let Some(api_key) = &self.api_key else {
            return "Web search is not configured (missing TAVILY_API_KEY).".to_string();
        };

        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.max_results,
            "include_answer": false,
        });

        let resp = match self.http.post(TAVILY_SEARCH_URL).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return format!("Web search failed: {e}"),
        };
        if !resp.status().is_success() {
            return format!("Web search failed: status {}", resp.status());
        }

        let v: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return format!("Web search failed: unreadable response ({e})"),
        };

        let results = v
            .get("results")
            .and_then(|r| r.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        if results.is_empty() {
            return format!("No search results for '{query}'.");
        }

        let mut out = format!("Top results for '{query}':\n");
        for (i, result) in results.iter().take(self.max_results).enumerate() {
            let title = result.get("title").and_then(|t| t.as_str()).unwrap_or("-");
            let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("-");
            let snippet = result
                .get("content")
                .and_then(|c| c.as_str())
                .unwrap_or("");
            out.push_str(&format!("{}. {title}\n   {url}\n", i + 1));
            if !snippet.is_empty() {
                out.push_str(&format!("   {}\n", truncate(snippet, 300)));
            }
        }
        out
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return the top matching links with snippets"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let query = required_str_arg(&args, "query")?;
        Ok(self.search(query).await)
    }
}
