//! Page fetch-and-extract tool.
//!
//! Fetches a URL and reduces the HTML to readable text: script/style blocks
//! and comments removed, tags stripped, entities decoded, whitespace
//! collapsed, output bounded.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use super::{Tool, required_str_arg};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "mantle-agent/0.1 (+https://www.mantle.xyz)";

/// Default cap on extracted text length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 8000;

/// Fetch a page and extract its text content.
pub struct CrawlTool {
    http: reqwest::Client,
    max_length: usize,
    re_script: Regex,
    re_style: Regex,
    re_comment: Regex,
    re_tag: Regex,
    re_space: Regex,
}

impl std::fmt::Debug for CrawlTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlTool")
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl CrawlTool {
    /// Create a crawl tool with the given output length cap.
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            max_length,
            // Static, known-good patterns.
            re_script: Regex::new(r"(?is)<script\b.*?</script>").unwrap(),
            re_style: Regex::new(r"(?is)<style\b.*?</style>").unwrap(),
            re_comment: Regex::new(r"(?s)<!--.*?-->").unwrap(),
            re_tag: Regex::new(r"(?s)<[^>]+>").unwrap(),
            re_space: Regex::new(r"\s+").unwrap(),
        }
    }

    async fn fetch(&self, url: &str) -> String {
        if let Err(e) = Url::parse(url) {
            return format!("Invalid URL '{url}': {e}");
        }

        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => return format!("Failed to fetch '{url}': {e}"),
        };
        if !resp.status().is_success() {
            return format!("Failed to fetch '{url}': status {}", resp.status());
        }

        let html = match resp.text().await {
            Ok(t) => t,
            Err(e) => return format!("Failed to read '{url}': {e}"),
        };

        let text = self.extract_text(&html);
        if text.is_empty() {
            format!("No readable text found at '{url}'.")
        } else {
            text
        }
    }

    /// Reduce an HTML document to bounded plain text.
    fn extract_text(&self, html: &str) -> String {
        let no_script = self.re_script.replace_all(html, " ");
        let no_style = self.re_style.replace_all(&no_script, " ");
        let no_comment = self.re_comment.replace_all(&no_style, " ");
        let no_tags = self.re_tag.replace_all(&no_comment, " ");
        let decoded = decode_entities(&no_tags);
        let collapsed = self.re_space.replace_all(&decoded, " ");
        let trimmed = collapsed.trim();

        if trimmed.chars().count() > self.max_length {
            let cut: String = trimmed.chars().take(self.max_length).collect();
            format!("{cut}… (truncated)")
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for CrawlTool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

/// Decode the handful of entities that dominate real pages.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[async_trait]
impl Tool for CrawlTool {
    fn name(&self) -> &str {
        "fetch_page"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its extracted text content"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL of the page to read"
                }
            },
            "required": ["url"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let url = required_str_arg(&args, "url")?;
        Ok(self.fetch(url).await)
    }
}
