//! web_search tool backed by the Tavily search API

use crate::error::{CajaError, Result};
use crate::tools::{ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Registered tool name
pub const TOOL_NAME: &str = "web_search";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct WebSearchParams {
    query: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    topic: &'static str,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// General web search for current information
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    max_results: usize,
}

impl WebSearchTool {
    /// Create the tool
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: String, api_base: String, max_results: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CajaError::Tool(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base,
            max_results,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.api_base.trim_end_matches('/'))
    }
}

fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n   {}\n   {}", i + 1, hit.title, hit.url, hit.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl ToolExecutor for WebSearchTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": TOOL_NAME,
            "description": "Search the web for current information. Use for news, facts, or anything not in the conversation or the notes database.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"}
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: WebSearchParams = match serde_json::from_value(args) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("Invalid arguments: {}", e))),
        };

        let body = SearchRequest {
            api_key: &self.api_key,
            query: &params.query,
            max_results: self.max_results,
            topic: "general",
            include_answer: false,
            include_raw_content: false,
        };

        tracing::debug!("web_search: {}", params.query);
        let response = match self
            .client
            .post(self.search_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("Search request failed: {}", e))),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Tavily returned {}: {}", status, text);
            return Ok(ToolResult::error(format!(
                "Search failed with HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => Ok(ToolResult::success(render_hits(&parsed.results))),
            Err(e) => Ok(ToolResult::error(format!(
                "Failed to parse search response: {}",
                e
            ))),
        }
    }
}
