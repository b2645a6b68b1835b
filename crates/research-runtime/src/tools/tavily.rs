//! Tavily Search Tool
//!
//! In-depth web search through the Tavily API. A missing API key is an
//! in-band error record rather than a hard failure, so the model can fall
//! back to the other search tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use research_core::error::{AgentError, Result};
use research_core::report::SearchResult;
use research_core::tool::{ParameterSchema, SearchTool, ToolSchema};

use super::{opt_str, opt_usize, require_str, truncate_chars};

const API_URL: &str = "https://api.tavily.com/search";
const MAX_SNIPPET_CHARS: usize = 500;

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    raw_content: Option<String>,
}

/// Web search tool backed by Tavily
pub struct TavilySearchTool {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl TavilySearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    fn missing_key_record() -> SearchResult {
        SearchResult::new(
            "Tavily API Key Error",
            "",
            "Tavily API key is not configured. Search cannot be performed.",
            "Tavily",
        )
    }

    fn to_record(hit: TavilyHit) -> SearchResult {
        let snippet = hit
            .content
            .or(hit.raw_content)
            .unwrap_or_else(|| "No Snippet".into());
        SearchResult::new(
            hit.title.unwrap_or_else(|| "No Title".into()),
            hit.url.unwrap_or_default(),
            truncate_chars(&snippet, MAX_SNIPPET_CHARS),
            "Tavily",
        )
    }
}

#[async_trait]
impl SearchTool for TavilySearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "tavily_search".into(),
            description: "Performs a web search using Tavily. Use this for in-depth \
                          research when Wikipedia, DuckDuckGo, and targeted web scraping \
                          do not yield enough information or when you need a quick \
                          summarized answer with sources. Set search_depth to 'advanced' \
                          for more comprehensive results if basic is not enough."
                .into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "The search query for Tavily."),
                ParameterSchema::optional(
                    "search_depth",
                    "string",
                    "Search depth for Tavily ('basic' or 'advanced').",
                    serde_json::json!("basic"),
                ),
                ParameterSchema::optional(
                    "max_results",
                    "number",
                    "Maximum number of search results.",
                    serde_json::json!(3),
                ),
            ],
        }
    }

    async fn run(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let query = require_str(arguments, "query")?;
        let search_depth = opt_str(arguments, "search_depth", "basic");
        let max_results = opt_usize(arguments, "max_results", 3);
        tracing::info!(query, search_depth, "executing tavily search");

        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("tavily API key not configured");
            return Ok(serde_json::to_value(vec![Self::missing_key_record()])?);
        };

        let response = self
            .http
            .post(API_URL)
            .json(&TavilyRequest {
                api_key,
                query,
                search_depth,
                max_results,
            })
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("tavily request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::ToolExecution(format!(
                "tavily returned {status}"
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("tavily response: {e}")))?;

        tracing::debug!(query, count = parsed.results.len(), "tavily search returned results");
        let records: Vec<SearchResult> =
            parsed.results.into_iter().map(Self::to_record).collect();
        Ok(serde_json::to_value(records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_key_yields_in_band_record() {
        let tool = TavilySearchTool::new(None);
        let arguments = json!({"query": "rust"}).as_object().unwrap().clone();

        let output = tool.run(&arguments).await.unwrap();
        let records: Vec<SearchResult> = serde_json::from_value(output).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Tavily API Key Error");
        assert_eq!(records[0].source_name, "Tavily");
    }

    #[test]
    fn test_hit_conversion_prefers_content_and_truncates() {
        let hit = TavilyHit {
            title: None,
            url: None,
            content: Some("x".repeat(600)),
            raw_content: Some("raw".into()),
        };
        let record = TavilySearchTool::to_record(hit);
        assert_eq!(record.title, "No Title");
        assert_eq!(record.snippet.len(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn test_hit_conversion_falls_back_to_raw_content() {
        let hit = TavilyHit {
            title: Some("T".into()),
            url: Some("https://t".into()),
            content: None,
            raw_content: Some("raw".into()),
        };
        let record = TavilySearchTool::to_record(hit);
        assert_eq!(record.snippet, "raw");
    }

    #[test]
    fn test_schema_defaults() {
        let schema = TavilySearchTool::new(None).schema();
        let rendered = schema.parameters_json_schema();
        assert_eq!(rendered["properties"]["search_depth"]["default"], "basic");
        assert_eq!(rendered["required"], json!(["query"]));
    }
}
