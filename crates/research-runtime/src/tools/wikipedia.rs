//! Wikipedia Search Tool
//!
//! Two-stage lookup against the public MediaWiki APIs: a full-text search
//! to resolve the best-matching page title, then the REST summary endpoint
//! for that page's extract and canonical URL. A query that matches no page
//! yields an in-band "not found" record, not an error.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use research_core::error::{AgentError, Result};
use research_core::report::SearchResult;
use research_core::tool::{ParameterSchema, SearchTool, ToolSchema};

use super::require_str;

const SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php";
const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const USER_AGENT: &str = "deep-research-agent/0.1 (research tool)";

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PageSummary {
    title: String,
    extract: Option<String>,
    content_urls: Option<ContentUrls>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: UrlSet,
}

#[derive(Deserialize)]
struct UrlSet {
    page: String,
}

/// Encyclopedia lookup tool
pub struct WikipediaSearchTool {
    http: reqwest::Client,
}

impl Default for WikipediaSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WikipediaSearchTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    async fn best_title(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(SEARCH_URL)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("wikipedia search request: {e}")))?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("wikipedia search response: {e}")))?;

        Ok(parsed
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title))
    }

    async fn page_summary(&self, title: &str) -> Result<PageSummary> {
        let response = self
            .http
            .get(format!("{SUMMARY_URL}/{}", urlencode(title)))
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("wikipedia summary request: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("wikipedia summary response: {e}")))
    }

    fn not_found(query: &str) -> SearchResult {
        SearchResult::new(
            format!("Page for '{query}' not found"),
            "",
            format!("Wikipedia does not have a page specifically titled '{query}'."),
            "Wikipedia",
        )
    }
}

/// Percent-encode a page title for the REST path segment
fn urlencode(title: &str) -> String {
    let mut encoded = String::with_capacity(title.len());
    for byte in title.replace(' ', "_").bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'~' | b'(' | b')' => {
                encoded.push(byte as char);
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

#[async_trait]
impl SearchTool for WikipediaSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "wikipedia_search".into(),
            description: "Searches Wikipedia for the given query and returns a summary. \
                          Use this first for factual, encyclopedic queries."
                .into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "The search query for Wikipedia."),
                ParameterSchema::optional(
                    "max_sentences",
                    "number",
                    "Maximum number of sentences for the Wikipedia summary.",
                    serde_json::json!(3),
                ),
            ],
        }
    }

    async fn run(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let query = require_str(arguments, "query")?;
        let max_sentences = super::opt_usize(arguments, "max_sentences", 3);
        tracing::info!(query, "executing wikipedia search");

        let Some(title) = self.best_title(query).await? else {
            tracing::info!(query, "no wikipedia page matched");
            return Ok(serde_json::to_value(vec![Self::not_found(query)])?);
        };

        let summary = self.page_summary(&title).await?;
        let extract = summary.extract.unwrap_or_default();
        let snippet = first_sentences(&extract, max_sentences);
        let url = summary
            .content_urls
            .map(|u| u.desktop.page)
            .unwrap_or_else(|| format!("https://en.wikipedia.org/wiki/{}", urlencode(&title)));

        tracing::debug!(page = %summary.title, "wikipedia lookup succeeded");
        Ok(serde_json::to_value(vec![SearchResult::new(
            summary.title,
            url,
            snippet,
            "Wikipedia",
        )])?)
    }
}

/// Keep roughly the first `max` sentences of an extract
fn first_sentences(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut end = text.len();
    let mut seen = 0;
    for (idx, _) in text.match_indices(". ") {
        seen += 1;
        if seen == max {
            end = idx + 1;
            break;
        }
    }
    text[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode_page_titles() {
        assert_eq!(urlencode("Rust (programming language)"), "Rust_(programming_language)");
        assert_eq!(urlencode("C++"), "C%2B%2B");
    }

    #[test]
    fn test_first_sentences_cuts_at_boundary() {
        let text = "One. Two. Three. Four.";
        assert_eq!(first_sentences(text, 2), "One. Two.");
        assert_eq!(first_sentences(text, 10), text);
        assert_eq!(first_sentences(text, 0), "");
    }

    #[test]
    fn test_not_found_record_shape() {
        let record = WikipediaSearchTool::not_found("xyzzy");
        assert_eq!(record.source_name, "Wikipedia");
        assert!(record.url.is_empty());
        assert!(record.snippet.contains("xyzzy"));
    }

    #[test]
    fn test_schema_declares_query_required() {
        let schema = WikipediaSearchTool::new().schema();
        assert_eq!(schema.name, "wikipedia_search");
        let rendered = schema.parameters_json_schema();
        assert_eq!(rendered["required"], serde_json::json!(["query"]));
    }
}
