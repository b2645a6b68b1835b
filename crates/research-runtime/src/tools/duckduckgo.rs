//! DuckDuckGo Search Tool
//!
//! General web search through the DuckDuckGo Instant Answer API. The API
//! returns an abstract plus a tree of related topics; both are flattened
//! into standard search result records. An empty answer is a legitimate
//! outcome and yields an empty list.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use research_core::error::{AgentError, Result};
use research_core::report::SearchResult;
use research_core::tool::{ParameterSchema, SearchTool, ToolSchema};

use super::{opt_usize, require_str};

const API_URL: &str = "https://api.duckduckgo.com/";

#[derive(Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

/// A related topic is either a leaf link or a named group of leaves
#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Leaf {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics", default)]
        topics: Vec<RelatedTopic>,
    },
    Other(Value),
}

/// Web search tool backed by DuckDuckGo
pub struct DuckDuckGoSearchTool {
    http: reqwest::Client,
}

impl Default for DuckDuckGoSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearchTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn flatten(answer: InstantAnswer, max_results: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if !answer.abstract_text.is_empty() {
            results.push(SearchResult::new(
                if answer.heading.is_empty() {
                    "No Title".to_string()
                } else {
                    answer.heading
                },
                answer.abstract_url,
                answer.abstract_text,
                "DuckDuckGo",
            ));
        }

        collect_topics(&answer.related_topics, max_results, &mut results);
        results.truncate(max_results);
        results
    }
}

fn collect_topics(topics: &[RelatedTopic], max_results: usize, out: &mut Vec<SearchResult>) {
    for topic in topics {
        if out.len() >= max_results {
            return;
        }
        match topic {
            RelatedTopic::Leaf { text, first_url } => {
                if !text.is_empty() {
                    // The text's leading phrase doubles as a title.
                    let title = text.split(" - ").next().unwrap_or(text);
                    out.push(SearchResult::new(title, first_url, text, "DuckDuckGo"));
                }
            }
            RelatedTopic::Group { topics } => collect_topics(topics, max_results, out),
            RelatedTopic::Other(_) => {}
        }
    }
}

#[async_trait]
impl SearchTool for DuckDuckGoSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "duckduckgo_search".into(),
            description: "Searches the web using DuckDuckGo for the given query. Use this \
                          for general web searches if Wikipedia is not sufficient or \
                          appropriate. It's fast and provides a good starting point for \
                          research."
                .into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "The search query for DuckDuckGo."),
                ParameterSchema::optional(
                    "max_results",
                    "number",
                    "Maximum number of search results to return.",
                    serde_json::json!(3),
                ),
            ],
        }
    }

    async fn run(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let query = require_str(arguments, "query")?;
        let max_results = opt_usize(arguments, "max_results", 3);
        tracing::info!(query, "executing duckduckgo search");

        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("duckduckgo request: {e}")))?;

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("duckduckgo response: {e}")))?;

        let results = Self::flatten(answer, max_results);
        if results.is_empty() {
            tracing::warn!(query, "duckduckgo returned no results");
        } else {
            tracing::debug!(query, count = results.len(), "duckduckgo search returned results");
        }
        Ok(serde_json::to_value(results)?)
    }
}
