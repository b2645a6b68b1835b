//! Web Scrape and Summarize Tool
//!
//! Fetches a page, extracts its readable text and asks the configured
//! provider to summarize it in the context of the original query. Fetch and
//! summarization failures are reported as in-band error records so the model
//! can see what went wrong and route around the page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use research_core::error::Result;
use research_core::message::Message;
use research_core::provider::LlmProvider;
use research_core::report::SearchResult;
use research_core::tool::{ParameterSchema, SearchTool, ToolSchema};

use super::{require_str, truncate_chars};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const TEXT_WIDTH: usize = 120;

// Roughly 2k tokens of page text per summarization call
const MAX_CHARS_FOR_SUMMARY: usize = 8000;

const SUMMARIZER_SYSTEM_PROMPT: &str = "You are an expert at extracting and summarizing web \
    page content based on a user's research query. Focus only on information directly \
    relevant to the query. If no relevant information is found, state that clearly. Provide \
    a concise snippet (around 3-5 sentences).";

/// Tool that scrapes a page and summarizes it with the active provider
pub struct ScrapeAndSummarizeTool {
    http: reqwest::Client,
    provider: Arc<dyn LlmProvider>,
}

impl ScrapeAndSummarizeTool {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider,
        }
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<(String, Option<String>), String> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", BROWSER_UA)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("server responded with {status}"));
        }

        let html = response.text().await.map_err(|e| e.to_string())?;
        let title = extract_title(&html);
        let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH).map_err(|e| e.to_string())?;
        Ok((text, title))
    }

    async fn summarize(&self, original_query: &str, page_text: &str) -> Result<String> {
        let prompt = format!(
            "Original Research Query: '{original_query}'\n\n\
             Web Page Content (first {MAX_CHARS_FOR_SUMMARY} characters):\n```\n{page_text}\n```\n\n\
             Based *only* on the provided web page content and its relevance to the original \
             research query, provide a concise summary snippet. If the page content does not \
             seem relevant to the query, output 'The page content does not appear to be \
             relevant to the query.'"
        );

        let messages = [
            Message::system(SUMMARIZER_SYSTEM_PROMPT),
            Message::user(prompt),
        ];
        let response = self.provider.complete(&messages, &[]).await?;
        Ok(response.content.trim().to_string())
    }
}

/// Pull the document title out of raw HTML, if present.
///
/// Tag matching is ASCII-case-insensitive only; ASCII lowercasing preserves
/// byte offsets, so indices found in the lowered copy stay valid in the
/// original text.
fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = lower[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = html[open_end..close].trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[async_trait]
impl SearchTool for ScrapeAndSummarizeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "scrape_and_summarize_web_page".into(),
            description: "Scrapes content from a given web page URL, then analyzes its \
                          content in the context of the original_query and returns a \
                          concise summary. Use this when a URL from a previous search \
                          seems highly relevant and needs deeper inspection than its \
                          snippet provides."
                .into(),
            parameters: vec![
                ParameterSchema::required(
                    "url",
                    "string",
                    "The URL of the web page to scrape and summarize.",
                ),
                ParameterSchema::required(
                    "original_query",
                    "string",
                    "The original user research query to provide context for summarization.",
                ),
            ],
        }
    }

    async fn run(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let url = require_str(arguments, "url")?;
        let original_query = require_str(arguments, "original_query")?;
        tracing::info!(url, original_query, "executing web scrape and summarize");

        let (text, title) = match self.fetch_text(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!(url, error = %e, "web page fetch failed");
                return Ok(serde_json::to_value(vec![SearchResult::new(
                    format!("Failed to fetch {url}"),
                    url,
                    format!("Error during web request: {e}"),
                    "WebScraper",
                )])?);
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(url, "no meaningful text content found on page");
            return Ok(serde_json::to_value(vec![SearchResult::new(
                format!("Content Scraped from {url}"),
                url,
                "No meaningful text content found on the page.",
                "WebScraper",
            )])?);
        }

        let excerpt = truncate_chars(&text, MAX_CHARS_FOR_SUMMARY);
        tracing::debug!(
            url,
            total_chars = text.len(),
            used_chars = excerpt.len(),
            "extracted page text"
        );

        let record = match self.summarize(original_query, excerpt).await {
            Ok(summary) => SearchResult::new(
                title.unwrap_or_else(|| url.to_string()),
                url,
                summary,
                "WebScraper",
            ),
            Err(e) => {
                tracing::error!(url, error = %e, "page summarization failed");
                SearchResult::new(
                    format!("Error processing {url}"),
                    url,
                    format!("An unexpected error occurred: {e}"),
                    "WebScraper",
                )
            }
        };

        Ok(serde_json::to_value(vec![record])?)
    }
}
