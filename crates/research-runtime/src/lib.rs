//! # research-runtime
//!
//! Runtime layer for the deep-research agent: environment configuration,
//! provider adapters for hosted LLM backends, and the concrete research
//! tools. `research-core` stays free of HTTP and environment concerns; this
//! crate supplies both.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod tools;

pub use anthropic::AnthropicProvider;
pub use config::{LlmConfig, ProviderKind};
pub use openai::OpenAiProvider;
pub use tools::{
    DuckDuckGoSearchTool, ScrapeAndSummarizeTool, TavilySearchTool, WikipediaSearchTool,
};

use std::sync::Arc;

use research_core::error::Result;
use research_core::provider::LlmProvider;
use research_core::tool::ToolRegistry;

/// Build the standard research tool registry.
///
/// The scraper borrows the active provider for its summarization step; the
/// Tavily tool degrades in-band when no key is configured.
pub fn build_registry(
    config: &LlmConfig,
    provider: Arc<dyn LlmProvider>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(WikipediaSearchTool::new())?;
    registry.register(DuckDuckGoSearchTool::new())?;
    registry.register(ScrapeAndSummarizeTool::new(provider))?;
    registry.register(TavilySearchTool::new(config.tavily_api_key.clone()))?;

    tracing::info!(tools = registry.len(), "tool registry constructed");
    Ok(registry)
}
