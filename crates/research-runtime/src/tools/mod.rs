//! Research Tools
//!
//! Concrete `SearchTool` implementations backed by public web services.
//! Each tool returns in-band error records for conditions the model can
//! recover from (missing page, missing API key) and a hard error only when
//! the backend itself is unreachable.

pub mod duckduckgo;
pub mod scraper;
pub mod tavily;
pub mod wikipedia;

pub use duckduckgo::DuckDuckGoSearchTool;
pub use scraper::ScrapeAndSummarizeTool;
pub use tavily::TavilySearchTool;
pub use wikipedia::WikipediaSearchTool;

use serde_json::{Map, Value};

use research_core::error::{AgentError, Result};

/// Extract a required string argument from a decoded call mapping
pub(crate) fn require_str<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AgentError::ToolExecution(format!("missing required string argument '{name}'"))
        })
}

/// Extract an optional positive integer argument, falling back to a default
pub(crate) fn opt_usize(arguments: &Map<String, Value>, name: &str, default: usize) -> usize {
    arguments
        .get(name)
        .and_then(Value::as_u64)
        .map_or(default, |n| n as usize)
}

/// Extract an optional string argument, falling back to a default
pub(crate) fn opt_str<'a>(
    arguments: &'a Map<String, Value>,
    name: &str,
    default: &'a str,
) -> &'a str {
    arguments.get(name).and_then(Value::as_str).unwrap_or(default)
}

/// Truncate at a character boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_require_str_present() {
        let arguments = args(json!({"query": "rust"}));
        assert_eq!(require_str(&arguments, "query").unwrap(), "rust");
    }

    #[test]
    fn test_require_str_rejects_missing_blank_and_non_string() {
        assert!(require_str(&args(json!({})), "query").is_err());
        assert!(require_str(&args(json!({"query": "  "})), "query").is_err());
        assert!(require_str(&args(json!({"query": 7})), "query").is_err());
    }

    #[test]
    fn test_opt_usize_default_and_override() {
        assert_eq!(opt_usize(&args(json!({})), "max_results", 3), 3);
        assert_eq!(opt_usize(&args(json!({"max_results": 5})), "max_results", 3), 5);
        assert_eq!(opt_usize(&args(json!({"max_results": "x"})), "max_results", 3), 3);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
