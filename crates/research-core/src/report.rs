//! Evidence and Final Output
//!
//! `SearchResult` is the atomic unit of evidence produced by every tool;
//! `ResearchSummary` is the sole terminal output of a run. Decoding in this
//! module is tolerant by contract: backends sometimes double-encode the
//! `sources` argument as a JSON string, and individual source records may be
//! malformed. Neither case is allowed to escape as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::value_type;

/// A single, standardized search result from any source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the search result
    pub title: String,

    /// URL of the search result
    pub url: String,

    /// Brief summary or snippet of the content
    pub snippet: String,

    /// Name of the source engine, e.g. "Wikipedia", "DuckDuckGo",
    /// "WebScraper", "Tavily"
    pub source_name: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            source_name: source_name.into(),
        }
    }

    /// Placeholder for a source element that failed validation. Substituted
    /// in place of the bad element so the source count is preserved.
    pub fn invalid(raw: &Value) -> Self {
        Self {
            title: "Invalid Source Data".into(),
            url: String::new(),
            snippet: raw.to_string(),
            source_name: "Error".into(),
        }
    }
}

/// The final, synthesized output of the research agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSummary {
    /// Synthesized answer to the query. States explicitly when no
    /// information was found.
    pub summary: String,

    /// Source materials backing the summary; may be empty
    #[serde(default)]
    pub sources: Vec<SearchResult>,
}

impl ResearchSummary {
    pub fn new(summary: impl Into<String>, sources: Vec<SearchResult>) -> Self {
        Self {
            summary: summary.into(),
            sources,
        }
    }

    /// A summary with no sources (all forced-finish paths)
    pub fn without_sources(summary: impl Into<String>) -> Self {
        Self::new(summary, Vec::new())
    }
}

/// Tolerantly decode a finalize call's `sources` argument into raw elements.
///
/// An array is taken as-is. A JSON-string-encoded array is parsed first
/// (some backends double-encode). Anything else, including a string that
/// does not parse to an array, decodes to an empty list. Never errors.
pub fn decode_sources_value(value: Option<&Value>) -> Vec<Value> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => {
                tracing::info!("parsed sources from JSON string");
                items
            }
            Ok(other) => {
                tracing::warn!(
                    payload_type = %value_type(&other),
                    "sources string did not decode to a list, treating as empty"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not parse sources string as JSON, treating as empty");
                Vec::new()
            }
        },
        Some(other) => {
            tracing::warn!(
                payload_type = %value_type(other),
                "sources value is not a list, treating as empty"
            );
            Vec::new()
        }
    }
}

/// Decode and validate a `sources` argument element-wise.
///
/// Elements that fail validation are replaced by [`SearchResult::invalid`]
/// placeholders rather than dropped, so the element count is preserved.
pub fn decode_sources(value: Option<&Value>) -> Vec<SearchResult> {
    decode_sources_value(value)
        .into_iter()
        .map(|raw| match serde_json::from_value::<SearchResult>(raw.clone()) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, raw = %raw, "could not validate source element");
                SearchResult::invalid(&raw)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_source() -> Value {
        json!({"title": "T", "url": "u", "snippet": "s", "source_name": "n"})
    }

    #[test]
    fn test_decode_sources_list_is_noop() {
        let value = json!([sample_source()]);
        let decoded = decode_sources(Some(&value));
        assert_eq!(
            decoded,
            vec![SearchResult::new("T", "u", "s", "n")]
        );
    }

    #[test]
    fn test_decode_sources_string_encoded_list() {
        let value = json!(r#"[{"title":"T","url":"u","snippet":"s","source_name":"n"}]"#);
        let decoded = decode_sources(Some(&value));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], SearchResult::new("T", "u", "s", "n"));
    }

    #[test]
    fn test_decode_sources_idempotent_between_shapes() {
        let list = json!([sample_source()]);
        let string = json!(list.to_string());
        assert_eq!(decode_sources(Some(&list)), decode_sources(Some(&string)));
    }

    #[test]
    fn test_decode_sources_garbage_string_is_empty() {
        let value = json!("{definitely not json");
        assert!(decode_sources(Some(&value)).is_empty());
    }

    #[test]
    fn test_decode_sources_non_list_is_empty() {
        assert!(decode_sources(Some(&json!({"a": 1}))).is_empty());
        assert!(decode_sources(Some(&json!(42))).is_empty());
        assert!(decode_sources(None).is_empty());
    }

    #[test]
    fn test_invalid_element_replaced_not_dropped() {
        let value = json!([sample_source(), {"title": "only a title"}]);
        let decoded = decode_sources(Some(&value));
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].source_name, "n");
        assert_eq!(decoded[1].source_name, "Error");
        assert_eq!(decoded[1].title, "Invalid Source Data");
    }
}
