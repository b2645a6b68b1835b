//! Canonical Messages
//!
//! The message and tool-call shapes shared by orchestration, the tool
//! harness and every provider adapter. Adapters translate to and from their
//! backend's native representation at the boundary; nothing outside the
//! adapter layer ever sees a provider-specific type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the reserved finalize tool. Calling it is the agent's decision
/// to terminate with a synthesized answer; ordinary tools may not reuse it.
pub const FINALIZE_TOOL_NAME: &str = "research_summary";

/// Role of a message sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result, linked to a tool call by id
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A structured request from the model to execute a named tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique within its batch; synthesized when the backend omits one
    pub id: String,

    /// Requested capability
    pub name: String,

    /// Decoded argument mapping. Always present; malformed payloads decode
    /// to an empty mapping rather than an error.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(
        id: Option<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(generate_call_id),
            name: name.into(),
            arguments,
        }
    }

    /// Build a call from a serialized argument payload, as delivered by
    /// backends that stringify function arguments.
    pub fn from_raw_arguments(
        id: Option<String>,
        name: impl Into<String>,
        raw_arguments: &str,
    ) -> Self {
        Self::new(id, name, parse_arguments(raw_arguments))
    }

    /// Whether this call targets the reserved finalize tool
    pub fn is_finalize(&self) -> bool {
        self.name == FINALIZE_TOOL_NAME
    }
}

/// Synthesize a call id for backends that omit one
pub fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4())
}

/// Tolerantly decode a serialized argument payload into a mapping.
///
/// Invalid JSON or a non-object payload yields an empty mapping; this
/// function never errors.
pub fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(payload_type = %value_type(&other), "tool arguments were not an object, using empty mapping");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not decode tool arguments, using empty mapping");
            Map::new()
        }
    }
}

pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single message in the run transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content; may be empty on assistant turns that only carry calls
    pub content: String,

    /// Ordered tool calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// On tool-role messages, the id of the call this answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message without tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message linked to its originating call
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The finalize call in this message's batch, if any
    pub fn finalize_call(&self) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|tc| tc.is_finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_tool_message_carries_call_id() {
        let msg = Message::tool("[]", "call_1");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_parse_arguments_valid() {
        let args = parse_arguments(r#"{"query": "rust", "max_results": 3}"#);
        assert_eq!(args.get("query"), Some(&json!("rust")));
        assert_eq!(args.get("max_results"), Some(&json!(3)));
    }

    #[test]
    fn test_parse_arguments_invalid_json_is_empty() {
        assert!(parse_arguments("{not json").is_empty());
    }

    #[test]
    fn test_parse_arguments_non_object_is_empty() {
        assert!(parse_arguments(r#"["a", "b"]"#).is_empty());
        assert!(parse_arguments(r#""just a string""#).is_empty());
    }

    #[test]
    fn test_missing_id_is_synthesized() {
        let call = ToolCall::from_raw_arguments(None, "wikipedia_search", "{}");
        assert!(call.id.starts_with("call_"));
        assert!(call.id.len() > "call_".len());
    }

    #[test]
    fn test_finalize_call_lookup() {
        let msg = Message::assistant_with_calls(
            "",
            vec![
                ToolCall::from_raw_arguments(Some("a".into()), "wikipedia_search", "{}"),
                ToolCall::from_raw_arguments(Some("b".into()), FINALIZE_TOOL_NAME, "{}"),
            ],
        );
        assert_eq!(msg.finalize_call().map(|tc| tc.id.as_str()), Some("b"));
    }
}
