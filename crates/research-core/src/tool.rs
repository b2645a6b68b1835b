//! Tool System
//!
//! The tool contract, the static registry shared by the harness and the
//! provider adapters, and the batch execution harness itself. Every failure
//! mode at this boundary (unknown tool, malformed arguments, tool panic,
//! non-conforming output shape) is contained at per-call granularity and
//! converted into a tool-role error message; nothing propagates past here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCall, FINALIZE_TOOL_NAME};
use crate::report::SearchResult;

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render the parameter list as a JSON Schema object, the shape every
    /// backend's function-calling surface expects.
    pub fn parameters_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut spec = Map::new();
            spec.insert("type".into(), json!(param.param_type));
            spec.insert("description".into(), json!(param.description));
            if let Some(default) = &param.default {
                spec.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(spec));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Schema for the reserved finalize call, advertised alongside the
/// registered tools so the model can terminate with a structured answer.
pub fn finalize_schema() -> ToolSchema {
    ToolSchema {
        name: FINALIZE_TOOL_NAME.into(),
        description: "Provide the final research summary and its sources, or state \
                      explicitly that no information was found."
            .into(),
        parameters: vec![
            ParameterSchema::required(
                "summary",
                "string",
                "A comprehensive, synthesized answer to the user's query based on the \
                 search results. If no information is found, state that explicitly.",
            ),
            ParameterSchema::optional(
                "sources",
                "array",
                "All source records used to build the summary, each with title, url, \
                 snippet and source_name. May be empty if nothing was found.",
                json!([]),
            ),
        ],
    }
}

/// Tool trait - implement to add a research capability.
///
/// The contract is strict on output: `run` must return a JSON array of
/// `SearchResult` records. The harness validates this and treats any other
/// shape as a schema violation for that call.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with a decoded argument mapping
    async fn run(&self, arguments: &Map<String, Value>) -> Result<Value>;
}

/// Registry for available tools.
///
/// Built once at startup and shared read-only between the harness and the
/// provider adapters; never mutated during a run.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn SearchTool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool. The finalize name is reserved and refused.
    pub fn register<T: SearchTool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_boxed(Arc::new(tool))
    }

    /// Register a shared tool handle
    pub fn register_boxed(&mut self, tool: Arc<dyn SearchTool>) -> Result<()> {
        let schema = tool.schema();
        if schema.name == FINALIZE_TOOL_NAME {
            return Err(AgentError::Config(format!(
                "tool name '{FINALIZE_TOOL_NAME}' is reserved for the finalize call"
            )));
        }
        self.tools.insert(schema.name.clone(), tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchTool>> {
        self.tools.get(name).cloned()
    }

    /// Schemas of the registered tools
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Schemas advertised to a provider: registered tools plus finalize
    pub fn advertised_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas = self.schemas();
        schemas.push(finalize_schema());
        schemas
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

const NO_TOOL_CORRECTION: &str = "Error: No tool was called. Please try again, ensuring \
                                  you select a tool or use the research_summary function.";

/// Execute the full tool-call batch of an assistant message.
///
/// Returns the messages to append: one tool-role message per call, in call
/// order, each linked by id. An empty batch yields a single corrective
/// user-role message and dispatches nothing. Failure of one call never
/// blocks the others.
pub async fn run_tool_batch(registry: &ToolRegistry, assistant: &Message) -> Vec<Message> {
    if assistant.tool_calls.is_empty() {
        tracing::warn!("tool batch requested but the assistant message had no tool calls");
        return vec![Message::user(NO_TOOL_CORRECTION)];
    }

    let mut appended = Vec::with_capacity(assistant.tool_calls.len());
    for call in &assistant.tool_calls {
        appended.push(run_single_call(registry, call).await);
    }
    appended
}

async fn run_single_call(registry: &ToolRegistry, call: &ToolCall) -> Message {
    tracing::info!(tool = %call.name, call_id = %call.id, "executing tool");

    let Some(tool) = registry.get(&call.name) else {
        let error = AgentError::UnknownTool(call.name.clone());
        tracing::error!(tool = %call.name, "tool not found in registry");
        return error_message(call, &error);
    };

    match tool.run(&call.arguments).await {
        Ok(output) => match validate_output(&call.name, output) {
            Ok(results) => {
                tracing::debug!(
                    tool = %call.name,
                    count = results.len(),
                    "tool executed successfully"
                );
                success_message(call, &results)
            }
            Err(error) => {
                tracing::error!(tool = %call.name, error = %error, "tool output rejected");
                error_message(call, &error)
            }
        },
        Err(error) => {
            tracing::error!(tool = %call.name, error = %error, "tool execution failed");
            error_message(call, &error)
        }
    }
}

/// Validate that a tool returned a list of search results
fn validate_output(tool_name: &str, output: Value) -> Result<Vec<SearchResult>> {
    serde_json::from_value::<Vec<SearchResult>>(output).map_err(|e| {
        AgentError::ToolOutputSchema {
            tool: tool_name.into(),
            detail: e.to_string(),
        }
    })
}

fn success_message(call: &ToolCall, results: &[SearchResult]) -> Message {
    // Serialization of plain records cannot fail; fall back defensively anyway.
    let content = serde_json::to_string(results).unwrap_or_else(|e| {
        json!([{ "error": format!("could not serialize tool output: {e}") }]).to_string()
    });
    Message::tool(content, call.id.clone())
}

fn error_message(call: &ToolCall, error: &AgentError) -> Message {
    let content = json!([{ "error": error.to_string() }]).to_string();
    Message::tool(content, call.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;

    struct StaticTool {
        name: &'static str,
        results: Vec<SearchResult>,
    }

    #[async_trait]
    impl SearchTool for StaticTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.into(),
                description: "static test tool".into(),
                parameters: vec![ParameterSchema::required("query", "string", "query")],
            }
        }

        async fn run(&self, _arguments: &Map<String, Value>) -> Result<Value> {
            Ok(serde_json::to_value(&self.results)?)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl SearchTool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "failing".into(),
                description: "always fails".into(),
                parameters: vec![],
            }
        }

        async fn run(&self, _arguments: &Map<String, Value>) -> Result<Value> {
            Err(AgentError::ToolExecution("backend unreachable".into()))
        }
    }

    struct MalformedTool;

    #[async_trait]
    impl SearchTool for MalformedTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "malformed".into(),
                description: "returns the wrong shape".into(),
                parameters: vec![],
            }
        }

        async fn run(&self, _arguments: &Map<String, Value>) -> Result<Value> {
            Ok(json!({"not": "a list"}))
        }
    }

    fn lookup_tool() -> StaticTool {
        StaticTool {
            name: "wikipedia_search",
            results: vec![SearchResult::new("Paris", "https://w/Paris", "Capital", "Wikipedia")],
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(lookup_tool()).unwrap();
        registry.register(FailingTool).unwrap();
        registry.register(MalformedTool).unwrap();
        registry
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall::from_raw_arguments(Some(id.into()), name, r#"{"query": "paris"}"#)
    }

    #[test]
    fn test_finalize_name_is_reserved() {
        let mut registry = ToolRegistry::new();
        let result = registry.register(StaticTool {
            name: FINALIZE_TOOL_NAME,
            results: vec![],
        });
        assert!(matches!(result, Err(AgentError::Config(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_advertised_schemas_include_finalize() {
        let registry = registry();
        let schemas = registry.advertised_schemas();
        assert_eq!(schemas.len(), registry.len() + 1);
        assert!(schemas.iter().any(|s| s.name == FINALIZE_TOOL_NAME));
    }

    #[test]
    fn test_parameters_json_schema_shape() {
        let schema = finalize_schema().parameters_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["summary"]));
        assert_eq!(schema["properties"]["sources"]["type"], "array");
    }

    #[tokio::test]
    async fn test_empty_batch_appends_single_corrective_message() {
        let registry = registry();
        let assistant = Message::assistant("thinking out loud");
        let appended = run_tool_batch(&registry, &assistant).await;
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].role, crate::message::Role::User);
        assert!(appended[0].content.contains("No tool was called"));
    }

    #[tokio::test]
    async fn test_batch_message_count_matches_call_count() {
        let registry = registry();
        let assistant = Message::assistant_with_calls(
            "",
            vec![call("a", "wikipedia_search"), call("b", "wikipedia_search")],
        );
        let appended = run_tool_batch(&registry, &assistant).await;
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].tool_call_id.as_deref(), Some("a"));
        assert_eq!(appended[1].tool_call_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_message() {
        let registry = registry();
        let assistant = Message::assistant_with_calls("", vec![call("x", "no_such_tool")]);
        let appended = run_tool_batch(&registry, &assistant).await;
        assert_eq!(appended.len(), 1);
        let payload: Vec<Value> = serde_json::from_str(&appended[0].content).unwrap();
        assert!(payload[0]["error"]
            .as_str()
            .unwrap()
            .contains("no_such_tool"));
    }

    #[tokio::test]
    async fn test_failing_call_does_not_block_sibling() {
        let registry = registry();
        let assistant = Message::assistant_with_calls(
            "",
            vec![call("bad", "failing"), call("good", "wikipedia_search")],
        );
        let appended = run_tool_batch(&registry, &assistant).await;
        assert_eq!(appended.len(), 2);

        let failed: Vec<Value> = serde_json::from_str(&appended[0].content).unwrap();
        assert!(failed[0]["error"].as_str().unwrap().contains("unreachable"));

        let succeeded: Vec<SearchResult> = serde_json::from_str(&appended[1].content).unwrap();
        assert_eq!(succeeded[0].title, "Paris");
    }

    #[tokio::test]
    async fn test_schema_violation_becomes_error_message() {
        let registry = registry();
        let assistant = Message::assistant_with_calls("", vec![call("m", "malformed")]);
        let appended = run_tool_batch(&registry, &assistant).await;
        let payload: Vec<Value> = serde_json::from_str(&appended[0].content).unwrap();
        assert!(payload[0]["error"]
            .as_str()
            .unwrap()
            .contains("invalid result shape"));
    }
}
