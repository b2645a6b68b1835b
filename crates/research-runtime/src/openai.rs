//! OpenAI-compatible Provider
//!
//! Adapter for the chat-completions wire format, used both for OpenAI
//! itself and for Together AI's compatible endpoint. Tool-call arguments
//! travel as JSON strings on this wire; they are re-stringified on the way
//! out and tolerantly parsed back into structured mappings on the way in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use research_core::error::{AgentError, Result};
use research_core::message::{Message, ToolCall};
use research_core::provider::{with_backoff, LlmProvider, RetryPolicy};
use research_core::tool::ToolSchema;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument payload
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

/// Provider for the OpenAI chat-completions surface
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    label: &'static str,
    retry: RetryPolicy,
}

impl OpenAiProvider {
    /// Adapter for api.openai.com
    pub fn openai(api_key: String, model: String, retry: RetryPolicy) -> Self {
        Self::with_base_url(OPENAI_BASE_URL, "openai", api_key, model, retry)
    }

    /// Adapter for Together AI's OpenAI-compatible endpoint
    pub fn together(api_key: String, model: String, retry: RetryPolicy) -> Self {
        Self::with_base_url(TOGETHER_BASE_URL, "together", api_key, model, retry)
    }

    fn with_base_url(
        base_url: &str,
        label: &'static str,
        api_key: String,
        model: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            label,
            retry,
        }
    }

    /// Convert canonical history to the wire shape
    fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages.iter().map(Self::to_wire_message).collect()
    }

    fn to_wire_message(message: &Message) -> WireMessage {
        let role = message.role.to_string();
        let tool_calls = message
            .tool_calls
            .iter()
            .map(|tc| WireToolCall {
                id: Some(tc.id.clone()),
                kind: "function".into(),
                function: WireFunctionCall {
                    name: tc.name.clone(),
                    arguments: Value::Object(tc.arguments.clone()).to_string(),
                },
            })
            .collect();

        WireMessage {
            role,
            content: Some(message.content.clone()),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    /// Normalize a response message into the canonical shape
    fn from_wire_response(message: ResponseMessage) -> Message {
        let content = message.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                ToolCall::from_raw_arguments(tc.id, tc.function.name, &tc.function.arguments)
            })
            .collect();

        if tool_calls.is_empty() {
            Message::assistant(content)
        } else {
            Message::assistant_with_calls(content, tool_calls)
        }
    }

    fn to_wire_tools(tools: &[ToolSchema]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|schema| WireTool {
                kind: "function",
                function: WireFunctionDef {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    parameters: schema.parameters_json_schema(),
                },
            })
            .collect()
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        let request = ChatRequest {
            model: &self.model,
            messages: Self::to_wire_messages(messages),
            tools: Self::to_wire_tools(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "{} returned {status}: {body}",
                self.label
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("response contained no choices".into()))?;

        Ok(Self::from_wire_response(choice.message))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.label
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        tracing::info!(provider = self.label, model = %self.model, "calling chat completions");
        with_backoff(&self.retry, self.label, || self.invoke(messages, tools)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::message::{Role, FINALIZE_TOOL_NAME};
    use research_core::tool::finalize_schema;
    use serde_json::json;

    fn call(id: &str, raw_args: &str) -> ToolCall {
        ToolCall::from_raw_arguments(Some(id.into()), "wikipedia_search", raw_args)
    }

    #[test]
    fn test_tool_history_demotes_to_wire_roles() {
        let messages = vec![
            Message::system("instructions"),
            Message::user("capital of France"),
            Message::assistant_with_calls("", vec![call("c1", r#"{"query":"paris"}"#)]),
            Message::tool(r#"[{"title":"Paris"}]"#, "c1"),
        ];

        let wire = OpenAiProvider::to_wire_messages(&messages);
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[2].role, "assistant");
        assert_eq!(wire[2].tool_calls.len(), 1);
        assert_eq!(wire[2].tool_calls[0].function.name, "wikipedia_search");
        assert_eq!(wire[3].role, "tool");
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_arguments_restringified_on_the_way_out() {
        let wire = OpenAiProvider::to_wire_message(&Message::assistant_with_calls(
            "",
            vec![call("c1", r#"{"query": "paris"}"#)],
        ));
        let raw = &wire.tool_calls[0].function.arguments;
        let parsed: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, json!({"query": "paris"}));
    }

    #[test]
    fn test_response_normalization_parses_string_arguments() {
        let response = ResponseMessage {
            content: None,
            tool_calls: Some(vec![WireToolCall {
                id: Some("abc".into()),
                kind: "function".into(),
                function: WireFunctionCall {
                    name: FINALIZE_TOOL_NAME.into(),
                    arguments: r#"{"summary": "Paris", "sources": []}"#.into(),
                },
            }]),
        };

        let message = OpenAiProvider::from_wire_response(response);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "");
        let tc = &message.tool_calls[0];
        assert_eq!(tc.id, "abc");
        assert_eq!(tc.arguments.get("summary"), Some(&json!("Paris")));
    }

    #[test]
    fn test_response_without_id_gets_synthesized_one() {
        let response = ResponseMessage {
            content: Some("".into()),
            tool_calls: Some(vec![WireToolCall {
                id: None,
                kind: "function".into(),
                function: WireFunctionCall {
                    name: "tavily_search".into(),
                    arguments: "{}".into(),
                },
            }]),
        };

        let message = OpenAiProvider::from_wire_response(response);
        assert!(message.tool_calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_malformed_arguments_decode_to_empty_mapping() {
        let response = ResponseMessage {
            content: None,
            tool_calls: Some(vec![WireToolCall {
                id: Some("x".into()),
                kind: "function".into(),
                function: WireFunctionCall {
                    name: "tavily_search".into(),
                    arguments: "{broken".into(),
                },
            }]),
        };

        let message = OpenAiProvider::from_wire_response(response);
        assert!(message.tool_calls[0].arguments.is_empty());
    }

    #[test]
    fn test_tool_schema_advertisement_shape() {
        let wire = OpenAiProvider::to_wire_tools(&[finalize_schema()]);
        let rendered = serde_json::to_value(&wire[0]).unwrap();
        assert_eq!(rendered["type"], "function");
        assert_eq!(rendered["function"]["name"], FINALIZE_TOOL_NAME);
        assert_eq!(rendered["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_plain_text_response_has_no_calls() {
        let message = OpenAiProvider::from_wire_response(ResponseMessage {
            content: Some("I think it's Paris".into()),
            tool_calls: None,
        });
        assert_eq!(message.content, "I think it's Paris");
        assert!(!message.has_tool_calls());
    }
}
