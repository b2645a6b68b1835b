//! Anthropic Provider
//!
//! Adapter for the Anthropic messages API. The wire shape differs from the
//! chat-completions surface in three ways this module has to bridge: the
//! system prompt is a top-level field rather than a message, message content
//! is a list of typed blocks, and tool results travel as `tool_result`
//! blocks inside a user turn instead of a dedicated tool role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use research_core::error::{AgentError, Result};
use research_core::message::{parse_arguments, Message, Role, ToolCall};
use research_core::provider::{with_backoff, LlmProvider, RetryPolicy};
use research_core::tool::ToolSchema;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// Provider for the Anthropic messages API
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            retry,
        }
    }

    /// Split canonical history into the top-level system string and the
    /// block-structured turn list.
    ///
    /// Consecutive tool-role messages are folded into a single user turn of
    /// `tool_result` blocks, preserving call order and id linkage.
    fn to_wire_history(messages: &[Message]) -> (Option<String>, Vec<ApiMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut turns: Vec<ApiMessage> = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_parts.push(&message.content),
                Role::User => turns.push(ApiMessage {
                    role: "user".into(),
                    content: vec![ContentBlock::Text {
                        text: message.content.clone(),
                    }],
                }),
                Role::Assistant => {
                    let mut content = Vec::new();
                    if !message.content.is_empty() {
                        content.push(ContentBlock::Text {
                            text: message.content.clone(),
                        });
                    }
                    for tc in &message.tool_calls {
                        content.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: Value::Object(tc.arguments.clone()),
                        });
                    }
                    if content.is_empty() {
                        content.push(ContentBlock::Text { text: String::new() });
                    }
                    turns.push(ApiMessage {
                        role: "assistant".into(),
                        content,
                    });
                }
                Role::Tool => {
                    let block = ContentBlock::ToolResult {
                        tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                        content: message.content.clone(),
                    };
                    match turns.last_mut() {
                        Some(turn)
                            if turn.role == "user"
                                && turn
                                    .content
                                    .iter()
                                    .all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                        {
                            turn.content.push(block);
                        }
                        _ => turns.push(ApiMessage {
                            role: "user".into(),
                            content: vec![block],
                        }),
                    }
                }
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, turns)
    }

    /// Normalize response blocks into a canonical assistant message.
    ///
    /// Text blocks are concatenated; each `tool_use` block becomes one tool
    /// call. A non-object `input` decodes tolerantly rather than failing the
    /// whole response.
    fn from_wire_response(blocks: Vec<ContentBlock>) -> Message {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block {
                ContentBlock::Text { text } => content.push_str(&text),
                ContentBlock::ToolUse { id, name, input } => {
                    let arguments = match input {
                        Value::Object(map) => map,
                        Value::String(raw) => parse_arguments(&raw),
                        other => {
                            tracing::warn!(
                                tool = %name,
                                "tool_use input was not an object: {other}"
                            );
                            Map::new()
                        }
                    };
                    tool_calls.push(ToolCall::new(Some(id), name, arguments));
                }
                ContentBlock::ToolResult { .. } => {
                    tracing::warn!("unexpected tool_result block in model response, ignoring");
                }
            }
        }

        if tool_calls.is_empty() {
            Message::assistant(content)
        } else {
            Message::assistant_with_calls(content, tool_calls)
        }
    }

    fn to_wire_tools(tools: &[ToolSchema]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|schema| ApiTool {
                name: schema.name.clone(),
                description: schema.description.clone(),
                input_schema: schema.parameters_json_schema(),
            })
            .collect()
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        let (system, turns) = Self::to_wire_history(messages);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: turns,
            tools: Self::to_wire_tools(tools),
        };

        let response = self
            .client
            .post(format!("{ANTHROPIC_BASE_URL}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "anthropic returned {status}: {body}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response body: {e}")))?;

        Ok(Self::from_wire_response(parsed.content))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        tracing::info!(provider = "anthropic", model = %self.model, "calling messages API");
        with_backoff(&self.retry, "anthropic", || self.invoke(messages, tools)).await
    }
}
