// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request, response and streaming chunk types

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default token budget for a generation
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// Transaction hash reported for generations settled off the inference chain
pub const EXTERNAL_TRANSACTION_HASH: &str = "external";

/// How a paid request is settled on chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    /// Record input and output hashes only
    Private,
    /// Aggregate many requests into one batch hash
    #[default]
    Batch,
    /// Record the full request, response and metadata
    Individual,
}

impl SettlementMode {
    /// Value sent in the `X-SETTLEMENT-TYPE` header
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Batch => "batch",
            Self::Individual => "individual",
        }
    }
}

impl fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "batch" => Ok(Self::Batch),
            "individual" => Ok(Self::Individual),
            other => Err(format!("unknown settlement mode '{other}'")),
        }
    }
}

/// One message of a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role: `system`, `user`, `assistant` or `tool`
    pub role: String,
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    /// Call this tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Message with the given role and text
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// System prompt
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Tool result answering `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new("tool", content)
        }
    }
}

/// Requested output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// `json_object` or `json_schema`
    #[serde(rename = "type")]
    pub format_type: String,
    /// Schema for `json_schema` output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
}

impl ResponseFormat {
    /// Any valid JSON object
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
            json_schema: None,
        }
    }

    /// JSON matching `schema`
    pub fn json_schema(schema: Value) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: Some(schema),
        }
    }
}

/// Model identifier as sent on the wire
///
/// Identifiers of the form `provider/model` are sent without the provider.
pub fn wire_model_name(model: &str) -> &str {
    model.split_once('/').map_or(model, |(_, name)| name)
}

/// Chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier, optionally prefixed with `provider/`
    pub model: String,
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Stop sequences
    pub stop: Vec<String>,
    /// Tool definitions for function calling
    pub tools: Vec<Value>,
    /// Tool selection, `auto` when tools are given without one
    pub tool_choice: Option<String>,
    /// Output format
    pub response_format: Option<ResponseFormat>,
    /// Settlement mode for the payment, the client default when unset
    pub settlement_mode: Option<SettlementMode>,
}

impl ChatRequest {
    /// Chat request with default generation parameters
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            stop: Vec::new(),
            tools: Vec::new(),
            tool_choice: None,
            response_format: None,
            settlement_mode: None,
        }
    }

    /// Set the token budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the stop sequences
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Offer tools to the model
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Value>, tool_choice: Option<String>) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    /// Request a specific output format
    #[must_use]
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }

    /// Choose how the request is settled
    #[must_use]
    pub fn with_settlement_mode(mut self, settlement_mode: SettlementMode) -> Self {
        self.settlement_mode = Some(settlement_mode);
        self
    }

    pub(crate) fn payload(&self, stream: bool) -> ChatPayload<'_> {
        let has_tools = !self.tools.is_empty();
        ChatPayload {
            model: wire_model_name(&self.model),
            messages: &self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: (!self.stop.is_empty()).then_some(self.stop.as_slice()),
            tools: has_tools.then_some(self.tools.as_slice()),
            tool_choice: has_tools.then(|| self.tool_choice.as_deref().unwrap_or("auto")),
            response_format: self.response_format.as_ref(),
            stream: stream.then_some(true),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Plain text completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier, optionally prefixed with `provider/`
    pub model: String,
    /// Prompt to complete
    pub prompt: String,
    /// Token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Stop sequences
    pub stop: Vec<String>,
    /// Output format
    pub response_format: Option<ResponseFormat>,
    /// Settlement mode for the payment, the client default when unset
    pub settlement_mode: Option<SettlementMode>,
}

impl CompletionRequest {
    /// Completion request with default generation parameters
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            stop: Vec::new(),
            response_format: None,
            settlement_mode: None,
        }
    }

    /// Set the token budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the stop sequences
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Request a specific output format
    #[must_use]
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }

    /// Choose how the request is settled
    #[must_use]
    pub fn with_settlement_mode(mut self, settlement_mode: SettlementMode) -> Self {
        self.settlement_mode = Some(settlement_mode);
        self
    }

    pub(crate) fn payload(&self) -> CompletionPayload<'_> {
        CompletionPayload {
            model: wire_model_name(&self.model),
            prompt: &self.prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: (!self.stop.is_empty()).then_some(self.stop.as_slice()),
            response_format: self.response_format.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a ResponseFormat>,
}

/// Result of a non-streaming generation
#[derive(Debug, Clone, PartialEq)]
pub struct TextGenerationOutput {
    /// Settlement transaction, `external` for off-chain providers
    pub transaction_hash: String,
    /// Why generation stopped (chat only)
    pub finish_reason: Option<String>,
    /// Assistant message (chat only)
    pub chat_output: Option<ChatMessage>,
    /// Completed text (completion only)
    pub completion_output: Option<String>,
    /// Payment processing hash from the `x-processing-hash` header
    pub payment_hash: Option<String>,
}

/// Token accounting reported at the end of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens generated
    pub completion_tokens: u32,
    /// Sum of both
    pub total_tokens: u32,
}

/// Incremental function call fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDelta {
    /// Function name, usually only on the first fragment
    #[serde(default)]
    pub name: Option<String>,
    /// Fragment of the JSON arguments
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Incremental tool call fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Position of the call among the tool calls of the message
    #[serde(default)]
    pub index: u32,
    /// Call identifier, usually only on the first fragment
    #[serde(default)]
    pub id: Option<String>,
    /// Call type, `function`
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    /// Function fragment
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

/// What a choice adds in one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDelta {
    /// Role, usually only on the first chunk
    #[serde(default)]
    pub role: Option<String>,
    /// Text fragment
    #[serde(default)]
    pub content: Option<String>,
    /// Tool call fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallDelta>,
}

/// One choice within a chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental content
    #[serde(default)]
    pub delta: StreamDelta,
    /// Set on the last chunk of the choice
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One parsed frame of a chat stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Completion identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model that produced the chunk
    #[serde(default)]
    pub model: String,
    /// Choices carried by this chunk
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Token accounting, on the trailing frame
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Whether a choice carries a finish reason; accounting-only frames may
    /// still follow
    #[serde(default)]
    pub is_final: bool,
}

impl StreamChunk {
    /// Build a chunk from the JSON payload of one `data:` frame
    pub fn from_sse_data(data: Value) -> Result<Self, serde_json::Error> {
        let mut chunk: Self = serde_json::from_value(data)?;
        chunk.is_final = chunk
            .choices
            .iter()
            .any(|choice| choice.finish_reason.is_some());
        Ok(chunk)
    }

    /// Text carried by the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chunk_with_content_is_not_final() {
        let chunk = StreamChunk::from_sse_data(json!({
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {"content": "Hello"}, "finish_reason": null}]
        }))
        .unwrap();

        assert_eq!(chunk.model, "gpt-4o");
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.content(), Some("Hello"));
        assert!(!chunk.is_final);
    }

    #[test]
    fn finish_reason_marks_final() {
        let chunk = StreamChunk::from_sse_data(json!({
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();

        assert!(chunk.is_final);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn usage_alone_is_not_final() {
        let chunk = StreamChunk::from_sse_data(json!({
            "model": "gpt-4o",
            "choices": [],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        }))
        .unwrap();

        let usage = chunk.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.total_tokens, 30);
        assert!(!chunk.is_final);

        let chunk = StreamChunk::from_sse_data(json!({
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {"content": "Hi"}, "finish_reason": null}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
        }))
        .unwrap();
        assert!(!chunk.is_final);
    }

    #[test]
    fn tool_call_fragments_parse() {
        let chunk = StreamChunk::from_sse_data(json!({
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {"tool_calls": [{
                "index": 0,
                "id": "call_1",
                "type": "function",
                "function": {"name": "get_price", "arguments": "{\"sym"}
            }]}}]
        }))
        .unwrap();

        let call = &chunk.choices[0].delta.tool_calls[0];
        assert_eq!(call.id.as_deref(), Some("call_1"));
        assert_eq!(call.call_type.as_deref(), Some("function"));
        let function = call.function.as_ref().unwrap();
        assert_eq!(function.name.as_deref(), Some("get_price"));
        assert_eq!(function.arguments.as_deref(), Some("{\"sym"));
    }

    #[test]
    fn settlement_modes_use_wire_values() {
        assert_eq!(SettlementMode::default(), SettlementMode::Batch);
        assert_eq!(SettlementMode::Private.to_string(), "private");
        assert_eq!(SettlementMode::Individual.as_str(), "individual");
        assert_eq!("BATCH".parse::<SettlementMode>().unwrap(), SettlementMode::Batch);
        assert!("settle".parse::<SettlementMode>().is_err());
        assert_eq!(json!(SettlementMode::Private), json!("private"));
    }

    #[test]
    fn chat_payload_applies_defaults() {
        let request = ChatRequest::new("openai/gpt-4o", vec![ChatMessage::user("hi")]);
        let payload = serde_json::to_value(request.payload(false)).unwrap();

        assert_eq!(
            payload,
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 100,
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn tools_default_to_auto_choice() {
        let request = ChatRequest::new("gpt-4o", vec![ChatMessage::user("price?")])
            .with_tools(vec![json!({"type": "function", "function": {"name": "get_price"}})], None)
            .with_stop(vec!["\n".to_string()])
            .with_response_format(ResponseFormat::json_object());
        let payload = serde_json::to_value(request.payload(true)).unwrap();

        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["stop"], json!(["\n"]));
        assert_eq!(payload["response_format"], json!({"type": "json_object"}));
        assert_eq!(payload["stream"], true);
    }

    #[test]
    fn completion_payload_strips_provider() {
        let request = CompletionRequest::new("anthropic/claude-3.5-haiku", "Once upon");
        let payload = serde_json::to_value(request.payload()).unwrap();

        assert_eq!(payload["model"], "claude-3.5-haiku");
        assert_eq!(payload["prompt"], "Once upon");
        assert!(payload.get("stop").is_none());
    }
}
