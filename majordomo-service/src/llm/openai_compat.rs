//! OpenAI-compatible `/chat/completions` client (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    ChatMessage, ChatModel, ChatRequest, InvocationRequest, ModelTurn, STREAM_BUFFER, StreamEvent,
    drain_lines,
};
use crate::config::OpenAiCompatConfig;
use crate::error::LlmError;
use crate::tools::{RawArguments, ToolDefinition};

/// Client for any endpoint speaking the OpenAI chat completions protocol
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection {
                url: config.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post(&self, body: &WireRequest<'_>) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).json(body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| LlmError::Connection {
            url: url.clone(),
            source: e,
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &text, body.model));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
        let body = WireRequest::new(&request, false);
        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            tool_count = request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion"
        );

        let response = self.post(&body).await?;
        let completion: WireCompletion =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: e.to_string(),
                })?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "completion has no choices".to_string(),
            })?;

        Ok(message.into_turn())
    }

    async fn stream(&self, request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, LlmError> {
        let body = WireRequest::new(&request, true);
        let response = self.post(&body).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                for line in drain_lines(&mut buffer) {
                    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                        continue;
                    };
                    if data == "[DONE]" {
                        let _ = tx.send(StreamEvent::Done).await;
                        return;
                    }
                    match serde_json::from_str::<WireChunk>(data) {
                        Ok(parsed) => {
                            for choice in parsed.choices {
                                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty())
                                    && tx.send(StreamEvent::Content(text)).await.is_err()
                                {
                                    return;
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "Skipping unparseable stream chunk"),
                    }
                }
            }

            // Body ended without the [DONE] sentinel
            let _ = tx.send(StreamEvent::Done).await;
        });

        Ok(rx)
    }
}

/// Map a non-success response to the matching error.
///
/// Groq reports a model's malformed tool call as a 400 with
/// `code = "tool_use_failed"` and the raw text in `failed_generation`.
fn classify_error(status: u16, body: &str, model: &str) -> LlmError {
    let envelope = serde_json::from_str::<WireErrorEnvelope>(body).ok();
    let detail = envelope.map(|e| e.error);

    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| body.to_string());

    if let Some(detail) = &detail
        && (detail.code.as_deref() == Some("tool_use_failed") || detail.failed_generation.is_some())
    {
        return LlmError::ToolSyntax {
            failed_generation: detail.failed_generation.clone().unwrap_or_default(),
            message,
        };
    }

    if status == 400 && message.contains("model output must contain") {
        return LlmError::ToolSyntax {
            failed_generation: String::new(),
            message,
        };
    }

    if status == 404 && message.contains("model") {
        return LlmError::ModelNotFound {
            model: model.to_string(),
        };
    }

    LlmError::Generation { status, message }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

impl<'a> WireRequest<'a> {
    fn new(request: &'a ChatRequest, stream: bool) -> Self {
        let tools = request.tools.as_deref().filter(|t| !t.is_empty());
        Self {
            model: &request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools,
            tool_choice: tools.map(|_| "auto"),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.iter().map(WireToolCall::from).collect(),
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

impl From<&InvocationRequest> for WireToolCall {
    fn from(call: &InvocationRequest) -> Self {
        let arguments = match &call.raw_arguments {
            RawArguments::Text(text) => text.clone(),
            RawArguments::Structured(value) => value.to_string(),
        };
        Self {
            id: call.call_id.clone(),
            call_type: function_type(),
            function: WireFunctionCall {
                name: call.capability_name.clone(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCompletion {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireResponseMessage {
    fn into_turn(self) -> ModelTurn {
        let content = self.content.unwrap_or_default();
        match self.tool_calls {
            Some(calls) if !calls.is_empty() => ModelTurn::Invocations {
                content,
                calls: calls
                    .into_iter()
                    .map(|c| InvocationRequest {
                        call_id: c.id,
                        capability_name: c.function.name,
                        raw_arguments: RawArguments::Text(c.function.arguments),
                    })
                    .collect(),
            },
            _ => ModelTurn::Answer(content),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    #[serde(default)]
    choices: Vec<WireChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChunkChoice {
    #[serde(default)]
    delta: WireDelta,
}

#[derive(Debug, Default, Deserialize)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    failed_generation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_use_failed_becomes_tool_syntax() {
        let body = json!({
            "error": {
                "message": "Failed to call a function. Please adjust your prompt.",
                "type": "invalid_request_error",
                "code": "tool_use_failed",
                "failed_generation": "<function=list_tasks>{}</function>"
            }
        })
        .to_string();

        match classify_error(400, &body, "openai/gpt-oss-20b") {
            LlmError::ToolSyntax {
                failed_generation, ..
            } => assert_eq!(failed_generation, "<function=list_tasks>{}</function>"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_tool_output_is_tool_syntax() {
        let body = json!({"error": {"message": "model output must contain either output text or tool calls"}})
            .to_string();
        assert!(matches!(
            classify_error(400, &body, "m"),
            LlmError::ToolSyntax { .. }
        ));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = classify_error(401, r#"{"error":{"message":"Invalid API Key"}}"#, "m");
        match err {
            LlmError::Generation { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            classify_error(404, "The model `nope` does not exist", "nope"),
            LlmError::ModelNotFound { .. }
        ));
    }

    #[test]
    fn test_tool_calls_become_invocations() {
        let message: WireResponseMessage = serde_json::from_value(json!({
            "content": null,
            "tool_calls": [{
                "id": "call_9",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"city\":\"Pune\"}"}
            }]
        }))
        .unwrap();

        match message.into_turn() {
            ModelTurn::Invocations { content, calls } => {
                assert!(content.is_empty());
                assert_eq!(calls[0].call_id, "call_9");
                assert_eq!(calls[0].capability_name, "get_weather");
                assert_eq!(
                    calls[0].raw_arguments,
                    RawArguments::Text(r#"{"city":"Pune"}"#.to_string())
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_request_binds_tools_with_auto_choice() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant".to_string(),
            messages: vec![ChatMessage::user("hi")],
            tools: Some(vec![ToolDefinition::from(
                &crate::tools::registry::REGISTRY.descriptors()[0],
            )]),
            temperature: Some(0.3),
            max_tokens: Some(350),
        };
        let wire = serde_json::to_value(WireRequest::new(&request, false)).unwrap();
        assert_eq!(wire["tool_choice"], "auto");
        assert_eq!(wire["tools"][0]["type"], "function");

        let no_tools = ChatRequest {
            tools: None,
            ..request
        };
        let wire = serde_json::to_value(WireRequest::new(&no_tools, true)).unwrap();
        assert!(wire.get("tools").is_none());
        assert!(wire.get("tool_choice").is_none());
        assert_eq!(wire["stream"], true);
    }
}
