use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    ChatMessage, ChatModel, ChatRequest, InvocationRequest, ModelTurn, STREAM_BUFFER, StreamEvent,
    drain_lines,
};
use crate::config::OllamaConfig;
use crate::error::LlmError;
use crate::tools::{RawArguments, ToolDefinition};

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
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
        })
    }

    async fn post(&self, request: &OllamaChatRequest<'_>) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();

            if message.contains("model") && message.contains("not found") {
                return Err(LlmError::ModelNotFound {
                    model: request.model.to_string(),
                });
            }

            return Err(LlmError::Generation { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
        let body = OllamaChatRequest::new(&request, false);
        debug!(model = %request.model, message_count = request.messages.len(), "Sending Ollama chat");

        let response = self.post(&body).await?;
        let chat_response: OllamaChatResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: e.to_string(),
                })?;

        Ok(chat_response.message.into_turn())
    }

    async fn stream(&self, request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, LlmError> {
        let body = OllamaChatRequest::new(&request, true);
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

                // One JSON object per line
                for line in drain_lines(&mut buffer) {
                    let parsed: OllamaChatResponse = match serde_json::from_str(&line) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(error = %e, "Skipping unparseable Ollama stream line");
                            continue;
                        }
                    };
                    if !parsed.message.content.is_empty()
                        && tx
                            .send(StreamEvent::Content(parsed.message.content))
                            .await
                            .is_err()
                    {
                        return;
                    }
                    if parsed.done {
                        let _ = tx.send(StreamEvent::Done).await;
                        return;
                    }
                }
            }

            let _ = tx.send(StreamEvent::Done).await;
        });

        Ok(rx)
    }
}

// Internal Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessageOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

impl<'a> OllamaChatRequest<'a> {
    fn new(request: &'a ChatRequest, stream: bool) -> Self {
        let options = (request.temperature.is_some() || request.max_tokens.is_some()).then(|| {
            OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            }
        });

        Self {
            model: &request.model,
            messages: request.messages.iter().map(OllamaMessageOut::from).collect(),
            tools: request.tools.as_deref().filter(|t| !t.is_empty()),
            stream,
            options,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaMessageOut {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl From<&ChatMessage> for OllamaMessageOut {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: call.capability_name.clone(),
                        arguments: match &call.raw_arguments {
                            RawArguments::Structured(value) => value.clone(),
                            RawArguments::Text(text) => serde_json::from_str(text)
                                .unwrap_or_else(|_| serde_json::json!({})),
                        },
                    },
                })
                .collect(),
            tool_name: msg.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    /// Ollama sends arguments as an object, not a string
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

impl OllamaMessage {
    fn into_turn(self) -> ModelTurn {
        if self.tool_calls.is_empty() {
            return ModelTurn::Answer(self.content);
        }

        // Ollama does not assign call ids
        let calls = self
            .tool_calls
            .into_iter()
            .map(|tc| InvocationRequest {
                call_id: format!("call_{}", Uuid::new_v4().simple()),
                capability_name: tc.function.name,
                raw_arguments: RawArguments::Structured(tc.function.arguments),
            })
            .collect();

        ModelTurn::Invocations {
            content: self.content,
            calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_tool_calls_get_ids() {
        let response: OllamaChatResponse = serde_json::from_value(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "get_weather", "arguments": {"city": "Pune"}}},
                    {"function": {"name": "get_notes", "arguments": {}}}
                ]
            },
            "done": true
        }))
        .unwrap();

        match response.message.into_turn() {
            ModelTurn::Invocations { calls, .. } => {
                assert_eq!(calls.len(), 2);
                assert_ne!(calls[0].call_id, calls[1].call_id);
                assert_eq!(
                    calls[0].raw_arguments,
                    RawArguments::Structured(json!({"city": "Pune"}))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_answer() {
        let response: OllamaChatResponse =
            serde_json::from_value(json!({"message": {"content": "Hello!"}, "done": true}))
                .unwrap();
        assert_eq!(
            response.message.into_turn(),
            ModelTurn::Answer("Hello!".to_string())
        );
    }

    #[test]
    fn test_text_arguments_sent_as_object() {
        let msg = ChatMessage::assistant_with_calls(
            "",
            vec![InvocationRequest {
                call_id: "c1".to_string(),
                capability_name: "take_notes".to_string(),
                raw_arguments: RawArguments::Text(r#"{"content":"milk"}"#.to_string()),
            }],
        );
        let wire = serde_json::to_value(OllamaMessageOut::from(&msg)).unwrap();
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"]["content"], "milk");
    }
}
