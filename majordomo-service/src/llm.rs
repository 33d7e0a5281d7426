//! Chat model clients.
//!
//! Every provider is normalized to one request shape ([`ChatRequest`]) and one
//! response shape ([`ModelTurn`]), so provider quirks stop at this module.

mod ollama;
mod openai_compat;
mod router;

pub use ollama::OllamaClient;
pub use openai_compat::OpenAiCompatClient;
pub use router::{ModelRouter, OPENAI_COMPAT_PROVIDER};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::LlmError;
use crate::tools::{RawArguments, ToolDefinition};

/// Buffered stream events per response
pub(crate) const STREAM_BUFFER: usize = 64;

/// A capability invocation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Correlates the result message with this request
    pub call_id: String,
    pub capability_name: String,
    pub raw_arguments: RawArguments,
}

/// Message in a provider-neutral conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Calls requested by an assistant message
    pub tool_calls: Vec<InvocationRequest>,
    /// Set on tool result messages
    pub tool_call_id: Option<String>,
    /// Capability name on tool result messages
    pub name: Option<String>,
}

impl ChatMessage {
    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content)
    }

    /// Assistant message carrying the calls it requested
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<InvocationRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::with_role("assistant", content)
        }
    }

    /// Result of one invocation, correlated by call id
    pub fn tool(call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
            ..Self::with_role("tool", content)
        }
    }
}

/// One chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model selector; may carry a `<provider>/` prefix until routed
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// `None` means tool use is not permitted
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// What the model produced for a non-streamed request
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// Direct text answer
    Answer(String),
    /// The model asked for one or more invocations
    Invocations {
        content: String,
        calls: Vec<InvocationRequest>,
    },
}

/// Incremental output of a streamed request
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Content(String),
    Done,
    Error(String),
}

/// A capability-aware chat primitive
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One-shot completion
    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError>;

    /// Streamed completion; the receiver ends after `Done` or `Error`
    async fn stream(&self, request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, LlmError>;
}

/// Split a byte buffer into complete lines, leaving any partial tail in place
pub(crate) fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(idx) = buffer.iter().position(|&b| b == b'\n') {
        let line_bytes: Vec<u8> = buffer.drain(..=idx).collect();
        let line = String::from_utf8_lossy(&line_bytes).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_lines_keeps_partial_tail() {
        let mut buffer = b"data: one\n\ndata: tw".to_vec();
        assert_eq!(drain_lines(&mut buffer), vec!["data: one".to_string()]);
        assert_eq!(buffer, b"data: tw".to_vec());

        buffer.extend_from_slice(b"o\n");
        assert_eq!(drain_lines(&mut buffer), vec!["data: two".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_tool_message_correlates_call() {
        let msg = ChatMessage::tool("call_1", "get_weather", "Sunny");
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("get_weather"));
    }
}
