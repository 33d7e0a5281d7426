//! Per-turn request and result types for the conversation loop.
//!
//! Nothing here outlives a turn; durable chat history belongs to the caller.

use serde::{Deserialize, Serialize};

/// One prior message supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Knobs the caller may set per turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSettings {
    /// Bind the capability catalog to the first model call
    #[serde(default = "default_true")]
    pub tools_enabled: bool,

    /// Include capabilities from connected remote providers
    #[serde(default = "default_true")]
    pub mcp_enabled: bool,

    /// Model selector, optionally `<provider>/<model>`
    #[serde(default)]
    pub model: Option<String>,

    /// When false only the latest message is sent
    #[serde(default = "default_true")]
    pub memory_enabled: bool,

    /// Free-text addendum to the system prompt
    #[serde(default)]
    pub custom_instructions: Option<String>,

    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            tools_enabled: true,
            mcp_enabled: true,
            model: None,
            memory_enabled: true,
            custom_instructions: None,
            max_output_tokens: None,
        }
    }
}

/// Everything needed to answer one user turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub settings: TurnSettings,
}

impl TurnRequest {
    /// Content of the most recent user message
    pub fn latest_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Streamed output of a turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ChatEvent {
    Text(String),
    Error(String),
    Done,
}

/// Outcome of one dispatched invocation
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub call_id: String,
    pub capability_name: String,
    pub payload: String,
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_default_when_omitted() {
        let request: TurnRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert!(request.settings.tools_enabled);
        assert!(request.settings.mcp_enabled);
        assert!(request.settings.memory_enabled);
        assert!(request.settings.model.is_none());
        assert_eq!(request.latest_user_text(), "hi");
    }

    #[test]
    fn test_chat_event_wire_shape() {
        assert_eq!(
            serde_json::to_value(ChatEvent::Text("Hel".to_string())).unwrap(),
            json!({"type": "text", "content": "Hel"})
        );
        assert_eq!(
            serde_json::to_value(ChatEvent::Done).unwrap(),
            json!({"type": "done"})
        );
    }
}
