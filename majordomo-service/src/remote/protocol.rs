//! JSON-RPC 2.0 envelopes for remote capability providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

pub const METHOD_LIST_TOOLS: &str = "tools/list";
pub const METHOD_CALL_TOOL: &str = "tools/call";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn list_tools(id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: METHOD_LIST_TOOLS,
            params: serde_json::json!({}),
        }
    }

    pub fn call_tool(id: u64, name: &str, arguments: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: METHOD_CALL_TOOL,
            params: serde_json::json!({ "name": name, "arguments": arguments }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl JsonRpcResponse {
    /// The `result` member, or the protocol error the provider reported
    pub fn into_result(self) -> Result<Value, TransportError> {
        if let Some(error) = self.error {
            let message = if error.message.is_empty() {
                "Unknown error".to_string()
            } else {
                error.message
            };
            return Err(TransportError::Protocol {
                code: error.code,
                message,
            });
        }
        self.result.ok_or_else(|| TransportError::Malformed {
            message: "response has neither result nor error".to_string(),
        })
    }
}

/// A capability as a provider describes it in `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", alias = "input_schema", default)]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<RemoteTool>,
}

/// Decode a response body that is either plain JSON or an SSE stream.
///
/// Streamable-HTTP providers answer with `text/event-stream`; the JSON-RPC
/// response is the last `data:` event.
pub fn parse_body(content_type: &str, body: &str) -> Result<JsonRpcResponse, TransportError> {
    let trimmed = body.trim_start();
    let is_sse = content_type.contains("text/event-stream")
        || trimmed.starts_with("event:")
        || trimmed.starts_with("data:");

    let json = if is_sse {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .rfind(|data| !data.is_empty())
            .ok_or_else(|| TransportError::Malformed {
                message: "event stream carried no data".to_string(),
            })?
    } else {
        body
    };

    serde_json::from_str(json).map_err(|e| TransportError::Malformed {
        message: e.to_string(),
    })
}

/// Text of a `tools/call` result.
///
/// Text items of `content` are joined by newlines; with no text items the
/// content array is serialized, and with no content the whole result is.
pub fn extract_text(result: &Value) -> String {
    match result.get("content").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => {
            let texts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect();
            if texts.is_empty() {
                Value::Array(items.clone()).to_string()
            } else {
                texts.join("\n")
            }
        }
        _ => result.to_string(),
    }
}

/// Whether a `tools/call` result reports a failed invocation
pub fn is_error_result(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_tool_envelope() {
        let request = JsonRpcRequest::call_tool(7, "get_holdings", json!({"limit": 3}));
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["method"], "tools/call");
        assert_eq!(wire["params"]["name"], "get_holdings");
        assert_eq!(wire["params"]["arguments"]["limit"], 3);
    }

    #[test]
    fn test_parse_sse_takes_last_data_event() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":0,\"result\":{}}\n\n\
                    event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"tools\":[]}}\n\n";
        let response = parse_body("text/event-stream", body).unwrap();
        assert_eq!(response.id, Some(json!(1)));
    }

    #[test]
    fn test_protocol_error_surfaces() {
        let response =
            parse_body("application/json", r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#)
                .unwrap();
        match response.into_result() {
            Err(TransportError::Protocol { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_body("application/json", "<html>bad gateway</html>"),
            Err(TransportError::Malformed { .. })
        ));
    }

    #[test]
    fn test_extract_text_variants() {
        let joined = json!({"content": [
            {"type": "text", "text": "line one"},
            {"type": "image", "data": "..."},
            {"type": "text", "text": "line two"}
        ]});
        assert_eq!(extract_text(&joined), "line one\nline two");

        let no_text = json!({"content": [{"type": "image", "data": "abc"}]});
        assert_eq!(extract_text(&no_text), r#"[{"data":"abc","type":"image"}]"#);

        let bare = json!({"holdings": []});
        assert_eq!(extract_text(&bare), r#"{"holdings":[]}"#);
    }

    #[test]
    fn test_tool_schema_alias() {
        let tool: RemoteTool = serde_json::from_value(json!({
            "name": "get_quote",
            "input_schema": {"type": "object"}
        }))
        .unwrap();
        assert_eq!(tool.input_schema, Some(json!({"type": "object"})));
        assert!(tool.description.is_none());
    }
}
