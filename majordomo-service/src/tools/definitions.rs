//! Tool definitions in the OpenAI-style function calling format.
//!
//! Both the OpenAI-compatible and Ollama chat APIs accept this shape.

use serde::{Deserialize, Serialize};

use super::CapabilityDescriptor;

/// Tool definition for the `tools` array of a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&CapabilityDescriptor> for ToolDefinition {
    fn from(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.parameters.clone(),
            },
        }
    }
}
