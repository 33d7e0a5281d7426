//! Capability types shared by built-in and remote tools.
//!
//! This module contains:
//! - The capability descriptor handed to the model
//! - Raw and parsed argument types
//! - The `Capability` trait every built-in handler implements
//! - Submodules for built-in tool metadata and the pure/HTTP helpers behind them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CapabilityError;

pub mod calculator;
pub mod conversions;
pub mod definitions;
pub mod registry;
mod tool_defs;
pub mod weather;
pub mod web_search;

pub use definitions::ToolDefinition;

/// Name, description and JSON Schema of one callable capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl CapabilityDescriptor {
    /// Schema used when a provider does not publish one
    pub fn empty_parameters() -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
}

/// Arguments as the model supplied them
#[derive(Debug, Clone, PartialEq)]
pub enum RawArguments {
    /// JSON-encoded text (OpenAI-style tool calls)
    Text(String),
    /// Already-decoded JSON (Ollama-style tool calls, recovered calls)
    Structured(Value),
}

impl RawArguments {
    /// Decode into an argument map. Empty text and `null` mean "no arguments".
    pub fn parse(&self) -> Result<Arguments, String> {
        let value = match self {
            RawArguments::Text(text) if text.trim().is_empty() => return Ok(Arguments::default()),
            RawArguments::Text(text) => {
                serde_json::from_str::<Value>(text).map_err(|e| format!("not valid JSON: {}", e))?
            }
            RawArguments::Structured(value) => value.clone(),
        };

        match value {
            Value::Object(map) => Ok(Arguments(map)),
            Value::Null => Ok(Arguments::default()),
            other => Err(format!("expected a JSON object, got {}", json_type(&other))),
        }
    }

    /// Short form for logs
    pub fn preview(&self, max_chars: usize) -> String {
        let full = match self {
            RawArguments::Text(text) => text.clone(),
            RawArguments::Structured(value) => value.to_string(),
        };
        truncate(&full, max_chars)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Truncate on a character boundary, marking the cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Parsed argument map with typed accessors.
///
/// Models are loose with types, so numeric accessors also accept numeric strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(pub Map<String, Value>);

impl Arguments {
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn required_str(&self, key: &str) -> Result<&str, CapabilityError> {
        self.str(key)
            .ok_or_else(|| CapabilityError::argument(format!("'{}' is required", key)))
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn required_f64(&self, key: &str) -> Result<f64, CapabilityError> {
        match self.0.get(key) {
            None | Some(Value::Null) => {
                Err(CapabilityError::argument(format!("'{}' is required", key)))
            }
            Some(_) => self
                .f64(key)
                .ok_or_else(|| CapabilityError::argument(format!("'{}' must be a number", key))),
        }
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.f64(key).filter(|v| *v >= 0.0).map(|v| v as u64)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// What a capability produced
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Text(String),
    Json(Value),
}

impl CapabilityOutput {
    /// Normalize to the string payload handed back to the model
    pub fn into_payload(self) -> String {
        match self {
            CapabilityOutput::Text(text) => text,
            CapabilityOutput::Json(value) => value.to_string(),
        }
    }
}

/// A single callable capability
#[async_trait]
pub trait Capability: Send + Sync {
    fn descriptor(&self) -> CapabilityDescriptor;

    async fn invoke(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError>;
}
