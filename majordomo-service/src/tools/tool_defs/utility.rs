//! Utility tool definitions (math, time, conversions).

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [
        calculate(),
        get_time_now(),
        convert_currency(),
        convert_units(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn calculate() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::Calculate,
        category: Category::Utilities,
        description: "Evaluates a mathematical expression",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": { "type": "string", "description": "Math expression like '2 + 2' or '10 * (5 - 3)'" }
                },
                "required": ["expression"]
            })
        },
    }
}

fn get_time_now() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetTimeNow,
        category: Category::Utilities,
        description: "Returns the current time and date in the user's timezone",
        parameters: || serde_json::json!({ "type": "object", "properties": {} }),
    }
}

fn convert_currency() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::ConvertCurrency,
        category: Category::Utilities,
        description: "Converts currency from one type to another",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "amount": { "type": "number", "description": "Amount to convert" },
                    "from_currency": { "type": "string", "description": "Source currency code (USD, EUR, INR, etc.)" },
                    "to_currency": { "type": "string", "description": "Target currency code" }
                },
                "required": ["amount", "from_currency", "to_currency"]
            })
        },
    }
}

fn convert_units() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::ConvertUnits,
        category: Category::Utilities,
        description: "Converts units (length, weight, temperature)",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "value": { "type": "number", "description": "Value to convert" },
                    "from_unit": { "type": "string", "description": "Source unit (m, km, ft, mi, kg, lb, g, oz, c, f)" },
                    "to_unit": { "type": "string", "description": "Target unit" }
                },
                "required": ["value", "from_unit", "to_unit"]
            })
        },
    }
}
