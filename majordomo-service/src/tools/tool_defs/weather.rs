//! Weather tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [get_weather(), get_forecast()];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn city_only() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "city": { "type": "string", "description": "City name, default Mumbai" }
        }
    })
}

fn get_weather() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetWeather,
        category: Category::Weather,
        description: "Gets current weather for a city",
        parameters: city_only,
    }
}

fn get_forecast() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetForecast,
        category: Category::Weather,
        description: "Gets 3-day weather forecast for a city",
        parameters: city_only,
    }
}
