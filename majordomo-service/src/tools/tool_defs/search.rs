//! Web search tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [web_search(), get_news()];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn web_search() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::WebSearch,
        category: Category::Search,
        description: "Searches the web for information",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            })
        },
    }
}

fn get_news() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetNews,
        category: Category::Search,
        description: "Gets latest news on a topic",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic": { "type": "string", "description": "News topic, default 'technology'" }
                }
            })
        },
    }
}
