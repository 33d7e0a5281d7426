//! Note-taking tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [take_notes(), get_notes()];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn take_notes() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::TakeNotes,
        category: Category::Notes,
        description: "Saves a note for the user. Use this when the user asks to remember something or take a note.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Note title" },
                    "content": { "type": "string", "description": "Note content" }
                },
                "required": ["content"]
            })
        },
    }
}

fn get_notes() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetNotes,
        category: Category::Notes,
        description: "Retrieves recent notes",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "description": "Number of notes to retrieve, default 10" }
                }
            })
        },
    }
}
