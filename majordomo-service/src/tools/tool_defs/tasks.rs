//! Task list tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [
        create_task(),
        list_tasks(),
        complete_task(),
        update_task(),
        delete_task(),
        search_tasks(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn create_task() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::CreateTask,
        category: Category::Tasks,
        description: "Creates a new task in the user's to-do list. Use when the user wants to add, create, or make a new task.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "The task title" },
                    "due_date": { "type": "string", "description": "Optional due date in YYYY-MM-DD format" },
                    "notes": { "type": "string", "description": "Optional task notes" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                },
                "required": ["title"]
            })
        },
    }
}

fn list_tasks() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::ListTasks,
        category: Category::Tasks,
        description: "Lists all uncompleted tasks. Use when the user asks 'what are my tasks', 'show my tasks', 'pending tasks', or 'to-do list'.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "description": "Optional limit" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                }
            })
        },
    }
}

fn complete_task() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::CompleteTask,
        category: Category::Tasks,
        description: "Marks a task as completed",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "ID of the task to complete" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                },
                "required": ["task_id"]
            })
        },
    }
}

fn update_task() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::UpdateTask,
        category: Category::Tasks,
        description: "Updates an existing task's title, notes or due date",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "ID of the task" },
                    "title": { "type": "string", "description": "New title (optional)" },
                    "due_date": { "type": "string", "description": "New due date in YYYY-MM-DD format (optional)" },
                    "notes": { "type": "string", "description": "New notes (optional)" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                },
                "required": ["task_id"]
            })
        },
    }
}

fn delete_task() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::DeleteTask,
        category: Category::Tasks,
        description: "Deletes a task permanently",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "ID of the task to delete" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                },
                "required": ["task_id"]
            })
        },
    }
}

fn search_tasks() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::SearchTasks,
        category: Category::Tasks,
        description: "Searches tasks by title keyword",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search keyword" },
                    "task_list_id": { "type": "string", "description": "Optional task list id (default @default)" }
                },
                "required": ["query"]
            })
        },
    }
}
