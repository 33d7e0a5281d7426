//! Email tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [
        get_unread_emails_summary(),
        summarize_emails(),
        daily_digest(),
        send_email(),
        search_emails(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn limit_only(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "limit": { "type": "integer", "description": description }
        }
    })
}

fn get_unread_emails_summary() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetUnreadEmailsSummary,
        category: Category::Email,
        description: "Gets a summary of recent unread emails",
        parameters: || limit_only("Optional limit"),
    }
}

fn summarize_emails() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::SummarizeEmails,
        category: Category::Email,
        description: "Summarizes recent unread emails with optional limit",
        parameters: || limit_only("Max emails to summarize (default 5)"),
    }
}

fn daily_digest() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::DailyDigest,
        category: Category::Email,
        description: "Creates a quick daily digest of tasks, calendar, and unread email count",
        parameters: || serde_json::json!({ "type": "object", "properties": {} }),
    }
}

fn send_email() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::SendEmail,
        category: Category::Email,
        description: "Sends an email. If you only have a name (e.g., 'Alice'), use get_email_address first to find their email.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "to_email": { "type": "string", "description": "Recipient email address" },
                    "subject": { "type": "string", "description": "Email subject" },
                    "body": { "type": "string", "description": "Email body" }
                },
                "required": ["to_email", "subject", "body"]
            })
        },
    }
}

fn search_emails() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::SearchEmails,
        category: Category::Email,
        description: "Searches for emails using specified criteria. Useful for finding emails from a person or about a topic.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query (e.g., 'from:zerodha', 'subject:invoice', 'is:unread')" },
                    "limit": { "type": "integer", "description": "Max number of emails to return (default 5)" }
                },
                "required": ["query"]
            })
        },
    }
}
