//! Calendar tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [
        get_calendar_today(),
        get_calendar_events(),
        get_calendar_range(),
        create_calendar_event(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn get_calendar_today() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetCalendarToday,
        category: Category::Calendar,
        description: "Gets calendar events for today only. Use get_calendar_events for other dates.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "description": "Optional limit" }
                }
            })
        },
    }
}

fn get_calendar_events() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetCalendarEvents,
        category: Category::Calendar,
        description: "Gets calendar events for a specific date. Use this when the user asks about events on a specific day like 'tomorrow' or 'next Monday'. Convert the date to YYYY-MM-DD format.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Date in YYYY-MM-DD format (e.g., 2026-01-27)" }
                },
                "required": ["date"]
            })
        },
    }
}

fn get_calendar_range() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetCalendarRange,
        category: Category::Calendar,
        description: "Gets upcoming calendar events for the next N days starting from today",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "days": { "type": "integer", "description": "Number of days to look ahead (default 7)" }
                }
            })
        },
    }
}

fn create_calendar_event() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::CreateCalendarEvent,
        category: Category::Calendar,
        description: "Creates a calendar event. The start_time MUST be in ISO 8601 format like '2026-01-05T16:00:00'. Convert natural language times to ISO format using the current date provided in the system context.",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "summary": { "type": "string", "description": "Event title/summary" },
                    "start_time": { "type": "string", "description": "Start time in ISO 8601 format (e.g., 2026-01-05T16:00:00)" },
                    "duration_minutes": { "type": "integer", "description": "Duration in minutes, default 60" }
                },
                "required": ["summary", "start_time"]
            })
        },
    }
}
