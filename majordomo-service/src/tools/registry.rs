//! Registry of built-in capability metadata.
//!
//! Capability names are derived from enum variants via strum, so the name the
//! model sees, the dispatch table key and the handler match arm cannot drift.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::CapabilityDescriptor;

/// Every built-in capability.
///
/// Adding one requires:
/// 1. Add variant here
/// 2. Register metadata in the matching `tool_defs` module
/// 3. Handle it in the category handler (compile error if missing due to exhaustive match)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BuiltinName {
    // ==========================================
    // Tasks
    // ==========================================
    CreateTask,
    ListTasks,
    CompleteTask,
    UpdateTask,
    DeleteTask,
    SearchTasks,

    // ==========================================
    // Calendar
    // ==========================================
    GetCalendarToday,
    GetCalendarEvents,
    GetCalendarRange,
    CreateCalendarEvent,

    // ==========================================
    // Email
    // ==========================================
    GetUnreadEmailsSummary,
    SummarizeEmails,
    DailyDigest,
    SendEmail,
    SearchEmails,

    // ==========================================
    // Notes
    // ==========================================
    TakeNotes,
    GetNotes,

    // ==========================================
    // Contacts
    // ==========================================
    AddContact,
    GetEmailAddress,
    GetPhoneNumber,
    ListContacts,

    // ==========================================
    // Weather
    // ==========================================
    GetWeather,
    GetForecast,

    // ==========================================
    // Search
    // ==========================================
    WebSearch,
    GetNews,

    // ==========================================
    // Utilities
    // ==========================================
    Calculate,
    GetTimeNow,
    ConvertCurrency,
    ConvertUnits,
}

/// Grouping used for handler wiring and the tools listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Category {
    Tasks,
    Calendar,
    Email,
    Notes,
    Contacts,
    Weather,
    Search,
    Utilities,
}

/// Metadata for a built-in capability.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    /// Identifier; the string form comes from strum Display
    pub name: BuiltinName,

    pub category: Category,

    /// Description shown to the model
    pub description: &'static str,

    /// JSON Schema for parameters (called lazily to avoid static initialization issues)
    pub parameters: fn() -> serde_json::Value,
}

impl ToolMetadata {
    pub fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: (self.parameters)(),
        }
    }
}

/// Compile-time set of built-in capability metadata.
pub struct ToolRegistry {
    tools: HashMap<BuiltinName, ToolMetadata>,
}

impl ToolRegistry {
    /// Build the registry from all registered tool definitions
    pub fn new() -> Self {
        let mut tools = HashMap::new();

        super::tool_defs::register_all_tools(&mut tools);

        Self { tools }
    }

    /// Get metadata by enum variant
    pub fn get(&self, name: BuiltinName) -> Option<&ToolMetadata> {
        self.tools.get(&name)
    }

    /// Get metadata by string name
    pub fn get_by_str(&self, name: &str) -> Option<&ToolMetadata> {
        BuiltinName::from_str(name)
            .ok()
            .and_then(|n| self.tools.get(&n))
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        BuiltinName::iter()
            .filter_map(|name| self.tools.get(&name))
            .map(ToolMetadata::descriptor)
            .collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in metadata never changes at runtime, so one shared instance suffices
pub static REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(ToolRegistry::new);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_name_string_conversion() {
        assert_eq!(BuiltinName::CreateTask.to_string(), "create_task");
        assert_eq!(
            BuiltinName::GetUnreadEmailsSummary.to_string(),
            "get_unread_emails_summary"
        );
        assert_eq!(BuiltinName::GetTimeNow.to_string(), "get_time_now");
    }

    #[test]
    fn test_builtin_name_from_string() {
        assert_eq!(
            BuiltinName::from_str("create_calendar_event").unwrap(),
            BuiltinName::CreateCalendarEvent
        );
        assert!(BuiltinName::from_str("unknown_tool").is_err());
    }

    #[test]
    fn test_every_variant_registered() {
        for name in BuiltinName::iter() {
            assert!(REGISTRY.get(name).is_some(), "{name} has no metadata");
        }
        assert_eq!(REGISTRY.len(), BuiltinName::iter().count());
    }

    #[test]
    fn test_descriptors_unique_and_unprefixed() {
        let descriptors = REGISTRY.descriptors();
        let names: HashSet<_> = descriptors.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names.len(), descriptors.len());
        assert!(names.iter().all(|n| !n.starts_with("mcp_")));
    }

    #[test]
    fn test_parameter_schemas_are_objects() {
        for descriptor in REGISTRY.descriptors() {
            assert_eq!(descriptor.parameters["type"], "object", "{}", descriptor.name);
            if let Some(required) = descriptor.parameters.get("required") {
                let props = &descriptor.parameters["properties"];
                for key in required.as_array().unwrap() {
                    assert!(
                        props.get(key.as_str().unwrap()).is_some(),
                        "{} requires undeclared {}",
                        descriptor.name,
                        key
                    );
                }
            }
        }
    }
}
