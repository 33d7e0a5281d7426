//! Tool definitions organized by category.
//!
//! Each submodule defines tools for a specific category and provides
//! a registration function that adds them to the registry.

mod calendar;
mod contacts;
mod email;
mod notes;
mod search;
mod tasks;
mod utility;
mod weather;

use std::collections::HashMap;

use super::registry::{BuiltinName, ToolMetadata};

/// Register all tools from all categories into the registry.
pub fn register_all_tools(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    tasks::register(registry);
    calendar::register(registry);
    email::register(registry);
    notes::register(registry);
    contacts::register(registry);
    weather::register(registry);
    search::register(registry);
    utility::register(registry);
}
