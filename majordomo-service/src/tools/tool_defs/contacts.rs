//! Contact book tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{BuiltinName, Category, ToolMetadata};

pub fn register(registry: &mut HashMap<BuiltinName, ToolMetadata>) {
    let tools = [
        add_contact(),
        get_email_address(),
        get_phone_number(),
        list_contacts(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn name_lookup() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "Name to look up" }
        },
        "required": ["name"]
    })
}

fn add_contact() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::AddContact,
        category: Category::Contacts,
        description: "Saves a new contact. Use this when the user asks to save someone's contact info (name, email, phone, company).",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the person" },
                    "email": { "type": "string", "description": "Email address (optional)" },
                    "phone": { "type": "string", "description": "Phone number (optional)" },
                    "company": { "type": "string", "description": "Company/organization (optional)" },
                    "notes": { "type": "string", "description": "Additional notes (optional)" }
                },
                "required": ["name"]
            })
        },
    }
}

fn get_email_address() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetEmailAddress,
        category: Category::Contacts,
        description: "Finds an email address for a contact by name.",
        parameters: name_lookup,
    }
}

fn get_phone_number() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::GetPhoneNumber,
        category: Category::Contacts,
        description: "Finds a phone number for a contact by name.",
        parameters: name_lookup,
    }
}

fn list_contacts() -> ToolMetadata {
    ToolMetadata {
        name: BuiltinName::ListContacts,
        category: Category::Contacts,
        description: "Lists all saved contacts with their names, emails, and phone numbers.",
        parameters: || serde_json::json!({ "type": "object", "properties": {} }),
    }
}
