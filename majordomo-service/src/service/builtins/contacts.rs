//! Contact capabilities backed by SQLite.

use super::{BuiltinContext, storage_error};
use crate::db::{ContactInput, UpsertOutcome};
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

impl BuiltinContext {
    pub(super) fn add_contact(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        let name = args.required_str("name")?;
        let input = ContactInput {
            name: name.to_string(),
            email: args.str("email").map(str::to_string),
            phone: args.str("phone").map(str::to_string),
            company: args.str("company").map(str::to_string),
            notes: args.str("notes").map(str::to_string),
        };

        let verb = match self.db.upsert_contact(&input).map_err(storage_error)? {
            UpsertOutcome::Inserted => "added",
            UpsertOutcome::Updated => "updated",
        };
        Ok(CapabilityOutput::Text(format!("Contact '{}' {}.", name, verb)))
    }

    pub(super) fn get_email_address(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let name = args.required_str("name")?;
        let found = self.db.find_contact(name).map_err(storage_error)?;

        let text = match found {
            Some(contact) => match contact.email {
                Some(email) => format!("{} (found: {})", email, contact.name),
                None => format!("No email address saved for {}.", contact.name),
            },
            None => format!("Contact '{}' not found.", name),
        };
        Ok(CapabilityOutput::Text(text))
    }

    pub(super) fn get_phone_number(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let name = args.required_str("name")?;
        let found = self.db.find_contact(name).map_err(storage_error)?;

        let text = match found.and_then(|c| c.phone.map(|phone| (phone, c.name))) {
            Some((phone, contact_name)) => format!("{} (found: {})", phone, contact_name),
            None => format!("Phone number for '{}' not found.", name),
        };
        Ok(CapabilityOutput::Text(text))
    }

    pub(super) fn list_contacts(&self) -> Result<CapabilityOutput, CapabilityError> {
        let contacts = self.db.list_contacts().map_err(storage_error)?;
        if contacts.is_empty() {
            return Ok(CapabilityOutput::Text("No contacts found.".to_string()));
        }

        let lines: Vec<String> = contacts
            .iter()
            .map(|c| {
                format!(
                    "- {}: {}",
                    c.name,
                    c.email.as_deref().or(c.phone.as_deref()).unwrap_or("no details")
                )
            })
            .collect();
        Ok(CapabilityOutput::Text(lines.join("\n")))
    }
}
