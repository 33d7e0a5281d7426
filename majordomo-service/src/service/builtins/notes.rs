//! Note capabilities backed by SQLite.

use serde_json::json;

use super::{BuiltinContext, storage_error};
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

const DEFAULT_TITLE: &str = "Quick Note";
const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

impl BuiltinContext {
    pub(super) fn take_notes(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        let content = args.required_str("content")?;
        let title = args.str("title").unwrap_or(DEFAULT_TITLE);

        let note = self.db.insert_note(title, content).map_err(storage_error)?;
        Ok(CapabilityOutput::Text(format!("Note saved: {}", note.title)))
    }

    pub(super) fn get_notes(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        let limit = args.u64("limit").unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let notes = self.db.list_notes(limit as usize).map_err(storage_error)?;

        if notes.is_empty() {
            return Ok(CapabilityOutput::Text("No notes found.".to_string()));
        }

        let notes: Vec<_> = notes
            .into_iter()
            .map(|note| {
                json!({
                    "title": note.title,
                    "content": note.content,
                    "created_at": note.created_at.to_rfc3339(),
                })
            })
            .collect();
        Ok(CapabilityOutput::Json(json!(notes)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::tests::{json_output, run, text_output, unlinked_context};
    use crate::tools::registry::BuiltinName;

    #[tokio::test]
    async fn test_take_then_get_notes() {
        let ctx = unlinked_context();

        let saved = text_output(
            run(&ctx, BuiltinName::TakeNotes, json!({"content": "buy milk"}))
                .await
                .unwrap(),
        );
        assert_eq!(saved, "Note saved: Quick Note");

        run(
            &ctx,
            BuiltinName::TakeNotes,
            json!({"content": "renew passport", "title": "Errands"}),
        )
        .await
        .unwrap();

        let notes = json_output(run(&ctx, BuiltinName::GetNotes, json!({})).await.unwrap());
        assert_eq!(notes[0]["title"], "Errands");
        assert_eq!(notes[1]["content"], "buy milk");
    }

    #[tokio::test]
    async fn test_no_notes() {
        let ctx = unlinked_context();
        let output = text_output(run(&ctx, BuiltinName::GetNotes, json!({"limit": 3})).await.unwrap());
        assert_eq!(output, "No notes found.");
    }
}
