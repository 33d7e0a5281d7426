//! Note storage operations.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::Database;
use super::models::Note;
use crate::error::{DatabaseError, ServiceResult};

impl Database {
    /// Save a new note
    pub fn insert_note(&self, title: &str, content: &str) -> ServiceResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conn()
            .execute(
                "INSERT INTO notes (id, title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    note.id,
                    note.title,
                    note.content,
                    note.created_at.to_rfc3339(),
                    note.updated_at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::Query)?;

        Ok(note)
    }

    /// Most recent notes first
    pub fn list_notes(&self, limit: usize) -> ServiceResult<Vec<Note>> {
        let conn = self.conn();

        let mut stmt = conn
            .prepare(
                "SELECT id, title, content, created_at, updated_at FROM notes \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )
            .map_err(DatabaseError::Query)?;

        let notes = stmt
            .query_map(params![limit as i64], Note::from_row)
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.insert_note("First", "buy milk").unwrap();
        db.insert_note("Second", "call mom").unwrap();

        let notes = db.list_notes(10).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "Second");

        let limited = db.list_notes(1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
