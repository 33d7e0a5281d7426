//! Contact storage operations.
//!
//! Names are unique case-insensitively; adding an existing name updates it.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use super::Database;
use super::models::{Contact, ContactInput, UpsertOutcome};
use crate::error::{DatabaseError, ServiceResult};

const CONTACT_COLUMNS: &str = "id, name, email, phone, company, notes, updated_at";

impl Database {
    /// Insert a contact or merge non-empty fields into an existing one
    pub fn upsert_contact(&self, input: &ContactInput) -> ServiceResult<UpsertOutcome> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM contacts WHERE name = ?1 COLLATE NOCASE",
                params![input.name],
                |row| row.get(0),
            )
            .optional()
            .map_err(DatabaseError::Query)?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE contacts SET \
                     email = COALESCE(?2, email), phone = COALESCE(?3, phone), \
                     company = COALESCE(?4, company), notes = COALESCE(?5, notes), \
                     updated_at = ?6 WHERE id = ?1",
                    params![
                        id,
                        input.email,
                        input.phone,
                        input.company,
                        input.notes,
                        now
                    ],
                )
                .map_err(DatabaseError::Query)?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                conn.execute(
                    "INSERT INTO contacts (id, name, email, phone, company, notes, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        Uuid::new_v4().to_string(),
                        input.name,
                        input.email,
                        input.phone,
                        input.company,
                        input.notes,
                        now
                    ],
                )
                .map_err(DatabaseError::Query)?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Best match for a (partial, case-insensitive) name. Exact matches win.
    pub fn find_contact(&self, name: &str) -> ServiceResult<Option<Contact>> {
        let conn = self.conn();
        let pattern = format!("%{}%", escape_like(name.trim()));

        conn.query_row(
            &format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts WHERE name LIKE ?1 ESCAPE '\\' \
                 ORDER BY (name = ?2 COLLATE NOCASE) DESC, length(name) ASC LIMIT 1"
            ),
            params![pattern, name.trim()],
            Contact::from_row,
        )
        .optional()
        .map_err(|e| DatabaseError::Query(e).into())
    }

    /// All contacts ordered by name
    pub fn list_contacts(&self) -> ServiceResult<Vec<Contact>> {
        let conn = self.conn();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY name COLLATE NOCASE"
            ))
            .map_err(DatabaseError::Query)?;

        let contacts = stmt
            .query_map([], Contact::from_row)
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(contacts)
    }
}

/// Make `%`, `_` and the escape character match literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: Option<&str>) -> ContactInput {
        ContactInput {
            name: name.to_string(),
            email: email.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_merges_by_name() {
        let db = Database::open_in_memory().unwrap();

        let first = db
            .upsert_contact(&input("Asha Rao", Some("asha@example.com")))
            .unwrap();
        assert_eq!(first, UpsertOutcome::Inserted);

        let mut update = input("asha rao", None);
        update.phone = Some("+91 98200 00000".to_string());
        assert_eq!(db.upsert_contact(&update).unwrap(), UpsertOutcome::Updated);

        let contacts = db.list_contacts().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].email.as_deref(), Some("asha@example.com"));
        assert_eq!(contacts[0].phone.as_deref(), Some("+91 98200 00000"));
    }

    #[test]
    fn test_find_contact_partial_and_exact() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_contact(&input("Sam", Some("sam@example.com"))).unwrap();
        db.upsert_contact(&input("Samantha Iyer", Some("samantha@example.com")))
            .unwrap();

        let exact = db.find_contact("sam").unwrap().unwrap();
        assert_eq!(exact.name, "Sam");

        let partial = db.find_contact("iyer").unwrap().unwrap();
        assert_eq!(partial.name, "Samantha Iyer");

        assert!(db.find_contact("nobody").unwrap().is_none());
    }

    #[test]
    fn test_find_contact_treats_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_contact(&input("Asha Rao", Some("asha@example.com"))).unwrap();
        db.upsert_contact(&input("ops_team", Some("ops@example.com"))).unwrap();

        assert!(db.find_contact("%").unwrap().is_none());
        assert!(db.find_contact("a_ha").unwrap().is_none());
        assert!(db.find_contact("\\").unwrap().is_none());

        let literal = db.find_contact("s_t").unwrap().unwrap();
        assert_eq!(literal.name, "ops_team");
    }
}
