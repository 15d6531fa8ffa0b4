use crate::models::{ConversationRow, UserRow};
use crate::{Database, DbError, Result};
use rusqlite::{Connection, OptionalExtension, Row, ffi};

const USER_COLUMNS: &str = "id, username, email, password, created_at";
const CONVERSATION_COLUMNS: &str = "id, user_id, conversation_id, name, created_at";

impl Database {
    // -- Users --

    /// Cheap pre-insert guard. The UNIQUE constraint on `users.email` is what
    /// actually rejects a concurrent duplicate, see `create_user`.
    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Insert a user. Returns `DbError::Duplicate` when the email is taken.
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            )
            .map_err(|e| unique_violation(e, "email"))?;

            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", id)?
                .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Conversations --

    pub fn create_conversation(
        &self,
        user_id: i64,
        conversation_id: &str,
        name: &str,
    ) -> Result<ConversationRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (user_id, conversation_id, name) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, conversation_id, name],
            )?;

            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                [id],
                conversation_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn list_conversations(&self, user_id: i64) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user_id = ?1 ORDER BY id"
            ))?;

            let rows = stmt
                .query_map([user_id], conversation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_conversation(&self, conversation_id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE conversation_id = ?1 LIMIT 1"
                    ),
                    [conversation_id],
                    conversation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}"))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn unique_violation(err: rusqlite::Error, column: &str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            DbError::Duplicate(column.to_string())
        }
        _ => DbError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_find_user() {
        let db = db();
        assert!(!db.email_exists("a@example.com").unwrap());

        let created = db.create_user("alice", "a@example.com", "$hash").unwrap();
        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert!(db.email_exists("a@example.com").unwrap());

        let by_email = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.password, "$hash");

        let by_id = db.get_user_by_id(created.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        assert!(db.get_user_by_id(created.id + 100).unwrap().is_none());
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_by_constraint() {
        let db = db();
        db.create_user("alice", "a@example.com", "$hash").unwrap();

        let result = db.create_user("alice2", "a@example.com", "$other");
        assert!(matches!(result, Err(DbError::Duplicate(ref col)) if col == "email"));

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE email = 'a@example.com'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn conversations_are_scoped_to_owner() {
        let db = db();
        let alice = db.create_user("alice", "a@example.com", "$hash").unwrap();
        let bob = db.create_user("bob", "b@example.com", "$hash").unwrap();

        db.create_conversation(alice.id, "conv-1", "first").unwrap();
        db.create_conversation(alice.id, "conv-2", "").unwrap();
        db.create_conversation(bob.id, "conv-3", "bob's").unwrap();

        let mine = db.list_conversations(alice.id).unwrap();
        let mut ids: Vec<_> = mine.iter().map(|c| c.conversation_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["conv-1", "conv-2"]);
        assert!(mine.iter().all(|c| c.user_id == alice.id));

        let found = db.get_conversation("conv-3").unwrap().unwrap();
        assert_eq!(found.user_id, bob.id);
        assert_eq!(found.name, "bob's");
        assert!(db.get_conversation("conv-404").unwrap().is_none());
    }

    #[test]
    fn empty_listing_for_user_without_conversations() {
        let db = db();
        let alice = db.create_user("alice", "a@example.com", "$hash").unwrap();
        assert!(db.list_conversations(alice.id).unwrap().is_empty());
    }

    #[test]
    fn conversation_requires_existing_user() {
        let db = db();
        let result = db.create_conversation(999, "conv-x", "orphan");
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }
}
