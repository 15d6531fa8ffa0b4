use chatgate_types::models::{Conversation, User};

/// Database row types: these map directly to SQLite rows.
/// Distinct from chatgate-types models so the password hash stays in this layer.
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}

pub struct ConversationRow {
    pub id: i64,
    pub user_id: i64,
    pub conversation_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: row.id,
            user_id: row.user_id,
            conversation_id: row.conversation_id,
            name: row.name,
        }
    }
}
