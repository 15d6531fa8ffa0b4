use serde::{Deserialize, Serialize};

/// Public view of a user. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A conversation owned by a local user. `conversation_id` is issued by the
/// provider and never generated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    pub conversation_id: String,
    #[serde(rename = "title")]
    pub name: String,
}

/// `{code, result}` envelope used for auth/user success bodies and for every
/// error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    pub code: i64,
    pub result: T,
}

impl<T> Report<T> {
    pub const OK: i64 = 20000;

    pub fn ok(result: T) -> Self {
        Self {
            code: Self::OK,
            result,
        }
    }
}
