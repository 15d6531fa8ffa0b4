use serde::{Deserialize, Serialize};

use crate::error::CozeError;

// -- Response envelope --

/// `{code, data, msg}` wrapper on every provider response. `code == 0` is success.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub msg: String,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Result<Option<T>, CozeError> {
        if self.code != 0 {
            return Err(CozeError::Upstream {
                code: self.code,
                msg: self.msg,
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatData {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatStatusData {
    #[serde(default)]
    pub status: String,
}

// -- Request payloads --

#[derive(Debug, Serialize)]
pub struct CreateConversationPayload<'a> {
    pub bot_id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateChatPayload<'a> {
    pub bot_id: &'a str,
    pub user_id: String,
    pub stream: bool,
    pub additional_messages: Vec<OutgoingMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct OutgoingMessage<'a> {
    pub role: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content_type: &'static str,
    pub content: &'a str,
}

impl<'a> OutgoingMessage<'a> {
    /// A plain-text question from the end user.
    pub fn question(content: &'a str) -> Self {
        Self {
            role: "user",
            kind: "question",
            content_type: "text",
            content,
        }
    }
}

/// Empty JSON object body for POST endpoints that take everything in the query.
#[derive(Debug, Serialize)]
pub struct EmptyPayload {}
