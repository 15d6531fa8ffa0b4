use serde::{Deserialize, Serialize};

use crate::models::{Conversation, User};

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

// -- Coze proxy --

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub bot_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub conversation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub conversation_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChatResponse {
    pub chat_id: String,
    pub status: String,
}

/// Query string shared by the chat status and chat message endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatQuery {
    pub conversation_id: String,
    pub chat_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationQuery {
    pub conversation_id: String,
}

/// One provider message, trimmed to the fields relayed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<ChatMessage>,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
