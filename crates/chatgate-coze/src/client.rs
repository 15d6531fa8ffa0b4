use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use chatgate_types::api::ChatMessage;

use crate::error::CozeError;
use crate::wire::{
    ChatData, ChatStatusData, ConversationData, CreateChatPayload, CreateConversationPayload,
    EmptyPayload, Envelope, OutgoingMessage,
};

pub const DEFAULT_API_BASE: &str = "https://api.coze.ai";

#[derive(Debug, Clone)]
pub struct CozeConfig {
    /// Scheme and host, without the `/v1` or `/v3` suffix.
    pub api_base: String,
    /// Service credential sent as `Authorization: Bearer`. May be empty.
    pub token: String,
    pub bot_id: String,
    pub timeout: Duration,
}

/// Provider-assigned chat id and its status at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTicket {
    pub id: String,
    pub status: String,
}

#[derive(Clone)]
pub struct CozeClient {
    http: Client,
    api_base: String,
    token: String,
    bot_id: String,
}

impl CozeClient {
    pub fn new(config: CozeConfig) -> Result<Self, CozeError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token,
            bot_id: config.bot_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// POST /v1/conversation/create: returns the provider's conversation id.
    pub async fn create_conversation(&self, bot_id: &str, name: &str) -> Result<String, CozeError> {
        let req = self
            .http
            .post(self.url("/v1/conversation/create"))
            .json(&CreateConversationPayload { bot_id, name });

        let data: ConversationData = self
            .send(req)
            .await?
            .ok_or_else(|| CozeError::Decode("conversation response has no data".into()))?;

        Ok(data.id)
    }

    /// POST /v3/chat: submit one user question to an existing conversation.
    pub async fn create_chat(
        &self,
        conversation_id: &str,
        user_id: i64,
        content: &str,
    ) -> Result<ChatTicket, CozeError> {
        let payload = CreateChatPayload {
            bot_id: &self.bot_id,
            user_id: user_id.to_string(),
            stream: false,
            additional_messages: vec![OutgoingMessage::question(content)],
        };

        let req = self
            .http
            .post(self.url("/v3/chat"))
            .query(&[("conversation_id", conversation_id)])
            .json(&payload);

        let data: ChatData = self
            .send(req)
            .await?
            .ok_or_else(|| CozeError::Decode("chat response has no data".into()))?;

        Ok(ChatTicket {
            id: data.id,
            status: data.status,
        })
    }

    /// GET /v3/chat/retrieve: current status of a chat turn.
    pub async fn retrieve_chat(&self, conversation_id: &str, chat_id: &str) -> Result<String, CozeError> {
        let req = self
            .http
            .get(self.url("/v3/chat/retrieve"))
            .query(&[("conversation_id", conversation_id), ("chat_id", chat_id)]);

        let data: ChatStatusData = self
            .send(req)
            .await?
            .ok_or_else(|| CozeError::Decode("chat status response has no data".into()))?;

        Ok(data.status)
    }

    /// GET /v3/chat/message/list: messages produced by one chat turn.
    pub async fn list_chat_messages(
        &self,
        conversation_id: &str,
        chat_id: &str,
    ) -> Result<Vec<ChatMessage>, CozeError> {
        let req = self
            .http
            .get(self.url("/v3/chat/message/list"))
            .query(&[("conversation_id", conversation_id), ("chat_id", chat_id)]);

        Ok(self.send(req).await?.unwrap_or_default())
    }

    /// POST /v1/conversation/message/list: full history of a conversation.
    pub async fn list_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, CozeError> {
        let req = self
            .http
            .post(self.url("/v1/conversation/message/list"))
            .query(&[("conversation_id", conversation_id)])
            .json(&EmptyPayload {});

        Ok(self.send(req).await?.unwrap_or_default())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, CozeError> {
        let resp = req.bearer_auth(&self.token).send().await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        debug!("coze responded {} ({} bytes)", status, body.len());

        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| CozeError::Decode(format!("HTTP {status}: {e}")))?;

        envelope.into_data()
    }
}
