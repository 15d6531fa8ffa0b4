use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use tracing::{error, info};

use chatgate_auth::Identity;
use chatgate_types::api::{
    ChatQuery, ChatStatusResponse, ConversationQuery, CreateChatRequest, CreateChatResponse,
    CreateConversationRequest, CreateConversationResponse, ListConversationsResponse,
    MessageListResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::assert_owner;
use crate::run_db;

fn bad_params() -> ApiError {
    ApiError::validation(40000, "Invalid request parameters")
}

fn require(field: &str) -> Result<&str, ApiError> {
    let field = field.trim();
    if field.is_empty() { Err(bad_params()) } else { Ok(field) }
}

/// POST /coze/conversation: create the conversation upstream, then record
/// that the caller owns it.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<Json<CreateConversationResponse>, ApiError> {
    let Json(req) = payload.map_err(|_| bad_params())?;
    let bot_id = require(&req.bot_id)?;

    let conversation_id = state.coze.create_conversation(bot_id, &req.name).await?;

    // No compensation if this insert fails: the upstream conversation stays
    // without a local owner.
    let user_id = identity.user_id;
    let external_id = conversation_id.clone();
    run_db(&state, move |db| {
        db.create_conversation(user_id, &external_id, &req.name)
            .map_err(|e| {
                error!(
                    "Conversation {} created upstream but not saved for user {}",
                    external_id, user_id
                );
                ApiError::store(50002, "Failed to save conversation to database")(e)
            })
    })
    .await?;

    info!("User {} opened conversation {}", user_id, conversation_id);
    Ok(Json(CreateConversationResponse { conversation_id }))
}

/// GET /coze/conversation: the caller's conversations, possibly none.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ListConversationsResponse>, ApiError> {
    let user_id = identity.user_id;
    let rows = run_db(&state, move |db| {
        db.list_conversations(user_id)
            .map_err(ApiError::store(50001, "Failed to retrieve conversations from database"))
    })
    .await?;

    Ok(Json(ListConversationsResponse {
        conversations: rows.into_iter().map(Into::into).collect(),
    }))
}

/// POST /coze/chat: ask the bot a question in a conversation. Nothing is
/// stored locally; chat turns belong to the provider.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Json<CreateChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|_| bad_params())?;
    let conversation_id = require(&req.conversation_id)?;
    if req.message.trim().is_empty() {
        return Err(bad_params());
    }

    let ticket = state
        .coze
        .create_chat(conversation_id, identity.user_id, &req.message)
        .await?;

    Ok(Json(CreateChatResponse {
        chat_id: ticket.id,
        status: ticket.status,
    }))
}

/// GET /coze/chat?conversation_id=&chat_id=
pub async fn retrieve_chat(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Json<ChatStatusResponse>, ApiError> {
    let Query(q) = query.map_err(|_| bad_params())?;

    let status = state
        .coze
        .retrieve_chat(require(&q.conversation_id)?, require(&q.chat_id)?)
        .await?;

    Ok(Json(ChatStatusResponse { status }))
}

/// GET /coze/chat/message?conversation_id=&chat_id=
pub async fn list_chat_messages(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let Query(q) = query.map_err(|_| bad_params())?;

    let messages = state
        .coze
        .list_chat_messages(require(&q.conversation_id)?, require(&q.chat_id)?)
        .await?;

    Ok(Json(MessageListResponse { messages }))
}

/// GET /coze/conversation/message?conversation_id=: full history of a
/// conversation the caller owns.
pub async fn list_conversation_messages(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<ConversationQuery>, QueryRejection>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let Query(q) = query.map_err(|_| bad_params())?;
    let conversation_id = require(&q.conversation_id)?.to_string();

    let lookup = conversation_id.clone();
    let row = run_db(&state, move |db| {
        db.get_conversation(&lookup)
            .map_err(ApiError::store(50001, "Database error"))
    })
    .await?
    .ok_or_else(|| ApiError::unauthorized(40101))?;

    assert_owner(&identity, row.user_id)?;

    let messages = state.coze.list_conversation_messages(&conversation_id).await?;

    Ok(Json(MessageListResponse { messages }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use crate::test_support::{TestApp, get as get_req, post_json};

    fn provider_ok() -> Router {
        Router::new()
            .route(
                "/v1/conversation/create",
                post(|| async { Json(json!({"code": 0, "data": {"id": "X"}, "msg": ""})) }),
            )
            .route(
                "/v3/chat",
                post(|Json(body): Json<Value>| async move {
                    // Echo the provider user id back as the chat id so the test can see it.
                    let user = body["user_id"].as_str().unwrap_or_default().to_string();
                    Json(json!({"code": 0, "data": {"id": format!("chat-for-{user}"), "status": "in_progress"}, "msg": ""}))
                }),
            )
            .route(
                "/v3/chat/retrieve",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let status = if q.get("chat_id").map(String::as_str) == Some("done") {
                        "completed"
                    } else {
                        "in_progress"
                    };
                    Json(json!({"code": 0, "data": {"status": status}, "msg": ""}))
                }),
            )
            .route(
                "/v3/chat/message/list",
                get(|| async { Json(json!({"code": 0, "data": [], "msg": ""})) }),
            )
            .route(
                "/v1/conversation/message/list",
                post(|| async {
                    Json(json!({"code": 0, "data": [
                        {"content": "hi", "role": "user", "type": "question"},
                        {"content": "hello", "role": "assistant", "type": "answer"}
                    ], "msg": "", "has_more": false}))
                }),
            )
    }

    fn provider_failing() -> Router {
        let fail = || async { Json(json!({"code": 5000, "msg": "limit"})) };
        Router::new()
            .route("/v1/conversation/create", post(fail))
            .route("/v3/chat", post(fail))
            .route("/v3/chat/retrieve", get(fail))
            .route("/v3/chat/message/list", get(fail))
            .route("/v1/conversation/message/list", post(fail))
    }

    #[tokio::test]
    async fn create_conversation_persists_owner() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (user_id, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(post_json(
                "/coze/conversation",
                Some(&token),
                json!({"bot_id": "7563218003241058343", "name": "homework"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"conversation_id": "X"}));

        let rows = app.state.db.list_conversations(user_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].conversation_id, "X");
        assert_eq!(rows[0].name, "homework");

        let (status, body) = app.send(get_req("/coze/conversation", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversations"][0]["conversation_id"], "X");
        assert_eq!(body["conversations"][0]["title"], "homework");
        assert_eq!(body["conversations"][0]["user_id"], user_id);
    }

    #[tokio::test]
    async fn upstream_failure_creates_no_row() {
        let app = TestApp::with_provider(provider_failing()).await;
        let (user_id, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(post_json("/coze/conversation", Some(&token), json!({"bot_id": "b"})))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"code": 5000, "result": "limit"}));
        assert!(app.state.db.list_conversations(user_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_after_upstream_success_is_500() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (_, token) = app.seed_user("a@example.com");
        app.state
            .db
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE conversations")?;
                Ok(())
            })
            .unwrap();

        let (status, body) = app
            .send(post_json("/coze/conversation", Some(&token), json!({"bot_id": "b"})))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 50002);
        assert_eq!(body["result"], "Failed to save conversation to database");
    }

    #[tokio::test]
    async fn list_store_failure_is_read_error() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (_, token) = app.seed_user("a@example.com");
        app.state
            .db
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE conversations")?;
                Ok(())
            })
            .unwrap();

        let (status, body) = app.send(get_req("/coze/conversation", Some(&token))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 50001);
    }

    #[tokio::test]
    async fn missing_bot_id_is_rejected_before_upstream() {
        let app = TestApp::with_provider(provider_failing()).await;
        let (_, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(post_json("/coze/conversation", Some(&token), json!({"name": "x"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 40000);
    }

    #[tokio::test]
    async fn create_chat_uses_caller_id() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (user_id, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(post_json(
                "/coze/chat",
                Some(&token),
                json!({"conversation_id": "X", "message": "what is rust?"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chat_id"], format!("chat-for-{user_id}"));
        assert_eq!(body["status"], "in_progress");
    }

    #[tokio::test]
    async fn chat_status_and_messages() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (_, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(get_req("/coze/chat?conversation_id=X&chat_id=done", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "completed"}));

        let (status, body) = app
            .send(get_req("/coze/chat/message?conversation_id=X&chat_id=done", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"messages": []}));
    }

    #[tokio::test]
    async fn chat_query_needs_both_ids() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (_, token) = app.seed_user("a@example.com");

        let (status, body) = app.send(get_req("/coze/chat?conversation_id=X", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 40000);

        let (status, _) = app
            .send(get_req("/coze/chat/message?conversation_id=&chat_id=1", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_upstream_errors_are_bad_gateway() {
        let app = TestApp::with_provider(provider_failing()).await;
        let (_, token) = app.seed_user("a@example.com");

        let (status, body) = app
            .send(post_json(
                "/coze/chat",
                Some(&token),
                json!({"conversation_id": "X", "message": "hi"}),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], 5000);

        let (status, _) = app
            .send(get_req("/coze/chat?conversation_id=X&chat_id=1", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = app
            .send(get_req("/coze/chat/message?conversation_id=X&chat_id=1", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn conversation_history_requires_ownership() {
        let app = TestApp::with_provider(provider_ok()).await;
        let (alice, alice_token) = app.seed_user("a@example.com");
        let (_, bob_token) = app.seed_user("b@example.com");
        app.state.db.create_conversation(alice, "X", "").unwrap();

        let (status, body) = app
            .send(get_req("/coze/conversation/message?conversation_id=X", Some(&alice_token)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][1]["type"], "answer");

        let (status, body) = app
            .send(get_req("/coze/conversation/message?conversation_id=X", Some(&bob_token)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 40101);

        let (status, _) = app
            .send(get_req("/coze/conversation/message?conversation_id=nope", Some(&alice_token)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn conversation_history_relays_upstream_error() {
        let app = TestApp::with_provider(provider_failing()).await;
        let (alice, token) = app.seed_user("a@example.com");
        app.state.db.create_conversation(alice, "X", "").unwrap();

        let (status, body) = app
            .send(get_req("/coze/conversation/message?conversation_id=X", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"code": 5000, "result": "limit"}));
    }
}
