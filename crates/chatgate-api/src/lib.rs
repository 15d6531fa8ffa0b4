pub mod auth;
pub mod coze;
pub mod error;
pub mod middleware;
pub mod users;

#[cfg(test)]
mod test_support;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing::error;

use chatgate_db::Database;
use chatgate_types::api::PingResponse;
use chatgate_types::models::Report;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{AuthGate, USER_ROLE, require_auth};

/// Build the full HTTP surface. Layers such as CORS and tracing are added by
/// the binary.
pub fn router(state: AppState) -> Router {
    let gate = AuthGate::new(state.clone(), USER_ROLE);

    let public_routes = Router::new()
        .route("/ping", get(ping))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/user/{id}", get(users::get_user_by_id))
        .route("/user", get(users::get_user_by_email))
        .route(
            "/coze/conversation",
            post(coze::create_conversation).get(coze::list_conversations),
        )
        .route("/coze/conversation/message", get(coze::list_conversation_messages))
        .route("/coze/chat", post(coze::create_chat).get(coze::retrieve_chat))
        .route("/coze/chat/message", get(coze::list_chat_messages))
        .layer(from_fn_with_state(gate, require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn ping() -> Json<Report<PingResponse>> {
    Json(Report {
        code: 200,
        result: PingResponse {
            message: "pong".into(),
        },
    })
}

/// Run a store operation off the async runtime. The closure maps its own
/// errors so callers can tell duplicates from plain store failures.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::store(50001, "Database error")(e)
        })?
}
