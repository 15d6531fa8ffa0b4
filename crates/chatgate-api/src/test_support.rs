use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use chatgate_auth::{TokenConfig, TokenService};
use chatgate_coze::{CozeClient, CozeConfig};
use chatgate_db::Database;

use crate::auth::{AppState, AppStateInner};
use crate::middleware::USER_ROLE;

pub const ISSUER: &str = "chatgate-test";

#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_provider(Router::new()).await
    }

    /// App wired to an in-memory store and to `provider` served on loopback.
    pub async fn with_provider(provider: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, provider).await.unwrap();
        });

        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            tokens: TokenService::new(TokenConfig {
                secret: "test-secret".into(),
                issuer: ISSUER.into(),
                ttl: chrono::Duration::hours(72),
            }),
            coze: CozeClient::new(CozeConfig {
                api_base: format!("http://{addr}"),
                token: "pat_test".into(),
                bot_id: "bot-1".into(),
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        });

        Self {
            router: crate::router(state.clone()),
            state,
        }
    }

    /// Insert a user directly and return its id with a valid token.
    pub fn seed_user(&self, email: &str) -> (i64, String) {
        let row = self.state.db.create_user("tester", email, "$unused").unwrap();
        let token = self.state.tokens.issue(row.id, USER_ROLE).unwrap();
        (row.id, token)
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
