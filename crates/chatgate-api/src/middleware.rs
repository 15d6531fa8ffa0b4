use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use chatgate_auth::{Identity, TokenError};

use crate::auth::AppState;
use crate::error::ApiError;

/// Role carried by every token issued at login.
pub const USER_ROLE: &str = "user";

/// State for `require_auth`: the shared app state plus the role a route group
/// demands.
#[derive(Clone)]
pub struct AuthGate {
    app: AppState,
    role: &'static str,
}

impl AuthGate {
    pub fn new(app: AppState, role: &'static str) -> Self {
        Self { app, role }
    }
}

/// Validate the bearer token and hand the resolved `Identity` to the handler
/// through request extensions. Any failure ends the request with 401.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        warn!("[AUTH] Missing or non-bearer Authorization header");
        ApiError::unauthorized(40100)
    })?;

    let identity = gate.app.tokens.validate(token).map_err(|e| {
        warn!("[AUTH] Token rejected: {}", e);
        match e {
            TokenError::Expired => ApiError::Auth {
                code: 40102,
                message: "token expired",
            },
            _ => ApiError::unauthorized(40100),
        }
    })?;

    if identity.role != gate.role {
        warn!(
            "[AUTH] Role '{}' not allowed here (need '{}')",
            identity.role, gate.role
        );
        return Err(ApiError::unauthorized(40100));
    }

    debug!("[AUTH] Authenticated user {}", identity.user_id);
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Ownership check on canonical numeric ids.
pub fn assert_owner(identity: &Identity, owner_id: i64) -> Result<(), ApiError> {
    if identity.owns(owner_id) {
        Ok(())
    } else {
        warn!(
            "[AUTH] User {} denied access to resource owned by {}",
            identity.user_id, owner_id
        );
        Err(ApiError::unauthorized(40101))
    }
}
