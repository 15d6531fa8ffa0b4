use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{debug, info};

use chatgate_auth::{PasswordError, TokenService, hash_password, verify_password};
use chatgate_coze::CozeClient;
use chatgate_db::{Database, DbError};
use chatgate_types::api::{LoginRequest, LoginResponse, RegisterRequest};
use chatgate_types::models::{Report, User};

use crate::error::ApiError;
use crate::middleware::USER_ROLE;
use crate::run_db;

const MIN_PASSWORD_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub coze: CozeClient,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Report<User>>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        debug!("register: bad body: {}", e);
        ApiError::validation(40000, "Invalid request data")
    })?;

    if !registration_is_valid(&req) {
        return Err(ApiError::validation(40001, "Invalid request data"));
    }

    let email = req.email.trim().to_string();

    let taken = {
        let email = email.clone();
        run_db(&state, move |db| {
            db.email_exists(&email)
                .map_err(ApiError::store(50001, "Database error"))
        })
        .await?
    };
    if taken {
        return Err(email_taken());
    }

    let password_hash =
        hash_password(&req.password).map_err(ApiError::internal(50000, "Failed to hash password"))?;

    // The UNIQUE constraint catches a registration that raced past the check above.
    let username = req.username.trim().to_string();
    let row = run_db(&state, move |db| {
        db.create_user(&username, &email, &password_hash)
            .map_err(|e| match e {
                DbError::Duplicate(_) => email_taken(),
                other => ApiError::store(50002, "Failed to create user")(other),
            })
    })
    .await?;

    info!("Registered user {} <{}>", row.id, row.email);
    Ok(Json(Report::ok(row.into())))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Report<LoginResponse>>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        debug!("login: bad body: {}", e);
        ApiError::validation(40004, "invalid request data")
    })?;

    let email = req.email.trim().to_string();
    let row = run_db(&state, move |db| {
        db.get_user_by_email(&email)
            .map_err(ApiError::store(50001, "database error"))
    })
    .await?
    .ok_or_else(|| ApiError::not_found(40005, "user not found"))?;

    verify_password(&req.password, &row.password).map_err(|e| match e {
        PasswordError::Mismatch => ApiError::validation(40006, "incorrect password or email"),
        other => ApiError::internal(50000, "Failed to verify password")(other),
    })?;

    let token = state
        .tokens
        .issue(row.id, USER_ROLE)
        .map_err(ApiError::internal(50005, "failed to generate jwt token"))?;

    info!("User {} logged in", row.id);
    Ok(Json(Report::ok(LoginResponse {
        user: row.into(),
        token,
    })))
}

fn email_taken() -> ApiError {
    ApiError::Duplicate {
        code: 40002,
        message: "User with this email already exists",
    }
}

fn registration_is_valid(req: &RegisterRequest) -> bool {
    let email = req.email.trim();
    let email_ok = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };

    !req.username.trim().is_empty()
        && email_ok
        && req.password.chars().count() >= MIN_PASSWORD_LEN
}
