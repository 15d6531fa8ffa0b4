use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};

use chatgate_auth::Identity;
use chatgate_types::api::EmailQuery;
use chatgate_types::models::{Report, User};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::assert_owner;
use crate::run_db;

/// GET /user/{id}: a caller may only read their own record.
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Report<User>>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::validation(40000, "Invalid request parameters"))?;

    assert_owner(&identity, id)?;

    let row = run_db(&state, move |db| {
        db.get_user_by_id(id)
            .map_err(ApiError::store(50001, "Database error"))
    })
    .await?
    .ok_or_else(|| ApiError::not_found(40007, "user not found"))?;

    Ok(Json(Report::ok(row.into())))
}

/// GET /user?email=...
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Report<User>>, ApiError> {
    let Query(EmailQuery { email }) =
        query.map_err(|_| ApiError::validation(40000, "Invalid request parameters"))?;

    let row = run_db(&state, move |db| {
        db.get_user_by_email(email.trim())
            .map_err(ApiError::store(50001, "Database error"))
    })
    .await?
    .ok_or_else(|| ApiError::not_found(40008, "user not found"))?;

    assert_owner(&identity, row.id)?;

    Ok(Json(Report::ok(row.into())))
}
