use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, warn};

use chatgate_coze::CozeError;
use chatgate_types::models::Report;

/// Every handler failure. Each variant carries the numeric code placed in the
/// `{code, result}` body; 4xxxx codes are client faults, 5xxxx server faults.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed ({code}): {message}")]
    Validation { code: i64, message: &'static str },

    #[error("unauthorized ({code}): {message}")]
    Auth { code: i64, message: &'static str },

    /// Answered with 400, not 404, to keep the existing client contract.
    #[error("not found ({code}): {message}")]
    NotFound { code: i64, message: &'static str },

    #[error("duplicate ({code}): {message}")]
    Duplicate { code: i64, message: &'static str },

    /// The provider answered with a non-zero code. Its code and message are
    /// relayed to the caller as-is.
    #[error("provider returned {code}: {message}")]
    Upstream { code: i64, message: String },

    /// The provider could not be reached or answered with garbage.
    #[error("provider unavailable ({code}): {detail}")]
    UpstreamUnavailable { code: i64, message: &'static str, detail: String },

    #[error("store failure ({code}): {detail}")]
    Store { code: i64, message: &'static str, detail: String },

    #[error("internal failure ({code}): {detail}")]
    Internal { code: i64, message: &'static str, detail: String },
}

impl ApiError {
    pub fn validation(code: i64, message: &'static str) -> Self {
        Self::Validation { code, message }
    }

    pub fn unauthorized(code: i64) -> Self {
        Self::Auth {
            code,
            message: "unauthorized",
        }
    }

    pub fn not_found(code: i64, message: &'static str) -> Self {
        Self::NotFound { code, message }
    }

    /// Adapter for `map_err`: wraps any store error with a code and a generic message.
    pub fn store<E: Display>(code: i64, message: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Store {
            code,
            message,
            detail: e.to_string(),
        }
    }

    pub fn internal<E: Display>(code: i64, message: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Internal {
            code,
            message,
            detail: e.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } | Self::Duplicate { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable { .. } | Self::Store { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Validation { code, .. }
            | Self::Auth { code, .. }
            | Self::NotFound { code, .. }
            | Self::Duplicate { code, .. }
            | Self::Upstream { code, .. }
            | Self::UpstreamUnavailable { code, .. }
            | Self::Store { code, .. }
            | Self::Internal { code, .. } => *code,
        }
    }

    /// Caller-facing text. Store and transport detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Auth { message, .. }
            | Self::NotFound { message, .. }
            | Self::Duplicate { message, .. }
            | Self::UpstreamUnavailable { message, .. }
            | Self::Store { message, .. }
            | Self::Internal { message, .. } => message.to_string(),
            Self::Upstream { message, .. } => message.clone(),
        }
    }
}

impl From<CozeError> for ApiError {
    fn from(err: CozeError) -> Self {
        match err {
            CozeError::Upstream { code, msg } => Self::Upstream { code, message: msg },
            CozeError::Transport(e) => Self::UpstreamUnavailable {
                code: 50003,
                message: "Failed to call external API",
                detail: e.to_string(),
            },
            CozeError::Decode(detail) => Self::UpstreamUnavailable {
                code: 50004,
                message: "Failed to parse external response",
                detail,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match status {
            StatusCode::BAD_REQUEST => debug!("Client error: {}", self),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_GATEWAY => warn!("{}", self),
            _ => error!("Server error: {}", self),
        }

        let body = Report {
            code: self.code(),
            result: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
