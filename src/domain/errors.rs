use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::infrastructure::auth_provider::AuthProviderError;
use crate::persistence::DatabaseError;

/// Errors produced by the journal data layer
#[derive(Debug, Error, Serialize, Clone)]
#[serde(tag = "type", content = "message")]
pub enum JournalError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt row data: {0}")]
    CorruptRow(String),
}

impl From<ValidationError> for JournalError {
    fn from(e: ValidationError) -> Self {
        JournalError::Validation(e.to_string())
    }
}

impl From<DatabaseError> for JournalError {
    fn from(e: DatabaseError) -> Self {
        JournalError::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Auth provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Auth provider unreachable: {0}")]
    ProviderUnavailable(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ProviderRejected(_) => StatusCode::UNAUTHORIZED,
            ApiError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("API error: {}", self);
        } else {
            tracing::warn!("API error: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JournalError> for ApiError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            JournalError::Validation(msg) => ApiError::InvalidRequest(msg),
            JournalError::Storage(msg) => ApiError::InternalServerError(msg),
            JournalError::CorruptRow(msg) => ApiError::InternalServerError(msg),
        }
    }
}

impl From<AuthProviderError> for ApiError {
    fn from(e: AuthProviderError) -> Self {
        match e {
            AuthProviderError::Rejected { message, .. } => ApiError::ProviderRejected(message),
            AuthProviderError::Request(msg) => ApiError::ProviderUnavailable(msg),
            AuthProviderError::MalformedResponse(msg) => ApiError::ProviderUnavailable(msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid position size: {0}")]
    InvalidPositionSize(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Closed trades must have an exit price")]
    MissingExitPrice,

    #[error("Value must be non-negative")]
    MustBeNonNegative,

    #[error("Value must be finite")]
    MustBeFinite,
}

impl From<ValidationError> for String {
    fn from(error: ValidationError) -> Self {
        error.to_string()
    }
}
