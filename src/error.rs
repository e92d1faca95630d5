use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, ThisError)]
pub enum CmsError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("insufficient role for this operation")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("Database error: {0}")]
    DatabaseError(SqlxError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SqlxError> for CmsError {
    fn from(e: SqlxError) -> Self {
        if let Some(db_err) = e.as_database_error()
            && db_err.is_unique_violation()
        {
            return CmsError::Conflict(db_err.message().to_string());
        }
        if let Some(db_err) = e.as_database_error()
            && db_err.is_foreign_key_violation()
        {
            return CmsError::BadRequest("referenced record does not exist".to_string());
        }
        CmsError::DatabaseError(e)
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            CmsError::Validation(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorBody::new("VALIDATION_ERROR", "Request validation failed.")
                        .with_details(details),
                )
            }
            CmsError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("BAD_REQUEST", message),
            ),
            CmsError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "Authentication required."),
            ),
            CmsError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "Invalid email or password."),
            ),
            CmsError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody::new("FORBIDDEN", "You do not have access to this resource."),
            ),
            CmsError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", format!("{what} not found.")),
            ),
            CmsError::Conflict(message) => (
                StatusCode::CONFLICT,
                ApiErrorBody::new("CONFLICT", message),
            ),
            CmsError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody::new("RATE_LIMITED", "Too many requests. Try again shortly."),
            ),
            err @ (CmsError::DatabaseError(_)
            | CmsError::JsonError(_)
            | CmsError::Password(_)
            | CmsError::Reqwest(_)
            | CmsError::Mail(_)
            | CmsError::Internal(_)) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
