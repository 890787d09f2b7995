use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pagination::PaginationError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Account locked until {0}")]
    AccountLocked(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn has_sqlstate(err: &sqlx::Error, sqlstate: &str) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == sqlstate)
}

impl AppError {
    /// Turn a unique-constraint violation into a 409, pass anything else through.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        if has_sqlstate(&err, UNIQUE_VIOLATION) {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(err)
        }
    }

    /// A row referenced by the write disappeared under it: 400, not 500.
    pub fn bad_request_on_foreign_key(err: sqlx::Error, message: &str) -> Self {
        if has_sqlstate(&err, FOREIGN_KEY_VIOLATION) {
            AppError::BadRequest(message.to_string())
        } else {
            AppError::Database(err)
        }
    }

    /// Deleting a row something else still points at: 409.
    pub fn conflict_on_foreign_key(err: sqlx::Error, message: &str) -> Self {
        if has_sqlstate(&err, FOREIGN_KEY_VIOLATION) {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::AccountLocked(_) => (StatusCode::LOCKED, "ACCOUNT_LOCKED", self.to_string()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Timeout => {
                tracing::warn!("Database query exceeded its deadline");
                (StatusCode::GATEWAY_TIMEOUT, "QUERY_TIMEOUT", self.to_string())
            }
            AppError::Unavailable(msg) => {
                tracing::error!("Dependency unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", "Service temporarily unavailable".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error occurred".to_string())
            }
            AppError::Pagination(PaginationError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::Pagination(PaginationError::Mapping { index, source }) => {
                tracing::error!(row = index, "Failed to map row: {}", source);
                (StatusCode::INTERNAL_SERVER_ERROR, "MAPPING_ERROR", "Internal server error".to_string())
            }
            AppError::Pagination(e) => {
                tracing::error!("Pagination query failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error occurred".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
