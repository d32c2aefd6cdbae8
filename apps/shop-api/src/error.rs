//! # API Error Handling
//!
//! Converts domain and database errors into HTTP responses.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ OrderError  │     │   DbError   │     │  AuthError   │     │ Validation / │
//! │ (shop-core) │     │  (shop-db)  │     │   (auth)     │     │  rejections  │
//! └──────┬──────┘     └──────┬──────┘     └──────┬───────┘     └──────┬───────┘
//!        │                   │                   │                    │
//!        └───────────────────┴─────────┬─────────┴────────────────────┘
//!                                      ▼
//!                          ┌──────────────────────┐
//!                          │      ApiError        │
//!                          │  status + code +     │
//!                          │  message             │
//!                          └──────────┬───────────┘
//!                                     ▼
//!                     HTTP 4xx/5xx  { "code": "...", "message": "..." }
//! ```
//!
//! ## Status Mapping
//! | Source                                   | Status |
//! |------------------------------------------|--------|
//! | client input (identity, address, qty...) | 422    |
//! | product missing / out of stock           | 400    |
//! | missing or invalid credentials           | 401    |
//! | unknown resource                         | 404    |
//! | store failure                            | 500    |
//!
//! Database error text never reaches the client; it is logged instead.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shop_core::{ErrorKind, OrderError, ValidationError};
use shop_db::DbError;
use ts_rs::TS;

use crate::auth::AuthError;
use crate::services::order_service::ListOrdersError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `INSUFFICIENT_STOCK`
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Error returned from handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    /// Creates a duplicate-resource error (400).
    pub fn already_exists(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "ALREADY_EXISTS", message)
    }

    /// Creates an authentication error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Converts order engine errors to API errors.
impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let status = match err.kind() {
            ErrorKind::ClientInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::StateConflict => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::TransientStore => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.code(), err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => {
                // Field text is `table.column` straight from SQLite
                tracing::debug!(field = %field, "Unique constraint violated");
                ApiError::already_exists("Resource already exists")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REFERENCE", "Invalid reference")
            }
            DbError::Busy(e) => {
                tracing::error!("Database busy: {}", e);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database is busy, please retry",
                )
            }
            DbError::PoolExhausted => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database pool exhausted",
            ),
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database operation failed",
                )
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenIssue(e) => {
                tracing::error!("Failed to issue token: {}", e);
                ApiError::internal("Failed to issue token")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<ListOrdersError> for ApiError {
    fn from(err: ListOrdersError) -> Self {
        match err {
            ListOrdersError::Order(e) => e.into(),
            ListOrdersError::Db(e) => e.into(),
        }
    }
}

/// Malformed or mistyped JSON bodies are client input errors (422).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_BODY",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_QUERY",
            rejection.body_text(),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PATH",
            rejection.body_text(),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;
