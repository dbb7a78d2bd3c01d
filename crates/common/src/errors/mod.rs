//! Error types for Newsboard services
//!
//! Provides a single error taxonomy for the API:
//! - Application-raised semantic errors (not found, invalid query, invalid input)
//! - Storage errors classified by PostgreSQL SQLSTATE
//! - Opaque internal errors whose details are logged but never returned
//!
//! Every error renders as `{"msg": ..., "code": ...}` with a matching HTTP status.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, RuntimeErr};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

use crate::metrics;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for every server-side failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// PostgreSQL SQLSTATE codes the classifier understands
pub mod sqlstate {
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
    pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
    pub const INVALID_ROW_COUNT_IN_LIMIT: &str = "2201W";
    pub const INVALID_ROW_COUNT_IN_OFFSET: &str = "2201X";
}

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Resource errors
    NotFound,
    RouteNotFound,

    // Request validation errors
    InvalidQuery,
    InvalidInput,
    NegativePage,
    NegativeLimit,

    // Constraint errors
    MissingRequiredKey,
    ForeignKeyViolation,
    DuplicateKey,

    // Rate limiting
    RateLimited,

    // Server errors
    DatabaseError,
    ConnectionError,
    InternalError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    /// A referenced row named in a request body is missing
    #[error("{key} {entity} does not exist")]
    MissingReference { entity: &'static str, key: String },

    #[error("Not found")]
    RouteNotFound,

    // Request validation errors
    #[error("invalid query: {param}")]
    InvalidQuery { param: &'static str },

    #[error("invalid input")]
    InvalidInput,

    #[error("negative page number")]
    NegativePage,

    #[error("negative limit number")]
    NegativeLimit,

    // Constraint errors
    #[error("missing required key")]
    MissingRequiredKey,

    #[error("foreign key violation")]
    ForeignKeyViolation,

    #[error("duplicate key: {detail}")]
    Duplicate { detail: String },

    // Rate limiting
    #[error("too many requests")]
    RateLimited,

    // Database errors
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound { entity, id: id.to_string() }
    }

    pub fn missing_reference(entity: &'static str, key: impl ToString) -> Self {
        AppError::MissingReference { entity, key: key.to_string() }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { .. } | AppError::MissingReference { .. } => ErrorCode::NotFound,
            AppError::RouteNotFound => ErrorCode::RouteNotFound,
            AppError::InvalidQuery { .. } => ErrorCode::InvalidQuery,
            AppError::InvalidInput => ErrorCode::InvalidInput,
            AppError::NegativePage => ErrorCode::NegativePage,
            AppError::NegativeLimit => ErrorCode::NegativeLimit,
            AppError::MissingRequiredKey => ErrorCode::MissingRequiredKey,
            AppError::ForeignKeyViolation => ErrorCode::ForeignKeyViolation,
            AppError::Duplicate { .. } => ErrorCode::DuplicateKey,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidQuery { .. } |
            AppError::InvalidInput |
            AppError::NegativePage |
            AppError::NegativeLimit |
            AppError::MissingRequiredKey |
            AppError::ForeignKeyViolation => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::MissingReference { .. } |
            AppError::RouteNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message safe to return to the caller
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Map a PostgreSQL SQLSTATE to a client-facing error.
///
/// Returns `None` for codes outside the known taxonomy; callers treat those as internal failures.
pub fn classify_sqlstate(code: &str, detail: Option<&str>) -> Option<AppError> {
    let classified = match code {
        sqlstate::NOT_NULL_VIOLATION => AppError::MissingRequiredKey,
        sqlstate::FOREIGN_KEY_VIOLATION => AppError::ForeignKeyViolation,
        sqlstate::INVALID_TEXT_REPRESENTATION | sqlstate::NUMERIC_VALUE_OUT_OF_RANGE => {
            AppError::InvalidInput
        }
        sqlstate::INVALID_ROW_COUNT_IN_OFFSET => AppError::NegativePage,
        sqlstate::INVALID_ROW_COUNT_IN_LIMIT => AppError::NegativeLimit,
        sqlstate::UNIQUE_VIOLATION => AppError::Duplicate {
            detail: detail.unwrap_or("value already exists").to_string(),
        },
        _ => return None,
    };
    Some(classified)
}

/// SQLSTATE and detail text carried by a database-originated error
fn storage_error_code(err: &DbErr) -> Option<(String, Option<String>)> {
    let runtime = match err {
        DbErr::Query(e) | DbErr::Exec(e) | DbErr::Conn(e) => e,
        _ => return None,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            let code = db_err.code()?.into_owned();
            let detail = db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .map(str::to_string);
            Some((code, detail))
        }
        _ => None,
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let DbErr::ConnectionAcquire(ref cause) = err {
            return AppError::DatabaseConnection { message: cause.to_string() };
        }

        match storage_error_code(&err) {
            Some((code, detail)) => {
                metrics::record_storage_error(&code);
                classify_sqlstate(&code, detail.as_deref()).unwrap_or(AppError::Database(err))
            }
            None => AppError::Database(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        AppError::InvalidInput
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected path parameter");
        AppError::InvalidInput
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected query string");
        AppError::InvalidInput
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        tracing::debug!(reason = %errors, "Request body failed validation");
        AppError::InvalidInput
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal {
            message: format!("migration failed: {}", err),
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub msg: String,
    pub code: ErrorCode,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            msg: self.public_message(),
            code,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        let err = AppError::not_found("article", 111111);
        assert_eq!(err.to_string(), "article 111111 does not exist");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppError::missing_reference("user", "rogue");
        assert_eq!(err.to_string(), "rogue user does not exist");
        assert_eq!(err.code(), ErrorCode::NotFound);

        assert_eq!(AppError::RouteNotFound.to_string(), "Not found");
    }

    #[test]
    fn test_invalid_query_names_parameter() {
        let err = AppError::InvalidQuery { param: "sort_by" };
        assert_eq!(err.to_string(), "invalid query: sort_by");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_classify_known_sqlstates() {
        let cases = [
            (sqlstate::NOT_NULL_VIOLATION, "missing required key"),
            (sqlstate::FOREIGN_KEY_VIOLATION, "foreign key violation"),
            (sqlstate::INVALID_TEXT_REPRESENTATION, "invalid input"),
            (sqlstate::NUMERIC_VALUE_OUT_OF_RANGE, "invalid input"),
            (sqlstate::INVALID_ROW_COUNT_IN_OFFSET, "negative page number"),
            (sqlstate::INVALID_ROW_COUNT_IN_LIMIT, "negative limit number"),
        ];

        for (code, message) in cases {
            let err = classify_sqlstate(code, None).unwrap();
            assert_eq!(err.to_string(), message);
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_classify_duplicate_carries_detail() {
        let err = classify_sqlstate(
            sqlstate::UNIQUE_VIOLATION,
            Some("Key (slug)=(cats) already exists."),
        )
        .unwrap();

        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "duplicate key: Key (slug)=(cats) already exists.");
    }

    #[test]
    fn test_unknown_sqlstate_is_unclassified() {
        assert!(classify_sqlstate("40001", None).is_none());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database(DbErr::Custom("relation \"articles\" does not exist".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = AppError::from(DbErr::Custom("boom".into()));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_migration_failure_is_internal() {
        let err = AppError::from(sqlx::migrate::MigrateError::VersionMissing(1));
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = AppError::NegativeLimit.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["msg"], "negative limit number");
        assert_eq!(body["code"], "NEGATIVE_LIMIT");
    }
}
