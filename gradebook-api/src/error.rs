//! Error types for gradebook-api
//!
//! `ApiError` is the single translator between failures and HTTP responses.
//! Store errors are classified on conversion (`From<sqlx::Error>`), so
//! handlers only need `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Field name -> messages, reported with 422 responses
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> ApiResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Request body failed validation (422)
    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Unique constraint violated (400)
    #[error("Duplicate value for field: {field}")]
    Duplicate { field: String },

    /// Malformed identifier (400)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Query parameter could not be cast to its type (400)
    #[error("Invalid value for {field}: {value}")]
    InvalidCast { field: String, value: String },

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Store failure not covered above (500)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// IO error (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(label: &str) -> Self {
        ApiError::NotFound(format!("{} not found", label))
    }

    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Duplicate { .. }
            | ApiError::InvalidIdentifier(_)
            | ApiError::InvalidCast { .. }
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return ApiError::Duplicate {
                    field: constraint_field(db_err.message()),
                };
            }
            if db_err.is_check_violation() {
                return ApiError::BadRequest(format!(
                    "Constraint violated: {}",
                    db_err.message()
                ));
            }
        }
        ApiError::Database(err)
    }
}

impl From<gradebook_common::Error> for ApiError {
    fn from(err: gradebook_common::Error) -> Self {
        match err {
            gradebook_common::Error::Database(e) => e.into(),
            gradebook_common::Error::Io(e) => ApiError::Io(e),
            gradebook_common::Error::Config(msg) => ApiError::Internal(msg),
        }
    }
}

/// Column named by an SQLite constraint message
///
/// "UNIQUE constraint failed: students.email" -> "email"
fn constraint_field(message: &str) -> String {
    message
        .rsplit(": ")
        .next()
        .and_then(|columns| columns.split(',').next())
        .map(|column| column.trim())
        .map(|column| column.rsplit('.').next().unwrap_or(column))
        .unwrap_or(message)
        .to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::NotFound(msg) => json!({
                "error": { "code": "NOT_FOUND", "message": msg }
            }),
            ApiError::Validation(details) => json!({
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Validation failed",
                    "details": details,
                }
            }),
            ApiError::Duplicate { field } => json!({
                "error": {
                    "code": "DUPLICATE_VALUE",
                    "message": format!("Value for '{}' must be unique", field),
                    "field": field,
                }
            }),
            ApiError::InvalidIdentifier(_) | ApiError::InvalidCast { .. } => json!({
                "error": { "code": "INVALID_IDENTIFIER", "message": self.to_string() }
            }),
            ApiError::BadRequest(msg) => json!({
                "error": { "code": "BAD_REQUEST", "message": msg }
            }),
            ApiError::Database(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                error!("Unhandled API error: {}", self);
                json!({
                    "error": { "code": "INTERNAL_ERROR", "message": "Internal server error" }
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
