// src/error.rs
use std::collections::BTreeMap;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

/// Validation messages keyed by the form field they belong to.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("invalid fields: {0:?}")]
    InvalidFields(FieldErrors),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn db(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }

    pub fn fields(errors: FieldErrors) -> Self {
        AppError::InvalidFields(errors)
    }

    /// True for failures of the remote store rather than of the caller's input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, AppError::DatabaseError(_) | AppError::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error occurred".to_string(),
                None,
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized access".to_string(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidFields(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(errors),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Operation failed, please try again".to_string(),
                None,
            ),
        };

        let body = match fields {
            Some(fields) => Json(json!({ "error": error_message, "fields": fields })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_map_to_unprocessable_entity() {
        let mut errors = FieldErrors::new();
        errors.insert("rent".into(), "Rent must be greater than 0".into());
        let response = AppError::fields(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn backend_failures_are_distinguished_from_input_errors() {
        assert!(AppError::internal("boom").is_backend_failure());
        assert!(!AppError::validation("bad").is_backend_failure());
        assert!(!AppError::not_found("Bilty not found").is_backend_failure());
    }
}
