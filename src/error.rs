// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;
use crate::models::ValidationError;
use crate::services::MaterializeError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed to modify this activity")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid field {field}: {message}")]
    Validation { field: String, message: String },

    /// Parent stored but its instances were not.
    #[error("Series incomplete for parent {parent_id}: {message}")]
    PartialSeries { parent_id: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field = None;
        let mut parent_id = None;
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Validation {
                field: f,
                message,
            } => {
                field = Some(f.clone());
                (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    Some(message.clone()),
                )
            }
            AppError::PartialSeries {
                parent_id: id,
                message,
            } => {
                tracing::error!(parent_id = %id, error = %message, "Partial series left in store");
                parent_id = Some(id.clone());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_series",
                    Some(message.clone()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            field,
            parent_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("Activity {} not found", id)),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field.to_string(),
            message: err.message,
        }
    }
}

impl From<MaterializeError> for AppError {
    fn from(err: MaterializeError) -> Self {
        match err {
            MaterializeError::Validation(e) => e.into(),
            MaterializeError::ParentWrite(e) => {
                AppError::Database(format!("Failed to store parent activity: {}", e))
            }
            MaterializeError::InstanceWrite {
                parent_id,
                compensated: true,
                source,
            } => AppError::Database(format!(
                "Failed to store instances; parent {} was removed: {}",
                parent_id, source
            )),
            MaterializeError::InstanceWrite {
                parent_id,
                compensated: false,
                source,
            } => AppError::PartialSeries {
                parent_id,
                message: source.to_string(),
            },
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::Validation {
                    field: "days".into(),
                    message: "required".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::PartialSeries {
                    parent_id: "p".into(),
                    message: "boom".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_instance_write_maps_by_compensation() {
        let partial: AppError = MaterializeError::InstanceWrite {
            parent_id: "p1".into(),
            compensated: false,
            source: StoreError::Write("down".into()),
        }
        .into();
        assert!(matches!(
            partial,
            AppError::PartialSeries { ref parent_id, .. } if parent_id == "p1"
        ));

        let cleaned: AppError = MaterializeError::InstanceWrite {
            parent_id: "p1".into(),
            compensated: true,
            source: StoreError::Write("down".into()),
        }
        .into();
        assert!(matches!(cleaned, AppError::Database(_)));
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound("abc".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
