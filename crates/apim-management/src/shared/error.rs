//! Management Error Types

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum ManagementError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Duplicate entity: {entity_type} with id {id}")]
    Duplicate { entity_type: String, id: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ManagementError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Turn a unique index violation on insert into `Duplicate`.
    pub fn on_insert(err: mongodb::error::Error, entity_type: &str, id: &str) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
                Self::duplicate(entity_type, id)
            }
            _ => Self::Database(err),
        }
    }
}

const DUPLICATE_KEY: i32 = 11000;

pub type Result<T> = std::result::Result<T, ManagementError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ManagementError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ManagementError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ManagementError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ManagementError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
            ManagementError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            ManagementError::Json(_) => (StatusCode::BAD_REQUEST, "MALFORMED_JSON"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "TECHNICAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed with a technical error");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<UseCaseError> for ManagementError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::ValidationError { message, .. } => ManagementError::Validation { message },
            UseCaseError::NotFoundError { code, message, .. } => ManagementError::NotFound {
                entity_type: code,
                id: message,
            },
            UseCaseError::InvalidState { message, .. } => ManagementError::InvalidState { message },
            UseCaseError::TechnicalError { message, .. } => ManagementError::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ManagementError::not_found("Api", "api-1").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ManagementError::invalid_state("plans have been removed").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ManagementError::internal("boom").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_use_case_error() {
        let err: ManagementError = UseCaseError::invalid_state("NOT_PUBLISH_EVENT", "bad event").into();
        assert!(matches!(err, ManagementError::InvalidState { .. }));

        let err: ManagementError = UseCaseError::technical("db down").into();
        assert!(matches!(err, ManagementError::Internal { .. }));
    }
}
