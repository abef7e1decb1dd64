//! Common API types and utilities

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::usecase::UseCaseError;

/// Standard API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for UseCaseError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = %self.code(), message = %self.message(), "Use case failed with a technical error");
        }

        let details = match self.details() {
            d if d.is_empty() => None,
            d => serde_json::to_value(d).ok(),
        };
        let body = ApiError {
            error: self.code().to_string(),
            message: self.message().to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details;

    #[test]
    fn test_use_case_error_status() {
        let resp = UseCaseError::invalid_state_with_details(
            "PLANS_REMOVED",
            "plans have been removed",
            details! { "expected" => 2 },
        )
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = UseCaseError::not_found("EVENT_NOT_FOUND", "missing").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
