//! Use Case Errors
//!
//! Categorized error types for use case failures, one variant per failure
//! kind. Domain failures raised by repositories and services keep their kind
//! when they cross the use case boundary; everything else becomes a
//! `TechnicalError`.
//!
//! ```ignore
//! UseCaseError::invalid_state_with_details(
//!     "NOT_A_PUBLISH_EVENT",
//!     "Rollback target must be a PUBLISH_API event",
//!     details! { "eventId" => event_id },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::error::ManagementError;

/// Macro for creating error detail maps.
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

/// Categorized error types for use case failures.
///
/// - `ValidationError` -> 400 Bad Request (severe validation only)
/// - `NotFoundError` -> 404 Not Found
/// - `InvalidState` -> 409 Conflict
/// - `TechnicalError` -> 500 Internal Server Error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    NotFoundError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// The request is well-formed but the stored state forbids it
    /// (rollback to a non-publish event, plans removed since a snapshot).
    InvalidState {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Unexpected lower-layer failure.
    TechnicalError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn invalid_state(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn invalid_state_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::InvalidState {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn technical(message: impl Into<String>) -> Self {
        Self::TechnicalError {
            code: "TECHNICAL_ERROR".to_string(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. } => code,
            Self::NotFoundError { code, .. } => code,
            Self::InvalidState { code, .. } => code,
            Self::TechnicalError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. } => message,
            Self::NotFoundError { message, .. } => message,
            Self::InvalidState { message, .. } => message,
            Self::TechnicalError { message, .. } => message,
        }
    }

    pub fn details(&self) -> &HashMap<String, serde_json::Value> {
        match self {
            Self::ValidationError { details, .. } => details,
            Self::NotFoundError { details, .. } => details,
            Self::InvalidState { details, .. } => details,
            Self::TechnicalError { details, .. } => details,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } => 400,
            Self::NotFoundError { .. } => 404,
            Self::InvalidState { .. } => 409,
            Self::TechnicalError { .. } => 500,
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}

/// `FlowSet` becomes `FLOW_SET`.
fn code_prefix(entity_type: &str) -> String {
    let mut prefix = String::with_capacity(entity_type.len() + 4);
    for (i, c) in entity_type.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            prefix.push('_');
        }
        prefix.push(c.to_ascii_uppercase());
    }
    prefix
}

impl From<ManagementError> for UseCaseError {
    fn from(err: ManagementError) -> Self {
        match err {
            ManagementError::NotFound { entity_type, id } => Self::NotFoundError {
                code: format!("{}_NOT_FOUND", code_prefix(&entity_type)),
                message: format!("{} [{}] cannot be found", entity_type, id),
                details: details! { "id" => id },
            },
            ManagementError::Duplicate { entity_type, id } => Self::InvalidState {
                code: format!("{}_ALREADY_EXISTS", code_prefix(&entity_type)),
                message: format!("{} [{}] already exists", entity_type, id),
                details: details! { "id" => id },
            },
            ManagementError::Validation { message } => Self::validation("VALIDATION_FAILED", message),
            ManagementError::InvalidState { message } => Self::invalid_state("INVALID_STATE", message),
            other => {
                tracing::error!(error = %other, "Technical failure in use case");
                Self::technical(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = UseCaseError::validation("NAME_REQUIRED", "Name is required");
        assert_eq!(err.code(), "NAME_REQUIRED");
        assert_eq!(err.message(), "Name is required");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_invalid_state_with_details() {
        let err = UseCaseError::invalid_state_with_details(
            "PLANS_REMOVED",
            "plans have been removed",
            details! { "expected" => 3, "found" => 2 },
        );
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.details().get("expected"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_details_macro_empty() {
        let details: HashMap<String, serde_json::Value> = details!();
        assert!(details.is_empty());
    }

    #[test]
    fn test_domain_errors_keep_their_kind() {
        let err: UseCaseError = ManagementError::not_found("Api", "api-1").into();
        assert!(matches!(err, UseCaseError::NotFoundError { .. }));
        assert_eq!(err.code(), "API_NOT_FOUND");

        let err: UseCaseError = ManagementError::invalid_state("closed").into();
        assert!(matches!(err, UseCaseError::InvalidState { .. }));

        let err: UseCaseError = ManagementError::validation("bad parent").into();
        assert!(matches!(err, UseCaseError::ValidationError { .. }));
    }

    #[test]
    fn test_other_errors_become_technical() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: UseCaseError = ManagementError::from(json_err).into();
        assert!(matches!(err, UseCaseError::TechnicalError { .. }));
    }

    #[test]
    fn test_duplicate_is_a_conflict() {
        let err: UseCaseError = ManagementError::duplicate("Plan", "p1").into();
        assert!(matches!(err, UseCaseError::InvalidState { .. }));
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.code(), "PLAN_ALREADY_EXISTS");
        assert_eq!(err.details().get("id"), Some(&serde_json::json!("p1")));

        let err: UseCaseError = ManagementError::duplicate("FlowSet", "f1").into();
        assert_eq!(err.code(), "FLOW_SET_ALREADY_EXISTS");
    }
}
