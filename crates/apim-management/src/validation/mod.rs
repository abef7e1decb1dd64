//! Validation
//!
//! Validators sanitize a desired state and tag what they find with a
//! severity. Warnings travel with the result; severe errors stop the
//! operation before anything is written.

pub mod api;
pub mod members;
pub mod pages;
pub mod paths;
pub mod plans;

use serde::{Deserialize, Serialize};

use crate::details;
use crate::usecase::UseCaseError;

pub use api::ApiValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

/// A sanitized value and the issues found while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub issues: Vec<ValidationIssue>,
}

impl<T> Validated<T> {
    pub fn of(value: T) -> Self {
        Self { value, issues: vec![] }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    pub fn severe(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Severe,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, issues: Vec<ValidationIssue>) {
        self.issues.extend(issues);
    }

    fn messages(&self, severity: Severity) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| i.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warning)
    }

    pub fn severe_errors(&self) -> Vec<String> {
        self.messages(Severity::Severe)
    }

    pub fn has_severe(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Severe)
    }

    /// The value and its warnings, or a validation error listing every
    /// severe message.
    pub fn into_result(self) -> Result<(T, Vec<String>), UseCaseError> {
        let severe = self.severe_errors();
        if !severe.is_empty() {
            return Err(UseCaseError::validation_with_details(
                "INVALID_API",
                severe.join("; "),
                details! { "errors" => severe },
            ));
        }
        let warnings = self.warnings();
        Ok((self.value, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severe_errors_abort_with_all_messages() {
        let mut validated = Validated::of(());
        validated.warn("group [ops] not found");
        validated.severe("name is required");
        validated.severe("path [orders] is invalid");

        let err = validated.into_result().unwrap_err();
        assert_eq!(err.code(), "INVALID_API");
        assert!(err.message().contains("name is required"));
        assert!(err.message().contains("path [orders] is invalid"));
        assert_eq!(err.details()["errors"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_warnings_are_kept() {
        let mut validated = Validated::of(1);
        validated.warn("category [x] not found");
        let (value, warnings) = validated.into_result().unwrap();
        assert_eq!(value, 1);
        assert_eq!(warnings, vec!["category [x] not found".to_string()]);
    }
}
