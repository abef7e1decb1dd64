//! Execution Context
//!
//! Carries the principal, the tenancy (organization and environment) and the
//! correlation id through one use case execution. Audit logs and deployment
//! events take their `user` and environment from here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for distributed tracing (usually from the original request)
    pub correlation_id: String,
    /// ID of the principal performing the action
    pub principal_id: String,
    pub organization_id: String,
    pub environment_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create a context for a fresh request; the correlation id starts as the execution id.
    pub fn create(
        principal_id: impl Into<String>,
        organization_id: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Self {
        let exec_id = format!("exec-{}", Uuid::new_v4().simple());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            principal_id: principal_id.into(),
            organization_id: organization_id.into(),
            environment_id: environment_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Keep an upstream correlation id (for example from `X-Correlation-ID`).
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Same execution, different target environment.
    pub fn with_environment(&self, environment_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_context() {
        let ctx = ExecutionContext::create("user-123", "DEFAULT", "env-1");

        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.principal_id, "user-123");
        assert_eq!(ctx.correlation_id, ctx.execution_id);
        assert_eq!(ctx.environment_id, "env-1");
    }

    #[test]
    fn test_with_correlation() {
        let ctx = ExecutionContext::create("user-123", "DEFAULT", "env-1").with_correlation("corr-456");
        assert_eq!(ctx.correlation_id, "corr-456");
    }

    #[test]
    fn test_with_environment_keeps_execution() {
        let ctx = ExecutionContext::create("user-123", "DEFAULT", "env-1");
        let other = ctx.with_environment("env-2");
        assert_eq!(other.execution_id, ctx.execution_id);
        assert_eq!(other.environment_id, "env-2");
        assert_eq!(other.principal_id, "user-123");
    }
}
