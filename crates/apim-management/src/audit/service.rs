//! Audit Service
//!
//! Centralized audit logging for management plane mutations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::entity::{AuditEvent, AuditLog, AuditReferenceType};
use super::repository::AuditLogRepository;
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct AuditService {
    repo: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<dyn AuditLogRepository>) -> Self {
        Self { repo }
    }

    /// Record an event on an API, serializing the before/after values as JSON.
    pub async fn log_api<T: Serialize>(
        &self,
        ctx: &ExecutionContext,
        api_id: &str,
        event: AuditEvent,
        properties: BTreeMap<String, String>,
        old_value: Option<&T>,
        new_value: Option<&T>,
    ) -> Result<()> {
        let mut log = AuditLog::new(
            &ctx.organization_id,
            &ctx.environment_id,
            AuditReferenceType::Api,
            api_id,
            event,
            &ctx.principal_id,
        );
        log.properties = properties;
        log.old_value = old_value.map(serde_json::to_string).transpose()?;
        log.new_value = new_value.map(serde_json::to_string).transpose()?;

        self.repo.create(&log).await?;
        debug!(api_id = %api_id, event = ?event, user = %ctx.principal_id, "Audit log recorded");
        Ok(())
    }

    pub async fn find_for_api(&self, api_id: &str) -> Result<Vec<AuditLog>> {
        self.repo.find_by_reference(AuditReferenceType::Api, api_id).await
    }
}

/// Property map for one referenced entity, e.g. `prop("PLAN", &plan.id)`.
pub fn prop(key: &str, value: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert(key.to_string(), value.to_string());
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::repository::InMemoryAuditLogRepository;

    #[tokio::test]
    async fn test_log_api_serializes_values() {
        let repo = Arc::new(InMemoryAuditLogRepository::new());
        let service = AuditService::new(repo.clone());
        let ctx = ExecutionContext::create("admin", "org", "env");

        service
            .log_api(&ctx, "api-1", AuditEvent::ApiUpdated, prop("PLAN", "p1"), Some(&"old"), Some(&"new"))
            .await
            .unwrap();

        let logs = service.find_for_api("api-1").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, AuditEvent::ApiUpdated);
        assert_eq!(logs[0].user, "admin");
        assert_eq!(logs[0].old_value.as_deref(), Some("\"old\""));
        assert_eq!(logs[0].new_value.as_deref(), Some("\"new\""));
        assert_eq!(logs[0].properties.get("PLAN").map(String::as_str), Some("p1"));
    }
}
