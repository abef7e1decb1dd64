//! Metadata Service

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::entity::{Metadata, MetadataReferenceType};
use super::repository::MetadataRepository;
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct MetadataService {
    repo: Arc<dyn MetadataRepository>,
    audit: AuditService,
}

impl MetadataService {
    pub fn new(repo: Arc<dyn MetadataRepository>, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn find_by_api(&self, api_id: &str) -> Result<Vec<Metadata>> {
        self.repo.find_by_reference(MetadataReferenceType::Api, api_id).await
    }

    pub async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Metadata>> {
        self.repo.find_by_reference(MetadataReferenceType::Environment, environment_id).await
    }

    /// Create or update one API metadata entry. Returns whether anything was written.
    pub async fn upsert_api(&self, ctx: &ExecutionContext, desired: &Metadata) -> Result<bool> {
        let id = Metadata::id_for(MetadataReferenceType::Api, &desired.reference_id, &desired.key);
        match self.repo.find_by_id(&id).await? {
            Some(existing) if existing.same_content(desired) => Ok(false),
            Some(existing) => {
                let mut updated = existing.clone();
                updated.name = desired.name.clone();
                updated.format = desired.format;
                updated.value = desired.value.clone();
                updated.updated_at = Utc::now();
                self.repo.update(&updated).await?;
                self.audit
                    .log_api(ctx, &updated.reference_id, AuditEvent::MetadataUpdated, prop("METADATA", &updated.key), Some(&existing), Some(&updated))
                    .await?;
                debug!(api_id = %updated.reference_id, key = %updated.key, "Metadata updated");
                Ok(true)
            }
            None => {
                let mut created = desired.clone();
                created.id = id;
                created.reference_type = MetadataReferenceType::Api;
                self.repo.create(&created).await?;
                self.audit
                    .log_api(ctx, &created.reference_id, AuditEvent::MetadataCreated, prop("METADATA", &created.key), None, Some(&created))
                    .await?;
                debug!(api_id = %created.reference_id, key = %created.key, "Metadata created");
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLogRepository;
    use crate::metadata::entity::MetadataFormat;
    use crate::metadata::repository::InMemoryMetadataRepository;

    #[tokio::test]
    async fn test_upsert_api_is_idempotent() {
        let repo = Arc::new(InMemoryMetadataRepository::new());
        let service = MetadataService::new(repo.clone(), AuditService::new(Arc::new(InMemoryAuditLogRepository::new())));
        let ctx = ExecutionContext::create("admin", "org", "env");
        let team = Metadata::new(MetadataReferenceType::Api, "api-1", "team", "Team", MetadataFormat::String, Some("payments".into()));

        assert!(service.upsert_api(&ctx, &team).await.unwrap());
        assert!(!service.upsert_api(&ctx, &team).await.unwrap());
        assert_eq!(repo.write_count(), 1);

        let mut renamed = team.clone();
        renamed.value = Some("billing".into());
        assert!(service.upsert_api(&ctx, &renamed).await.unwrap());
        let stored = service.find_by_api("api-1").await.unwrap();
        assert_eq!(stored[0].value.as_deref(), Some("billing"));
    }
}
