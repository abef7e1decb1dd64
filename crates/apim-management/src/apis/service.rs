//! API Service
//!
//! Writes to the API aggregate. Content updates are compared before they are
//! written, so reconciling an unchanged API costs no write.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::entity::Api;
use super::repository::{ApiQuery, ApiRepository};
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::shared::error::{ManagementError, Result};
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct ApiService {
    repo: Arc<dyn ApiRepository>,
    audit: AuditService,
}

impl ApiService {
    pub fn new(repo: Arc<dyn ApiRepository>, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    /// Load an API, failing with `NotFound`.
    pub async fn get(&self, id: &str) -> Result<Api> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ManagementError::not_found("Api", id))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Api>> {
        self.repo.find_by_id(id).await
    }

    pub async fn find_by_cross_id(&self, cross_id: &str, environment_id: &str) -> Result<Option<Api>> {
        self.repo.find_by_cross_id(cross_id, environment_id).await
    }

    pub async fn exists_by_id(&self, id: &str) -> Result<bool> {
        self.repo.exists_by_id(id).await
    }

    pub async fn search(&self, query: &ApiQuery) -> Result<Vec<Api>> {
        self.repo.search(query).await
    }

    pub async fn create(&self, ctx: &ExecutionContext, mut api: Api) -> Result<Api> {
        let now = Utc::now();
        api.created_at = now;
        api.updated_at = now;
        self.repo.create(&api).await?;
        self.audit
            .log_api(ctx, &api.id, AuditEvent::ApiCreated, prop("API", &api.id), None, Some(&api))
            .await?;
        info!(
            api_id = %api.id,
            cross_id = %api.cross_id,
            definition_version = %api.definition_version(),
            "API created"
        );
        Ok(api)
    }

    /// Store `updated` when its content differs from `existing`, auditing the
    /// change under `event`. Returns the stored API and whether it was written.
    pub async fn update(
        &self,
        ctx: &ExecutionContext,
        existing: &Api,
        mut updated: Api,
        event: AuditEvent,
    ) -> Result<(Api, bool)> {
        if updated.same_content(existing) {
            return Ok((existing.clone(), false));
        }
        updated.updated_at = Utc::now();
        self.repo.update(&updated).await?;
        self.audit
            .log_api(ctx, &updated.id, event, prop("API", &updated.id), Some(existing), Some(&updated))
            .await?;
        info!(api_id = %updated.id, event = ?event, "API updated");
        Ok((updated, true))
    }

    /// Persist lifecycle and deployment fields without a content audit entry.
    pub(crate) async fn save_state(&self, api: &Api) -> Result<()> {
        self.repo.update(api).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::{ApiDefinition, ApiDefinitionV1};
    use crate::apis::repository::InMemoryApiRepository;
    use crate::audit::InMemoryAuditLogRepository;

    #[tokio::test]
    async fn test_update_unchanged_api_writes_nothing() {
        let repo = Arc::new(InMemoryApiRepository::new());
        let service = ApiService::new(repo.clone(), AuditService::new(Arc::new(InMemoryAuditLogRepository::new())));
        let ctx = ExecutionContext::create("admin", "org", "env");
        let api = Api::new("api-1", "cross-1", "env", "org", "Legacy", "1", ApiDefinition::V1(ApiDefinitionV1::default()));

        let created = service.create(&ctx, api).await.unwrap();
        let (_, changed) = service.update(&ctx, &created, created.clone(), AuditEvent::ApiUpdated).await.unwrap();
        assert!(!changed);
        assert_eq!(repo.write_count(), 1);

        let mut renamed = created.clone();
        renamed.name = "Legacy v2".into();
        let (stored, changed) = service.update(&ctx, &created, renamed, AuditEvent::ApiUpdated).await.unwrap();
        assert!(changed);
        assert_eq!(stored.name, "Legacy v2");
        assert!(matches!(service.get("nope").await.unwrap_err(), ManagementError::NotFound { .. }));
    }
}
