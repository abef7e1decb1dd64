//! Membership Service

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::entity::{MemberType, Membership, MembershipReferenceType, PRIMARY_OWNER};
use super::repository::MembershipRepository;
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::shared::error::{ManagementError, Result};
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct MembershipService {
    repo: Arc<dyn MembershipRepository>,
    audit: AuditService,
}

impl MembershipService {
    pub fn new(repo: Arc<dyn MembershipRepository>, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn find_by_api(&self, api_id: &str) -> Result<Vec<Membership>> {
        self.repo.find_by_reference(MembershipReferenceType::Api, api_id).await
    }

    /// Make the caller primary owner of a newly created API.
    pub async fn create_primary_owner(&self, ctx: &ExecutionContext, api_id: &str) -> Result<Membership> {
        let membership = Membership::for_api(api_id, &ctx.principal_id, MemberType::User, PRIMARY_OWNER);
        self.create(ctx, membership).await
    }

    pub async fn create(&self, ctx: &ExecutionContext, membership: Membership) -> Result<Membership> {
        self.repo.create(&membership).await?;
        self.audit
            .log_api(
                ctx,
                &membership.reference_id,
                AuditEvent::MembershipCreated,
                prop("USER", &membership.member_id),
                None,
                Some(&membership),
            )
            .await?;
        info!(
            api_id = %membership.reference_id,
            member_id = %membership.member_id,
            role = %membership.role,
            "Membership created"
        );
        Ok(membership)
    }

    /// Change the role of a membership. Returns whether anything was written.
    pub async fn update_role(&self, ctx: &ExecutionContext, existing: &Membership, role: &str) -> Result<bool> {
        if existing.role == role {
            return Ok(false);
        }
        if existing.is_primary_owner() {
            return Err(ManagementError::invalid_state(format!(
                "Primary owner [{}] of API [{}] cannot change role",
                existing.member_id, existing.reference_id
            )));
        }

        let mut updated = existing.clone();
        updated.role = role.to_string();
        updated.updated_at = Utc::now();
        self.repo.update(&updated).await?;
        self.audit
            .log_api(
                ctx,
                &updated.reference_id,
                AuditEvent::MembershipUpdated,
                prop("USER", &updated.member_id),
                Some(existing),
                Some(&updated),
            )
            .await?;
        debug!(member_id = %updated.member_id, role = %role, "Membership role updated");
        Ok(true)
    }

    pub async fn delete(&self, ctx: &ExecutionContext, membership: &Membership) -> Result<()> {
        if membership.is_primary_owner() {
            return Err(ManagementError::invalid_state(format!(
                "Primary owner [{}] of API [{}] cannot be removed",
                membership.member_id, membership.reference_id
            )));
        }

        self.repo.delete(&membership.id).await?;
        self.audit
            .log_api(
                ctx,
                &membership.reference_id,
                AuditEvent::MembershipDeleted,
                prop("USER", &membership.member_id),
                Some(membership),
                None,
            )
            .await?;
        info!(
            api_id = %membership.reference_id,
            member_id = %membership.member_id,
            "Membership deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLogRepository;
    use crate::membership::repository::InMemoryMembershipRepository;

    fn service() -> (Arc<InMemoryMembershipRepository>, MembershipService) {
        let repo = Arc::new(InMemoryMembershipRepository::new());
        let service = MembershipService::new(
            repo.clone(),
            AuditService::new(Arc::new(InMemoryAuditLogRepository::new())),
        );
        (repo, service)
    }

    #[tokio::test]
    async fn test_primary_owner_cannot_be_deleted() {
        let (_, service) = service();
        let ctx = ExecutionContext::create("admin", "org", "env");
        let owner = service.create_primary_owner(&ctx, "api-1").await.unwrap();

        let err = service.delete(&ctx, &owner).await.unwrap_err();
        assert!(matches!(err, ManagementError::InvalidState { .. }));
        assert_eq!(service.find_by_api("api-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_role_same_role_is_noop() {
        let (repo, service) = service();
        let ctx = ExecutionContext::create("admin", "org", "env");
        let member = service
            .create(&ctx, Membership::for_api("api-1", "user-2", MemberType::User, "USER"))
            .await
            .unwrap();
        let writes = repo.write_count();

        assert!(!service.update_role(&ctx, &member, "USER").await.unwrap());
        assert_eq!(repo.write_count(), writes);
        assert!(service.update_role(&ctx, &member, "OWNER").await.unwrap());
    }
}
