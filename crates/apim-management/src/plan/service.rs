//! Plan Service
//!
//! The only writer of plans. Closed plans cannot be edited through
//! [`PlanService::update`]; rollback goes through [`PlanService::restore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::entity::Plan;
use super::repository::PlanRepository;
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::flow::{Flow, FlowReferenceType, FlowService};
use crate::shared::error::{ManagementError, Result};
use crate::subscription::SubscriptionService;
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct PlanService {
    repo: Arc<dyn PlanRepository>,
    subscriptions: SubscriptionService,
    flows: FlowService,
    audit: AuditService,
}

impl PlanService {
    pub fn new(
        repo: Arc<dyn PlanRepository>,
        subscriptions: SubscriptionService,
        flows: FlowService,
        audit: AuditService,
    ) -> Self {
        Self {
            repo,
            subscriptions,
            flows,
            audit,
        }
    }

    pub async fn find_by_api(&self, api_id: &str) -> Result<Vec<Plan>> {
        self.repo.find_by_api_id(api_id).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Plan>> {
        self.repo.find_by_id(id).await
    }

    pub async fn create(&self, ctx: &ExecutionContext, mut plan: Plan, flows: &[Flow]) -> Result<Plan> {
        let now = Utc::now();
        plan.created_at = now;
        plan.updated_at = now;
        if plan.status.is_deployable() && plan.published_at.is_none() {
            plan.published_at = Some(now);
        }

        self.repo.create(&plan).await?;
        if !flows.is_empty() {
            self.flows.save_if_changed(FlowReferenceType::Plan, &plan.id, flows).await?;
        }

        self.audit
            .log_api(ctx, &plan.api_id, AuditEvent::PlanCreated, prop("PLAN", &plan.id), None, Some(&plan))
            .await?;
        info!(api_id = %plan.api_id, plan_id = %plan.id, status = ?plan.status, "Plan created");
        Ok(plan)
    }

    /// Apply `desired` onto `existing`. Writes only when something differs;
    /// `flows = None` leaves the stored flows alone.
    pub async fn update(
        &self,
        ctx: &ExecutionContext,
        existing: &Plan,
        desired: &Plan,
        flows: Option<&[Flow]>,
    ) -> Result<bool> {
        if existing.is_closed() {
            return Err(ManagementError::invalid_state(format!(
                "Plan [{}] is closed and cannot be updated",
                existing.id
            )));
        }
        self.write_content(ctx, existing, desired, flows, AuditEvent::PlanUpdated).await
    }

    /// Roll a plan back (or reopen it) to a snapshot, whatever its current status.
    pub(crate) async fn restore(
        &self,
        ctx: &ExecutionContext,
        existing: &Plan,
        target: &Plan,
        flows: Option<&[Flow]>,
    ) -> Result<bool> {
        self.write_content(ctx, existing, target, flows, AuditEvent::PlanRestored).await
    }

    /// Rewrite a plan for another definition version, closed plans included.
    pub(crate) async fn migrate(
        &self,
        ctx: &ExecutionContext,
        existing: &Plan,
        migrated: &Plan,
        flows: &[Flow],
    ) -> Result<bool> {
        self.write_content(ctx, existing, migrated, Some(flows), AuditEvent::PlanUpdated).await
    }

    async fn write_content(
        &self,
        ctx: &ExecutionContext,
        existing: &Plan,
        desired: &Plan,
        flows: Option<&[Flow]>,
        event: AuditEvent,
    ) -> Result<bool> {
        let mut updated = existing.clone();
        updated.apply_content(desired);

        let mut changed = false;
        if !updated.same_content(existing) {
            updated.updated_at = Utc::now();
            self.repo.update(&updated).await?;
            self.audit
                .log_api(ctx, &updated.api_id, event, prop("PLAN", &updated.id), Some(existing), Some(&updated))
                .await?;
            info!(api_id = %updated.api_id, plan_id = %updated.id, status = ?updated.status, "Plan updated");
            changed = true;
        }

        if let Some(flows) = flows {
            changed |= self.flows.save_if_changed(FlowReferenceType::Plan, &updated.id, flows).await?;
        }
        Ok(changed)
    }

    /// Close the plan's active subscriptions, then the plan. No-op on a closed plan.
    pub async fn close(&self, ctx: &ExecutionContext, plan: &Plan) -> Result<Plan> {
        if plan.is_closed() {
            return Ok(plan.clone());
        }

        let closed_subscriptions = self
            .subscriptions
            .close_active_for_plan(&plan.id, "Plan has been closed")
            .await?;

        let mut closed = plan.clone();
        closed.set_status(super::entity::PlanStatus::Closed);
        closed.updated_at = Utc::now();
        self.repo.update(&closed).await?;

        self.audit
            .log_api(ctx, &plan.api_id, AuditEvent::PlanClosed, prop("PLAN", &plan.id), Some(plan), Some(&closed))
            .await?;
        info!(
            api_id = %plan.api_id,
            plan_id = %plan.id,
            closed_subscriptions,
            "Plan closed"
        );
        Ok(closed)
    }

    /// Delete a plan and its flows. Refused while subscriptions are active.
    pub async fn delete(&self, ctx: &ExecutionContext, plan: &Plan) -> Result<()> {
        if self.subscriptions.has_active(&plan.id).await? {
            return Err(ManagementError::invalid_state(format!(
                "Plan [{}] still has active subscriptions",
                plan.id
            )));
        }

        self.repo.delete(&plan.id).await?;
        self.flows.clear(FlowReferenceType::Plan, &plan.id).await?;
        self.audit
            .log_api(ctx, &plan.api_id, AuditEvent::PlanDeleted, prop("PLAN", &plan.id), Some(plan), None)
            .await?;
        info!(api_id = %plan.api_id, plan_id = %plan.id, "Plan deleted");
        Ok(())
    }

    /// Renumber the non-closed plans of an API 1..n by current order then name.
    /// Returns how many plans were rewritten.
    pub async fn reorder(&self, api_id: &str) -> Result<usize> {
        let mut plans: Vec<Plan> = self
            .repo
            .find_by_api_id(api_id)
            .await?
            .into_iter()
            .filter(|p| !p.is_closed())
            .collect();
        plans.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

        let mut rewritten = 0;
        for (index, mut plan) in plans.into_iter().enumerate() {
            let order = index as i32 + 1;
            if plan.order != order {
                plan.order = order;
                plan.updated_at = Utc::now();
                self.repo.update(&plan).await?;
                rewritten += 1;
            }
        }
        if rewritten > 0 {
            info!(api_id = %api_id, rewritten, "Plan order refreshed");
        }
        Ok(rewritten)
    }

    /// Close, then delete. Used when a plan disappears from a desired state.
    pub async fn close_and_delete(&self, ctx: &ExecutionContext, plan: &Plan) -> Result<()> {
        let closed = self.close(ctx, plan).await?;
        if let Err(e) = self.delete(ctx, &closed).await {
            warn!(plan_id = %plan.id, error = %e, "Plan closed but could not be deleted");
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::DefinitionVersion;
    use crate::audit::InMemoryAuditLogRepository;
    use crate::flow::InMemoryFlowRepository;
    use crate::plan::entity::PlanStatus;
    use crate::plan::repository::InMemoryPlanRepository;
    use crate::subscription::{InMemorySubscriptionRepository, Subscription, SubscriptionRepository, SubscriptionStatus};

    struct Fixture {
        plans: Arc<InMemoryPlanRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        service: PlanService,
        ctx: ExecutionContext,
    }

    fn fixture() -> Fixture {
        let plans = Arc::new(InMemoryPlanRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let service = PlanService::new(
            plans.clone(),
            SubscriptionService::new(subscriptions.clone()),
            FlowService::new(Arc::new(InMemoryFlowRepository::new())),
            AuditService::new(Arc::new(InMemoryAuditLogRepository::new())),
        );
        Fixture {
            plans,
            subscriptions,
            service,
            ctx: ExecutionContext::create("admin", "org", "env"),
        }
    }

    fn plan(id: &str, name: &str, order: i32) -> Plan {
        let mut plan = Plan::new(id, "api-1", name, DefinitionVersion::V4);
        plan.order = order;
        plan
    }

    #[tokio::test]
    async fn test_update_without_changes_writes_nothing() {
        let f = fixture();
        let created = f.service.create(&f.ctx, plan("p1", "Gold", 1), &[]).await.unwrap();
        let writes = f.plans.write_count();

        let changed = f.service.update(&f.ctx, &created, &created.clone(), Some(&[])).await.unwrap();
        assert!(!changed);
        assert_eq!(f.plans.write_count(), writes);
    }

    #[tokio::test]
    async fn test_update_closed_plan_is_invalid_state() {
        let f = fixture();
        let created = f.service.create(&f.ctx, plan("p1", "Gold", 1), &[]).await.unwrap();
        let closed = f.service.close(&f.ctx, &created).await.unwrap();

        let err = f.service.update(&f.ctx, &closed, &created, None).await.unwrap_err();
        assert!(matches!(err, ManagementError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_close_and_delete_closes_subscriptions_first() {
        let f = fixture();
        let mut published = plan("p1", "Gold", 1);
        published.status = PlanStatus::Published;
        let created = f.service.create(&f.ctx, published, &[]).await.unwrap();

        let mut sub = Subscription::new("api-1", "p1", "app-1");
        sub.accept();
        f.subscriptions.create(&sub).await.unwrap();

        assert!(f.service.delete(&f.ctx, &created).await.is_err());

        f.service.close_and_delete(&f.ctx, &created).await.unwrap();
        assert!(f.plans.find_by_id("p1").await.unwrap().is_none());
        let sub = f.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Closed);
    }

    #[tokio::test]
    async fn test_reorder_skips_closed_and_compacts() {
        let f = fixture();
        f.service.create(&f.ctx, plan("p1", "Bronze", 5), &[]).await.unwrap();
        let silver = f.service.create(&f.ctx, plan("p2", "Silver", 2), &[]).await.unwrap();
        f.service.create(&f.ctx, plan("p3", "Gold", 9), &[]).await.unwrap();
        f.service.close(&f.ctx, &silver).await.unwrap();

        assert_eq!(f.service.reorder("api-1").await.unwrap(), 2);
        let p1 = f.plans.find_by_id("p1").await.unwrap().unwrap();
        let p3 = f.plans.find_by_id("p3").await.unwrap().unwrap();
        assert_eq!((p1.order, p3.order), (1, 2));

        assert_eq!(f.service.reorder("api-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_restore_reopens_closed_plan() {
        let f = fixture();
        let mut published = plan("p1", "Gold", 1);
        published.status = PlanStatus::Published;
        let created = f.service.create(&f.ctx, published, &[]).await.unwrap();
        let closed = f.service.close(&f.ctx, &created).await.unwrap();

        assert!(f.service.restore(&f.ctx, &closed, &created, None).await.unwrap());
        let restored = f.plans.find_by_id("p1").await.unwrap().unwrap();
        assert_eq!(restored.status, PlanStatus::Published);
        assert!(restored.closed_at.is_none());
    }
}
