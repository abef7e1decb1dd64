//! Reconciliation Engine
//!
//! Applies a validated [`DesiredApi`] to the stored state of one API. Writes
//! are ordered API, plans, members, pages, metadata. Every step compares
//! before writing, so a second pass over the same desired state writes
//! nothing; a pass interrupted by a failure is finished by running it again.

mod members;
mod pages;
mod plans;

use std::collections::BTreeMap;

use tracing::info;

use crate::apis::desired::DesiredApi;
use crate::apis::entity::Api;
use crate::apis::service::ApiService;
use crate::audit::AuditEvent;
use crate::flow::{FlowReferenceType, FlowService};
use crate::membership::MembershipService;
use crate::metadata::MetadataService;
use crate::page::PageService;
use crate::plan::PlanService;
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

/// What a reconciliation pass did.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub api: Api,
    pub created: bool,
    /// Plan key to plan id.
    pub plan_ids: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ApiReconciler {
    apis: ApiService,
    plans: PlanService,
    flows: FlowService,
    memberships: MembershipService,
    pages: PageService,
    metadata: MetadataService,
}

impl ApiReconciler {
    pub fn new(
        apis: ApiService,
        plans: PlanService,
        flows: FlowService,
        memberships: MembershipService,
        pages: PageService,
        metadata: MetadataService,
    ) -> Self {
        Self {
            apis,
            plans,
            flows,
            memberships,
            pages,
            metadata,
        }
    }

    /// Create API `api_id` from `desired`. The caller becomes primary owner.
    pub async fn create(&self, ctx: &ExecutionContext, api_id: &str, mut desired: DesiredApi) -> Result<Reconciled> {
        desired.normalize_plan_order(|_| false);
        let mut warnings = Vec::new();

        let api = desired.to_api(api_id, &ctx.environment_id, &ctx.organization_id);
        let api = self.apis.create(ctx, api).await?;
        self.flows
            .save_if_changed(FlowReferenceType::Api, &api.id, &desired.api_flows)
            .await?;

        let plan_ids = self.create_plans(ctx, &api, &desired, &mut warnings).await?;

        self.memberships.create_primary_owner(ctx, &api.id).await?;
        if let Some(members) = &desired.members {
            self.reconcile_members(ctx, &api, members).await?;
        }
        if let Some(pages) = &desired.pages {
            self.reconcile_pages(ctx, &api, pages).await?;
        }
        self.import_metadata(ctx, &api, &desired).await?;

        info!(api_id = %api.id, plans = plan_ids.len(), warnings = warnings.len(), "API reconciled (created)");
        Ok(Reconciled {
            api,
            created: true,
            plan_ids,
            warnings,
        })
    }

    /// Bring `existing` in line with `desired`.
    pub async fn update(&self, ctx: &ExecutionContext, existing: &Api, mut desired: DesiredApi) -> Result<Reconciled> {
        let mut warnings = Vec::new();

        let merged = desired.merge_into(existing);
        let (api, _) = self.apis.update(ctx, existing, merged, AuditEvent::ApiUpdated).await?;
        self.flows
            .save_if_changed(FlowReferenceType::Api, &api.id, &desired.api_flows)
            .await?;

        let plan_ids = self.update_plans(ctx, &api, &mut desired, &mut warnings).await?;
        self.plans.reorder(&api.id).await?;

        if let Some(members) = &desired.members {
            self.reconcile_members(ctx, &api, members).await?;
        }
        if let Some(pages) = &desired.pages {
            self.reconcile_pages(ctx, &api, pages).await?;
        }
        self.import_metadata(ctx, &api, &desired).await?;

        info!(api_id = %api.id, plans = plan_ids.len(), warnings = warnings.len(), "API reconciled (updated)");
        Ok(Reconciled {
            api,
            created: false,
            plan_ids,
            warnings,
        })
    }

    async fn import_metadata(&self, ctx: &ExecutionContext, api: &Api, desired: &DesiredApi) -> Result<()> {
        for entry in &desired.metadata {
            self.metadata.upsert_api(ctx, &entry.to_metadata(&api.id)).await?;
        }
        Ok(())
    }
}
