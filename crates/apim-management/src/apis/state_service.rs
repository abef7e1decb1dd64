//! API Lifecycle State Service
//!
//! Deploy publishes a snapshot of the API, its flows and its deployable plans
//! as a `PUBLISH_API` event. An API is synchronized when its current
//! deployment view equals the view of the last published snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::definition::ApiDefinition;
use super::entity::{Api, LifecycleState};
use super::service::ApiService;
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::event::entity::{DEPLOYMENT_LABEL, DEPLOYMENT_NUMBER, USER};
use crate::event::{ApiEvent, ApiEventType, ApiSnapshot, EventRepository, PlanSnapshot};
use crate::flow::{Flow, FlowService};
use crate::plan::{Plan, PlanService};
use crate::shared::error::{ManagementError, Result};
use crate::usecase::ExecutionContext;

/// The part of an API the gateway sees. Timestamps and lifecycle fields are
/// left out so that starting, stopping or re-saving does not count as drift.
#[derive(Debug, PartialEq)]
struct DeploymentView {
    name: String,
    version: String,
    definition: ApiDefinition,
    api_flows: Vec<Flow>,
    plans: Vec<PlanView>,
}

#[derive(Debug, PartialEq)]
struct PlanView {
    plan: Plan,
    flows: Vec<Flow>,
}

impl DeploymentView {
    fn of(snapshot: &ApiSnapshot) -> Self {
        let epoch = DateTime::<Utc>::default();
        let mut plans: Vec<PlanView> = snapshot
            .plans
            .iter()
            .map(|p| {
                let mut plan = p.plan.clone();
                plan.created_at = epoch;
                plan.updated_at = epoch;
                plan.published_at = None;
                plan.closed_at = None;
                PlanView {
                    plan,
                    flows: p.flows.clone(),
                }
            })
            .collect();
        plans.sort_by(|a, b| a.plan.id.cmp(&b.plan.id));

        Self {
            name: snapshot.api.name.clone(),
            version: snapshot.api.version.clone(),
            definition: snapshot.api.definition.clone(),
            api_flows: snapshot.api_flows.clone(),
            plans,
        }
    }
}

#[derive(Clone)]
pub struct ApiStateService {
    apis: ApiService,
    plans: PlanService,
    flows: FlowService,
    events: Arc<dyn EventRepository>,
    audit: AuditService,
    default_label: String,
}

impl ApiStateService {
    pub fn new(
        apis: ApiService,
        plans: PlanService,
        flows: FlowService,
        events: Arc<dyn EventRepository>,
        audit: AuditService,
        default_label: impl Into<String>,
    ) -> Self {
        Self {
            apis,
            plans,
            flows,
            events,
            audit,
            default_label: default_label.into(),
        }
    }

    /// Snapshot of what would be deployed right now.
    pub async fn current_snapshot(&self, api: &Api) -> Result<ApiSnapshot> {
        let mut plans = Vec::new();
        for plan in self.plans.find_by_api(&api.id).await? {
            if !plan.status.is_deployable() {
                continue;
            }
            let flows = self.flows.plan_flows(&plan.id).await?;
            plans.push(PlanSnapshot { plan, flows });
        }
        Ok(ApiSnapshot {
            api: api.clone(),
            api_flows: self.flows.api_flows(&api.id).await?,
            plans,
        })
    }

    /// Snapshot carried by the last `PUBLISH_API` event, if any.
    pub async fn deployed_snapshot(&self, api_id: &str) -> Result<Option<ApiSnapshot>> {
        match self.events.find_latest_by_api(api_id, ApiEventType::PublishApi).await? {
            Some(event) => event.snapshot(),
            None => Ok(None),
        }
    }

    /// Never-deployed APIs are not synchronized.
    pub async fn is_synchronized(&self, api: &Api) -> Result<bool> {
        let Some(deployed) = self.deployed_snapshot(&api.id).await? else {
            return Ok(false);
        };
        let current = self.current_snapshot(api).await?;
        let synchronized = DeploymentView::of(&current) == DeploymentView::of(&deployed);
        debug!(api_id = %api.id, synchronized, "API synchronization checked");
        Ok(synchronized)
    }

    pub async fn has_deployable_plan(&self, api_id: &str) -> Result<bool> {
        Ok(self
            .plans
            .find_by_api(api_id)
            .await?
            .iter()
            .any(|p| p.status.is_deployable()))
    }

    /// Publish the current state of the API to the gateway.
    pub async fn deploy(&self, ctx: &ExecutionContext, api: &Api, label: Option<&str>) -> Result<Api> {
        self.deploy_with(ctx, api, label, |_| {}).await
    }

    /// Deploy, letting `adjust` alter the published snapshot without touching
    /// the stored API.
    pub async fn deploy_with<F>(
        &self,
        ctx: &ExecutionContext,
        api: &Api,
        label: Option<&str>,
        adjust: F,
    ) -> Result<Api>
    where
        F: FnOnce(&mut ApiSnapshot),
    {
        if !api.definition.is_deployable() {
            return Err(ManagementError::invalid_state(format!(
                "API [{}] is a {} API and cannot be deployed",
                api.id,
                api.definition_version()
            )));
        }

        let mut deployed = api.clone();
        deployed.deployed_at = Some(Utc::now());
        self.apis.save_state(&deployed).await?;

        let mut snapshot = self.current_snapshot(&deployed).await?;
        adjust(&mut snapshot);

        let number = self
            .events
            .find_by_api(&api.id)
            .await?
            .iter()
            .filter(|e| e.event_type == ApiEventType::PublishApi)
            .count()
            + 1;
        let label = label.unwrap_or(&self.default_label);
        let event = ApiEvent::publish(&snapshot, &api.environment_id)?
            .with_property(DEPLOYMENT_NUMBER, number.to_string())
            .with_property(DEPLOYMENT_LABEL, label)
            .with_property(USER, ctx.principal_id.as_str());
        self.events.create(&event).await?;

        self.audit
            .log_api::<Api>(ctx, &api.id, AuditEvent::ApiDeployed, prop("EVENT", &event.id), None, None)
            .await?;
        info!(
            api_id = %api.id,
            event_id = %event.id,
            deployment_number = number,
            plans = snapshot.plans.len(),
            "API deployed"
        );
        Ok(deployed)
    }

    /// Start a deployed API. No-op when already started.
    pub async fn start(&self, ctx: &ExecutionContext, api: &Api) -> Result<Api> {
        if api.is_started() {
            return Ok(api.clone());
        }
        if !api.is_deployed() {
            return Err(ManagementError::invalid_state(format!(
                "API [{}] must be deployed before it can be started",
                api.id
            )));
        }
        if !self.has_deployable_plan(&api.id).await? {
            return Err(ManagementError::invalid_state(format!(
                "API [{}] has no published plan",
                api.id
            )));
        }
        self.transition(ctx, api, LifecycleState::Started).await
    }

    /// Stop an API. No-op when already stopped.
    pub async fn stop(&self, ctx: &ExecutionContext, api: &Api) -> Result<Api> {
        if !api.is_started() {
            return Ok(api.clone());
        }
        self.transition(ctx, api, LifecycleState::Stopped).await
    }

    async fn transition(&self, ctx: &ExecutionContext, api: &Api, state: LifecycleState) -> Result<Api> {
        let (event_type, audit_event) = match state {
            LifecycleState::Started => (ApiEventType::StartApi, AuditEvent::ApiStarted),
            LifecycleState::Stopped => (ApiEventType::StopApi, AuditEvent::ApiStopped),
        };

        let mut updated = api.clone();
        updated.lifecycle_state = state;
        updated.updated_at = Utc::now();
        self.apis.save_state(&updated).await?;

        let event = ApiEvent::new(&api.id, &api.environment_id, event_type)
            .with_property(USER, ctx.principal_id.as_str());
        self.events.create(&event).await?;
        self.audit
            .log_api::<Api>(ctx, &api.id, audit_event, prop("EVENT", &event.id), None, None)
            .await?;
        info!(api_id = %api.id, state = ?state, "API lifecycle state changed");
        Ok(updated)
    }
}
