//! Plan reconciliation.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use super::ApiReconciler;
use crate::apis::desired::{DesiredApi, DesiredPlan};
use crate::apis::entity::Api;
use crate::plan::{Plan, PlanStatus};
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

impl ApiReconciler {
    pub(super) async fn create_plans(
        &self,
        ctx: &ExecutionContext,
        api: &Api,
        desired: &DesiredApi,
        warnings: &mut Vec<String>,
    ) -> Result<BTreeMap<String, String>> {
        let mut plan_ids = BTreeMap::new();
        for desired_plan in &desired.plans {
            let id = desired_plan.resolve_id(&api.id);
            if desired_plan.status == PlanStatus::Closed {
                warnings.push(closed_on_create(desired_plan));
                continue;
            }
            self.plans
                .create(ctx, self.build_plan(api, desired_plan, &id), &desired_plan.flows)
                .await?;
            plan_ids.insert(desired_plan.key.clone(), id);
        }
        Ok(plan_ids)
    }

    /// Update matching plans, create new ones, then close and delete the
    /// stored plans the desired state no longer lists.
    pub(super) async fn update_plans(
        &self,
        ctx: &ExecutionContext,
        api: &Api,
        desired: &mut DesiredApi,
        warnings: &mut Vec<String>,
    ) -> Result<BTreeMap<String, String>> {
        let existing: BTreeMap<String, Plan> = self
            .plans
            .find_by_api(&api.id)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        desired.normalize_plan_order(|p| {
            existing
                .get(&p.resolve_id(&api.id))
                .is_some_and(Plan::is_closed)
        });

        let mut plan_ids = BTreeMap::new();
        let mut processed = HashSet::new();

        for desired_plan in &desired.plans {
            let id = desired_plan.resolve_id(&api.id);
            match existing.get(&id) {
                Some(current) if current.is_closed() => {
                    processed.insert(id.clone());
                    if desired_plan.status != PlanStatus::Closed {
                        let message = format!(
                            "Plan [{}] is closed and cannot be updated",
                            desired_plan.key
                        );
                        warn!(api_id = %api.id, plan_id = %id, "{}", message);
                        warnings.push(message);
                    }
                    plan_ids.insert(desired_plan.key.clone(), id);
                }
                Some(current) => {
                    processed.insert(id.clone());
                    if desired_plan.status == PlanStatus::Closed {
                        self.plans.close(ctx, current).await?;
                    } else {
                        let target = self.build_plan(api, desired_plan, &id);
                        self.plans
                            .update(ctx, current, &target, Some(&desired_plan.flows))
                            .await?;
                    }
                    plan_ids.insert(desired_plan.key.clone(), id);
                }
                None => {
                    if desired_plan.status == PlanStatus::Closed {
                        warnings.push(closed_on_create(desired_plan));
                        continue;
                    }
                    self.plans
                        .create(ctx, self.build_plan(api, desired_plan, &id), &desired_plan.flows)
                        .await?;
                    processed.insert(id.clone());
                    plan_ids.insert(desired_plan.key.clone(), id);
                }
            }
        }

        for (id, plan) in &existing {
            if processed.contains(id) {
                continue;
            }
            debug!(api_id = %api.id, plan_id = %id, "Plan no longer desired");
            self.plans.close_and_delete(ctx, plan).await?;
        }

        Ok(plan_ids)
    }

    fn build_plan(&self, api: &Api, desired_plan: &DesiredPlan, id: &str) -> Plan {
        desired_plan.to_plan(id, &api.id, api.definition_version())
    }
}

fn closed_on_create(plan: &DesiredPlan) -> String {
    format!("Plan [{}] is declared closed and has not been created", plan.key)
}
