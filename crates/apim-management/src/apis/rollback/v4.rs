//! Rollback of V4 and native APIs.

use tracing::{info, warn};

use crate::event::ApiSnapshot;
use crate::flow::{FlowReferenceType, FlowService};
use crate::plan::PlanService;
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct V4RollbackOperator {
    plans: PlanService,
    flows: FlowService,
}

impl V4RollbackOperator {
    pub fn new(plans: PlanService, flows: FlowService) -> Self {
        Self { plans, flows }
    }

    /// Restore plans and flows of `api_id` to `snapshot`. Plans that are not
    /// in the snapshot are closed; snapshot plans that no longer exist are
    /// reported as warnings.
    pub async fn rollback(&self, ctx: &ExecutionContext, api_id: &str, snapshot: &ApiSnapshot) -> Result<Vec<String>> {
        let current = self.plans.find_by_api(api_id).await?;
        let mut warnings = Vec::new();

        for plan in &current {
            match snapshot.plan(&plan.id) {
                Some(target) => {
                    self.plans
                        .restore(ctx, plan, &target.plan, Some(&target.flows))
                        .await?;
                }
                None if !plan.is_closed() => {
                    self.plans.close(ctx, plan).await?;
                }
                None => {}
            }
        }

        for target in &snapshot.plans {
            if !current.iter().any(|p| p.id == target.plan.id) {
                let message = format!("Plan [{}] no longer exists and was not restored", target.plan.name);
                warn!(api_id = %api_id, plan_id = %target.plan.id, "{}", message);
                warnings.push(message);
            }
        }

        self.flows
            .save_if_changed(FlowReferenceType::Api, api_id, &snapshot.api_flows)
            .await?;
        info!(api_id = %api_id, plans = snapshot.plans.len(), "V4 rollback applied");
        Ok(warnings)
    }
}
