//! Rollback of V2 APIs, including migrated APIs going back to V2.

use tracing::{debug, info, warn};

use crate::details;
use crate::event::ApiSnapshot;
use crate::flow::{FlowReferenceType, FlowService};
use crate::plan::{Plan, PlanService};
use crate::usecase::{ExecutionContext, UseCaseError};

/// What a rollback does to one stored plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Not in the snapshot.
    Close,
    /// Closed now, open in the snapshot.
    Reopen,
    Rollback,
}

#[derive(Debug, Default)]
pub struct PlanPartition {
    pub close: Vec<Plan>,
    pub reopen: Vec<Plan>,
    pub rollback: Vec<Plan>,
}

/// Sort stored plans into close, reopen and rollback buckets. Plans already
/// closed and absent from the snapshot are left alone.
pub fn partition(current: Vec<Plan>, snapshot: &ApiSnapshot) -> PlanPartition {
    let mut partition = PlanPartition::default();
    for plan in current {
        let action = match snapshot.plan(&plan.id) {
            None if plan.is_closed() => continue,
            None => PlanAction::Close,
            Some(target) if plan.is_closed() && !target.plan.is_closed() => PlanAction::Reopen,
            Some(_) => PlanAction::Rollback,
        };
        match action {
            PlanAction::Close => partition.close.push(plan),
            PlanAction::Reopen => partition.reopen.push(plan),
            PlanAction::Rollback => partition.rollback.push(plan),
        }
    }
    partition
}

/// One warning per closed plan the rollback brings back, since its
/// subscriptions stay closed.
pub fn reopen_warnings(reopen: &[Plan]) -> Vec<String> {
    reopen
        .iter()
        .map(|plan| format!("Plan [{}] was closed and has been reopened", plan.name))
        .collect()
}

#[derive(Clone)]
pub struct V2RollbackOperator {
    plans: PlanService,
    flows: FlowService,
}

impl V2RollbackOperator {
    pub fn new(plans: PlanService, flows: FlowService) -> Self {
        Self { plans, flows }
    }

    /// Every snapshot plan must still exist, or the rollback is refused
    /// before anything is written.
    pub async fn rollback(
        &self,
        ctx: &ExecutionContext,
        api_id: &str,
        snapshot: &ApiSnapshot,
    ) -> Result<Vec<String>, UseCaseError> {
        let buckets = partition(self.plans.find_by_api(api_id).await?, snapshot);
        let restorable = buckets.rollback.len() + buckets.reopen.len();
        if restorable < snapshot.plans.len() {
            return Err(UseCaseError::invalid_state_with_details(
                "PLANS_REMOVED",
                "Cannot rollback: plans have been removed since this deployment",
                details! { "expected" => snapshot.plans.len(), "found" => restorable },
            ));
        }
        debug!(
            api_id = %api_id,
            close = buckets.close.len(),
            reopen = buckets.reopen.len(),
            rollback = buckets.rollback.len(),
            "V2 rollback plan partition"
        );

        for plan in &buckets.close {
            self.plans.close(ctx, plan).await?;
        }
        for plan in buckets.rollback.iter().chain(buckets.reopen.iter()) {
            if let Some(target) = snapshot.plan(&plan.id) {
                self.plans.restore(ctx, plan, &target.plan, None).await?;
            }
        }

        self.flows
            .save_if_changed(FlowReferenceType::Api, api_id, &snapshot.api_flows)
            .await?;
        for target in &snapshot.plans {
            self.flows
                .save_if_changed(FlowReferenceType::Plan, &target.plan.id, &target.flows)
                .await?;
        }
        for plan in &buckets.close {
            self.flows.clear(FlowReferenceType::Plan, &plan.id).await?;
        }

        let warnings = reopen_warnings(&buckets.reopen);
        for warning in &warnings {
            warn!(api_id = %api_id, "{}", warning);
        }
        info!(api_id = %api_id, plans = snapshot.plans.len(), "V2 rollback applied");
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::{ApiDefinition, ApiDefinitionV1, DefinitionVersion};
    use crate::apis::entity::Api;
    use crate::event::PlanSnapshot;
    use crate::plan::PlanStatus;

    fn plan(id: &str, status: PlanStatus) -> Plan {
        let mut plan = Plan::new(id, "api-1", id, DefinitionVersion::V2);
        plan.status = status;
        plan
    }

    fn snapshot(plans: Vec<Plan>) -> ApiSnapshot {
        ApiSnapshot {
            api: Api::new("api-1", "c", "env", "org", "A", "1", ApiDefinition::V1(ApiDefinitionV1::default())),
            api_flows: vec![],
            plans: plans.into_iter().map(|plan| PlanSnapshot { plan, flows: vec![] }).collect(),
        }
    }

    #[test]
    fn test_partition_buckets() {
        let target = snapshot(vec![plan("a", PlanStatus::Published), plan("b", PlanStatus::Published)]);
        let current = vec![
            plan("a", PlanStatus::Deprecated),
            plan("b", PlanStatus::Closed),
            plan("c", PlanStatus::Published),
            plan("d", PlanStatus::Closed),
        ];

        let buckets = partition(current, &target);
        let ids = |plans: &[Plan]| plans.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&buckets.rollback), vec!["a"]);
        assert_eq!(ids(&buckets.reopen), vec!["b"]);
        assert_eq!(ids(&buckets.close), vec!["c"]);
    }

    #[test]
    fn test_only_reopened_plans_are_reported() {
        let target = snapshot(vec![plan("a", PlanStatus::Published), plan("b", PlanStatus::Published)]);
        let buckets = partition(
            vec![plan("a", PlanStatus::Published), plan("b", PlanStatus::Closed)],
            &target,
        );

        assert_eq!(
            reopen_warnings(&buckets.reopen),
            vec!["Plan [b] was closed and has been reopened".to_string()]
        );

        let untouched = partition(
            vec![plan("a", PlanStatus::Published), plan("b", PlanStatus::Deprecated)],
            &target,
        );
        assert!(reopen_warnings(&untouched.reopen).is_empty());
    }

    #[test]
    fn test_partition_detects_removed_plans() {
        let target = snapshot(vec![plan("a", PlanStatus::Published), plan("gone", PlanStatus::Published)]);
        let buckets = partition(vec![plan("a", PlanStatus::Published)], &target);
        assert!(buckets.rollback.len() + buckets.reopen.len() < target.plans.len());
    }
}
