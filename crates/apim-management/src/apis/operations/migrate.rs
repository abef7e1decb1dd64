//! Migrate API Use Case
//!
//! Moves a V2 API to the V4 definition. Plans, flows and the API are written
//! only when the mode allows it for the computed state.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::load_api;
use crate::apis::definition::ApiDefinition;
use crate::apis::migration::{self, mapper, MigrationMode, MigrationResult, MigrationState};
use crate::audit::AuditEvent;
use crate::flow::FlowReferenceType;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateApiCommand {
    pub api_id: String,
    #[serde(default)]
    pub mode: MigrationMode,
}

pub struct MigrateApiUseCase {
    services: DomainServices,
}

impl MigrateApiUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: MigrateApiCommand, ctx: ExecutionContext) -> UseCaseResult<MigrationResult> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: MigrateApiCommand, ctx: &ExecutionContext) -> Result<MigrationResult, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;

        let api_flows = self.services.flows.api_flows(&api.id).await?;
        let mut plans = Vec::new();
        for plan in self.services.plans.find_by_api(&api.id).await? {
            let flows = self.services.flows.plan_flows(&plan.id).await?;
            plans.push((plan, flows));
        }

        let synchronized = match api.definition {
            ApiDefinition::V2(_) => self.services.state.is_synchronized(&api).await?,
            _ => true,
        };
        let all_flows = api_flows.iter().chain(plans.iter().flat_map(|(_, flows)| flows.iter()));
        let issues = migration::check(&api, synchronized, all_flows, &self.services.config.migration);
        let state = migration::overall_state(&issues);

        if !command.mode.persists(state) {
            info!(api_id = %api.id, state = ?state, mode = ?command.mode, "API migration not applied");
            return Ok(MigrationResult {
                api_id: api.id,
                state,
                issues,
            });
        }
        let ApiDefinition::V2(v2) = &api.definition else {
            return Err(UseCaseError::invalid_state("MIGRATION_IMPOSSIBLE", "Only V2 APIs can be migrated"));
        };

        for (plan, flows) in &plans {
            self.services
                .plans
                .migrate(ctx, plan, &mapper::map_plan(plan), &mapper::map_flows(flows))
                .await?;
        }
        self.services
            .flows
            .save_if_changed(FlowReferenceType::Api, &api.id, &mapper::map_flows(&api_flows))
            .await?;

        let mut migrated = api.clone();
        migrated.definition = ApiDefinition::V4(mapper::map_definition(v2));
        self.services
            .apis
            .update(ctx, &api, migrated, AuditEvent::ApiMigrated)
            .await?;

        info!(api_id = %api.id, plans = plans.len(), issues = issues.len(), "API migrated to V4");
        Ok(MigrationResult {
            api_id: api.id,
            state: MigrationState::Migrated,
            issues,
        })
    }
}
