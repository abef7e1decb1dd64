//! Export API Definition Use Case

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::load_api;
use crate::apis::definition::ApiDefinition;
use crate::apis::desired::{DesiredMember, DesiredMetadata, DesiredPage, DesiredPlan};
use crate::apis::import_definition::{ExportedApi, ImportDefinition, EXPORT_VERSION};
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportApiDefinitionCommand {
    pub api_id: String,
}

pub struct ExportApiDefinitionUseCase {
    services: DomainServices,
}

impl ExportApiDefinitionUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: ExportApiDefinitionCommand, ctx: ExecutionContext) -> UseCaseResult<ImportDefinition> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: ExportApiDefinitionCommand, ctx: &ExecutionContext) -> Result<ImportDefinition, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;
        if let ApiDefinition::Federated(_) = api.definition {
            return Err(UseCaseError::invalid_state(
                "FEDERATED_API_NOT_EXPORTABLE",
                format!("API [{}] is federated and cannot be exported", api.id),
            ));
        }

        let mut plans = Vec::new();
        for plan in self.services.plans.find_by_api(&api.id).await? {
            let flows = self.services.flows.plan_flows(&plan.id).await?;
            plans.push(DesiredPlan::from_plan(&plan, flows));
        }

        let mut members = Vec::new();
        for membership in self.services.memberships.find_by_api(&api.id).await? {
            if membership.is_primary_owner() {
                continue;
            }
            if let Some(user) = self.services.users.find_by_id(&membership.member_id).await? {
                members.push(DesiredMember {
                    source: user.source,
                    source_id: user.source_id,
                    role: membership.role,
                    user_id: None,
                });
            }
        }

        let pages = self
            .services
            .pages
            .find_by_api(&api.id)
            .await?
            .iter()
            .map(DesiredPage::from_page)
            .collect();

        let metadata = self
            .services
            .metadata
            .find_by_api(&api.id)
            .await?
            .into_iter()
            .map(|m| DesiredMetadata {
                key: m.key,
                name: m.name,
                format: m.format,
                value: m.value,
            })
            .collect();

        let flows = self.services.flows.api_flows(&api.id).await?;
        debug!(api_id = %api.id, plans = plans.len(), "API definition exported");

        Ok(ImportDefinition {
            export_version: EXPORT_VERSION.to_string(),
            api: ExportedApi::from_api(&api),
            flows,
            plans,
            members: Some(members),
            pages: Some(pages),
            metadata,
        })
    }
}
