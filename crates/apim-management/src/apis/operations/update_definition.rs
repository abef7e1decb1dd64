//! Update API Definition Use Case
//!
//! Reconciles an existing API against an exported definition. Nothing is
//! deployed; the API shows as out of sync until someone deploys it.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::import_definition::ApiImported;
use super::load_api;
use crate::apis::entity::Origin;
use crate::apis::import_definition::ImportDefinition;
use crate::details;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiDefinitionCommand {
    pub api_id: String,
    pub definition: ImportDefinition,
}

pub struct UpdateApiDefinitionUseCase {
    services: DomainServices,
}

impl UpdateApiDefinitionUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: UpdateApiDefinitionCommand, ctx: ExecutionContext) -> UseCaseResult<ApiImported> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: UpdateApiDefinitionCommand, ctx: &ExecutionContext) -> Result<ApiImported, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;

        if api.definition_context.origin == Origin::Kubernetes {
            return Err(UseCaseError::invalid_state(
                "API_MANAGED_BY_KUBERNETES",
                format!("API [{}] is managed by Kubernetes and cannot be updated from an import", api.id),
            ));
        }
        let definition = command.definition;
        if definition.api.cross_id != api.cross_id {
            return Err(UseCaseError::validation_with_details(
                "CROSS_ID_MISMATCH",
                "The imported definition belongs to another API",
                details! { "expected" => api.cross_id, "actual" => definition.api.cross_id },
            ));
        }
        if definition.api.definition.version() != api.definition_version() {
            return Err(UseCaseError::invalid_state_with_details(
                "DEFINITION_VERSION_MISMATCH",
                "An import cannot change the definition version of an API",
                details! {
                    "current" => api.definition_version().to_string(),
                    "imported" => definition.api.definition.version().to_string(),
                },
            ));
        }

        let mut desired = definition.into_desired();
        desired.definition_context = api.definition_context;

        let validated = self.services.validator.validate(ctx, &api.id, desired).await?;
        let (desired, mut warnings) = validated.into_result()?;
        let reconciled = self.services.reconciler.update(ctx, &api, desired).await?;
        warnings.extend(reconciled.warnings);

        info!(api_id = %api.id, "API definition updated from import");
        Ok(ApiImported {
            api_id: reconciled.api.id,
            cross_id: reconciled.api.cross_id,
            plans: reconciled.plan_ids,
            warnings,
        })
    }
}
