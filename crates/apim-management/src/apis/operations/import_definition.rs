//! Import API Definition Use Case
//!
//! Creates a new API from an exported definition. Plan and page ids of the
//! source are not reused; new ones derive from the new API id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::apis::entity::DefinitionContext;
use crate::apis::import_definition::ImportDefinition;
use crate::details;
use crate::services::DomainServices;
use crate::shared::ids::derive_id;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiDefinitionCommand {
    pub definition: ImportDefinition,
}

/// Outcome of a definition import.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiImported {
    pub api_id: String,
    pub cross_id: String,
    /// Plan key to plan id.
    pub plans: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

pub struct ImportApiDefinitionUseCase {
    services: DomainServices,
}

impl ImportApiDefinitionUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: ImportApiDefinitionCommand, ctx: ExecutionContext) -> UseCaseResult<ApiImported> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: ImportApiDefinitionCommand, ctx: &ExecutionContext) -> Result<ApiImported, UseCaseError> {
        let cross_id = command.definition.api.cross_id.clone();
        let api_id = derive_id(&[&ctx.environment_id, "api", &cross_id]);

        let taken = self
            .services
            .apis
            .find_by_cross_id(&cross_id, &ctx.environment_id)
            .await?
            .is_some()
            || self.services.apis.exists_by_id(&api_id).await?;
        if taken {
            return Err(UseCaseError::invalid_state_with_details(
                "API_ALREADY_EXISTS",
                format!("An API with cross id [{cross_id}] already exists in this environment"),
                details! { "crossId" => cross_id, "environmentId" => ctx.environment_id },
            ));
        }

        let mut desired = command.definition.into_new_desired();
        desired.definition_context = DefinitionContext::default();

        let validated = self.services.validator.validate(ctx, &api_id, desired).await?;
        let (desired, mut warnings) = validated.into_result()?;
        let reconciled = self.services.reconciler.create(ctx, &api_id, desired).await?;
        warnings.extend(reconciled.warnings);

        info!(api_id = %api_id, cross_id = %cross_id, "API definition imported");
        Ok(ApiImported {
            api_id: reconciled.api.id,
            cross_id: reconciled.api.cross_id,
            plans: reconciled.plan_ids,
            warnings,
        })
    }
}
