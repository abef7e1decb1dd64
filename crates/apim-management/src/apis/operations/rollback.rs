//! Rollback API Use Case
//!
//! Restores an API, its plans and flows to the snapshot of a previous
//! deployment. The rolled-back API is not redeployed.

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::load_api;
use crate::apis::definition::{ApiDefinition, DefinitionVersion};
use crate::apis::rollback::{rebuild_api, V2RollbackOperator, V4RollbackOperator};
use crate::audit::{service::prop, AuditEvent};
use crate::details;
use crate::event::ApiEventType;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackApiCommand {
    pub api_id: String,
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiRolledBack {
    pub api_id: String,
    pub event_id: String,
    pub definition_version: DefinitionVersion,
    pub warnings: Vec<String>,
}

pub struct RollbackApiUseCase {
    services: DomainServices,
    v2: V2RollbackOperator,
    v4: V4RollbackOperator,
}

impl RollbackApiUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
            v2: V2RollbackOperator::new(services.plans.clone(), services.flows.clone()),
            v4: V4RollbackOperator::new(services.plans.clone(), services.flows.clone()),
        }
    }

    pub async fn execute(&self, command: RollbackApiCommand, ctx: ExecutionContext) -> UseCaseResult<ApiRolledBack> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: RollbackApiCommand, ctx: &ExecutionContext) -> Result<ApiRolledBack, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;

        let event = self
            .services
            .events
            .find_by_id(&command.event_id)
            .await?
            .ok_or_else(|| {
                UseCaseError::not_found("EVENT_NOT_FOUND", format!("Event [{}] not found", command.event_id))
            })?;
        if event.api_id != api.id {
            return Err(UseCaseError::invalid_state_with_details(
                "EVENT_NOT_FOR_API",
                "Rollback target belongs to another API",
                details! { "eventId" => event.id, "apiId" => api.id },
            ));
        }
        if event.event_type != ApiEventType::PublishApi {
            return Err(UseCaseError::invalid_state_with_details(
                "NOT_A_PUBLISH_EVENT",
                "Rollback target must be a PUBLISH_API event",
                details! { "eventId" => event.id },
            ));
        }
        let Some(snapshot) = event.snapshot()? else {
            return Err(UseCaseError::invalid_state_with_details(
                "EVENT_WITHOUT_PAYLOAD",
                "Rollback target carries no API definition",
                details! { "eventId" => event.id },
            ));
        };

        let target_version = snapshot.api.definition_version();
        let rebuilt = rebuild_api(&api, &snapshot.api);
        let warnings = match &snapshot.api.definition {
            ApiDefinition::V4(_) | ApiDefinition::Native(_) => {
                self.services
                    .apis
                    .update(ctx, &api, rebuilt.clone(), AuditEvent::ApiUpdated)
                    .await?;
                self.v4.rollback(ctx, &api.id, &snapshot).await?
            }
            ApiDefinition::V2(_) => {
                // Plan preconditions are checked before the API is touched.
                let warnings = self.v2.rollback(ctx, &api.id, &snapshot).await?;
                self.services
                    .apis
                    .update(ctx, &api, rebuilt.clone(), AuditEvent::ApiUpdated)
                    .await?;
                warnings
            }
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => {
                return Err(UseCaseError::invalid_state_with_details(
                    "ROLLBACK_NOT_SUPPORTED",
                    format!("Cannot rollback to a {target_version} definition"),
                    details! { "eventId" => event.id, "definitionVersion" => target_version.to_string() },
                ));
            }
        };

        self.services
            .audit
            .log_api(ctx, &api.id, AuditEvent::ApiRollbacked, prop("EVENT", &event.id), Some(&api), Some(&rebuilt))
            .await?;
        info!(
            api_id = %api.id,
            event_id = %event.id,
            definition_version = %target_version,
            warnings = warnings.len(),
            "API rolled back"
        );
        Ok(ApiRolledBack {
            api_id: api.id,
            event_id: event.id,
            definition_version: target_version,
            warnings,
        })
    }
}
