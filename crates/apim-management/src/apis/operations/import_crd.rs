//! Import API CRD Use Case
//!
//! Reconciles the API described by a custom resource. When the API syncs
//! from the management plane and has a published plan, it is deployed
//! whenever it drifted from its last deployment and then moved to the
//! requested runtime state.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::apis::crd::{ApiCrdSpec, ApiCrdStatus, CrdErrors};
use crate::apis::entity::{Api, LifecycleState};
use crate::details;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiCrdCommand {
    pub spec: ApiCrdSpec,
    /// Validate and report without writing anything.
    #[serde(default)]
    pub dry_run: bool,
}

pub struct ImportApiCrdUseCase {
    services: DomainServices,
}

impl ImportApiCrdUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: ImportApiCrdCommand, ctx: ExecutionContext) -> UseCaseResult<ApiCrdStatus> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: ImportApiCrdCommand, ctx: &ExecutionContext) -> Result<ApiCrdStatus, UseCaseError> {
        let spec = command.spec;
        let existing = self.find_existing(&spec, ctx).await?;
        let api_id = existing
            .as_ref()
            .map(|a| a.id.clone())
            .unwrap_or_else(|| spec.resolve_id(&ctx.environment_id));
        let cross_id = spec.cross_id.clone();
        let requested_state = spec.state;

        let validated = self
            .services
            .validator
            .validate(ctx, &api_id, spec.into_desired())
            .await?;

        if command.dry_run {
            let plans = validated
                .value
                .plans
                .iter()
                .map(|p| (p.key.clone(), p.resolve_id(&api_id)))
                .collect();
            return Ok(ApiCrdStatus {
                id: api_id,
                cross_id,
                environment_id: ctx.environment_id.clone(),
                organization_id: ctx.organization_id.clone(),
                state: existing.map_or(requested_state, |a| a.lifecycle_state),
                plans,
                errors: CrdErrors {
                    warning: validated.warnings(),
                    severe: validated.severe_errors(),
                },
            });
        }

        let (desired, mut warnings) = validated.into_result()?;
        let reconciled = match &existing {
            Some(api) => self.services.reconciler.update(ctx, api, desired).await?,
            None => self.services.reconciler.create(ctx, &api_id, desired).await?,
        };
        warnings.extend(reconciled.warnings);

        let mut api = reconciled.api;
        if api.definition_context.syncs_from_management() && api.definition.is_deployable() {
            api = self
                .synchronize(ctx, api, reconciled.created, requested_state, &mut warnings)
                .await?;
        }

        info!(
            api_id = %api.id,
            cross_id = %api.cross_id,
            created = reconciled.created,
            state = ?api.lifecycle_state,
            warnings = warnings.len(),
            "API CRD imported"
        );
        Ok(ApiCrdStatus {
            id: api.id,
            cross_id: api.cross_id,
            environment_id: api.environment_id,
            organization_id: api.organization_id,
            state: api.lifecycle_state,
            plans: reconciled.plan_ids,
            errors: CrdErrors {
                warning: warnings,
                severe: vec![],
            },
        })
    }

    async fn find_existing(&self, spec: &ApiCrdSpec, ctx: &ExecutionContext) -> Result<Option<Api>, UseCaseError> {
        if let Some(id) = spec.id.as_deref() {
            if let Some(api) = self.services.apis.find_by_id(id).await? {
                if api.environment_id != ctx.environment_id {
                    return Err(UseCaseError::invalid_state_with_details(
                        "API_ALREADY_EXISTS",
                        format!("API [{}] already exists in another environment", id),
                        details! { "id" => id },
                    ));
                }
                return Ok(Some(api));
            }
        }
        Ok(self
            .services
            .apis
            .find_by_cross_id(&spec.cross_id, &ctx.environment_id)
            .await?)
    }

    /// Deploy when needed, then apply the requested runtime state.
    async fn synchronize(
        &self,
        ctx: &ExecutionContext,
        mut api: Api,
        created: bool,
        requested_state: LifecycleState,
        warnings: &mut Vec<String>,
    ) -> Result<Api, UseCaseError> {
        let state = &self.services.state;

        if !state.has_deployable_plan(&api.id).await? {
            match requested_state {
                LifecycleState::Started if !api.is_started() => {
                    let message = "API cannot be started without a published plan".to_string();
                    warn!(api_id = %api.id, "{}", message);
                    warnings.push(message);
                }
                LifecycleState::Stopped => api = state.stop(ctx, &api).await?,
                _ => {}
            }
            return Ok(api);
        }

        if created || !state.is_synchronized(&api).await? {
            api = state.deploy(ctx, &api, None).await?;
        }
        api = match requested_state {
            LifecycleState::Started => state.start(ctx, &api).await?,
            LifecycleState::Stopped => state.stop(ctx, &api).await?,
        };
        Ok(api)
    }
}
