//! Deploy, Start and Stop Use Cases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::load_api;
use crate::apis::entity::{Api, LifecycleState};
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

/// Runtime state of an API after a lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiStateChanged {
    pub api_id: String,
    pub state: LifecycleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl From<Api> for ApiStateChanged {
    fn from(api: Api) -> Self {
        Self {
            api_id: api.id,
            state: api.lifecycle_state,
            deployed_at: api.deployed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployApiCommand {
    pub api_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

pub struct DeployApiUseCase {
    services: DomainServices,
}

impl DeployApiUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: DeployApiCommand, ctx: ExecutionContext) -> UseCaseResult<ApiStateChanged> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: DeployApiCommand, ctx: &ExecutionContext) -> Result<ApiStateChanged, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;
        let deployed = self
            .services
            .state
            .deploy(ctx, &api, command.label.as_deref())
            .await?;
        Ok(deployed.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartApiCommand {
    pub api_id: String,
}

pub struct StartApiUseCase {
    services: DomainServices,
}

impl StartApiUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: StartApiCommand, ctx: ExecutionContext) -> UseCaseResult<ApiStateChanged> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: StartApiCommand, ctx: &ExecutionContext) -> Result<ApiStateChanged, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;
        Ok(self.services.state.start(ctx, &api).await?.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopApiCommand {
    pub api_id: String,
}

pub struct StopApiUseCase {
    services: DomainServices,
}

impl StopApiUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, command: StopApiCommand, ctx: ExecutionContext) -> UseCaseResult<ApiStateChanged> {
        self.run(command, &ctx).await.into()
    }

    async fn run(&self, command: StopApiCommand, ctx: &ExecutionContext) -> Result<ApiStateChanged, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;
        Ok(self.services.state.stop(ctx, &api).await?.into())
    }
}
