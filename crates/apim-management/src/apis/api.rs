//! APIs Management API
//!
//! REST endpoints for API import, export, rollback, migration and lifecycle,
//! nested under `/management/environments/{envId}/apis`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::crd::{ApiCrdSpec, ApiCrdStatus};
use super::definition::{DefinitionVersion, Property};
use super::entity::{Api, ApiLifecycleState, LifecycleState, Visibility};
use super::import_definition::ImportDefinition;
use super::migration::{MigrationMode, MigrationResult};
use super::operations::{
    load_api, ApiImported, ApiMetadata, ApiRolledBack, ApiStateChanged, DeployApiCommand,
    DeployApiUseCase, DynamicPropertiesUpdated, ExportApiDefinitionCommand, ExportApiDefinitionUseCase,
    GetApiMetadataQuery, GetApiMetadataUseCase, ImportApiCrdCommand, ImportApiCrdUseCase,
    ImportApiDefinitionCommand, ImportApiDefinitionUseCase, MetadataSource, MigrateApiCommand,
    MigrateApiUseCase, RollbackApiCommand, RollbackApiUseCase, StartApiCommand, StartApiUseCase,
    StopApiCommand, StopApiUseCase, UpdateApiDefinitionCommand, UpdateApiDefinitionUseCase,
    UpdateDynamicPropertiesCommand, UpdateDynamicPropertiesUseCase,
};
use crate::services::DomainServices;
use crate::shared::api_common::ApiError;
use crate::shared::middleware::Caller;
use crate::usecase::{UseCaseError, UseCaseResult};

/// API summary returned by the read endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub id: String,
    pub cross_id: String,
    pub environment_id: String,
    pub organization_id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub definition_version: DefinitionVersion,
    pub state: LifecycleState,
    pub lifecycle_state: ApiLifecycleState,
    pub visibility: Visibility,
    pub labels: Vec<String>,
    pub deployed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Api> for ApiResponse {
    fn from(a: Api) -> Self {
        Self {
            definition_version: a.definition_version(),
            id: a.id,
            cross_id: a.cross_id,
            environment_id: a.environment_id,
            organization_id: a.organization_id,
            name: a.name,
            version: a.version,
            description: a.description,
            state: a.lifecycle_state,
            lifecycle_state: a.api_lifecycle_state,
            visibility: a.visibility,
            labels: a.labels,
            deployed_at: a.deployed_at.map(|d| d.to_rfc3339()),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ImportCrdParams {
    /// Validate only
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MigrateParams {
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub mode: MigrationMode,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MetadataParams {
    #[param(value_type = Option<String>)]
    pub source: Option<MetadataSource>,
    /// `key`, `name` or `value`, `-` prefix for descending
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    /// Id of the `PUBLISH_API` event to roll back to
    pub event_id: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub deployment_label: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPropertiesRequest {
    pub properties: Vec<Property>,
}

/// APIs service state
#[derive(Clone)]
pub struct ApisState {
    pub services: DomainServices,
    pub import_crd: Arc<ImportApiCrdUseCase>,
    pub import_definition: Arc<ImportApiDefinitionUseCase>,
    pub update_definition: Arc<UpdateApiDefinitionUseCase>,
    pub export_definition: Arc<ExportApiDefinitionUseCase>,
    pub rollback: Arc<RollbackApiUseCase>,
    pub migrate: Arc<MigrateApiUseCase>,
    pub dynamic_properties: Arc<UpdateDynamicPropertiesUseCase>,
    pub deploy: Arc<DeployApiUseCase>,
    pub start: Arc<StartApiUseCase>,
    pub stop: Arc<StopApiUseCase>,
    pub metadata: Arc<GetApiMetadataUseCase>,
}

impl ApisState {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
            import_crd: Arc::new(ImportApiCrdUseCase::new(services)),
            import_definition: Arc::new(ImportApiDefinitionUseCase::new(services)),
            update_definition: Arc::new(UpdateApiDefinitionUseCase::new(services)),
            export_definition: Arc::new(ExportApiDefinitionUseCase::new(services)),
            rollback: Arc::new(RollbackApiUseCase::new(services)),
            migrate: Arc::new(MigrateApiUseCase::new(services)),
            dynamic_properties: Arc::new(UpdateDynamicPropertiesUseCase::new(services)),
            deploy: Arc::new(DeployApiUseCase::new(services)),
            start: Arc::new(StartApiUseCase::new(services)),
            stop: Arc::new(StopApiUseCase::new(services)),
            metadata: Arc::new(GetApiMetadataUseCase::new(services)),
        }
    }
}

fn respond<T>(result: UseCaseResult<T>) -> Result<Json<T>, UseCaseError> {
    result.into_result().map(Json)
}

/// Import an API custom resource
#[utoipa::path(
    put,
    path = "/_import/crd",
    tag = "apis",
    params(("envId" = String, Path, description = "Environment ID"), ImportCrdParams),
    request_body = ApiCrdSpec,
    responses(
        (status = 200, description = "API reconciled", body = ApiCrdStatus),
        (status = 400, description = "Severe validation errors", body = ApiError)
    )
)]
pub async fn import_crd(
    State(state): State<ApisState>,
    caller: Caller,
    Path(env_id): Path<String>,
    Query(params): Query<ImportCrdParams>,
    Json(spec): Json<ApiCrdSpec>,
) -> Result<Json<ApiCrdStatus>, UseCaseError> {
    let command = ImportApiCrdCommand {
        spec,
        dry_run: params.dry_run,
    };
    respond(state.import_crd.execute(command, caller.context(&env_id)).await)
}

/// Create an API from an exported definition
#[utoipa::path(
    post,
    path = "/_import/definition",
    tag = "apis",
    params(("envId" = String, Path, description = "Environment ID")),
    request_body = ImportDefinition,
    responses(
        (status = 201, description = "API created", body = ApiImported),
        (status = 400, description = "Severe validation errors", body = ApiError),
        (status = 409, description = "Cross id already used", body = ApiError)
    )
)]
pub async fn import_definition(
    State(state): State<ApisState>,
    caller: Caller,
    Path(env_id): Path<String>,
    Json(definition): Json<ImportDefinition>,
) -> Result<(StatusCode, Json<ApiImported>), UseCaseError> {
    let command = ImportApiDefinitionCommand { definition };
    let imported = respond(state.import_definition.execute(command, caller.context(&env_id)).await)?;
    Ok((StatusCode::CREATED, imported))
}

/// Get an API
#[utoipa::path(
    get,
    path = "/{apiId}",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    responses(
        (status = 200, description = "API found", body = ApiResponse),
        (status = 404, description = "API not found", body = ApiError)
    )
)]
pub async fn get_api(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse>, UseCaseError> {
    let api = load_api(&state.services.apis, &caller.context(&env_id), &api_id).await?;
    Ok(Json(api.into()))
}

/// Update an API from an exported definition
#[utoipa::path(
    put,
    path = "/{apiId}/_import/definition",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    request_body = ImportDefinition,
    responses(
        (status = 200, description = "API updated", body = ApiImported),
        (status = 404, description = "API not found", body = ApiError),
        (status = 409, description = "API cannot be updated from an import", body = ApiError)
    )
)]
pub async fn update_definition(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    Json(definition): Json<ImportDefinition>,
) -> Result<Json<ApiImported>, UseCaseError> {
    let command = UpdateApiDefinitionCommand { api_id, definition };
    respond(state.update_definition.execute(command, caller.context(&env_id)).await)
}

/// Export an API definition
#[utoipa::path(
    get,
    path = "/{apiId}/_export/definition",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    responses(
        (status = 200, description = "Exported definition", body = ImportDefinition),
        (status = 404, description = "API not found", body = ApiError)
    )
)]
pub async fn export_definition(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
) -> Result<Json<ImportDefinition>, UseCaseError> {
    let command = ExportApiDefinitionCommand { api_id };
    respond(state.export_definition.execute(command, caller.context(&env_id)).await)
}

/// Roll an API back to a previous deployment
#[utoipa::path(
    post,
    path = "/{apiId}/_rollback",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    request_body = RollbackRequest,
    responses(
        (status = 200, description = "API rolled back", body = ApiRolledBack),
        (status = 404, description = "API or event not found", body = ApiError),
        (status = 409, description = "Rollback not possible", body = ApiError)
    )
)]
pub async fn rollback(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    Json(req): Json<RollbackRequest>,
) -> Result<Json<ApiRolledBack>, UseCaseError> {
    let command = RollbackApiCommand {
        api_id,
        event_id: req.event_id,
    };
    respond(state.rollback.execute(command, caller.context(&env_id)).await)
}

/// Migrate a V2 API to V4
#[utoipa::path(
    post,
    path = "/{apiId}/_migrate",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID"),
        MigrateParams
    ),
    responses(
        (status = 200, description = "Migration result", body = MigrationResult),
        (status = 404, description = "API not found", body = ApiError)
    )
)]
pub async fn migrate(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    Query(params): Query<MigrateParams>,
) -> Result<Json<MigrationResult>, UseCaseError> {
    let command = MigrateApiCommand {
        api_id,
        mode: params.mode,
    };
    respond(state.migrate.execute(command, caller.context(&env_id)).await)
}

/// Push dynamic property values
#[utoipa::path(
    put,
    path = "/{apiId}/dynamic-properties",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    request_body = DynamicPropertiesRequest,
    responses(
        (status = 200, description = "Properties reconciled", body = DynamicPropertiesUpdated),
        (status = 404, description = "API not found", body = ApiError)
    )
)]
pub async fn update_dynamic_properties(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    Json(req): Json<DynamicPropertiesRequest>,
) -> Result<Json<DynamicPropertiesUpdated>, UseCaseError> {
    let command = UpdateDynamicPropertiesCommand {
        api_id,
        properties: req.properties,
    };
    respond(state.dynamic_properties.execute(command, caller.context(&env_id)).await)
}

/// Deploy an API
#[utoipa::path(
    post,
    path = "/{apiId}/deployments",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    request_body = DeployRequest,
    responses(
        (status = 202, description = "API deployed", body = ApiStateChanged),
        (status = 409, description = "API cannot be deployed", body = ApiError)
    )
)]
pub async fn deploy(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    req: Option<Json<DeployRequest>>,
) -> Result<(StatusCode, Json<ApiStateChanged>), UseCaseError> {
    let command = DeployApiCommand {
        api_id,
        label: req.and_then(|Json(r)| r.deployment_label),
    };
    let deployed = respond(state.deploy.execute(command, caller.context(&env_id)).await)?;
    Ok((StatusCode::ACCEPTED, deployed))
}

/// Start an API
#[utoipa::path(
    post,
    path = "/{apiId}/_start",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    responses(
        (status = 200, description = "API started", body = ApiStateChanged),
        (status = 409, description = "API cannot be started", body = ApiError)
    )
)]
pub async fn start(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
) -> Result<Json<ApiStateChanged>, UseCaseError> {
    respond(state.start.execute(StartApiCommand { api_id }, caller.context(&env_id)).await)
}

/// Stop an API
#[utoipa::path(
    post,
    path = "/{apiId}/_stop",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID")
    ),
    responses(
        (status = 200, description = "API stopped", body = ApiStateChanged)
    )
)]
pub async fn stop(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
) -> Result<Json<ApiStateChanged>, UseCaseError> {
    respond(state.stop.execute(StopApiCommand { api_id }, caller.context(&env_id)).await)
}

/// List the metadata of an API
#[utoipa::path(
    get,
    path = "/{apiId}/metadata",
    tag = "apis",
    params(
        ("envId" = String, Path, description = "Environment ID"),
        ("apiId" = String, Path, description = "API ID"),
        MetadataParams
    ),
    responses(
        (status = 200, description = "Effective metadata", body = Vec<ApiMetadata>),
        (status = 400, description = "Unknown sort field", body = ApiError)
    )
)]
pub async fn get_metadata(
    State(state): State<ApisState>,
    caller: Caller,
    Path((env_id, api_id)): Path<(String, String)>,
    Query(params): Query<MetadataParams>,
) -> Result<Json<Vec<ApiMetadata>>, UseCaseError> {
    let query = GetApiMetadataQuery {
        api_id,
        source: params.source,
        sort_by: params.sort_by,
    };
    respond(state.metadata.execute(query, caller.context(&env_id)).await)
}

/// Create APIs router
pub fn apis_router(state: ApisState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(import_crd))
        .routes(routes!(import_definition))
        .routes(routes!(get_api))
        .routes(routes!(update_definition))
        .routes(routes!(export_definition))
        .routes(routes!(rollback))
        .routes(routes!(migrate))
        .routes(routes!(update_dynamic_properties))
        .routes(routes!(deploy))
        .routes(routes!(start))
        .routes(routes!(stop))
        .routes(routes!(get_metadata))
        .with_state(state)
}
