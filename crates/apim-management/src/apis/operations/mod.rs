//! API Operations
//!
//! Use cases over the API aggregate. Each one takes a command and an
//! [`ExecutionContext`](crate::usecase::ExecutionContext) and returns a
//! [`UseCaseResult`](crate::usecase::UseCaseResult).

pub mod dynamic_properties;
pub mod export_definition;
pub mod import_crd;
pub mod import_definition;
pub mod lifecycle;
pub mod metadata;
pub mod migrate;
pub mod rollback;
pub mod update_definition;

pub use dynamic_properties::{
    DynamicPropertiesUpdated, UpdateDynamicPropertiesCommand, UpdateDynamicPropertiesUseCase,
};
pub use export_definition::{ExportApiDefinitionCommand, ExportApiDefinitionUseCase};
pub use import_crd::{ImportApiCrdCommand, ImportApiCrdUseCase};
pub use import_definition::{ApiImported, ImportApiDefinitionCommand, ImportApiDefinitionUseCase};
pub use lifecycle::{
    ApiStateChanged, DeployApiCommand, DeployApiUseCase, StartApiCommand, StartApiUseCase,
    StopApiCommand, StopApiUseCase,
};
pub use metadata::{ApiMetadata, GetApiMetadataQuery, GetApiMetadataUseCase, MetadataSource};
pub use migrate::{MigrateApiCommand, MigrateApiUseCase};
pub use rollback::{ApiRolledBack, RollbackApiCommand, RollbackApiUseCase};
pub use update_definition::{UpdateApiDefinitionCommand, UpdateApiDefinitionUseCase};

use crate::apis::entity::Api;
use crate::apis::service::ApiService;
use crate::usecase::{ExecutionContext, UseCaseError};

/// Load an API of the caller's environment. APIs of other environments are
/// reported as missing.
pub(crate) async fn load_api(
    apis: &ApiService,
    ctx: &ExecutionContext,
    api_id: &str,
) -> Result<Api, UseCaseError> {
    match apis.find_by_id(api_id).await? {
        Some(api) if api.environment_id == ctx.environment_id => Ok(api),
        _ => Err(UseCaseError::not_found(
            "API_NOT_FOUND",
            format!("API [{api_id}] not found"),
        )),
    }
}
