//! API Aggregate
//!
//! The API entity and its definitions, the desired-state models read from
//! custom resources and exported definitions, and the use cases that
//! reconcile, roll back, migrate and deploy APIs.

pub mod api;
pub mod crd;
pub mod definition;
pub mod desired;
pub mod entity;
pub mod import_definition;
pub mod migration;
pub mod operations;
pub mod repository;
pub mod rollback;
pub mod service;
pub mod state_service;

pub use api::{apis_router, ApisState};
pub use crd::{ApiCrdSpec, ApiCrdStatus, CrdErrors};
pub use definition::{ApiDefinition, DefinitionVersion, Property};
pub use desired::{DesiredApi, DesiredMember, DesiredMetadata, DesiredPage, DesiredPlan};
pub use entity::{Api, ApiLifecycleState, DefinitionContext, LifecycleState, Origin, SyncFrom, Visibility};
pub use import_definition::{ExportedApi, ImportDefinition};
pub use migration::{MigrationIssue, MigrationMode, MigrationResult, MigrationState};
pub use repository::{ApiQuery, ApiRepository, InMemoryApiRepository, MongoApiRepository};
pub use service::ApiService;
pub use state_service::ApiStateService;
