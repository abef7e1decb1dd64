//! API Management Plane
//!
//! Management of API definitions and everything attached to them:
//! - Reconciliation of a desired state (custom resource or exported
//!   definition) against stored APIs, plans, members, pages and metadata
//! - Deployment, start and stop through `PUBLISH_API` snapshots
//! - Rollback to a previous deployment (V2 and V4 operators)
//! - V2 to V4 migration with dry-run and forced modes
//! - Dynamic property reconciliation
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access (MongoDB and in-memory)
//! - `service` - Domain operations; entities are only written through these
//! - `api` / `operations` - REST endpoints and use cases (APIs only)

// Aggregates
pub mod apis;
pub mod plan;
pub mod subscription;
pub mod membership;
pub mod page;
pub mod metadata;
pub mod flow;
pub mod event;
pub mod audit;
pub mod directory;

// Desired-state engine
pub mod validation;
pub mod reconcile;

// Shared infrastructure
pub mod shared;
pub mod services;

// Cross-cutting concerns
pub mod usecase;

pub use shared::error::{ManagementError, Result};
pub use usecase::{ExecutionContext, UseCaseError, UseCaseResult};
pub use services::{DomainServices, InMemoryRepositories, Repositories};

pub use apis::{apis_router, Api, ApiDefinition, ApisState, DefinitionVersion, LifecycleState};
pub use plan::{Plan, PlanStatus};
pub use subscription::{Subscription, SubscriptionStatus};
pub use membership::Membership;
pub use page::Page;
pub use metadata::Metadata;
pub use event::{ApiEvent, ApiEventType};
pub use audit::{AuditEvent, AuditLog};
