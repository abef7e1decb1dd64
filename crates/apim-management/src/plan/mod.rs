//! Plan Aggregate

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{Plan, PlanMode, PlanSecurity, PlanSecurityType, PlanStatus, PlanValidation};
pub use repository::{InMemoryPlanRepository, MongoPlanRepository, PlanRepository};
pub use service::PlanService;
