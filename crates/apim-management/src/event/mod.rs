//! API Event Aggregate
//!
//! Deployment history. A `PUBLISH_API` event carries the snapshot the
//! gateway received, which is what rollback and sync checks compare against.

pub mod entity;
pub mod repository;

pub use entity::{ApiEvent, ApiEventType, ApiSnapshot, PlanSnapshot};
pub use repository::{EventRepository, InMemoryEventRepository, MongoEventRepository};
