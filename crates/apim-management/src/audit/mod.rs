//! Audit Aggregate

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{AuditEvent, AuditLog, AuditReferenceType};
pub use repository::{AuditLogRepository, InMemoryAuditLogRepository, MongoAuditLogRepository};
pub use service::AuditService;
