//! Membership Aggregate
//!
//! Binds users and groups to an API with a role.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{MemberType, Membership, MembershipReferenceType, PRIMARY_OWNER};
pub use repository::{InMemoryMembershipRepository, MembershipRepository, MongoMembershipRepository};
pub use service::MembershipService;
