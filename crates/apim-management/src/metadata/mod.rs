//! Metadata Aggregate
//!
//! Key/value metadata on environments (defaults) and APIs.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{Metadata, MetadataFormat, MetadataReferenceType};
pub use repository::{InMemoryMetadataRepository, MetadataRepository, MongoMetadataRepository};
pub use service::MetadataService;
