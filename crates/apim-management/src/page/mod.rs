//! Page Aggregate
//!
//! Documentation pages of an API, arranged in folders.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{Page, PageReferenceType, PageType, PageVisibility};
pub use repository::{InMemoryPageRepository, MongoPageRepository, PageRepository};
pub use service::PageService;
