//! Directory
//!
//! Users, groups and categories that desired states refer to by name. The
//! management plane only reads them while validating.

pub mod entity;
pub mod repository;

pub use entity::{Category, Group, User};
pub use repository::{
    CategoryRepository, GroupRepository, InMemoryCategoryRepository, InMemoryGroupRepository,
    InMemoryUserRepository, MongoCategoryRepository, MongoGroupRepository, MongoUserRepository,
    UserRepository,
};
