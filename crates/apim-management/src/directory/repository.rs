//! Directory Repositories

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{Category, Group, User};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_source(&self, organization_id: &str, source: &str, source_id: &str) -> Result<Option<User>>;
    async fn create(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Group>>;
    async fn create(&self, group: &Group) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Category>>;
    async fn create(&self, category: &Category) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MongoDB
// ---------------------------------------------------------------------------

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_source(&self, organization_id: &str, source: &str, source_id: &str) -> Result<Option<User>> {
        Ok(self
            .collection
            .find_one(doc! { "organizationId": organization_id, "source": source, "sourceId": source_id })
            .await?)
    }

    async fn create(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }
}

pub struct MongoGroupRepository {
    collection: Collection<Group>,
}

impl MongoGroupRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("groups"),
        }
    }
}

#[async_trait]
impl GroupRepository for MongoGroupRepository {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Group>> {
        let cursor = self.collection.find(doc! { "environmentId": environment_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, group: &Group) -> Result<()> {
        self.collection.insert_one(group).await?;
        Ok(())
    }
}

pub struct MongoCategoryRepository {
    collection: Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("categories"),
        }
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Category>> {
        let cursor = self.collection.find(doc! { "environmentId": environment_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, category: &Category) -> Result<()> {
        self.collection.insert_one(category).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

pub struct InMemoryUserRepository {
    store: InMemoryStore<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("User"),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.get(id))
    }

    async fn find_by_source(&self, organization_id: &str, source: &str, source_id: &str) -> Result<Option<User>> {
        Ok(self.store.find_one(|u| {
            u.organization_id == organization_id && u.source == source && u.source_id == source_id
        }))
    }

    async fn create(&self, user: &User) -> Result<()> {
        self.store.insert(user.clone())
    }
}

pub struct InMemoryGroupRepository {
    store: InMemoryStore<Group>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Group"),
        }
    }
}

impl Default for InMemoryGroupRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Group>> {
        Ok(self.store.find(|g| g.environment_id == environment_id))
    }

    async fn create(&self, group: &Group) -> Result<()> {
        self.store.insert(group.clone())
    }
}

pub struct InMemoryCategoryRepository {
    store: InMemoryStore<Category>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Category"),
        }
    }
}

impl Default for InMemoryCategoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_environment(&self, environment_id: &str) -> Result<Vec<Category>> {
        Ok(self.store.find(|c| c.environment_id == environment_id))
    }

    async fn create(&self, category: &Category) -> Result<()> {
        self.store.insert(category.clone())
    }
}
