//! Membership Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{Membership, MembershipReferenceType};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find_by_reference(&self, reference_type: MembershipReferenceType, reference_id: &str) -> Result<Vec<Membership>>;
    async fn create(&self, membership: &Membership) -> Result<()>;
    async fn update(&self, membership: &Membership) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub struct MongoMembershipRepository {
    collection: Collection<Membership>,
}

impl MongoMembershipRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("memberships"),
        }
    }
}

#[async_trait]
impl MembershipRepository for MongoMembershipRepository {
    async fn find_by_reference(&self, reference_type: MembershipReferenceType, reference_id: &str) -> Result<Vec<Membership>> {
        let reference_type = bson::to_bson(&reference_type)?;
        let cursor = self
            .collection
            .find(doc! { "referenceType": reference_type, "referenceId": reference_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, membership: &Membership) -> Result<()> {
        self.collection.insert_one(membership).await?;
        Ok(())
    }

    async fn update(&self, membership: &Membership) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &membership.id }, membership)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct InMemoryMembershipRepository {
    store: InMemoryStore<Membership>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Membership"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryMembershipRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn find_by_reference(&self, reference_type: MembershipReferenceType, reference_id: &str) -> Result<Vec<Membership>> {
        Ok(self
            .store
            .find(|m| m.reference_type == reference_type && m.reference_id == reference_id))
    }

    async fn create(&self, membership: &Membership) -> Result<()> {
        self.store.insert(membership.clone())
    }

    async fn update(&self, membership: &Membership) -> Result<()> {
        self.store.replace(membership.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.store.remove(id))
    }
}
