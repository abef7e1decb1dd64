//! Audit Log Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{AuditLog, AuditReferenceType};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, log: &AuditLog) -> Result<()>;
    /// Newest first.
    async fn find_by_reference(&self, reference_type: AuditReferenceType, reference_id: &str) -> Result<Vec<AuditLog>>;
}

pub struct MongoAuditLogRepository {
    collection: Collection<AuditLog>,
}

impl MongoAuditLogRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("audits"),
        }
    }
}

#[async_trait]
impl AuditLogRepository for MongoAuditLogRepository {
    async fn create(&self, log: &AuditLog) -> Result<()> {
        self.collection.insert_one(log).await?;
        Ok(())
    }

    async fn find_by_reference(&self, reference_type: AuditReferenceType, reference_id: &str) -> Result<Vec<AuditLog>> {
        let reference_type = bson::to_bson(&reference_type)?;
        let cursor = self
            .collection
            .find(doc! { "referenceType": reference_type, "referenceId": reference_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct InMemoryAuditLogRepository {
    store: InMemoryStore<AuditLog>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("AuditLog"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, log: &AuditLog) -> Result<()> {
        self.store.insert(log.clone())
    }

    async fn find_by_reference(&self, reference_type: AuditReferenceType, reference_id: &str) -> Result<Vec<AuditLog>> {
        let mut logs = self
            .store
            .find(|l| l.reference_type == reference_type && l.reference_id == reference_id);
        logs.reverse();
        Ok(logs)
    }
}
