//! Metadata Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{Metadata, MetadataReferenceType};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn find_by_reference(&self, reference_type: MetadataReferenceType, reference_id: &str) -> Result<Vec<Metadata>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Metadata>>;
    async fn create(&self, metadata: &Metadata) -> Result<()>;
    async fn update(&self, metadata: &Metadata) -> Result<()>;
}

pub struct MongoMetadataRepository {
    collection: Collection<Metadata>,
}

impl MongoMetadataRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("metadata"),
        }
    }
}

#[async_trait]
impl MetadataRepository for MongoMetadataRepository {
    async fn find_by_reference(&self, reference_type: MetadataReferenceType, reference_id: &str) -> Result<Vec<Metadata>> {
        let reference_type = bson::to_bson(&reference_type)?;
        let cursor = self
            .collection
            .find(doc! { "referenceType": reference_type, "referenceId": reference_id })
            .sort(doc! { "key": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Metadata>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn create(&self, metadata: &Metadata) -> Result<()> {
        self.collection.insert_one(metadata).await?;
        Ok(())
    }

    async fn update(&self, metadata: &Metadata) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &metadata.id }, metadata)
            .await?;
        Ok(())
    }
}

pub struct InMemoryMetadataRepository {
    store: InMemoryStore<Metadata>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Metadata"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryMetadataRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataRepository for InMemoryMetadataRepository {
    async fn find_by_reference(&self, reference_type: MetadataReferenceType, reference_id: &str) -> Result<Vec<Metadata>> {
        let mut metadata = self
            .store
            .find(|m| m.reference_type == reference_type && m.reference_id == reference_id);
        metadata.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metadata)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Metadata>> {
        Ok(self.store.get(id))
    }

    async fn create(&self, metadata: &Metadata) -> Result<()> {
        self.store.insert(metadata.clone())
    }

    async fn update(&self, metadata: &Metadata) -> Result<()> {
        self.store.replace(metadata.clone())
    }
}
