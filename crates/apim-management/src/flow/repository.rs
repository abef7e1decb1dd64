//! Flow Repository

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{Flow, FlowReferenceType, FlowSet};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait FlowRepository: Send + Sync {
    async fn find_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<Vec<Flow>>;

    /// Replace every flow of the reference.
    async fn save_all(&self, reference_type: FlowReferenceType, reference_id: &str, flows: &[Flow]) -> Result<()>;

    async fn delete_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<()>;
}

pub struct MongoFlowRepository {
    collection: Collection<FlowSet>,
}

impl MongoFlowRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("flows"),
        }
    }
}

#[async_trait]
impl FlowRepository for MongoFlowRepository {
    async fn find_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<Vec<Flow>> {
        let id = FlowSet::id_for(reference_type, reference_id);
        Ok(self
            .collection
            .find_one(doc! { "_id": id })
            .await?
            .map(|set| set.flows)
            .unwrap_or_default())
    }

    async fn save_all(&self, reference_type: FlowReferenceType, reference_id: &str, flows: &[Flow]) -> Result<()> {
        let set = FlowSet::new(reference_type, reference_id, flows.to_vec());
        self.collection
            .replace_one(doc! { "_id": &set.id }, &set)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<()> {
        let id = FlowSet::id_for(reference_type, reference_id);
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}

pub struct InMemoryFlowRepository {
    store: InMemoryStore<FlowSet>,
}

impl InMemoryFlowRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("FlowSet"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryFlowRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlowRepository for InMemoryFlowRepository {
    async fn find_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<Vec<Flow>> {
        Ok(self
            .store
            .get(&FlowSet::id_for(reference_type, reference_id))
            .map(|set| set.flows)
            .unwrap_or_default())
    }

    async fn save_all(&self, reference_type: FlowReferenceType, reference_id: &str, flows: &[Flow]) -> Result<()> {
        self.store.upsert(FlowSet::new(reference_type, reference_id, flows.to_vec()));
        Ok(())
    }

    async fn delete_by_reference(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<()> {
        self.store.remove(&FlowSet::id_for(reference_type, reference_id));
        Ok(())
    }
}
