//! API Event Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{ApiEvent, ApiEventType};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<ApiEvent>>;
    async fn find_latest_by_api(&self, api_id: &str, event_type: ApiEventType) -> Result<Option<ApiEvent>>;
    /// Newest first.
    async fn find_by_api(&self, api_id: &str) -> Result<Vec<ApiEvent>>;
    async fn create(&self, event: &ApiEvent) -> Result<()>;
}

pub struct MongoEventRepository {
    collection: Collection<ApiEvent>,
}

impl MongoEventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("events"),
        }
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ApiEvent>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_latest_by_api(&self, api_id: &str, event_type: ApiEventType) -> Result<Option<ApiEvent>> {
        let event_type = bson::to_bson(&event_type)?;
        Ok(self
            .collection
            .find_one(doc! { "apiId": api_id, "type": event_type })
            .sort(doc! { "createdAt": -1 })
            .await?)
    }

    async fn find_by_api(&self, api_id: &str) -> Result<Vec<ApiEvent>> {
        let cursor = self
            .collection
            .find(doc! { "apiId": api_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, event: &ApiEvent) -> Result<()> {
        self.collection.insert_one(event).await?;
        Ok(())
    }
}

pub struct InMemoryEventRepository {
    store: InMemoryStore<ApiEvent>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Event"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ApiEvent>> {
        Ok(self.store.get(id))
    }

    async fn find_latest_by_api(&self, api_id: &str, event_type: ApiEventType) -> Result<Option<ApiEvent>> {
        Ok(self.find_by_api(api_id).await?.into_iter().find(|e| e.event_type == event_type))
    }

    async fn find_by_api(&self, api_id: &str) -> Result<Vec<ApiEvent>> {
        // Insertion order breaks ties between events created in the same instant.
        let mut events = self.store.find(|e| e.api_id == api_id);
        events.reverse();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn create(&self, event: &ApiEvent) -> Result<()> {
        self.store.insert(event.clone())
    }
}
