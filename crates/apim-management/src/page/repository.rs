//! Page Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::{Page, PageReferenceType};
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Pages of an API, ordered by `order`.
    async fn search_by_api_id(&self, api_id: &str) -> Result<Vec<Page>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Page>>;
    async fn create(&self, page: &Page) -> Result<()>;
    async fn update(&self, page: &Page) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub struct MongoPageRepository {
    collection: Collection<Page>,
}

impl MongoPageRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("pages"),
        }
    }
}

#[async_trait]
impl PageRepository for MongoPageRepository {
    async fn search_by_api_id(&self, api_id: &str) -> Result<Vec<Page>> {
        let reference_type = bson::to_bson(&PageReferenceType::Api)?;
        let cursor = self
            .collection
            .find(doc! { "referenceType": reference_type, "referenceId": api_id })
            .sort(doc! { "order": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Page>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn create(&self, page: &Page) -> Result<()> {
        self.collection.insert_one(page).await?;
        Ok(())
    }

    async fn update(&self, page: &Page) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &page.id }, page)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct InMemoryPageRepository {
    store: InMemoryStore<Page>,
}

impl InMemoryPageRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Page"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryPageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRepository for InMemoryPageRepository {
    async fn search_by_api_id(&self, api_id: &str) -> Result<Vec<Page>> {
        let mut pages = self
            .store
            .find(|p| p.reference_type == PageReferenceType::Api && p.reference_id == api_id);
        pages.sort_by_key(|p| p.order);
        Ok(pages)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Page>> {
        Ok(self.store.get(id))
    }

    async fn create(&self, page: &Page) -> Result<()> {
        self.store.insert(page.clone())
    }

    async fn update(&self, page: &Page) -> Result<()> {
        self.store.replace(page.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.store.remove(id))
    }
}
