//! Plan Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::Plan;
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Plan>>;
    /// Every plan of the API, closed ones included, by ascending order.
    async fn find_by_api_id(&self, api_id: &str) -> Result<Vec<Plan>>;
    async fn create(&self, plan: &Plan) -> Result<()>;
    async fn update(&self, plan: &Plan) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub struct MongoPlanRepository {
    collection: Collection<Plan>,
}

impl MongoPlanRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("plans"),
        }
    }
}

#[async_trait]
impl PlanRepository for MongoPlanRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Plan>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_api_id(&self, api_id: &str) -> Result<Vec<Plan>> {
        let cursor = self
            .collection
            .find(doc! { "apiId": api_id })
            .sort(doc! { "order": 1, "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, plan: &Plan) -> Result<()> {
        self.collection.insert_one(plan).await?;
        Ok(())
    }

    async fn update(&self, plan: &Plan) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &plan.id }, plan)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct InMemoryPlanRepository {
    store: InMemoryStore<Plan>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Plan"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryPlanRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Plan>> {
        Ok(self.store.get(id))
    }

    async fn find_by_api_id(&self, api_id: &str) -> Result<Vec<Plan>> {
        let mut plans = self.store.find(|p| p.api_id == api_id);
        plans.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn create(&self, plan: &Plan) -> Result<()> {
        self.store.insert(plan.clone())
    }

    async fn update(&self, plan: &Plan) -> Result<()> {
        self.store.replace(plan.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.store.remove(id))
    }
}
