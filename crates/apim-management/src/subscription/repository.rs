//! Subscription Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use super::entity::Subscription;
use crate::shared::error::Result;
use crate::shared::memory::InMemoryStore;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>>;
    /// Pending, accepted and paused subscriptions of a plan.
    async fn find_active_by_plan(&self, plan_id: &str) -> Result<Vec<Subscription>>;
    async fn find_by_api(&self, api_id: &str) -> Result<Vec<Subscription>>;
    async fn create(&self, subscription: &Subscription) -> Result<()>;
    async fn update(&self, subscription: &Subscription) -> Result<()>;
}

pub struct MongoSubscriptionRepository {
    collection: Collection<Subscription>,
}

impl MongoSubscriptionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("subscriptions"),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for MongoSubscriptionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_active_by_plan(&self, plan_id: &str) -> Result<Vec<Subscription>> {
        let cursor = self
            .collection
            .find(doc! {
                "planId": plan_id,
                "status": { "$in": ["PENDING", "ACCEPTED", "PAUSED"] },
            })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_api(&self, api_id: &str) -> Result<Vec<Subscription>> {
        let cursor = self.collection.find(doc! { "apiId": api_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, subscription: &Subscription) -> Result<()> {
        self.collection.insert_one(subscription).await?;
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &subscription.id }, subscription)
            .await?;
        Ok(())
    }
}

pub struct InMemorySubscriptionRepository {
    store: InMemoryStore<Subscription>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Subscription"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemorySubscriptionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self.store.get(id))
    }

    async fn find_active_by_plan(&self, plan_id: &str) -> Result<Vec<Subscription>> {
        Ok(self.store.find(|s| s.plan_id == plan_id && s.status.is_active()))
    }

    async fn find_by_api(&self, api_id: &str) -> Result<Vec<Subscription>> {
        Ok(self.store.find(|s| s.api_id == api_id))
    }

    async fn create(&self, subscription: &Subscription) -> Result<()> {
        self.store.insert(subscription.clone())
    }

    async fn update(&self, subscription: &Subscription) -> Result<()> {
        self.store.replace(subscription.clone())
    }
}
