//! API Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::{doc, Document}};

use super::definition::DefinitionVersion;
use super::entity::Api;
use crate::shared::error::{ManagementError, Result};
use crate::shared::memory::InMemoryStore;

/// Search criteria; unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct ApiQuery {
    pub environment_id: Option<String>,
    pub cross_id: Option<String>,
    pub name: Option<String>,
    pub definition_version: Option<DefinitionVersion>,
}

impl ApiQuery {
    pub fn in_environment(environment_id: impl Into<String>) -> Self {
        Self {
            environment_id: Some(environment_id.into()),
            ..Default::default()
        }
    }

    fn matches(&self, api: &Api) -> bool {
        self.environment_id.as_deref().map_or(true, |e| api.environment_id == e)
            && self.cross_id.as_deref().map_or(true, |c| api.cross_id == c)
            && self.name.as_deref().map_or(true, |n| api.name == n)
            && self.definition_version.map_or(true, |v| api.definition_version() == v)
    }

    fn to_filter(&self) -> Document {
        let mut filter = Document::new();
        if let Some(env) = &self.environment_id {
            filter.insert("environmentId", env);
        }
        if let Some(cross_id) = &self.cross_id {
            filter.insert("crossId", cross_id);
        }
        if let Some(name) = &self.name {
            filter.insert("name", name);
        }
        if let Some(version) = self.definition_version {
            filter.insert("definition.definitionVersion", version.to_string());
        }
        filter
    }
}

#[async_trait]
pub trait ApiRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Api>>;
    async fn find_by_cross_id(&self, cross_id: &str, environment_id: &str) -> Result<Option<Api>>;
    async fn search(&self, query: &ApiQuery) -> Result<Vec<Api>>;
    async fn create(&self, api: &Api) -> Result<()>;
    async fn update(&self, api: &Api) -> Result<()>;
    async fn exists_by_id(&self, id: &str) -> Result<bool>;
}

pub struct MongoApiRepository {
    collection: Collection<Api>,
}

impl MongoApiRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("apis"),
        }
    }
}

#[async_trait]
impl ApiRepository for MongoApiRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Api>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_cross_id(&self, cross_id: &str, environment_id: &str) -> Result<Option<Api>> {
        Ok(self
            .collection
            .find_one(doc! { "crossId": cross_id, "environmentId": environment_id })
            .await?)
    }

    async fn search(&self, query: &ApiQuery) -> Result<Vec<Api>> {
        let cursor = self
            .collection
            .find(query.to_filter())
            .sort(doc! { "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create(&self, api: &Api) -> Result<()> {
        self.collection
            .insert_one(api)
            .await
            .map_err(|e| ManagementError::on_insert(e, "Api", &api.id))?;
        Ok(())
    }

    async fn update(&self, api: &Api) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &api.id }, api)
            .await?;
        Ok(())
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.collection.count_documents(doc! { "_id": id }).await? > 0)
    }
}

pub struct InMemoryApiRepository {
    store: InMemoryStore<Api>,
}

impl InMemoryApiRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("Api"),
        }
    }

    pub fn write_count(&self) -> usize {
        self.store.write_count()
    }
}

impl Default for InMemoryApiRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiRepository for InMemoryApiRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Api>> {
        Ok(self.store.get(id))
    }

    async fn find_by_cross_id(&self, cross_id: &str, environment_id: &str) -> Result<Option<Api>> {
        Ok(self
            .store
            .find_one(|a| a.cross_id == cross_id && a.environment_id == environment_id))
    }

    async fn search(&self, query: &ApiQuery) -> Result<Vec<Api>> {
        let mut apis = self.store.find(|a| query.matches(a));
        apis.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apis)
    }

    async fn create(&self, api: &Api) -> Result<()> {
        self.store.insert(api.clone())
    }

    async fn update(&self, api: &Api) -> Result<()> {
        self.store.replace(api.clone())
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.store.contains(id))
    }
}
