//! Page Entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageType {
    Markdown,
    Swagger,
    Asyncapi,
    Folder,
    Root,
    Link,
}

impl PageType {
    /// Whether pages of this type may hold children.
    pub fn is_container(&self) -> bool {
        matches!(self, PageType::Folder | PageType::Root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageReferenceType {
    Api,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_id: Option<String>,
    pub reference_type: PageReferenceType,
    pub reference_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub visibility: PageVisibility,
    #[serde(default)]
    pub homepage: bool,
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn for_api(id: impl Into<String>, api_id: impl Into<String>, name: impl Into<String>, page_type: PageType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            cross_id: None,
            reference_type: PageReferenceType::Api,
            reference_id: api_id.into(),
            name: name.into(),
            page_type,
            content: None,
            parent_id: None,
            order: 0,
            published: false,
            visibility: PageVisibility::Public,
            homepage: false,
            configuration: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy the user-editable fields of `source`, keeping identity and timestamps.
    pub fn apply_content(&mut self, source: &Page) {
        self.cross_id = source.cross_id.clone().or_else(|| self.cross_id.take());
        self.name = source.name.clone();
        self.page_type = source.page_type;
        self.content = source.content.clone();
        self.parent_id = source.parent_id.clone();
        self.order = source.order;
        self.published = source.published;
        self.visibility = source.visibility;
        self.homepage = source.homepage;
        self.configuration = source.configuration.clone();
    }

    /// Content equality, ignoring `updated_at`.
    pub fn same_content(&self, other: &Page) -> bool {
        let mut lhs = self.clone();
        lhs.updated_at = other.updated_at;
        lhs == *other
    }
}

impl Keyed for Page {
    fn key(&self) -> &str {
        &self.id
    }
}
