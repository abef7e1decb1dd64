//! Directory Entities

use serde::{Deserialize, Serialize};

use crate::shared::memory::Keyed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    /// Identity provider, e.g. `memory`, `gravitee`, `oidc`.
    pub source: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: &str, organization_id: &str, source: &str, source_id: &str) -> Self {
        Self {
            id: id.to_string(),
            organization_id: organization_id.to_string(),
            source: source.to_string(),
            source_id: source_id.to_string(),
            email: None,
            display_name: None,
        }
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    pub environment_id: String,
    pub name: String,
}

impl Keyed for Group {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub environment_id: String,
    pub key: String,
    pub name: String,
}

impl Keyed for Category {
    fn key(&self) -> &str {
        &self.id
    }
}
