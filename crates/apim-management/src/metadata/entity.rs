//! Metadata Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataFormat {
    #[default]
    String,
    Numeric,
    Boolean,
    Date,
    Mail,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataReferenceType {
    Environment,
    Api,
}

impl MetadataReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataReferenceType::Environment => "ENVIRONMENT",
            MetadataReferenceType::Api => "API",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub reference_type: MetadataReferenceType,
    pub reference_id: String,
    pub name: String,
    #[serde(default)]
    pub format: MetadataFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Metadata {
    pub fn new(
        reference_type: MetadataReferenceType,
        reference_id: &str,
        key: &str,
        name: impl Into<String>,
        format: MetadataFormat,
        value: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Self::id_for(reference_type, reference_id, key),
            key: key.to_string(),
            reference_type,
            reference_id: reference_id.to_string(),
            name: name.into(),
            format,
            value,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_for(reference_type: MetadataReferenceType, reference_id: &str, key: &str) -> String {
        format!("{}:{}:{}", reference_type.as_str(), reference_id, key)
    }

    pub fn same_content(&self, other: &Metadata) -> bool {
        self.name == other.name && self.format == other.format && self.value == other.value
    }
}

impl Keyed for Metadata {
    fn key(&self) -> &str {
        &self.id
    }
}
