//! Get API Metadata Use Case
//!
//! Environment metadata acts as defaults; API metadata with the same key
//! overrides the value.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::load_api;
use crate::metadata::MetadataFormat;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

/// Filter on where the effective value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataSource {
    /// Only the environment default applies.
    Global,
    /// The API sets its own value.
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetApiMetadataQuery {
    pub api_id: String,
    #[serde(default)]
    pub source: Option<MetadataSource>,
    /// `key`, `name` or `value`; a leading `-` sorts descending.
    #[serde(default)]
    pub sort_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetadata {
    pub key: String,
    pub name: String,
    pub format: MetadataFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ApiMetadata {
    /// The API value when set, otherwise the environment default.
    fn effective_value(&self) -> Option<&String> {
        self.value.as_ref().or(self.default_value.as_ref())
    }

    fn matches(&self, source: MetadataSource) -> bool {
        match source {
            MetadataSource::Global => self.default_value.is_some() && self.value.is_none(),
            MetadataSource::Api => self.value.is_some(),
        }
    }
}

/// Absent values sort after present ones in both directions.
fn compare_values(a: Option<&String>, b: Option<&String>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(a),
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort(metadata: &mut [ApiMetadata], sort_by: &str) -> Result<(), UseCaseError> {
    let (field, descending) = match sort_by.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort_by, false),
    };
    let directed = |ordering: Ordering| if descending { ordering.reverse() } else { ordering };
    match field {
        "key" => metadata.sort_by(|a, b| directed(a.key.cmp(&b.key))),
        "name" => metadata.sort_by(|a, b| directed(a.name.cmp(&b.name))),
        "value" => metadata.sort_by(|a, b| compare_values(a.effective_value(), b.effective_value(), descending)),
        other => {
            return Err(UseCaseError::validation(
                "INVALID_SORT_FIELD",
                format!("Cannot sort metadata by [{other}]"),
            ))
        }
    }
    Ok(())
}

pub struct GetApiMetadataUseCase {
    services: DomainServices,
}

impl GetApiMetadataUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(&self, query: GetApiMetadataQuery, ctx: ExecutionContext) -> UseCaseResult<Vec<ApiMetadata>> {
        self.run(query, &ctx).await.into()
    }

    async fn run(&self, query: GetApiMetadataQuery, ctx: &ExecutionContext) -> Result<Vec<ApiMetadata>, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &query.api_id).await?;

        let mut merged: BTreeMap<String, ApiMetadata> = BTreeMap::new();
        for default in self.services.metadata.find_by_environment(&api.environment_id).await? {
            merged.insert(
                default.key.clone(),
                ApiMetadata {
                    key: default.key,
                    name: default.name,
                    format: default.format,
                    value: None,
                    default_value: default.value,
                },
            );
        }
        for own in self.services.metadata.find_by_api(&api.id).await? {
            merged
                .entry(own.key.clone())
                .and_modify(|m| {
                    m.name = own.name.clone();
                    m.format = own.format;
                    m.value = own.value.clone();
                })
                .or_insert(ApiMetadata {
                    key: own.key,
                    name: own.name,
                    format: own.format,
                    value: own.value,
                    default_value: None,
                });
        }

        let mut metadata: Vec<ApiMetadata> = merged
            .into_values()
            .filter(|m| query.source.map_or(true, |source| m.matches(source)))
            .collect();
        if let Some(sort_by) = query.sort_by.as_deref() {
            sort(&mut metadata, sort_by)?;
        }
        Ok(metadata)
    }
}
