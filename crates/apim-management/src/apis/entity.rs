//! API Entity

use std::collections::BTreeSet;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::definition::{ApiDefinition, DefinitionVersion};
use crate::shared::memory::Keyed;

/// Gateway runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Started,
    #[default]
    Stopped,
}

/// Portal-facing publication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiLifecycleState {
    #[default]
    Created,
    Published,
    Unpublished,
    Deprecated,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// Where the API definition was authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    #[default]
    Management,
    Kubernetes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginMode {
    #[default]
    FullyManaged,
    ApiDefinitionOnly,
}

/// Which side pushes the definition to the gateway. With `MANAGEMENT` this
/// plane deploys after reconciling; with `KUBERNETES` the operator does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncFrom {
    #[default]
    Management,
    Kubernetes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionContext {
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub mode: OriginMode,
    #[serde(default)]
    pub sync_from: SyncFrom,
}

impl DefinitionContext {
    pub fn kubernetes(sync_from: SyncFrom) -> Self {
        Self {
            origin: Origin::Kubernetes,
            mode: OriginMode::FullyManaged,
            sync_from,
        }
    }

    pub fn syncs_from_management(&self) -> bool {
        self.sync_from == SyncFrom::Management
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    #[serde(rename = "_id")]
    pub id: String,

    /// Identity across environments; unique together with `environment_id`.
    pub cross_id: String,

    pub environment_id: String,
    pub organization_id: String,

    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub definition: ApiDefinition,

    #[serde(default)]
    pub lifecycle_state: LifecycleState,
    #[serde(default)]
    pub api_lifecycle_state: ApiLifecycleState,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub definition_context: DefinitionContext,

    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub disable_membership_notifications: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl Api {
    pub fn new(
        id: impl Into<String>,
        cross_id: impl Into<String>,
        environment_id: impl Into<String>,
        organization_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        definition: ApiDefinition,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            cross_id: cross_id.into(),
            environment_id: environment_id.into(),
            organization_id: organization_id.into(),
            name: name.into(),
            version: version.into(),
            description: None,
            definition,
            lifecycle_state: LifecycleState::Stopped,
            api_lifecycle_state: ApiLifecycleState::Created,
            visibility: Visibility::Private,
            definition_context: DefinitionContext::default(),
            groups: BTreeSet::new(),
            categories: BTreeSet::new(),
            labels: vec![],
            disable_membership_notifications: false,
            created_at: now,
            updated_at: now,
            deployed_at: None,
        }
    }

    pub fn definition_version(&self) -> DefinitionVersion {
        self.definition.version()
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle_state == LifecycleState::Started
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed_at.is_some()
    }

    /// Content equality, ignoring `updated_at`.
    pub fn same_content(&self, other: &Api) -> bool {
        let mut lhs = self.clone();
        lhs.updated_at = other.updated_at;
        lhs == *other
    }
}

impl Keyed for Api {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::ApiDefinitionV1;

    fn api() -> Api {
        Api::new("api-1", "cross-1", "env-1", "org-1", "Orders", "1.0", ApiDefinition::V1(ApiDefinitionV1::default()))
    }

    #[test]
    fn test_new_api_defaults() {
        let api = api();
        assert_eq!(api.lifecycle_state, LifecycleState::Stopped);
        assert!(!api.is_deployed());
        assert_eq!(api.definition_version(), DefinitionVersion::V1);
        assert!(api.definition_context.syncs_from_management());
    }

    #[test]
    fn test_same_content_ignores_updated_at() {
        let a = api();
        let mut b = a.clone();
        b.updated_at = a.updated_at + chrono::Duration::seconds(30);
        assert!(a.same_content(&b));

        b.name = "Payments".to_string();
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_bson_round_trip_keeps_definition() {
        let a = api();
        let doc = bson::to_document(&a).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "api-1");
        let back: Api = bson::from_document(doc).unwrap();
        assert_eq!(back.definition_version(), DefinitionVersion::V1);
    }
}
