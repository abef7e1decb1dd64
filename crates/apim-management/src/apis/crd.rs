//! API custom resource, as sent by the Kubernetes operator.
//!
//! Plans and pages are keyed maps so the operator can refer to them without
//! knowing their ids; the ids are derived from the API id and the key.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::definition::ApiDefinition;
use super::desired::{DesiredApi, DesiredMember, DesiredMetadata, DesiredPage, DesiredPlan};
use super::entity::{ApiLifecycleState, DefinitionContext, LifecycleState, SyncFrom, Visibility};
use crate::flow::Flow;
use crate::shared::ids::derive_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrdSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub cross_id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub definition: ApiDefinition,
    /// Runtime state the API should end up in.
    #[serde(default = "default_state")]
    pub state: LifecycleState,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<ApiLifecycleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_context: Option<DefinitionContext>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub plans: BTreeMap<String, DesiredPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub members: Option<Vec<DesiredMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub pages: Option<BTreeMap<String, DesiredPage>>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub metadata: Vec<DesiredMetadata>,
}

fn default_state() -> LifecycleState {
    LifecycleState::Started
}

impl ApiCrdSpec {
    /// Id the API gets in `environment_id` when the resource does not carry one.
    pub fn resolve_id(&self, environment_id: &str) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| derive_id(&[environment_id, "api", &self.cross_id]))
    }

    pub fn into_desired(self) -> DesiredApi {
        let plans = self
            .plans
            .into_iter()
            .map(|(key, plan)| DesiredPlan { key, ..plan })
            .collect();
        let pages = self.pages.map(|pages| {
            pages
                .into_iter()
                .map(|(key, page)| DesiredPage { key, ..page })
                .collect()
        });

        DesiredApi {
            cross_id: self.cross_id,
            name: self.name,
            version: self.version,
            description: self.description,
            definition: self.definition,
            visibility: self.visibility,
            api_lifecycle_state: self.lifecycle_state,
            state: Some(self.state),
            definition_context: self
                .definition_context
                .unwrap_or_else(|| DefinitionContext::kubernetes(SyncFrom::Management)),
            groups: self.groups,
            categories: self.categories,
            labels: self.labels,
            api_flows: self.flows,
            plans,
            members: self.members,
            pages,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrdErrors {
    pub warning: Vec<String>,
    pub severe: Vec<String>,
}

/// Status reported back to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrdStatus {
    pub id: String,
    pub cross_id: String,
    pub environment_id: String,
    pub organization_id: String,
    pub state: LifecycleState,
    /// Plan key to plan id.
    pub plans: BTreeMap<String, String>,
    pub errors: CrdErrors,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_come_from_maps() {
        let spec: ApiCrdSpec = serde_json::from_value(json!({
            "crossId": "orders",
            "name": "Orders",
            "version": "1",
            "definition": { "definitionVersion": "V4", "listeners": [] },
            "plans": {
                "gold": { "name": "Gold", "security": { "type": "API_KEY" } }
            },
            "pages": {
                "docs": { "name": "Docs", "type": "FOLDER" }
            }
        }))
        .unwrap();
        assert_eq!(spec.state, LifecycleState::Started);
        assert_ne!(spec.resolve_id("env-1"), spec.resolve_id("env-2"));

        let desired = spec.into_desired();
        assert_eq!(desired.plans[0].key, "gold");
        assert_eq!(desired.pages.as_ref().unwrap()[0].key, "docs");
        assert!(desired.members.is_none());
        assert!(desired.definition_context.syncs_from_management());
    }
}
