//! Portable definition of an API: what export produces and import consumes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::definition::ApiDefinition;
use super::desired::{DesiredApi, DesiredMember, DesiredMetadata, DesiredPage, DesiredPlan};
use super::entity::{Api, ApiLifecycleState, DefinitionContext, Visibility};
use crate::flow::Flow;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedApi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub cross_id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub definition: ApiDefinition,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub lifecycle_state: ApiLifecycleState,
    #[serde(default)]
    pub definition_context: DefinitionContext,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefinition {
    #[serde(default = "default_export_version")]
    pub export_version: String,
    pub api: ExportedApi,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub plans: Vec<DesiredPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub members: Option<Vec<DesiredMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub pages: Option<Vec<DesiredPage>>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub metadata: Vec<DesiredMetadata>,
}

fn default_export_version() -> String {
    EXPORT_VERSION.to_string()
}

impl ExportedApi {
    pub fn from_api(api: &Api) -> Self {
        Self {
            id: Some(api.id.clone()),
            cross_id: api.cross_id.clone(),
            name: api.name.clone(),
            version: api.version.clone(),
            description: api.description.clone(),
            definition: api.definition.clone(),
            visibility: api.visibility,
            lifecycle_state: api.api_lifecycle_state,
            definition_context: api.definition_context,
            groups: api.groups.clone(),
            categories: api.categories.clone(),
            labels: api.labels.clone(),
        }
    }
}

impl ImportDefinition {
    /// Desired state for an existing API: plan and page ids are kept so they
    /// match the stored ones.
    pub fn into_desired(self) -> DesiredApi {
        let plans = self
            .plans
            .into_iter()
            .map(|plan| {
                let key = if plan.key.is_empty() {
                    plan.id.clone().unwrap_or_else(|| plan.name.clone())
                } else {
                    plan.key.clone()
                };
                DesiredPlan { key, ..plan }
            })
            .collect();
        let pages = self.pages.map(|pages| {
            pages
                .into_iter()
                .map(|page| {
                    let key = if page.key.is_empty() {
                        page.id.clone().unwrap_or_else(|| page.name.clone())
                    } else {
                        page.key.clone()
                    };
                    DesiredPage { key, ..page }
                })
                .collect()
        });

        DesiredApi {
            cross_id: self.api.cross_id,
            name: self.api.name,
            version: self.api.version,
            description: self.api.description,
            definition: self.api.definition,
            visibility: self.api.visibility,
            api_lifecycle_state: Some(self.api.lifecycle_state),
            state: None,
            definition_context: self.api.definition_context,
            groups: self.api.groups,
            categories: self.api.categories,
            labels: self.api.labels,
            api_flows: self.flows,
            plans,
            members: self.members,
            pages,
            metadata: self.metadata,
        }
    }

    /// Desired state for a brand new API: source ids are dropped so new ones
    /// derive from the new API id and the keys.
    pub fn into_new_desired(self) -> DesiredApi {
        let mut desired = self.into_desired();
        for plan in &mut desired.plans {
            plan.id = None;
        }
        if let Some(pages) = desired.pages.as_mut() {
            for page in pages {
                page.id = None;
            }
        }
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_desired_drops_source_ids() {
        let definition: ImportDefinition = serde_json::from_value(json!({
            "api": {
                "id": "src-api",
                "crossId": "orders",
                "name": "Orders",
                "version": "1",
                "definition": { "definitionVersion": "V4" }
            },
            "plans": [{ "id": "src-plan", "name": "Gold", "security": { "type": "KEY_LESS" } }],
            "pages": [
                { "id": "src-folder", "name": "Guides", "type": "FOLDER" },
                { "id": "src-page", "name": "Intro", "type": "MARKDOWN", "parent": "src-folder" }
            ]
        }))
        .unwrap();

        let desired = definition.clone().into_desired();
        assert_eq!(desired.plans[0].key, "src-plan");
        assert_eq!(desired.plans[0].id.as_deref(), Some("src-plan"));

        let fresh = definition.into_new_desired();
        assert_eq!(fresh.plans[0].key, "src-plan");
        assert!(fresh.plans[0].id.is_none());
        let pages = fresh.pages.unwrap();
        assert_eq!(pages[1].parent.as_deref(), Some("src-folder"));
        assert!(pages.iter().all(|p| p.id.is_none()));
    }
}
