//! Desired state of an API.
//!
//! CRD specs and import definitions are both turned into a [`DesiredApi`],
//! which is what validation sanitizes and the reconciler applies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::definition::{ApiDefinition, DefinitionVersion};
use super::entity::{Api, ApiLifecycleState, DefinitionContext, LifecycleState, Visibility};
use crate::flow::Flow;
use crate::metadata::{Metadata, MetadataFormat, MetadataReferenceType};
use crate::page::{Page, PageType, PageVisibility};
use crate::plan::{Plan, PlanMode, PlanSecurity, PlanStatus, PlanValidation};
use crate::shared::ids::derive_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredPlan {
    /// Stable key of the plan inside its desired state.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<PlanSecurity>,
    #[serde(default)]
    pub mode: PlanMode,
    #[serde(default)]
    pub validation: PlanValidation,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub characteristics: Vec<String>,
    #[serde(default)]
    pub excluded_groups: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_rule: Option<String>,
    #[serde(default)]
    pub comment_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_conditions: Option<String>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl DesiredPlan {
    /// Explicit id, or one derived from the API and the plan key.
    pub fn resolve_id(&self, api_id: &str) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| derive_id(&[api_id, "plan", &self.key]))
    }

    pub fn to_plan(&self, id: &str, api_id: &str, definition_version: DefinitionVersion) -> Plan {
        let mut plan = Plan::new(id, api_id, &self.name, definition_version);
        plan.cross_id = self.cross_id.clone();
        plan.description = self.description.clone();
        plan.security = self.security.clone();
        plan.mode = self.mode;
        plan.validation = self.validation;
        plan.order = self.order;
        plan.characteristics = self.characteristics.clone();
        plan.excluded_groups = self.excluded_groups.clone();
        plan.tags = self.tags.clone();
        plan.selection_rule = self.selection_rule.clone();
        plan.comment_required = self.comment_required;
        plan.comment_message = self.comment_message.clone();
        plan.general_conditions = self.general_conditions.clone();
        plan.set_status(self.status);
        plan
    }

    pub fn from_plan(plan: &Plan, flows: Vec<Flow>) -> Self {
        Self {
            key: plan.id.clone(),
            id: Some(plan.id.clone()),
            cross_id: plan.cross_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            status: plan.status,
            security: plan.security.clone(),
            mode: plan.mode,
            validation: plan.validation,
            order: plan.order,
            characteristics: plan.characteristics.clone(),
            excluded_groups: plan.excluded_groups.clone(),
            tags: plan.tags.clone(),
            selection_rule: plan.selection_rule.clone(),
            comment_required: plan.comment_required,
            comment_message: plan.comment_message.clone(),
            general_conditions: plan.general_conditions.clone(),
            flows,
        }
    }
}

/// Member identified by its identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredMember {
    pub source: String,
    pub source_id: String,
    pub role: String,
    /// Filled in by validation once the user is found.
    #[serde(skip)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredPage {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Key of the parent page in the same desired state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
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
}

impl DesiredPage {
    pub fn resolve_id(&self, api_id: &str) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| derive_id(&[api_id, "page", &self.key]))
    }

    pub fn to_page(&self, id: &str, api_id: &str, parent_id: Option<String>) -> Page {
        let mut page = Page::for_api(id, api_id, &self.name, self.page_type);
        page.cross_id = self.cross_id.clone();
        page.content = self.content.clone();
        page.parent_id = parent_id;
        page.order = self.order;
        page.published = self.published;
        page.visibility = self.visibility;
        page.homepage = self.homepage;
        page.configuration = self.configuration.clone();
        page
    }

    pub fn from_page(page: &Page) -> Self {
        Self {
            key: page.id.clone(),
            id: Some(page.id.clone()),
            cross_id: page.cross_id.clone(),
            name: page.name.clone(),
            page_type: page.page_type,
            content: page.content.clone(),
            parent: page.parent_id.clone(),
            order: page.order,
            published: page.published,
            visibility: page.visibility,
            homepage: page.homepage,
            configuration: page.configuration.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredMetadata {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub format: MetadataFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DesiredMetadata {
    pub fn to_metadata(&self, api_id: &str) -> Metadata {
        Metadata::new(
            MetadataReferenceType::Api,
            api_id,
            &self.key,
            &self.name,
            self.format,
            self.value.clone(),
        )
    }
}

/// Everything a reconciliation pass needs to know about one API.
///
/// `members` and `pages` set to `None` leave the stored ones untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredApi {
    pub cross_id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub definition: ApiDefinition,
    pub visibility: Visibility,
    pub api_lifecycle_state: Option<ApiLifecycleState>,
    /// Requested runtime state, applied after deployment.
    pub state: Option<LifecycleState>,
    pub definition_context: DefinitionContext,
    pub groups: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub labels: Vec<String>,
    pub api_flows: Vec<Flow>,
    pub plans: Vec<DesiredPlan>,
    pub members: Option<Vec<DesiredMember>>,
    pub pages: Option<Vec<DesiredPage>>,
    pub metadata: Vec<DesiredMetadata>,
}

impl DesiredApi {
    /// Build a new API aggregate from this desired state.
    pub fn to_api(&self, id: &str, environment_id: &str, organization_id: &str) -> Api {
        let mut api = Api::new(
            id,
            &self.cross_id,
            environment_id,
            organization_id,
            &self.name,
            &self.version,
            self.definition.clone(),
        );
        api.description = self.description.clone();
        api.visibility = self.visibility;
        api.api_lifecycle_state = self.api_lifecycle_state.unwrap_or_default();
        api.definition_context = self.definition_context;
        api.groups = self.groups.clone();
        api.categories = self.categories.clone();
        api.labels = self.labels.clone();
        api
    }

    /// Apply this desired state onto a stored API. Identity, creation time,
    /// runtime state, deployment time and origin are kept from `existing`.
    pub fn merge_into(&self, existing: &Api) -> Api {
        let mut api = existing.clone();
        api.cross_id = self.cross_id.clone();
        api.name = self.name.clone();
        api.version = self.version.clone();
        api.description = self.description.clone();
        api.definition = self.definition.clone();
        api.visibility = self.visibility;
        if let Some(state) = self.api_lifecycle_state {
            api.api_lifecycle_state = state;
        }
        api.definition_context.mode = self.definition_context.mode;
        api.definition_context.sync_from = self.definition_context.sync_from;
        api.groups = self.groups.clone();
        api.categories = self.categories.clone();
        api.labels = self.labels.clone();
        api
    }

    /// Renumber the orders of the plans that will stay open 1..n, by current
    /// order then name, so a later reorder of the stored plans finds nothing
    /// to change. Plans for which `skip` holds keep their order.
    pub fn normalize_plan_order<F>(&mut self, skip: F)
    where
        F: Fn(&DesiredPlan) -> bool,
    {
        let mut indexes: Vec<usize> = (0..self.plans.len())
            .filter(|&i| self.plans[i].status != PlanStatus::Closed && !skip(&self.plans[i]))
            .collect();
        indexes.sort_by(|&a, &b| {
            let (a, b) = (&self.plans[a], &self.plans[b]);
            a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name))
        });
        for (position, index) in indexes.into_iter().enumerate() {
            self.plans[index].order = position as i32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(key: &str, name: &str, order: i32) -> DesiredPlan {
        DesiredPlan {
            key: key.into(),
            id: None,
            cross_id: None,
            name: name.into(),
            description: None,
            status: PlanStatus::Published,
            security: None,
            mode: PlanMode::Standard,
            validation: PlanValidation::Auto,
            order,
            characteristics: vec![],
            excluded_groups: vec![],
            tags: vec![],
            selection_rule: None,
            comment_required: false,
            comment_message: None,
            general_conditions: None,
            flows: vec![],
        }
    }

    #[test]
    fn test_plan_id_derives_from_key() {
        let p = plan("gold", "Gold", 1);
        assert_eq!(p.resolve_id("api-1"), p.resolve_id("api-1"));
        assert_ne!(p.resolve_id("api-1"), p.resolve_id("api-2"));

        let explicit = DesiredPlan { id: Some("p-1".into()), ..p };
        assert_eq!(explicit.resolve_id("api-1"), "p-1");
    }

    #[test]
    fn test_to_plan_stamps_publication() {
        let p = plan("gold", "Gold", 3).to_plan("p-1", "api-1", DefinitionVersion::V4);
        assert_eq!(p.status, PlanStatus::Published);
        assert!(p.published_at.is_some());
        assert_eq!(p.order, 3);
    }
}
