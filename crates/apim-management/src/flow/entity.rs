//! Flow Entities

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::shared::memory::Keyed;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpMethod {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathOperatorKind {
    Equals,
    #[default]
    StartsWith,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOperator {
    #[serde(default = "default_root_path")]
    pub path: String,
    #[serde(default)]
    pub operator: PathOperatorKind,
}

fn default_root_path() -> String {
    "/".to_string()
}

impl Default for PathOperator {
    fn default() -> Self {
        Self {
            path: default_root_path(),
            operator: PathOperatorKind::StartsWith,
        }
    }
}

/// Step of a V2 flow (pre or post phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepV2 {
    pub name: String,
    pub policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowV2 {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub path_operator: PathOperator,
    /// Empty means every method.
    #[serde(default)]
    pub methods: BTreeSet<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub pre: Vec<StepV2>,
    #[serde(default)]
    pub post: Vec<StepV2>,
}

/// Step of a V4 flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepV4 {
    pub name: String,
    pub policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSelector {
    pub path: String,
    #[serde(default)]
    pub path_operator: PathOperatorKind,
    #[serde(default)]
    pub methods: BTreeSet<HttpMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSelector {
    pub channel: String,
    #[serde(default)]
    pub channel_operator: PathOperatorKind,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub entrypoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSelector {
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selector {
    Http(HttpSelector),
    Channel(ChannelSelector),
    Condition(ConditionSelector),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowV4 {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub selectors: Vec<Selector>,
    #[serde(default)]
    pub request: Vec<StepV4>,
    #[serde(default)]
    pub response: Vec<StepV4>,
    #[serde(default)]
    pub subscribe: Vec<StepV4>,
    #[serde(default)]
    pub publish: Vec<StepV4>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// A flow of either generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flowVersion")]
pub enum Flow {
    V2(FlowV2),
    V4(FlowV4),
}

impl Flow {
    /// Policy ids used by the enabled steps of this flow.
    pub fn policies(&self) -> Vec<&str> {
        match self {
            Flow::V2(flow) => flow
                .pre
                .iter()
                .chain(flow.post.iter())
                .filter(|s| s.enabled)
                .map(|s| s.policy.as_str())
                .collect(),
            Flow::V4(flow) => flow
                .request
                .iter()
                .chain(flow.response.iter())
                .chain(flow.subscribe.iter())
                .chain(flow.publish.iter())
                .filter(|s| s.enabled)
                .map(|s| s.policy.as_str())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Flow::V2(flow) => &flow.name,
            Flow::V4(flow) => &flow.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowReferenceType {
    Api,
    Plan,
}

impl FlowReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowReferenceType::Api => "API",
            FlowReferenceType::Plan => "PLAN",
        }
    }
}

/// Stored flows of one API or plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSet {
    #[serde(rename = "_id")]
    pub id: String,
    pub reference_type: FlowReferenceType,
    pub reference_id: String,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl FlowSet {
    pub fn new(reference_type: FlowReferenceType, reference_id: &str, flows: Vec<Flow>) -> Self {
        Self {
            id: Self::id_for(reference_type, reference_id),
            reference_type,
            reference_id: reference_id.to_string(),
            flows,
            updated_at: Utc::now(),
        }
    }

    pub fn id_for(reference_type: FlowReferenceType, reference_id: &str) -> String {
        format!("{}:{}", reference_type.as_str(), reference_id)
    }
}

impl Keyed for FlowSet {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flow_v2_defaults_from_json() {
        let flow: Flow = serde_json::from_value(json!({
            "flowVersion": "V2",
            "name": "all",
            "pre": [{ "name": "Rate limit", "policy": "rate-limit" }]
        }))
        .unwrap();

        match flow {
            Flow::V2(f) => {
                assert!(f.enabled);
                assert_eq!(f.path_operator.path, "/");
                assert_eq!(f.path_operator.operator, PathOperatorKind::StartsWith);
                assert!(f.pre[0].enabled);
                assert!(f.methods.is_empty());
            }
            Flow::V4(_) => panic!("expected a V2 flow"),
        }
    }

    #[test]
    fn test_policies_skip_disabled_steps() {
        let flow: Flow = serde_json::from_value(json!({
            "flowVersion": "V4",
            "selectors": [{ "type": "http", "path": "/orders" }],
            "request": [
                { "name": "a", "policy": "transform-headers" },
                { "name": "b", "policy": "groovy", "enabled": false }
            ],
            "response": [{ "name": "c", "policy": "json-to-xml" }]
        }))
        .unwrap();

        assert_eq!(flow.policies(), vec!["transform-headers", "json-to-xml"]);
    }

    #[test]
    fn test_selector_tagging() {
        let selector = Selector::Condition(ConditionSelector {
            condition: "{#request.headers['x'] != null}".to_string(),
        });
        let value = serde_json::to_value(&selector).unwrap();
        assert_eq!(value["type"], "condition");
    }
}
