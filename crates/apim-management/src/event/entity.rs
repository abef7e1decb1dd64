//! API Event Entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::apis::entity::Api;
use crate::flow::Flow;
use crate::plan::Plan;
use crate::shared::error::Result;
use crate::shared::ids::new_id;
use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiEventType {
    PublishApi,
    StartApi,
    StopApi,
    UnpublishApi,
}

/// Event property holding the deployment number.
pub const DEPLOYMENT_NUMBER: &str = "DEPLOYMENT_NUMBER";
/// Event property holding the deployment label.
pub const DEPLOYMENT_LABEL: &str = "DEPLOYMENT_LABEL";
/// Event property holding the user that triggered the event.
pub const USER: &str = "USER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub plan: Plan,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

/// What the gateway received on a deployment: the API, its flows and its
/// deployable plans with their flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnapshot {
    pub api: Api,
    #[serde(default)]
    pub api_flows: Vec<Flow>,
    #[serde(default)]
    pub plans: Vec<PlanSnapshot>,
}

impl ApiSnapshot {
    pub fn plan(&self, plan_id: &str) -> Option<&PlanSnapshot> {
        self.plans.iter().find(|p| p.plan.id == plan_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(rename = "_id")]
    pub id: String,
    pub api_id: String,
    pub environment_id: String,
    #[serde(rename = "type")]
    pub event_type: ApiEventType,
    /// JSON-encoded [`ApiSnapshot`] for publish events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ApiEvent {
    pub fn new(api_id: &str, environment_id: &str, event_type: ApiEventType) -> Self {
        Self {
            id: new_id(),
            api_id: api_id.to_string(),
            environment_id: environment_id.to_string(),
            event_type,
            payload: None,
            properties: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn publish(snapshot: &ApiSnapshot, environment_id: &str) -> Result<Self> {
        let mut event = Self::new(&snapshot.api.id, environment_id, ApiEventType::PublishApi);
        event.payload = Some(serde_json::to_string(snapshot)?);
        Ok(event)
    }

    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Decode the snapshot of a publish event; `None` when there is no payload.
    pub fn snapshot(&self) -> Result<Option<ApiSnapshot>> {
        match &self.payload {
            Some(payload) => Ok(Some(serde_json::from_str(payload)?)),
            None => Ok(None),
        }
    }
}

impl Keyed for ApiEvent {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::{ApiDefinition, ApiDefinitionV4, ApiType, FlowExecution};
    use crate::plan::PlanStatus;
    use crate::apis::definition::DefinitionVersion;

    #[test]
    fn test_publish_payload_decodes_to_snapshot() {
        let api = Api::new(
            "api-1",
            "cross-1",
            "env",
            "org",
            "Orders",
            "1.0",
            ApiDefinition::V4(ApiDefinitionV4 {
                api_type: ApiType::Proxy,
                listeners: vec![],
                endpoint_groups: vec![],
                flow_execution: FlowExecution::default(),
                properties: vec![],
                services: Default::default(),
                resources: vec![],
                tags: vec![],
                response_templates: Default::default(),
            }),
        );
        let mut plan = Plan::new("p1", "api-1", "Gold", DefinitionVersion::V4);
        plan.set_status(PlanStatus::Published);
        let snapshot = ApiSnapshot {
            api,
            api_flows: vec![],
            plans: vec![PlanSnapshot { plan, flows: vec![] }],
        };

        let event = ApiEvent::publish(&snapshot, "env").unwrap().with_property(DEPLOYMENT_NUMBER, "1");
        assert_eq!(event.event_type, ApiEventType::PublishApi);
        let decoded = event.snapshot().unwrap().unwrap();
        assert_eq!(decoded.api.id, "api-1");
        assert!(decoded.plan("p1").is_some());
        assert!(ApiEvent::new("api-1", "env", ApiEventType::StartApi).snapshot().unwrap().is_none());
    }
}
