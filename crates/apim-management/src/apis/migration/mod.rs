//! V2 to V4 migration.
//!
//! [`check`] classifies an API before anything is written; [`mapper`] does
//! the one-way mapping of definitions, plans and flows.

pub mod mapper;

use apim_config::MigrationConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::apis::definition::{ApiDefinition, ExecutionMode};
use crate::apis::entity::Api;
use crate::flow::Flow;

/// Outcome of a migration check, ordered by weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationState {
    Migrated,
    Migratable,
    CanBeForced,
    Impossible,
}

impl MigrationState {
    pub fn weight(&self) -> u8 {
        match self {
            MigrationState::Migrated => 0,
            MigrationState::Migratable => 1,
            MigrationState::CanBeForced => 2,
            MigrationState::Impossible => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationIssue {
    pub message: String,
    pub state: MigrationState,
}

impl MigrationIssue {
    fn new(state: MigrationState, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationMode {
    #[default]
    Normal,
    DryRun,
    Force,
}

impl MigrationMode {
    /// Whether an API in `state` gets written in this mode.
    pub fn persists(&self, state: MigrationState) -> bool {
        match self {
            MigrationMode::DryRun => false,
            MigrationMode::Normal => state == MigrationState::Migratable,
            MigrationMode::Force => state != MigrationState::Impossible,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub api_id: String,
    pub state: MigrationState,
    pub issues: Vec<MigrationIssue>,
}

/// The heaviest issue decides; no issue means migratable.
pub fn overall_state(issues: &[MigrationIssue]) -> MigrationState {
    issues
        .iter()
        .map(|i| i.state)
        .max_by_key(MigrationState::weight)
        .unwrap_or(MigrationState::Migratable)
}

/// Everything that stands between `api` and a V4 definition.
pub fn check<'a>(
    api: &Api,
    synchronized: bool,
    flows: impl IntoIterator<Item = &'a Flow>,
    config: &MigrationConfig,
) -> Vec<MigrationIssue> {
    let ApiDefinition::V2(definition) = &api.definition else {
        return vec![MigrationIssue::new(
            MigrationState::Impossible,
            format!("Cannot migrate an API which is not a v2 definition (found {})", api.definition_version()),
        )];
    };

    let mut issues = Vec::new();
    if !synchronized {
        issues.push(MigrationIssue::new(
            MigrationState::CanBeForced,
            "API is not synchronized: undeployed changes will be part of the migration",
        ));
    }
    if definition.execution_mode == ExecutionMode::V3 {
        issues.push(MigrationIssue::new(
            MigrationState::CanBeForced,
            "API uses the V3 execution engine; behaviour may change on the V4 engine",
        ));
    }

    let mut incompatible: Vec<&str> = flows
        .into_iter()
        .flat_map(|f| f.policies())
        .filter(|p| config.incompatible_policies.iter().any(|i| i == p))
        .collect();
    incompatible.sort_unstable();
    incompatible.dedup();
    for policy in incompatible {
        issues.push(MigrationIssue::new(
            MigrationState::Impossible,
            format!("Policy [{policy}] is not compatible with V4 APIs"),
        ));
    }

    for group in &definition.proxy.groups {
        for endpoint in &group.endpoints {
            if !config.http_endpoint_types.iter().any(|t| t.eq_ignore_ascii_case(&endpoint.endpoint_type)) {
                issues.push(MigrationIssue::new(
                    MigrationState::Impossible,
                    format!(
                        "Endpoint [{}] of type [{}] has no V4 connector",
                        endpoint.name, endpoint.endpoint_type
                    ),
                ));
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::ApiDefinitionV1;
    use serde_json::json;

    fn v2_api(definition: serde_json::Value) -> Api {
        let definition: ApiDefinition = serde_json::from_value(definition).unwrap();
        Api::new("api-1", "cross", "env", "org", "Orders", "1", definition)
    }

    fn base_definition() -> serde_json::Value {
        json!({
            "definitionVersion": "V2",
            "proxy": {
                "virtualHosts": [{ "path": "/orders" }],
                "groups": [{ "name": "default", "endpoints": [{ "name": "e1", "target": "https://backend" }] }]
            }
        })
    }

    #[test]
    fn test_clean_synchronized_api_is_migratable() {
        let issues = check(&v2_api(base_definition()), true, [], &MigrationConfig::default());
        assert!(issues.is_empty());
        assert_eq!(overall_state(&issues), MigrationState::Migratable);
    }

    #[test]
    fn test_heaviest_issue_wins() {
        let mut definition = base_definition();
        definition["executionMode"] = json!("V3");
        definition["proxy"]["groups"][0]["endpoints"][0]["type"] = json!("kafka");
        let issues = check(&v2_api(definition), false, [], &MigrationConfig::default());

        assert_eq!(issues.len(), 3);
        assert_eq!(overall_state(&issues), MigrationState::Impossible);
    }

    #[test]
    fn test_incompatible_policy_reported_once() {
        let flow: Flow = serde_json::from_value(json!({
            "flowVersion": "V2",
            "pre": [{ "name": "a", "policy": "cloud-events" }],
            "post": [{ "name": "b", "policy": "cloud-events" }]
        }))
        .unwrap();
        let issues = check(&v2_api(base_definition()), true, [&flow, &flow], &MigrationConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].state, MigrationState::Impossible);
    }

    #[test]
    fn test_non_v2_is_impossible() {
        let api = Api::new("a", "c", "e", "o", "n", "1", ApiDefinition::V1(ApiDefinitionV1::default()));
        let issues = check(&api, true, [], &MigrationConfig::default());
        assert_eq!(overall_state(&issues), MigrationState::Impossible);
    }

    #[test]
    fn test_modes() {
        assert!(!MigrationMode::DryRun.persists(MigrationState::Migratable));
        assert!(MigrationMode::Normal.persists(MigrationState::Migratable));
        assert!(!MigrationMode::Normal.persists(MigrationState::CanBeForced));
        assert!(MigrationMode::Force.persists(MigrationState::CanBeForced));
        assert!(!MigrationMode::Force.persists(MigrationState::Impossible));
    }
}
