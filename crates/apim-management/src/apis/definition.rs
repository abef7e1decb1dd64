//! API definitions, one variant per definition generation.
//!
//! Rollback, migration and export all dispatch on [`ApiDefinition`] with an
//! exhaustive match, so adding a generation is a compile error everywhere it
//! matters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinitionVersion {
    V1,
    V2,
    V4,
    Native,
    Federated,
}

impl std::fmt::Display for DefinitionVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DefinitionVersion::V1 => "V1",
            DefinitionVersion::V2 => "V2",
            DefinitionVersion::V4 => "V4",
            DefinitionVersion::Native => "NATIVE",
            DefinitionVersion::Federated => "FEDERATED",
        };
        f.write_str(s)
    }
}

/// API property; dynamic ones are owned by the dynamic property service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub dynamic: bool,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            encrypted: false,
            dynamic: false,
        }
    }

    pub fn dynamic(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dynamic: true,
            ..Self::new(key, value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPropertyService {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression driving the provider polling.
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "default_dps_provider")]
    pub provider: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

fn default_dps_provider() -> String {
    "HTTP".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_property: Option<DynamicPropertyService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

// ---------------------------------------------------------------------------
// V1
// ---------------------------------------------------------------------------

/// Legacy definition kept verbatim; it can be stored and exported but never
/// rolled back or migrated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionV1 {
    #[serde(default)]
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// V2
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    V3,
    #[default]
    V4Emulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowMode {
    #[default]
    Default,
    BestMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadBalancerType {
    #[default]
    RoundRobin,
    Random,
    WeightedRoundRobin,
    WeightedRandom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub path: String,
    #[serde(default)]
    pub override_entrypoint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointV2 {
    pub name: String,
    pub target: String,
    #[serde(rename = "type", default = "default_endpoint_type")]
    pub endpoint_type: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub backup: bool,
    #[serde(default = "default_enabled")]
    pub inherit: bool,
}

fn default_endpoint_type() -> String {
    "http".to_string()
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroupV2 {
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointV2>,
    #[serde(default)]
    pub load_balancing: LoadBalancerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyV2 {
    #[serde(default)]
    pub virtual_hosts: Vec<VirtualHost>,
    #[serde(default = "default_enabled")]
    pub strip_context_path: bool,
    #[serde(default)]
    pub preserve_host: bool,
    #[serde(default)]
    pub groups: Vec<EndpointGroupV2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionV2 {
    pub proxy: ProxyV2,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub flow_mode: FlowMode,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub services: ApiServices,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub response_templates: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// V4
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiType {
    #[default]
    Proxy,
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub path: String,
    #[serde(default)]
    pub override_access: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrypoint {
    #[serde(rename = "type")]
    pub entrypoint_type: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpListener {
    #[serde(default)]
    pub paths: Vec<ListenerPath>,
    #[serde(default)]
    pub entrypoints: Vec<Entrypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListener {
    #[serde(default)]
    pub entrypoints: Vec<Entrypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpListener {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub entrypoints: Vec<Entrypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Listener {
    Http(HttpListener),
    Subscription(SubscriptionListener),
    Tcp(TcpListener),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointV4 {
    pub name: String,
    #[serde(rename = "type")]
    pub endpoint_type: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_enabled")]
    pub inherit_configuration: bool,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub secondary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroupV4 {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: String,
    #[serde(default)]
    pub load_balancer: LoadBalancerType,
    #[serde(default)]
    pub endpoints: Vec<EndpointV4>,
    #[serde(default)]
    pub shared_configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowExecution {
    #[serde(default)]
    pub mode: FlowMode,
    #[serde(default)]
    pub match_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionV4 {
    #[serde(default)]
    pub api_type: ApiType,
    #[serde(default)]
    pub listeners: Vec<Listener>,
    #[serde(default)]
    pub endpoint_groups: Vec<EndpointGroupV4>,
    #[serde(default)]
    pub flow_execution: FlowExecution,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub services: ApiServices,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub response_templates: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Native and federated
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeListener {
    pub host: String,
    #[serde(default)]
    pub entrypoints: Vec<Entrypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionNative {
    #[serde(default)]
    pub listeners: Vec<NativeListener>,
    #[serde(default)]
    pub endpoint_groups: Vec<EndpointGroupV4>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub services: ApiServices,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// API discovered on a third-party gateway; never deployed by this plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionFederated {
    pub integration_id: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub server: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Sum type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "definitionVersion", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiDefinition {
    V1(ApiDefinitionV1),
    V2(ApiDefinitionV2),
    V4(ApiDefinitionV4),
    Native(ApiDefinitionNative),
    Federated(ApiDefinitionFederated),
}

impl ApiDefinition {
    pub fn version(&self) -> DefinitionVersion {
        match self {
            ApiDefinition::V1(_) => DefinitionVersion::V1,
            ApiDefinition::V2(_) => DefinitionVersion::V2,
            ApiDefinition::V4(_) => DefinitionVersion::V4,
            ApiDefinition::Native(_) => DefinitionVersion::Native,
            ApiDefinition::Federated(_) => DefinitionVersion::Federated,
        }
    }

    /// Properties of definitions that carry them.
    pub fn properties(&self) -> Option<&[Property]> {
        match self {
            ApiDefinition::V2(d) => Some(&d.properties),
            ApiDefinition::V4(d) => Some(&d.properties),
            ApiDefinition::Native(d) => Some(&d.properties),
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => None,
        }
    }

    pub fn properties_mut(&mut self) -> Option<&mut Vec<Property>> {
        match self {
            ApiDefinition::V2(d) => Some(&mut d.properties),
            ApiDefinition::V4(d) => Some(&mut d.properties),
            ApiDefinition::Native(d) => Some(&mut d.properties),
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => None,
        }
    }

    pub fn services(&self) -> Option<&ApiServices> {
        match self {
            ApiDefinition::V2(d) => Some(&d.services),
            ApiDefinition::V4(d) => Some(&d.services),
            ApiDefinition::Native(d) => Some(&d.services),
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => None,
        }
    }

    pub fn services_mut(&mut self) -> Option<&mut ApiServices> {
        match self {
            ApiDefinition::V2(d) => Some(&mut d.services),
            ApiDefinition::V4(d) => Some(&mut d.services),
            ApiDefinition::Native(d) => Some(&mut d.services),
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            ApiDefinition::V2(d) => &d.tags,
            ApiDefinition::V4(d) => &d.tags,
            ApiDefinition::Native(d) => &d.tags,
            ApiDefinition::V1(_) | ApiDefinition::Federated(_) => &[],
        }
    }

    /// Context paths the gateway would expose for this definition.
    pub fn context_paths(&self) -> Vec<(Option<String>, String)> {
        match self {
            ApiDefinition::V2(d) => d
                .proxy
                .virtual_hosts
                .iter()
                .map(|vh| (vh.host.clone(), vh.path.clone()))
                .collect(),
            ApiDefinition::V4(d) => d
                .listeners
                .iter()
                .filter_map(|l| match l {
                    Listener::Http(http) => Some(http),
                    _ => None,
                })
                .flat_map(|http| http.paths.iter().map(|p| (p.host.clone(), p.path.clone())))
                .collect(),
            ApiDefinition::Native(_) | ApiDefinition::V1(_) | ApiDefinition::Federated(_) => vec![],
        }
    }

    /// Whether the gateway runs this definition; federated APIs live elsewhere.
    pub fn is_deployable(&self) -> bool {
        !matches!(self, ApiDefinition::Federated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_tag_selects_variant() {
        let def: ApiDefinition = serde_json::from_value(json!({
            "definitionVersion": "V2",
            "proxy": {
                "virtualHosts": [{ "path": "/orders" }],
                "groups": [{ "name": "default", "endpoints": [{ "name": "e1", "target": "https://backend" }] }]
            }
        }))
        .unwrap();

        assert_eq!(def.version(), DefinitionVersion::V2);
        match &def {
            ApiDefinition::V2(v2) => {
                assert_eq!(v2.execution_mode, ExecutionMode::V4Emulation);
                assert_eq!(v2.proxy.groups[0].endpoints[0].endpoint_type, "http");
                assert!(v2.proxy.strip_context_path);
            }
            other => panic!("unexpected {:?}", other.version()),
        }
        assert_eq!(def.context_paths(), vec![(None, "/orders".to_string())]);
    }

    #[test]
    fn test_federated_has_no_properties() {
        let mut def = ApiDefinition::Federated(ApiDefinitionFederated {
            integration_id: "int-1".to_string(),
            provider_id: None,
            server: serde_json::Value::Null,
        });
        assert!(def.properties().is_none());
        assert!(def.properties_mut().is_none());
        assert!(!def.is_deployable());
    }

    #[test]
    fn test_v4_listener_paths() {
        let def: ApiDefinition = serde_json::from_value(json!({
            "definitionVersion": "V4",
            "listeners": [
                { "type": "http", "paths": [{ "path": "/a" }, { "host": "api.example.com", "path": "/b" }] },
                { "type": "subscription", "entrypoints": [{ "type": "webhook" }] }
            ]
        }))
        .unwrap();

        assert_eq!(
            def.context_paths(),
            vec![
                (None, "/a".to_string()),
                (Some("api.example.com".to_string()), "/b".to_string())
            ]
        );
    }
}
