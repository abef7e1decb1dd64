//! V2 to V4 mapping of definitions, plans and flows.

use serde_json::json;

use crate::apis::definition::{
    ApiDefinitionV2, ApiDefinitionV4, ApiType, DefinitionVersion, EndpointGroupV2, EndpointGroupV4,
    EndpointV2, EndpointV4, Entrypoint, FlowExecution, HttpListener, Listener, ListenerPath,
};
use crate::flow::{ConditionSelector, Flow, FlowV2, FlowV4, HttpSelector, Selector, StepV2, StepV4};
use crate::plan::Plan;

const HTTP_PROXY: &str = "http-proxy";

pub fn map_definition(v2: &ApiDefinitionV2) -> ApiDefinitionV4 {
    let paths = v2
        .proxy
        .virtual_hosts
        .iter()
        .map(|vh| ListenerPath {
            host: vh.host.clone(),
            path: vh.path.clone(),
            override_access: vh.override_entrypoint,
        })
        .collect();

    ApiDefinitionV4 {
        api_type: ApiType::Proxy,
        listeners: vec![Listener::Http(HttpListener {
            paths,
            entrypoints: vec![Entrypoint {
                entrypoint_type: HTTP_PROXY.to_string(),
                configuration: serde_json::Value::Null,
            }],
        })],
        endpoint_groups: v2.proxy.groups.iter().map(map_group).collect(),
        flow_execution: FlowExecution {
            mode: v2.flow_mode,
            match_required: false,
        },
        properties: v2.properties.clone(),
        services: v2.services.clone(),
        resources: v2.resources.clone(),
        tags: v2.tags.clone(),
        response_templates: v2.response_templates.clone(),
    }
}

fn map_group(group: &EndpointGroupV2) -> EndpointGroupV4 {
    EndpointGroupV4 {
        name: group.name.clone(),
        group_type: HTTP_PROXY.to_string(),
        load_balancer: group.load_balancing,
        endpoints: group.endpoints.iter().map(map_endpoint).collect(),
        shared_configuration: serde_json::Value::Null,
    }
}

fn map_endpoint(endpoint: &EndpointV2) -> EndpointV4 {
    EndpointV4 {
        name: endpoint.name.clone(),
        endpoint_type: HTTP_PROXY.to_string(),
        weight: endpoint.weight,
        inherit_configuration: endpoint.inherit,
        configuration: json!({ "target": endpoint.target }),
        secondary: endpoint.backup,
    }
}

pub fn map_plan(plan: &Plan) -> Plan {
    let mut migrated = plan.clone();
    migrated.definition_version = DefinitionVersion::V4;
    migrated
}

/// V4 flows pass through unchanged.
pub fn map_flows(flows: &[Flow]) -> Vec<Flow> {
    flows
        .iter()
        .map(|flow| match flow {
            Flow::V2(v2) => Flow::V4(map_flow(v2)),
            Flow::V4(v4) => Flow::V4(v4.clone()),
        })
        .collect()
}

fn map_flow(flow: &FlowV2) -> FlowV4 {
    let mut selectors = vec![Selector::Http(HttpSelector {
        path: flow.path_operator.path.clone(),
        path_operator: flow.path_operator.operator,
        methods: flow.methods.clone(),
    })];
    if let Some(condition) = flow.condition.as_ref().filter(|c| !c.is_empty()) {
        selectors.push(Selector::Condition(ConditionSelector {
            condition: condition.clone(),
        }));
    }

    FlowV4 {
        name: flow.name.clone(),
        enabled: flow.enabled,
        selectors,
        request: flow.pre.iter().map(map_step).collect(),
        response: flow.post.iter().map(map_step).collect(),
        subscribe: vec![],
        publish: vec![],
        tags: Default::default(),
    }
}

fn map_step(step: &StepV2) -> StepV4 {
    StepV4 {
        name: step.name.clone(),
        policy: step.policy.clone(),
        description: step.description.clone(),
        enabled: step.enabled,
        configuration: step.configuration.clone(),
        condition: step.condition.clone(),
        message_condition: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::ApiDefinition;
    use crate::flow::{HttpMethod, PathOperatorKind};

    #[test]
    fn test_definition_mapping() {
        let def: ApiDefinition = serde_json::from_value(json!({
            "definitionVersion": "V2",
            "flowMode": "BEST_MATCH",
            "proxy": {
                "virtualHosts": [{ "host": "api.example.com", "path": "/orders", "overrideEntrypoint": true }],
                "groups": [{
                    "name": "default",
                    "endpoints": [
                        { "name": "main", "target": "https://main" },
                        { "name": "spare", "target": "https://spare", "backup": true }
                    ]
                }]
            },
            "properties": [{ "key": "k", "value": "v" }]
        }))
        .unwrap();
        let ApiDefinition::V2(v2) = def else { panic!("expected V2") };

        let v4 = map_definition(&v2);
        let Listener::Http(http) = &v4.listeners[0] else { panic!("expected an http listener") };
        assert_eq!(http.paths[0].host.as_deref(), Some("api.example.com"));
        assert!(http.paths[0].override_access);
        assert_eq!(http.entrypoints[0].entrypoint_type, "http-proxy");

        let group = &v4.endpoint_groups[0];
        assert_eq!(group.group_type, "http-proxy");
        assert_eq!(group.endpoints[0].configuration["target"], "https://main");
        assert!(group.endpoints[1].secondary);
        assert_eq!(v4.flow_execution.mode, v2.flow_mode);
        assert_eq!(v4.properties, v2.properties);
    }

    #[test]
    fn test_flow_mapping() {
        let flow: Flow = serde_json::from_value(json!({
            "flowVersion": "V2",
            "name": "orders",
            "pathOperator": { "path": "/orders", "operator": "EQUALS" },
            "methods": ["GET", "POST"],
            "condition": "{#request.headers['x'] != null}",
            "pre": [{ "name": "rl", "policy": "rate-limit" }],
            "post": [{ "name": "tx", "policy": "json-to-xml", "enabled": false }]
        }))
        .unwrap();

        let mapped = map_flows(&[flow]);
        let Flow::V4(v4) = &mapped[0] else { panic!("expected a V4 flow") };
        assert_eq!(v4.selectors.len(), 2);
        match &v4.selectors[0] {
            Selector::Http(http) => {
                assert_eq!(http.path, "/orders");
                assert_eq!(http.path_operator, PathOperatorKind::Equals);
                assert!(http.methods.contains(&HttpMethod::Post));
            }
            other => panic!("unexpected selector {other:?}"),
        }
        assert_eq!(v4.request[0].policy, "rate-limit");
        assert!(!v4.response[0].enabled);
    }
}
