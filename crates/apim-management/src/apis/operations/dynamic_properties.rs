//! Update Dynamic Properties Use Case
//!
//! Called by the dynamic property service with the latest values from its
//! provider. The API is redeployed only when it was in sync before and the
//! property set now differs from the deployed one.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use super::load_api;
use crate::apis::definition::Property;
use crate::audit::AuditEvent;
use crate::services::DomainServices;
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDynamicPropertiesCommand {
    pub api_id: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPropertiesUpdated {
    pub api_id: String,
    pub properties_changed: bool,
    pub need_redeployment: bool,
}

/// User-defined properties win over provider values with the same key.
fn merge(stored: &[Property], incoming: Vec<Property>) -> Vec<Property> {
    let user_keys: BTreeSet<&str> = stored.iter().filter(|p| !p.dynamic).map(|p| p.key.as_str()).collect();
    let mut merged: Vec<Property> = stored.iter().filter(|p| !p.dynamic).cloned().collect();
    let mut seen = BTreeSet::new();
    for mut property in incoming {
        if user_keys.contains(property.key.as_str()) || !seen.insert(property.key.clone()) {
            continue;
        }
        property.dynamic = true;
        merged.push(property);
    }
    merged
}

fn same_set(a: &[Property], b: &[Property]) -> bool {
    a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

pub struct UpdateDynamicPropertiesUseCase {
    services: DomainServices,
}

impl UpdateDynamicPropertiesUseCase {
    pub fn new(services: &DomainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }

    pub async fn execute(
        &self,
        command: UpdateDynamicPropertiesCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<DynamicPropertiesUpdated> {
        self.run(command, &ctx).await.into()
    }

    async fn run(
        &self,
        command: UpdateDynamicPropertiesCommand,
        ctx: &ExecutionContext,
    ) -> Result<DynamicPropertiesUpdated, UseCaseError> {
        let api = load_api(&self.services.apis, ctx, &command.api_id).await?;
        let Some(stored) = api.definition.properties() else {
            return Err(UseCaseError::invalid_state(
                "PROPERTIES_NOT_SUPPORTED",
                format!("A {} API has no properties", api.definition_version()),
            ));
        };

        let state = &self.services.state;
        let out_of_sync = !state.is_synchronized(&api).await?;
        let merged = merge(stored, command.properties);
        let properties_changed = !same_set(stored, &merged);

        let mut current = api.clone();
        if properties_changed {
            let mut updated = api.clone();
            if let Some(properties) = updated.definition.properties_mut() {
                *properties = merged.clone();
            }
            current = self
                .services
                .apis
                .update(ctx, &api, updated, AuditEvent::ApiUpdated)
                .await?
                .0;
        }

        let deployed = state.deployed_snapshot(&api.id).await?;
        let deployed_properties = deployed
            .as_ref()
            .and_then(|s| s.api.definition.properties())
            .unwrap_or_default();
        let need_redeployment = !out_of_sync && !same_set(&merged, deployed_properties);
        debug!(
            api_id = %api.id,
            out_of_sync,
            properties_changed,
            need_redeployment,
            "Dynamic properties reconciled"
        );

        if need_redeployment {
            let deployed_service = deployed
                .as_ref()
                .and_then(|s| s.api.definition.services())
                .and_then(|s| s.dynamic_property.clone());
            state
                .deploy_with(ctx, &current, None, |snapshot| {
                    if let Some(services) = snapshot.api.definition.services_mut() {
                        services.dynamic_property = deployed_service;
                    }
                })
                .await?;
            info!(api_id = %api.id, "API redeployed after dynamic property update");
        }

        Ok(DynamicPropertiesUpdated {
            api_id: api.id,
            properties_changed,
            need_redeployment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_user_properties() {
        let stored = vec![Property::new("env", "prod"), Property::dynamic("rate", "10")];
        let incoming = vec![
            Property::new("env", "staging"),
            Property::new("rate", "20"),
            Property::new("rate", "30"),
        ];

        let merged = merge(&stored, incoming);
        assert_eq!(merged, vec![Property::new("env", "prod"), Property::dynamic("rate", "20")]);
    }

    #[test]
    fn test_same_set_ignores_order() {
        let a = vec![Property::dynamic("a", "1"), Property::dynamic("b", "2")];
        let b = vec![Property::dynamic("b", "2"), Property::dynamic("a", "1")];
        assert!(same_set(&a, &b));
        assert!(!same_set(&a, &b[..1]));
    }
}
