//! Rollback operators.
//!
//! A rollback target is rebuilt from the snapshot carried by a `PUBLISH_API`
//! event, never from the live API. The operator is chosen by the snapshot's
//! definition variant.

pub mod v2;
pub mod v4;

pub use v2::V2RollbackOperator;
pub use v4::V4RollbackOperator;

use crate::apis::entity::Api;

/// The stored API with the deployable content of `snapshot`. Identity,
/// lifecycle and deployment fields stay those of `current`.
pub(crate) fn rebuild_api(current: &Api, snapshot: &Api) -> Api {
    let mut api = current.clone();
    api.name = snapshot.name.clone();
    api.version = snapshot.version.clone();
    api.description = snapshot.description.clone();
    api.definition = snapshot.definition.clone();
    api.labels = snapshot.labels.clone();
    api
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::definition::{ApiDefinition, ApiDefinitionV1, ApiDefinitionV4};
    use crate::apis::entity::LifecycleState;

    #[test]
    fn test_rebuild_keeps_identity_and_lifecycle() {
        let mut current = Api::new(
            "api-1",
            "cross-1",
            "env",
            "org",
            "Orders v2",
            "2.0",
            ApiDefinition::V1(ApiDefinitionV1::default()),
        );
        current.lifecycle_state = LifecycleState::Started;

        let mut snapshot = current.clone();
        snapshot.id = "other".into();
        snapshot.name = "Orders".into();
        snapshot.version = "1.0".into();
        snapshot.lifecycle_state = LifecycleState::Stopped;
        let v4: ApiDefinitionV4 = serde_json::from_value(serde_json::json!({})).unwrap();
        snapshot.definition = ApiDefinition::V4(v4);

        let rebuilt = rebuild_api(&current, &snapshot);
        assert_eq!(rebuilt.id, "api-1");
        assert_eq!(rebuilt.name, "Orders");
        assert_eq!(rebuilt.version, "1.0");
        assert_eq!(rebuilt.lifecycle_state, LifecycleState::Started);
        assert!(matches!(rebuilt.definition, ApiDefinition::V4(_)));
    }
}
