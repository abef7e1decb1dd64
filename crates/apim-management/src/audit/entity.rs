//! Audit Log Entity
//!
//! Records every mutation made by the management plane, with the serialized
//! entity before and after the change where one exists.

use std::collections::BTreeMap;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::ids::new_id;
use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditReferenceType {
    Organization,
    Environment,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    ApiCreated,
    ApiUpdated,
    ApiDeployed,
    ApiStarted,
    ApiStopped,
    ApiRollbacked,
    ApiMigrated,
    PlanCreated,
    PlanUpdated,
    PlanClosed,
    PlanDeleted,
    PlanRestored,
    MembershipCreated,
    MembershipUpdated,
    MembershipDeleted,
    PageCreated,
    PageUpdated,
    PageDeleted,
    MetadataCreated,
    MetadataUpdated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub environment_id: String,
    pub reference_type: AuditReferenceType,
    pub reference_id: String,
    pub event: AuditEvent,
    /// Principal who performed the action
    pub user: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        organization_id: impl Into<String>,
        environment_id: impl Into<String>,
        reference_type: AuditReferenceType,
        reference_id: impl Into<String>,
        event: AuditEvent,
        user: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            organization_id: organization_id.into(),
            environment_id: environment_id.into(),
            reference_type,
            reference_id: reference_id.into(),
            event,
            user: user.into(),
            properties: BTreeMap::new(),
            old_value: None,
            new_value: None,
            created_at: Utc::now(),
        }
    }
}

impl Keyed for AuditLog {
    fn key(&self) -> &str {
        &self.id
    }
}
