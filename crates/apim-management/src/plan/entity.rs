//! Plan Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::apis::definition::DefinitionVersion;
use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    #[default]
    Staging,
    Published,
    Deprecated,
    Closed,
}

impl PlanStatus {
    /// Plans the gateway serves.
    pub fn is_deployable(&self) -> bool {
        matches!(self, PlanStatus::Published | PlanStatus::Deprecated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanSecurityType {
    #[serde(alias = "key_less", alias = "KEYLESS", alias = "keyless")]
    KeyLess,
    #[serde(alias = "api_key", alias = "API-KEY", alias = "api-key")]
    ApiKey,
    #[serde(alias = "jwt")]
    Jwt,
    #[serde(alias = "oauth2")]
    Oauth2,
    #[serde(alias = "mtls")]
    Mtls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSecurity {
    #[serde(rename = "type")]
    pub security_type: PlanSecurityType,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

impl PlanSecurity {
    pub fn of(security_type: PlanSecurityType) -> Self {
        Self {
            security_type,
            configuration: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanMode {
    #[default]
    Standard,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanValidation {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_id: Option<String>,
    pub api_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PlanStatus,
    /// Absent for push plans.
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
    pub definition_version: DefinitionVersion,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Plan {
    pub fn new(
        id: impl Into<String>,
        api_id: impl Into<String>,
        name: impl Into<String>,
        definition_version: DefinitionVersion,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            cross_id: None,
            api_id: api_id.into(),
            name: name.into(),
            description: None,
            status: PlanStatus::Staging,
            security: Some(PlanSecurity::of(PlanSecurityType::KeyLess)),
            mode: PlanMode::Standard,
            validation: PlanValidation::Auto,
            order: 0,
            characteristics: vec![],
            excluded_groups: vec![],
            tags: vec![],
            selection_rule: None,
            comment_required: false,
            comment_message: None,
            general_conditions: None,
            definition_version,
            created_at: now,
            updated_at: now,
            published_at: None,
            closed_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == PlanStatus::Closed
    }

    /// Move to `status`, stamping publication and closing times.
    pub fn set_status(&mut self, status: PlanStatus) {
        if self.status == status {
            return;
        }
        let now = Utc::now();
        match status {
            PlanStatus::Published if self.published_at.is_none() => self.published_at = Some(now),
            PlanStatus::Closed => self.closed_at = Some(now),
            _ => {}
        }
        if status != PlanStatus::Closed {
            self.closed_at = None;
        }
        self.status = status;
    }

    /// Copy the user-editable fields of `source` (status included) onto this plan,
    /// keeping identity and timestamps.
    pub fn apply_content(&mut self, source: &Plan) {
        self.cross_id = source.cross_id.clone().or_else(|| self.cross_id.take());
        self.name = source.name.clone();
        self.description = source.description.clone();
        self.security = source.security.clone();
        self.mode = source.mode;
        self.validation = source.validation;
        self.order = source.order;
        self.characteristics = source.characteristics.clone();
        self.excluded_groups = source.excluded_groups.clone();
        self.tags = source.tags.clone();
        self.selection_rule = source.selection_rule.clone();
        self.comment_required = source.comment_required;
        self.comment_message = source.comment_message.clone();
        self.general_conditions = source.general_conditions.clone();
        self.definition_version = source.definition_version;
        self.set_status(source.status);
    }

    /// Content equality, ignoring `updated_at`.
    pub fn same_content(&self, other: &Plan) -> bool {
        let mut lhs = self.clone();
        lhs.updated_at = other.updated_at;
        lhs == *other
    }
}

impl Keyed for Plan {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_transitions_stamp_times() {
        let mut plan = Plan::new("p1", "api", "Gold", DefinitionVersion::V4);
        plan.set_status(PlanStatus::Published);
        assert!(plan.published_at.is_some());
        assert!(plan.status.is_deployable());

        plan.set_status(PlanStatus::Closed);
        assert!(plan.is_closed());
        assert!(plan.closed_at.is_some());

        plan.set_status(PlanStatus::Published);
        assert!(plan.closed_at.is_none());
    }

    #[test]
    fn test_apply_content_keeps_identity() {
        let existing = Plan::new("p1", "api", "Gold", DefinitionVersion::V4);
        let mut desired = Plan::new("other", "api-2", "Platinum", DefinitionVersion::V4);
        desired.order = 3;
        desired.status = PlanStatus::Published;

        let mut updated = existing.clone();
        updated.apply_content(&desired);
        assert_eq!(updated.id, "p1");
        assert_eq!(updated.api_id, "api");
        assert_eq!(updated.name, "Platinum");
        assert_eq!(updated.order, 3);
        assert_eq!(updated.status, PlanStatus::Published);
        assert!(updated.published_at.is_some());
    }

    #[test]
    fn test_security_type_aliases() {
        let security: PlanSecurity = serde_json::from_value(json!({ "type": "key_less" })).unwrap();
        assert_eq!(security.security_type, PlanSecurityType::KeyLess);
        let security: PlanSecurity = serde_json::from_value(json!({ "type": "API_KEY" })).unwrap();
        assert_eq!(security.security_type, PlanSecurityType::ApiKey);
    }
}
