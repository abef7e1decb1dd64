//! Membership Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::shared::ids::derive_id;
use crate::shared::memory::Keyed;

/// Role that owns an API. Reconciliation never removes it.
pub const PRIMARY_OWNER: &str = "PRIMARY_OWNER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    User,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipReferenceType {
    Api,
    Application,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(rename = "_id")]
    pub id: String,
    pub member_id: String,
    pub member_type: MemberType,
    pub reference_type: MembershipReferenceType,
    pub reference_id: String,
    pub role: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// API membership with an id derived from the member and the API, so one
    /// member holds at most one role per API.
    pub fn for_api(api_id: &str, member_id: &str, member_type: MemberType, role: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: derive_id(&[api_id, "member", member_id]),
            member_id: member_id.to_string(),
            member_type,
            reference_type: MembershipReferenceType::Api,
            reference_id: api_id.to_string(),
            role: role.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_primary_owner(&self) -> bool {
        self.role == PRIMARY_OWNER
    }
}

impl Keyed for Membership {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_api_id_is_stable() {
        let a = Membership::for_api("api-1", "user-1", MemberType::User, "OWNER");
        let b = Membership::for_api("api-1", "user-1", MemberType::User, "USER");
        assert_eq!(a.id, b.id);
        assert!(!a.is_primary_owner());
        assert!(Membership::for_api("api-1", "user-1", MemberType::User, PRIMARY_OWNER).is_primary_owner());
    }
}
