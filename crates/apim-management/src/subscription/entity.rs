//! Subscription Entity
//!
//! An application's access to an API through one plan.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::ids::new_id;
use crate::shared::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Accepted,
    Paused,
    Rejected,
    Closed,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted | Self::Paused)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub api_id: String,
    pub plan_id: String,
    pub application_id: String,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(api_id: impl Into<String>, plan_id: impl Into<String>, application_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            api_id: api_id.into(),
            plan_id: plan_id.into(),
            application_id: application_id.into(),
            status: SubscriptionStatus::Pending,
            reason: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn accept(&mut self) {
        self.status = SubscriptionStatus::Accepted;
        self.updated_at = Utc::now();
    }

    /// A pending request is rejected, anything else active is closed.
    pub fn close(&mut self, reason: impl Into<String>) {
        let now = Utc::now();
        self.status = match self.status {
            SubscriptionStatus::Pending => SubscriptionStatus::Rejected,
            _ => SubscriptionStatus::Closed,
        };
        self.reason = Some(reason.into());
        self.closed_at = Some(now);
        self.updated_at = now;
    }
}

impl Keyed for Subscription {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_pending_rejects() {
        let mut sub = Subscription::new("api", "plan", "app");
        sub.close("plan closed");
        assert_eq!(sub.status, SubscriptionStatus::Rejected);
        assert!(sub.closed_at.is_some());
    }

    #[test]
    fn test_close_accepted_closes() {
        let mut sub = Subscription::new("api", "plan", "app");
        sub.accept();
        assert!(sub.status.is_active());
        sub.close("plan closed");
        assert_eq!(sub.status, SubscriptionStatus::Closed);
        assert!(!sub.status.is_active());
    }
}
