//! Subscription Service

use std::sync::Arc;

use tracing::info;

use super::repository::SubscriptionRepository;
use crate::shared::error::Result;

#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    /// Close every active subscription of a plan. Returns how many were closed.
    pub async fn close_active_for_plan(&self, plan_id: &str, reason: &str) -> Result<usize> {
        let active = self.repo.find_active_by_plan(plan_id).await?;
        for mut subscription in active.iter().cloned() {
            subscription.close(reason);
            self.repo.update(&subscription).await?;
            info!(
                subscription_id = %subscription.id,
                plan_id = %plan_id,
                status = ?subscription.status,
                "Subscription closed"
            );
        }
        Ok(active.len())
    }

    pub async fn has_active(&self, plan_id: &str) -> Result<bool> {
        Ok(!self.repo.find_active_by_plan(plan_id).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::entity::{Subscription, SubscriptionStatus};
    use crate::subscription::repository::InMemorySubscriptionRepository;

    #[tokio::test]
    async fn test_close_active_for_plan() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let pending = Subscription::new("api", "plan-1", "app-1");
        let mut accepted = Subscription::new("api", "plan-1", "app-2");
        accepted.accept();
        let other_plan = Subscription::new("api", "plan-2", "app-3");
        for s in [&pending, &accepted, &other_plan] {
            repo.create(s).await.unwrap();
        }

        let service = SubscriptionService::new(repo.clone());
        assert_eq!(service.close_active_for_plan("plan-1", "plan deleted").await.unwrap(), 2);
        assert!(!service.has_active("plan-1").await.unwrap());
        assert!(service.has_active("plan-2").await.unwrap());

        let pending = repo.find_by_id(&pending.id).await.unwrap().unwrap();
        let accepted = repo.find_by_id(&accepted.id).await.unwrap().unwrap();
        assert_eq!(pending.status, SubscriptionStatus::Rejected);
        assert_eq!(accepted.status, SubscriptionStatus::Closed);
    }
}
