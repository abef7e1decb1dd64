//! Flow Service

use std::sync::Arc;

use super::entity::{Flow, FlowReferenceType};
use super::repository::FlowRepository;
use crate::shared::error::Result;

#[derive(Clone)]
pub struct FlowService {
    repo: Arc<dyn FlowRepository>,
}

impl FlowService {
    pub fn new(repo: Arc<dyn FlowRepository>) -> Self {
        Self { repo }
    }

    pub async fn api_flows(&self, api_id: &str) -> Result<Vec<Flow>> {
        self.repo.find_by_reference(FlowReferenceType::Api, api_id).await
    }

    pub async fn plan_flows(&self, plan_id: &str) -> Result<Vec<Flow>> {
        self.repo.find_by_reference(FlowReferenceType::Plan, plan_id).await
    }

    /// Store `flows` unless they already match. Returns whether anything was written.
    pub async fn save_if_changed(
        &self,
        reference_type: FlowReferenceType,
        reference_id: &str,
        flows: &[Flow],
    ) -> Result<bool> {
        let current = self.repo.find_by_reference(reference_type, reference_id).await?;
        if current.as_slice() == flows {
            return Ok(false);
        }
        self.repo.save_all(reference_type, reference_id, flows).await?;
        Ok(true)
    }

    /// Drop the flows of a reference; no-op when there are none.
    pub async fn clear(&self, reference_type: FlowReferenceType, reference_id: &str) -> Result<bool> {
        let current = self.repo.find_by_reference(reference_type, reference_id).await?;
        if current.is_empty() {
            return Ok(false);
        }
        self.repo.delete_by_reference(reference_type, reference_id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::entity::FlowV4;
    use crate::flow::repository::InMemoryFlowRepository;

    fn flow(name: &str) -> Flow {
        Flow::V4(FlowV4 {
            name: name.to_string(),
            enabled: true,
            selectors: vec![],
            request: vec![],
            response: vec![],
            subscribe: vec![],
            publish: vec![],
            tags: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_save_if_changed_skips_identical_flows() {
        let repo = Arc::new(InMemoryFlowRepository::new());
        let service = FlowService::new(repo.clone());

        assert!(service.save_if_changed(FlowReferenceType::Api, "api-1", &[flow("a")]).await.unwrap());
        assert!(!service.save_if_changed(FlowReferenceType::Api, "api-1", &[flow("a")]).await.unwrap());
        assert_eq!(repo.write_count(), 1);

        assert!(service.save_if_changed(FlowReferenceType::Api, "api-1", &[flow("b")]).await.unwrap());
        assert_eq!(service.api_flows("api-1").await.unwrap(), vec![flow("b")]);
    }

    #[tokio::test]
    async fn test_clear() {
        let repo = Arc::new(InMemoryFlowRepository::new());
        let service = FlowService::new(repo.clone());

        assert!(!service.clear(FlowReferenceType::Plan, "plan-1").await.unwrap());
        service.save_if_changed(FlowReferenceType::Plan, "plan-1", &[flow("a")]).await.unwrap();
        assert!(service.clear(FlowReferenceType::Plan, "plan-1").await.unwrap());
        assert!(service.plan_flows("plan-1").await.unwrap().is_empty());
    }
}
