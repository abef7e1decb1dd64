//! Page Service
//!
//! Writes go through here so the parent rule holds for every stored page:
//! a page's parent is absent, a folder, or the root.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::entity::Page;
use super::repository::PageRepository;
use crate::audit::{service::prop, AuditEvent, AuditService};
use crate::shared::error::{ManagementError, Result};
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct PageService {
    repo: Arc<dyn PageRepository>,
    audit: AuditService,
}

impl PageService {
    pub fn new(repo: Arc<dyn PageRepository>, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn find_by_api(&self, api_id: &str) -> Result<Vec<Page>> {
        self.repo.search_by_api_id(api_id).await
    }

    async fn check_parent(&self, page: &Page) -> Result<()> {
        let Some(parent_id) = page.parent_id.as_deref() else {
            return Ok(());
        };
        if parent_id == page.id {
            return Err(ManagementError::validation(format!(
                "Page [{}] cannot be its own parent",
                page.name
            )));
        }
        match self.repo.find_by_id(parent_id).await? {
            Some(parent) if parent.page_type.is_container() => Ok(()),
            Some(parent) => Err(ManagementError::validation(format!(
                "Parent [{}] of page [{}] must be a folder or the root, found {:?}",
                parent_id, page.name, parent.page_type
            ))),
            None => Err(ManagementError::not_found("Page", parent_id)),
        }
    }

    pub async fn create(&self, ctx: &ExecutionContext, mut page: Page) -> Result<Page> {
        self.check_parent(&page).await?;
        let now = Utc::now();
        page.created_at = now;
        page.updated_at = now;
        self.repo.create(&page).await?;
        self.audit
            .log_api(ctx, &page.reference_id, AuditEvent::PageCreated, prop("PAGE", &page.id), None, Some(&page))
            .await?;
        info!(api_id = %page.reference_id, page_id = %page.id, page_type = ?page.page_type, "Page created");
        Ok(page)
    }

    /// Apply `desired` onto `existing`; writes only when something differs.
    pub async fn update(&self, ctx: &ExecutionContext, existing: &Page, desired: &Page) -> Result<bool> {
        let mut updated = existing.clone();
        updated.apply_content(desired);
        if updated.same_content(existing) {
            return Ok(false);
        }

        self.check_parent(&updated).await?;
        updated.updated_at = Utc::now();
        self.repo.update(&updated).await?;
        self.audit
            .log_api(ctx, &updated.reference_id, AuditEvent::PageUpdated, prop("PAGE", &updated.id), Some(existing), Some(&updated))
            .await?;
        info!(api_id = %updated.reference_id, page_id = %updated.id, "Page updated");
        Ok(true)
    }

    pub async fn delete(&self, ctx: &ExecutionContext, page: &Page) -> Result<()> {
        self.repo.delete(&page.id).await?;
        self.audit
            .log_api(ctx, &page.reference_id, AuditEvent::PageDeleted, prop("PAGE", &page.id), Some(page), None)
            .await?;
        info!(api_id = %page.reference_id, page_id = %page.id, "Page deleted");
        Ok(())
    }

    /// Delete pages children first. Failures are logged and skipped; returns
    /// the ids that were deleted.
    pub async fn delete_best_effort(&self, ctx: &ExecutionContext, pages: &[Page]) -> Vec<String> {
        let parents: HashMap<&str, Option<&str>> = pages
            .iter()
            .map(|p| (p.id.as_str(), p.parent_id.as_deref()))
            .collect();
        let depth = |page: &Page| {
            let mut depth = 0usize;
            let mut current = page.parent_id.as_deref();
            while let Some(id) = current {
                depth += 1;
                if depth > pages.len() {
                    break;
                }
                current = parents.get(id).copied().flatten();
            }
            depth
        };

        let mut ordered: Vec<&Page> = pages.iter().collect();
        ordered.sort_by_key(|p| std::cmp::Reverse(depth(p)));

        let mut deleted = Vec::with_capacity(ordered.len());
        for page in ordered {
            match self.delete(ctx, page).await {
                Ok(()) => deleted.push(page.id.clone()),
                Err(e) => warn!(page_id = %page.id, error = %e, "Unable to delete page, skipping"),
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLogRepository;
    use crate::page::entity::PageType;
    use crate::page::repository::InMemoryPageRepository;

    fn service() -> (Arc<InMemoryPageRepository>, PageService) {
        let repo = Arc::new(InMemoryPageRepository::new());
        let service = PageService::new(repo.clone(), AuditService::new(Arc::new(InMemoryAuditLogRepository::new())));
        (repo, service)
    }

    #[tokio::test]
    async fn test_parent_must_be_folder_or_root() {
        let (_, service) = service();
        let ctx = ExecutionContext::create("admin", "org", "env");
        service.create(&ctx, Page::for_api("md", "api-1", "Readme", PageType::Markdown)).await.unwrap();
        service.create(&ctx, Page::for_api("dir", "api-1", "Guides", PageType::Folder)).await.unwrap();

        let mut child = Page::for_api("child", "api-1", "Child", PageType::Markdown);
        child.parent_id = Some("md".into());
        assert!(matches!(
            service.create(&ctx, child.clone()).await.unwrap_err(),
            ManagementError::Validation { .. }
        ));

        child.parent_id = Some("dir".into());
        assert!(service.create(&ctx, child).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_best_effort_deletes_children_first() {
        let (repo, service) = service();
        let ctx = ExecutionContext::create("admin", "org", "env");
        let folder = service.create(&ctx, Page::for_api("dir", "api-1", "Guides", PageType::Folder)).await.unwrap();
        let mut child = Page::for_api("child", "api-1", "Child", PageType::Markdown);
        child.parent_id = Some("dir".into());
        let child = service.create(&ctx, child).await.unwrap();
        let ghost = Page::for_api("ghost", "api-1", "Ghost", PageType::Markdown);

        let deleted = service.delete_best_effort(&ctx, &[folder, ghost, child]).await;
        assert_eq!(deleted[0], "child");
        assert!(deleted.contains(&"dir".to_string()));
        assert!(repo.search_by_api_id("api-1").await.unwrap().is_empty());
    }
}
