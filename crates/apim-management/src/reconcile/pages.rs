//! Page reconciliation. Parents are written before their children; stored
//! pages missing from the desired state are deleted on a best-effort basis.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::ApiReconciler;
use crate::apis::desired::DesiredPage;
use crate::apis::entity::Api;
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

/// Desired pages ordered so that every parent precedes its children.
fn parent_first(pages: &[DesiredPage]) -> Vec<&DesiredPage> {
    let keys: HashSet<&str> = pages.iter().map(|p| p.key.as_str()).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(pages.len());

    while ordered.len() < pages.len() {
        let before = ordered.len();
        for page in pages {
            if placed.contains(page.key.as_str()) {
                continue;
            }
            let ready = match page.parent.as_deref() {
                Some(parent) if keys.contains(parent) => placed.contains(parent),
                _ => true,
            };
            if ready {
                placed.insert(page.key.as_str());
                ordered.push(page);
            }
        }
        if ordered.len() == before {
            // Loops are rejected by validation; place the rest as they come.
            ordered.extend(pages.iter().filter(|p| !placed.contains(p.key.as_str())));
            break;
        }
    }
    ordered
}

impl ApiReconciler {
    pub(super) async fn reconcile_pages(
        &self,
        ctx: &ExecutionContext,
        api: &Api,
        desired: &[DesiredPage],
    ) -> Result<()> {
        let existing = self.pages.find_by_api(&api.id).await?;
        let ids: HashMap<&str, String> = desired
            .iter()
            .map(|p| (p.key.as_str(), p.resolve_id(&api.id)))
            .collect();

        for page in parent_first(desired) {
            let Some(id) = ids.get(page.key.as_str()) else {
                continue;
            };
            let parent_id = page
                .parent
                .as_deref()
                .map(|parent| ids.get(parent).cloned().unwrap_or_else(|| parent.to_string()));
            let target = page.to_page(id, &api.id, parent_id);

            match existing.iter().find(|p| &p.id == id) {
                Some(current) => {
                    self.pages.update(ctx, current, &target).await?;
                }
                None => {
                    self.pages.create(ctx, target).await?;
                }
            }
        }

        let wanted: HashSet<&String> = ids.values().collect();
        let stale: Vec<_> = existing.into_iter().filter(|p| !wanted.contains(&p.id)).collect();
        if !stale.is_empty() {
            let deleted = self.pages.delete_best_effort(ctx, &stale).await;
            if deleted.len() < stale.len() {
                warn!(
                    api_id = %api.id,
                    failed = stale.len() - deleted.len(),
                    "Some pages could not be deleted"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageType;

    fn page(key: &str, parent: Option<&str>) -> DesiredPage {
        DesiredPage {
            key: key.into(),
            id: None,
            cross_id: None,
            name: key.into(),
            page_type: PageType::Folder,
            content: None,
            parent: parent.map(str::to_string),
            order: 0,
            published: true,
            visibility: Default::default(),
            homepage: false,
            configuration: Default::default(),
        }
    }

    #[test]
    fn test_parent_first() {
        let pages = vec![page("c", Some("b")), page("b", Some("a")), page("a", None)];
        let keys: Vec<&str> = parent_first(&pages).iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
