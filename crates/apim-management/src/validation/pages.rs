//! Page checks. Every parent must be declared in the same desired state and
//! be a folder or the root; parent chains may not loop.

use std::collections::HashMap;

use super::{Severity, ValidationIssue};
use crate::apis::desired::DesiredPage;

pub fn check_pages(pages: &[DesiredPage]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let by_key: HashMap<&str, &DesiredPage> = pages.iter().map(|p| (p.key.as_str(), p)).collect();
    if by_key.len() != pages.len() {
        issues.push(severe("Page keys must be unique".to_string()));
    }

    for page in pages {
        let Some(parent_key) = page.parent.as_deref() else {
            continue;
        };
        match by_key.get(parent_key) {
            None => issues.push(severe(format!(
                "Parent [{parent_key}] of page [{}] does not exist",
                page.key
            ))),
            Some(parent) if !parent.page_type.is_container() => issues.push(severe(format!(
                "Parent [{parent_key}] of page [{}] must be a folder or the root",
                page.key
            ))),
            Some(_) => {
                if has_cycle(page, &by_key) {
                    issues.push(severe(format!("Page [{}] is its own ancestor", page.key)));
                }
            }
        }
    }
    issues
}

fn has_cycle(page: &DesiredPage, by_key: &HashMap<&str, &DesiredPage>) -> bool {
    let mut current = page.parent.as_deref();
    let mut steps = 0;
    while let Some(key) = current {
        if key == page.key {
            return true;
        }
        steps += 1;
        if steps > by_key.len() {
            return true;
        }
        current = by_key.get(key).and_then(|p| p.parent.as_deref());
    }
    false
}

fn severe(message: String) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Severe,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageType;

    fn page(key: &str, page_type: PageType, parent: Option<&str>) -> DesiredPage {
        DesiredPage {
            key: key.into(),
            id: None,
            cross_id: None,
            name: key.into(),
            page_type,
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
    fn test_parent_rules() {
        let pages = vec![
            page("root", PageType::Root, None),
            page("guides", PageType::Folder, Some("root")),
            page("intro", PageType::Markdown, Some("guides")),
            page("bad", PageType::Markdown, Some("intro")),
            page("orphan", PageType::Markdown, Some("missing")),
        ];
        let issues = check_pages(&pages);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_folder_cycle() {
        let pages = vec![
            page("a", PageType::Folder, Some("b")),
            page("b", PageType::Folder, Some("a")),
        ];
        assert_eq!(check_pages(&pages).len(), 2);
    }
}
