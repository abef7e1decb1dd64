//! API Validator
//!
//! Runs every check on a desired API and returns the sanitized state.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::members::sanitize_members;
use super::pages::check_pages;
use super::paths::check_context_paths;
use super::plans::check_plans;
use super::Validated;
use crate::apis::desired::DesiredApi;
use crate::apis::repository::ApiQuery;
use crate::apis::service::ApiService;
use crate::directory::{CategoryRepository, GroupRepository, UserRepository};
use crate::shared::error::Result;
use crate::usecase::ExecutionContext;

#[derive(Clone)]
pub struct ApiValidator {
    apis: ApiService,
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ApiValidator {
    pub fn new(
        apis: ApiService,
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            apis,
            users,
            groups,
            categories,
        }
    }

    /// Validate `desired` as the state of API `api_id` in the caller's
    /// environment. Repository failures are errors; rule violations are issues.
    pub async fn validate(
        &self,
        ctx: &ExecutionContext,
        api_id: &str,
        mut desired: DesiredApi,
    ) -> Result<Validated<DesiredApi>> {
        let mut issues = Vec::new();
        let mut core = Validated::of(());

        if desired.cross_id.trim().is_empty() {
            core.severe("API cross id is required");
        }
        if desired.name.trim().is_empty() {
            core.severe("API name is required");
        }
        if desired.version.trim().is_empty() {
            core.severe("API version is required");
        }
        issues.extend(core.issues);

        let others = self
            .apis
            .search(&ApiQuery::in_environment(&ctx.environment_id))
            .await?;
        issues.extend(check_context_paths(api_id, &desired.definition.context_paths(), &others));

        let groups = self.groups.find_by_environment(&ctx.environment_id).await?;
        let mut sanitized_groups = Validated::of(BTreeSet::new());
        for group in &desired.groups {
            match groups.iter().find(|g| &g.id == group || &g.name == group) {
                Some(found) => {
                    sanitized_groups.value.insert(found.id.clone());
                }
                None => sanitized_groups.warn(format!("Group [{group}] could not be found, it has been removed")),
            }
        }
        desired.groups = sanitized_groups.value;
        issues.extend(sanitized_groups.issues);

        let categories = self.categories.find_by_environment(&ctx.environment_id).await?;
        let mut sanitized_categories = Validated::of(BTreeSet::new());
        for category in &desired.categories {
            match categories.iter().find(|c| &c.id == category || &c.key == category) {
                Some(found) => {
                    sanitized_categories.value.insert(found.id.clone());
                }
                None => sanitized_categories
                    .warn(format!("Category [{category}] could not be found, it has been removed")),
            }
        }
        desired.categories = sanitized_categories.value;
        issues.extend(sanitized_categories.issues);

        issues.extend(check_plans(&desired.plans));
        if let Some(pages) = &desired.pages {
            issues.extend(check_pages(pages));
        }

        if let Some(members) = desired.members.take() {
            let sanitized = sanitize_members(&self.users, &ctx.organization_id, members).await?;
            desired.members = Some(sanitized.value);
            issues.extend(sanitized.issues);
        }

        let mut validated = Validated::of(desired);
        validated.extend(issues);
        debug!(
            api_id = %api_id,
            warnings = validated.warnings().len(),
            severe = validated.severe_errors().len(),
            "Desired API validated"
        );
        Ok(validated)
    }
}
