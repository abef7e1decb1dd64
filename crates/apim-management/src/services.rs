//! Composition root.
//!
//! Repositories are gathered in [`Repositories`], services are built once in
//! [`DomainServices`], and every use case takes what it needs from there.

use std::sync::Arc;

use apim_config::ManagementConfig;
use mongodb::Database;

use crate::apis::repository::{ApiRepository, InMemoryApiRepository, MongoApiRepository};
use crate::apis::service::ApiService;
use crate::apis::state_service::ApiStateService;
use crate::audit::{AuditLogRepository, AuditService, InMemoryAuditLogRepository, MongoAuditLogRepository};
use crate::directory::{
    CategoryRepository, GroupRepository, InMemoryCategoryRepository, InMemoryGroupRepository,
    InMemoryUserRepository, MongoCategoryRepository, MongoGroupRepository, MongoUserRepository,
    UserRepository,
};
use crate::event::{EventRepository, InMemoryEventRepository, MongoEventRepository};
use crate::flow::{FlowRepository, FlowService, InMemoryFlowRepository, MongoFlowRepository};
use crate::membership::{
    InMemoryMembershipRepository, MembershipRepository, MembershipService, MongoMembershipRepository,
};
use crate::metadata::{InMemoryMetadataRepository, MetadataRepository, MetadataService, MongoMetadataRepository};
use crate::page::{InMemoryPageRepository, MongoPageRepository, PageRepository, PageService};
use crate::plan::{InMemoryPlanRepository, MongoPlanRepository, PlanRepository, PlanService};
use crate::reconcile::ApiReconciler;
use crate::subscription::{
    InMemorySubscriptionRepository, MongoSubscriptionRepository, SubscriptionRepository, SubscriptionService,
};
use crate::validation::ApiValidator;

#[derive(Clone)]
pub struct Repositories {
    pub apis: Arc<dyn ApiRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub flows: Arc<dyn FlowRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub events: Arc<dyn EventRepository>,
    pub audits: Arc<dyn AuditLogRepository>,
    pub metadata: Arc<dyn MetadataRepository>,
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            apis: Arc::new(MongoApiRepository::new(db)),
            plans: Arc::new(MongoPlanRepository::new(db)),
            subscriptions: Arc::new(MongoSubscriptionRepository::new(db)),
            flows: Arc::new(MongoFlowRepository::new(db)),
            memberships: Arc::new(MongoMembershipRepository::new(db)),
            pages: Arc::new(MongoPageRepository::new(db)),
            events: Arc::new(MongoEventRepository::new(db)),
            audits: Arc::new(MongoAuditLogRepository::new(db)),
            metadata: Arc::new(MongoMetadataRepository::new(db)),
            users: Arc::new(MongoUserRepository::new(db)),
            groups: Arc::new(MongoGroupRepository::new(db)),
            categories: Arc::new(MongoCategoryRepository::new(db)),
        }
    }
}

/// In-memory backend with typed handles, so tests can count writes.
#[derive(Clone, Default)]
pub struct InMemoryRepositories {
    pub apis: Arc<InMemoryApiRepository>,
    pub plans: Arc<InMemoryPlanRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub flows: Arc<InMemoryFlowRepository>,
    pub memberships: Arc<InMemoryMembershipRepository>,
    pub pages: Arc<InMemoryPageRepository>,
    pub events: Arc<InMemoryEventRepository>,
    pub audits: Arc<InMemoryAuditLogRepository>,
    pub metadata: Arc<InMemoryMetadataRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub groups: Arc<InMemoryGroupRepository>,
    pub categories: Arc<InMemoryCategoryRepository>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_repositories(&self) -> Repositories {
        Repositories {
            apis: self.apis.clone(),
            plans: self.plans.clone(),
            subscriptions: self.subscriptions.clone(),
            flows: self.flows.clone(),
            memberships: self.memberships.clone(),
            pages: self.pages.clone(),
            events: self.events.clone(),
            audits: self.audits.clone(),
            metadata: self.metadata.clone(),
            users: self.users.clone(),
            groups: self.groups.clone(),
            categories: self.categories.clone(),
        }
    }

    /// Writes to the stores a reconciliation touches.
    pub fn write_count(&self) -> usize {
        self.apis.write_count()
            + self.plans.write_count()
            + self.subscriptions.write_count()
            + self.flows.write_count()
            + self.memberships.write_count()
            + self.pages.write_count()
            + self.events.write_count()
            + self.audits.write_count()
            + self.metadata.write_count()
    }
}

#[derive(Clone)]
pub struct DomainServices {
    pub apis: ApiService,
    pub plans: PlanService,
    pub flows: FlowService,
    pub subscriptions: SubscriptionService,
    pub memberships: MembershipService,
    pub pages: PageService,
    pub metadata: MetadataService,
    pub audit: AuditService,
    pub state: ApiStateService,
    pub validator: ApiValidator,
    pub reconciler: ApiReconciler,
    pub events: Arc<dyn EventRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: ManagementConfig,
}

impl DomainServices {
    pub fn new(repos: &Repositories, config: ManagementConfig) -> Self {
        let audit = AuditService::new(repos.audits.clone());
        let flows = FlowService::new(repos.flows.clone());
        let subscriptions = SubscriptionService::new(repos.subscriptions.clone());
        let apis = ApiService::new(repos.apis.clone(), audit.clone());
        let plans = PlanService::new(repos.plans.clone(), subscriptions.clone(), flows.clone(), audit.clone());
        let memberships = MembershipService::new(repos.memberships.clone(), audit.clone());
        let pages = PageService::new(repos.pages.clone(), audit.clone());
        let metadata = MetadataService::new(repos.metadata.clone(), audit.clone());
        let state = ApiStateService::new(
            apis.clone(),
            plans.clone(),
            flows.clone(),
            repos.events.clone(),
            audit.clone(),
            &config.deployment_label,
        );
        let validator = ApiValidator::new(
            apis.clone(),
            repos.users.clone(),
            repos.groups.clone(),
            repos.categories.clone(),
        );
        let reconciler = ApiReconciler::new(
            apis.clone(),
            plans.clone(),
            flows.clone(),
            memberships.clone(),
            pages.clone(),
            metadata.clone(),
        );

        Self {
            apis,
            plans,
            flows,
            subscriptions,
            memberships,
            pages,
            metadata,
            audit,
            state,
            validator,
            reconciler,
            events: repos.events.clone(),
            users: repos.users.clone(),
            config,
        }
    }
}
