//! Flow Aggregate
//!
//! Policy flows are stored apart from the API and plan documents, one flow
//! set per referencing API or plan.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{
    ChannelSelector, ConditionSelector, Flow, FlowReferenceType, FlowSet, FlowV2, FlowV4,
    HttpMethod, HttpSelector, PathOperator, PathOperatorKind, Selector, StepV2, StepV4,
};
pub use repository::{FlowRepository, InMemoryFlowRepository, MongoFlowRepository};
pub use service::FlowService;
