//! Subscription Aggregate

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{Subscription, SubscriptionStatus};
pub use repository::{InMemorySubscriptionRepository, MongoSubscriptionRepository, SubscriptionRepository};
pub use service::SubscriptionService;
