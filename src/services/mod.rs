//! Business logic: sessions, profiles, and subscriptions.

pub mod auth;
pub mod profile;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthFlowService, Credentials, LoginOutcome, Registration};
pub use profile::ProfileService;
pub use subscription::SubscriptionService;
