//! Data models: users, subscriptions, and the response envelope.

pub mod response;
pub mod subscription;
pub mod user;

pub use response::ApiResponse;
pub use subscription::*;
pub use user::*;
