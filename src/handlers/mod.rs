//! HTTP request handlers.

pub mod http;
pub mod subscriptions;
pub mod users;

pub use http::*;
pub use subscriptions::*;
pub use users::*;
