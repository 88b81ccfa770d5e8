//! Request authentication extractors.

pub mod auth;

pub use auth::{AuthUser, MaybeAuthUser};
