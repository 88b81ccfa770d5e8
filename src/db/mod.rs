//! Persistence: the credential and subscription stores, backed by PostgreSQL or memory.

mod memory;
mod pool;
mod postgres;
mod store;

pub use memory::{MemoryCredentialStore, MemorySubscriptionStore};
pub use pool::{create_pool, run_migrations, DbPool};
pub use postgres::{PgCredentialStore, PgSubscriptionStore};
pub use store::{AccountUpdate, CredentialStore, SubscriptionStore};
