//! Vidhub DB - Database abstractions
//!
//! SQLx-based database layer for Vidhub services. Holds the credential
//! store (`users`) and the read-only subscription edges (`subscriptions`).
//!
//! # Example
//!
//! ```rust,ignore
//! use vidhub_db::{create_pool_with_options, PoolOptions, Repositories, UserRepository};
//!
//! let pool = create_pool_with_options("postgres://localhost/vidhub", &PoolOptions::default()).await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_identity(Some("alice"), None).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;
