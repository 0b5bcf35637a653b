//! Application state

use std::ops::Deref;
use std::sync::Arc;

use vidhub_auth_core::{AccountService, CloudinaryHost};
use vidhub_db::pg::{PgSubscriptionRepository, PgUserRepository, Repositories};
use vidhub_db::DbPool;

use crate::config::Config;

/// Type alias for the account service with concrete backends
pub type AccountServiceImpl =
    AccountService<PgUserRepository, PgSubscriptionRepository, CloudinaryHost>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Account service for sessions and profiles
    pub accounts: Arc<AccountServiceImpl>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the account service over `pool` and the configured media host
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());
        let accounts = AccountService::new(
            &config.auth,
            Arc::new(repos.users),
            Arc::new(repos.subscriptions),
            Arc::new(CloudinaryHost::new(config.media.clone())),
        );

        Self {
            accounts: Arc::new(accounts),
            pool: SharedPool(Arc::new(pool)),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}
