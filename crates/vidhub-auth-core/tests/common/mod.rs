//! Common test utilities for vidhub-auth-core integration tests

pub mod mock_repos;

use std::path::PathBuf;
use std::sync::Arc;

use vidhub_auth_core::{AccountService, AuthConfig, Registration};

#[allow(unused_imports)]
pub use mock_repos::{MockMediaHost, MockSubscriptionRepository, MockUserRepository};

pub type TestService =
    AccountService<MockUserRepository, MockSubscriptionRepository, MockMediaHost>;

/// Service wired to in-memory stores, plus handles to inspect them
#[allow(dead_code)]
pub struct Harness {
    pub service: TestService,
    pub users: MockUserRepository,
    pub subscriptions: MockSubscriptionRepository,
    pub media: Arc<MockMediaHost>,
    pub staging: tempfile::TempDir,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let config = AuthConfig::try_new("a".repeat(32), "r".repeat(32)).unwrap();
        let users = MockUserRepository::new();
        let subscriptions = MockSubscriptionRepository::new(users.clone());
        let media = Arc::new(MockMediaHost::new());

        Self {
            service: AccountService::new(
                &config,
                Arc::new(users.clone()),
                Arc::new(subscriptions.clone()),
                Arc::clone(&media),
            ),
            users,
            subscriptions,
            media,
            staging: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a small file into the staging dir, as the request layer would
    pub fn stage(&self, name: &str) -> PathBuf {
        let path = self.staging.path().join(name);
        std::fs::write(&path, b"\x89PNG fake image bytes").unwrap();
        path
    }

    /// Registration input with a staged avatar
    pub fn registration(&self, username: &str, email: &str, password: &str) -> Registration {
        Registration {
            full_name: format!("{username} full name"),
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            avatar: Some(self.stage(&format!("{username}-avatar.png"))),
            cover_image: None,
        }
    }
}
