//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait (the credential store)
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user matching either key; `None` keys never match
    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Option<UserRow>>;

    /// Create a new user; `DbError::Conflict` if username or email is taken
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Overwrite the stored refresh token hash (or clear it)
    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DbResult<()>;

    /// Replace the stored refresh token hash only if it still equals `expected`.
    ///
    /// Returns `false` when the stored value had already moved on.
    async fn swap_refresh_token(&self, id: Uuid, expected: &str, new: &str) -> DbResult<bool>;

    /// Replace the password hash
    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<()>;

    /// Update display name and email
    async fn update_details(&self, id: Uuid, full_name: &str, email: &str) -> DbResult<UserRow>;

    /// Replace the avatar URL
    async fn update_avatar(&self, id: Uuid, url: &str) -> DbResult<UserRow>;

    /// Replace the cover image URL
    async fn update_cover_image(&self, id: Uuid, url: &str) -> DbResult<UserRow>;
}

/// Create user input
#[derive(Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Subscription edge repository (read-only)
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Load a channel profile by username, with counts relative to `viewer`
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> DbResult<Option<ChannelProfileRow>>;
}
