//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use vidhub_types::{ChannelProfile, PublicUser, UserId};

/// User row from the database
#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    /// Always stored lowercase
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    /// Argon2 PHC string
    pub password_hash: String,
    /// SHA-256 hex of the single live refresh token, `None` when logged out
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("has_refresh_token", &self.refresh_token_hash.is_some())
            .finish_non_exhaustive()
    }
}

/// Channel profile aggregate row
#[derive(Debug, Clone, FromRow)]
pub struct ChannelProfileRow {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

// Conversion implementations from Row types to vidhub-types domain types
impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Strip the password hash and refresh token for client output
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.user_id(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone().unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ChannelProfileRow> for ChannelProfile {
    fn from(row: ChannelProfileRow) -> Self {
        Self {
            id: UserId(row.id),
            full_name: row.full_name,
            username: row.username,
            email: row.email,
            avatar: row.avatar,
            cover_image: row.cover_image.unwrap_or_default(),
            created_at: row.created_at,
            subscribers_count: row.subscribers_count,
            channels_subscribed_to_count: row.channels_subscribed_to_count,
            is_subscribed: row.is_subscribed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice".to_string(),
            avatar: "https://media.example.com/a.png".to_string(),
            cover_image: None,
            password_hash: "$argon2id$v=19$secret".to_string(),
            refresh_token_hash: Some("deadbeef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_debug_omits_secrets() {
        let debug = format!("{:?}", row());
        assert!(!debug.contains("argon2"));
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("has_refresh_token: true"));
    }

    #[test]
    fn test_to_public_defaults_cover_image() {
        let public = row().to_public();
        assert_eq!(public.username, "alice");
        assert_eq!(public.cover_image, "");
    }
}
