//! User types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Account as it may be shown to clients.
///
/// There is deliberately no field for the password hash or the stored
/// refresh token: this is the only user shape that gets serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Avatar URL on the media host
    pub avatar: String,
    /// Cover image URL, empty when none was uploaded
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PublicUser {
        PublicUser {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice".to_string(),
            avatar: "https://media.example.com/avatar.png".to_string(),
            cover_image: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_id_roundtrip() {
        let id = UserId::new();
        let parsed = UserId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(UserId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_public_user_has_no_secret_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(obj.contains_key("_id"));
        assert!(obj.contains_key("fullName"));
        assert!(obj.contains_key("coverImage"));
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("refreshToken"));
    }
}
