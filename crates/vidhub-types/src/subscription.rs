//! Subscription edges and channel profile aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Directed edge: `subscriber` follows `channel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    /// User who subscribed
    pub subscriber: UserId,
    /// User being subscribed to
    pub channel: UserId,
}

/// Public channel page for a user, with subscription counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    /// Number of users subscribed to this channel
    pub subscribers_count: i64,
    /// Number of channels this user subscribes to
    pub channels_subscribed_to_count: i64,
    /// Whether the viewing user subscribes to this channel
    pub is_subscribed: bool,
}
