//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ChannelProfileRow;
use crate::repo::SubscriptionRepository;

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> DbResult<Option<ChannelProfileRow>> {
        let profile = sqlx::query_as::<_, ChannelProfileRow>(
            r#"
            SELECT u.id, u.full_name, u.username, u.email, u.avatar, u.cover_image, u.created_at,
                   (SELECT COUNT(*) FROM subscriptions s
                     WHERE s.channel_id = u.id) AS subscribers_count,
                   (SELECT COUNT(*) FROM subscriptions s
                     WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                   EXISTS (SELECT 1 FROM subscriptions s
                            WHERE s.channel_id = u.id AND s.subscriber_id = $2) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
