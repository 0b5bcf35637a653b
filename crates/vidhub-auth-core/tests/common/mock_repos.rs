//! Mock repositories and media host for testing

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use vidhub_auth_core::{MediaError, MediaHost, UploadedAsset};
use vidhub_db::{
    ChannelProfileRow, CreateUser, DbError, DbResult, SubscriptionRepository, UserRepository,
    UserRow,
};
use vidhub_types::Subscription;

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_username: Arc<DashMap<String, Uuid>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.by_username.insert(user.username.clone(), user.id);
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Current stored row, bypassing the trait
    #[allow(dead_code)]
    pub fn get(&self, id: Uuid) -> Option<UserRow> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    fn find_by_username(&self, username: &str) -> Option<UserRow> {
        self.by_username
            .get(username)
            .and_then(|id| self.get(*id.value()))
    }

    fn modify<F>(&self, id: Uuid, f: F) -> DbResult<UserRow>
    where
        F: FnOnce(&mut UserRow),
    {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        f(&mut user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.get(id))
    }

    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Option<UserRow>> {
        let id = username
            .and_then(|u| self.by_username.get(u).map(|id| *id.value()))
            .or_else(|| email.and_then(|e| self.by_email.get(e).map(|id| *id.value())));
        Ok(id.and_then(|id| self.get(id)))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if self.by_username.contains_key(&user.username) {
            return Err(DbError::Conflict("users_username_key".to_string()));
        }
        if self.by_email.contains_key(&user.email) {
            return Err(DbError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let row = UserRow {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_user(row.clone());
        Ok(row)
    }

    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DbResult<()> {
        self.modify(id, |user| {
            user.refresh_token_hash = token_hash.map(str::to_string);
        })
        .map(|_| ())
    }

    async fn swap_refresh_token(&self, id: Uuid, expected: &str, new: &str) -> DbResult<bool> {
        // get_mut holds the shard lock, so check-and-set is atomic
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        if user.refresh_token_hash.as_deref() != Some(expected) {
            return Ok(false);
        }
        user.refresh_token_hash = Some(new.to_string());
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        self.modify(id, |user| user.password_hash = password_hash.to_string())
            .map(|_| ())
    }

    async fn update_details(&self, id: Uuid, full_name: &str, email: &str) -> DbResult<UserRow> {
        if let Some(owner) = self.by_email.get(email) {
            if *owner.value() != id {
                return Err(DbError::Conflict("users_email_key".to_string()));
            }
        }

        let old_email = self.get(id).ok_or(DbError::NotFound)?.email;
        let row = self.modify(id, |user| {
            user.full_name = full_name.to_string();
            user.email = email.to_string();
        })?;
        self.by_email.remove(&old_email);
        self.by_email.insert(email.to_string(), id);
        Ok(row)
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> DbResult<UserRow> {
        self.modify(id, |user| user.avatar = url.to_string())
    }

    async fn update_cover_image(&self, id: Uuid, url: &str) -> DbResult<UserRow> {
        self.modify(id, |user| user.cover_image = Some(url.to_string()))
    }
}

/// In-memory subscription edges over a shared user store
#[derive(Clone)]
pub struct MockSubscriptionRepository {
    users: MockUserRepository,
    edges: Arc<DashMap<Subscription, ()>>,
}

impl MockSubscriptionRepository {
    pub fn new(users: MockUserRepository) -> Self {
        Self {
            users,
            edges: Arc::new(DashMap::new()),
        }
    }

    /// Record a subscription edge
    #[allow(dead_code)]
    pub fn insert_subscription(&self, subscription: Subscription) {
        self.edges.insert(subscription, ());
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> DbResult<Option<ChannelProfileRow>> {
        let Some(user) = self.users.find_by_username(username) else {
            return Ok(None);
        };

        let mut subscribers_count = 0;
        let mut channels_subscribed_to_count = 0;
        let mut is_subscribed = false;
        for edge in self.edges.iter() {
            let edge = edge.key();
            if edge.channel.0 == user.id {
                subscribers_count += 1;
                is_subscribed |= edge.subscriber.0 == viewer;
            }
            if edge.subscriber.0 == user.id {
                channels_subscribed_to_count += 1;
            }
        }

        Ok(Some(ChannelProfileRow {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            cover_image: user.cover_image,
            created_at: user.created_at,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        }))
    }
}

/// Media host that records calls instead of talking to the network
#[derive(Default)]
pub struct MockMediaHost {
    uploads: AtomicUsize,
    deleted: DashMap<String, ()>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

#[allow(dead_code)]
impl MockMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn was_deleted(&self, public_id: &str) -> bool {
        self.deleted.contains_key(public_id)
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.len()
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    async fn upload(&self, staged: &Path) -> Result<UploadedAsset, MediaError> {
        let result = if self.fail_uploads.load(Ordering::SeqCst) {
            Err(MediaError::Rejected { status: 500 })
        } else {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst);
            let public_id = format!("asset{n}");
            Ok(UploadedAsset {
                url: format!("https://media.test/image/upload/{public_id}.png"),
                public_id,
            })
        };
        vidhub_auth_core::discard_staged(staged).await;
        result
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected { status: 500 });
        }
        self.deleted.insert(public_id.to_string(), ());
        Ok(())
    }
}
