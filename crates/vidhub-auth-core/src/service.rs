//! Account service - ties together credentials, sessions and profile media

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidhub_db::{CreateUser, SubscriptionRepository, UserRepository, UserRow};
use vidhub_types::{ChannelProfile, PublicUser, UserId};

use crate::{
    config::AuthConfig,
    crypto::{hash_password, verify_password},
    media::{delete_best_effort, discard_staged, MediaHost, UploadedAsset},
    session::SessionManager,
    token::{TokenPair, TokenService},
    AuthError,
};

/// Registration input, with media already staged on local disk
#[derive(Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<PathBuf>,
    pub cover_image: Option<PathBuf>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("avatar", &self.avatar)
            .field("cover_image", &self.cover_image)
            .finish_non_exhaustive()
    }
}

/// Login input: password plus at least one identity key
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Which profile image a media update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileImage {
    Avatar,
    CoverImage,
}

/// Account service
///
/// Provides unified interface for:
/// - Registration and credential login
/// - Refresh rotation, logout and password change
/// - Profile updates and channel profile lookups
pub struct AccountService<U: UserRepository, S: SubscriptionRepository, M: MediaHost> {
    users: Arc<U>,
    subscriptions: Arc<S>,
    media: Arc<M>,
    sessions: SessionManager<U>,
}

impl<U: UserRepository, S: SubscriptionRepository, M: MediaHost> AccountService<U, S, M> {
    /// Create a new account service
    pub fn new(config: &AuthConfig, users: Arc<U>, subscriptions: Arc<S>, media: Arc<M>) -> Self {
        Self {
            sessions: SessionManager::new(TokenService::new(config), Arc::clone(&users)),
            users,
            subscriptions,
            media,
        }
    }

    /// Session manager backing this service
    pub fn sessions(&self) -> &SessionManager<U> {
        &self.sessions
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account.
    ///
    /// Staged files are always removed from local disk, whatever the outcome.
    pub async fn register(&self, registration: Registration) -> Result<PublicUser, AuthError> {
        let result = self.register_inner(&registration).await;

        for staged in [&registration.avatar, &registration.cover_image]
            .into_iter()
            .flatten()
        {
            discard_staged(staged).await;
        }

        result
    }

    async fn register_inner(&self, registration: &Registration) -> Result<PublicUser, AuthError> {
        let full_name = registration.full_name.trim();
        let email = registration.email.trim();
        let username = registration.username.trim().to_lowercase();

        if [full_name, email, username.as_str(), registration.password.trim()]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(AuthError::BadRequest("all fields are required".to_string()));
        }

        if self
            .users
            .find_by_identity(Some(username.as_str()), Some(email))
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict(
                "user with email or username already exists".to_string(),
            ));
        }

        let avatar_path = registration
            .avatar
            .as_deref()
            .ok_or_else(|| AuthError::BadRequest("avatar file is required".to_string()))?;

        let avatar = self.media.upload(avatar_path).await?;

        let cover = match registration.cover_image.as_deref() {
            Some(path) => match self.media.upload(path).await {
                Ok(asset) => Some(asset),
                Err(e) => {
                    tracing::warn!(error = %e, "Cover image upload failed, continuing without it");
                    None
                }
            },
            None => None,
        };

        let created = async {
            let password_hash = hash_blocking(registration.password.clone()).await?;
            let user = self
                .users
                .create(CreateUser {
                    id: uuid::Uuid::new_v4(),
                    username: username.clone(),
                    email: email.to_string(),
                    full_name: full_name.to_string(),
                    avatar: avatar.url.clone(),
                    cover_image: cover.as_ref().map(|c| c.url.clone()),
                    password_hash,
                })
                .await?;
            Ok::<_, AuthError>(user)
        }
        .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(user.to_public())
            }
            Err(e) => {
                for asset in std::iter::once(&avatar).chain(cover.as_ref()) {
                    delete_best_effort(self.media.as_ref(), &asset.url).await;
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Session Flow
    // =========================================================================

    /// Log in with username or email plus password
    pub async fn login(&self, credentials: Credentials) -> Result<LoginOutcome, AuthError> {
        let username = non_empty(credentials.username.as_deref()).map(str::to_lowercase);
        let email = non_empty(credentials.email.as_deref());

        if username.is_none() && email.is_none() {
            return Err(AuthError::BadRequest(
                "username or email is required".to_string(),
            ));
        }
        if credentials.password.is_empty() {
            return Err(AuthError::BadRequest("password is required".to_string()));
        }

        let user = self
            .users
            .find_by_identity(username.as_deref(), email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_blocking(credentials.password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Password mismatch on login");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.sessions.start_session(&user).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user: user.to_public(),
            tokens,
        })
    }

    /// Clear the caller's refresh token
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.sessions.end_session(user_id).await
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AuthError> {
        let presented = non_empty(presented).ok_or(AuthError::Unauthenticated)?;
        let (tokens, _user) = self.sessions.rotate(presented).await?;
        Ok(tokens)
    }

    /// Replace the caller's password after checking the old one.
    ///
    /// The live refresh token is left in place.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.trim().is_empty() {
            return Err(AuthError::BadRequest("new password is required".to_string()));
        }

        let user = self.load(user_id).await?;

        if !verify_blocking(old_password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Old password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash_blocking(new_password.to_string()).await?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!(
            user_id = %user.id,
            "Password changed; existing refresh token remains valid"
        );
        Ok(())
    }

    /// Resolve an access token to its user
    pub async fn authenticate(&self, access_token: &str) -> Result<PublicUser, AuthError> {
        let user = self.sessions.authenticate(access_token).await?;
        Ok(user.to_public())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Sanitized record of the caller
    pub async fn current_user(&self, user_id: UserId) -> Result<PublicUser, AuthError> {
        Ok(self.load(user_id).await?.to_public())
    }

    /// Update display name and email
    pub async fn update_account_details(
        &self,
        user_id: UserId,
        full_name: &str,
        email: &str,
    ) -> Result<PublicUser, AuthError> {
        let full_name = full_name.trim();
        let email = email.trim();

        if full_name.is_empty() || email.is_empty() {
            return Err(AuthError::BadRequest("all fields are required".to_string()));
        }

        let user = self.users.update_details(user_id.0, full_name, email).await?;
        Ok(user.to_public())
    }

    /// Replace the avatar and drop the previous asset
    pub async fn update_avatar(
        &self,
        user_id: UserId,
        staged: Option<PathBuf>,
    ) -> Result<PublicUser, AuthError> {
        self.replace_image(user_id, staged, ProfileImage::Avatar)
            .await
    }

    /// Replace the cover image and drop the previous asset
    pub async fn update_cover_image(
        &self,
        user_id: UserId,
        staged: Option<PathBuf>,
    ) -> Result<PublicUser, AuthError> {
        self.replace_image(user_id, staged, ProfileImage::CoverImage)
            .await
    }

    async fn replace_image(
        &self,
        user_id: UserId,
        staged: Option<PathBuf>,
        image: ProfileImage,
    ) -> Result<PublicUser, AuthError> {
        let Some(staged) = staged else {
            let name = match image {
                ProfileImage::Avatar => "avatar",
                ProfileImage::CoverImage => "cover image",
            };
            return Err(AuthError::BadRequest(format!("{name} file is missing")));
        };

        let result = self.replace_image_inner(user_id, &staged, image).await;
        discard_staged(&staged).await;
        result
    }

    async fn replace_image_inner(
        &self,
        user_id: UserId,
        staged: &Path,
        image: ProfileImage,
    ) -> Result<PublicUser, AuthError> {
        let user = self.load(user_id).await?;
        let asset: UploadedAsset = self.media.upload(staged).await?;

        let (previous, updated) = match image {
            ProfileImage::Avatar => (
                Some(user.avatar.clone()),
                self.users.update_avatar(user.id, &asset.url).await,
            ),
            ProfileImage::CoverImage => (
                user.cover_image.clone(),
                self.users.update_cover_image(user.id, &asset.url).await,
            ),
        };

        let updated = match updated {
            Ok(row) => row,
            Err(e) => {
                delete_best_effort(self.media.as_ref(), &asset.url).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous.filter(|url| url != &asset.url) {
            delete_best_effort(self.media.as_ref(), &previous).await;
        }

        tracing::debug!(user_id = %user.id, ?image, "Profile image replaced");
        Ok(updated.to_public())
    }

    /// Public profile of a channel as seen by `viewer`
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: UserId,
    ) -> Result<ChannelProfile, AuthError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AuthError::BadRequest("username is missing".to_string()));
        }

        self.subscriptions
            .channel_profile(&username, viewer.0)
            .await?
            .map(ChannelProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    async fn load(&self, user_id: UserId) -> Result<UserRow, AuthError> {
        self.users
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

impl<U: UserRepository, S: SubscriptionRepository, M: MediaHost> std::fmt::Debug
    for AccountService<U, S, M>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Hash on the blocking pool so request workers are not stalled
async fn hash_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))?
}
