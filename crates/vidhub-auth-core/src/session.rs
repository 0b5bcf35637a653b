//! Session management with single-token refresh rotation
//!
//! A user has at most one live refresh token. Its SHA-256 fingerprint is
//! stored on the user record; presenting anything else for rotation fails,
//! and presenting an earlier token additionally ends the session.

use std::sync::Arc;

use vidhub_db::{UserRepository, UserRow};
use vidhub_types::UserId;

use crate::crypto::{constant_time_str_eq, hash_token};
use crate::token::{AccessDetails, TokenKind, TokenPair, TokenService};
use crate::AuthError;

/// Access details for the token payload of `user`
pub fn access_details(user: &UserRow) -> AccessDetails {
    AccessDetails {
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
    }
}

/// Session manager handles pair issuance, rotation and revocation
pub struct SessionManager<U: UserRepository> {
    tokens: TokenService,
    repo: Arc<U>,
}

impl<U: UserRepository> Clone for SessionManager<U> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<U: UserRepository> SessionManager<U> {
    /// Create a new session manager
    pub fn new(tokens: TokenService, repo: Arc<U>) -> Self {
        Self { tokens, repo }
    }

    /// Token service used for signing and verification
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Issue a pair for `user` and make its refresh token the only live one
    pub async fn start_session(&self, user: &UserRow) -> Result<TokenPair, AuthError> {
        let pair = self.tokens.issue_pair(user.user_id(), access_details(user))?;
        let fingerprint = hash_token(&pair.refresh_token);

        self.repo
            .update_refresh_token(user.id, Some(fingerprint.as_str()))
            .await?;

        tracing::debug!(user_id = %user.id, "Session started");
        Ok(pair)
    }

    /// Exchange the live refresh token for a new pair.
    ///
    /// The stored fingerprint is replaced with a compare-and-swap so that of
    /// two concurrent rotations with the same token, exactly one succeeds.
    pub async fn rotate(&self, presented: &str) -> Result<(TokenPair, UserRow), AuthError> {
        let claims = self.tokens.verify(presented, TokenKind::Refresh)?;
        let user_id = claims.user_id()?;

        let user = self
            .repo
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let Some(stored) = user.refresh_token_hash.as_deref() else {
            tracing::debug!(user_id = %user.id, "Refresh attempted with no live session");
            return Err(AuthError::SessionRevoked);
        };

        let presented_hash = hash_token(presented);
        if !constant_time_str_eq(&presented_hash, stored) {
            // A superseded token came back: treat it as stolen and end the session
            tracing::warn!(user_id = %user.id, "Stale refresh token presented, revoking session");
            self.repo.update_refresh_token(user.id, None).await?;
            return Err(AuthError::SessionRevoked);
        }

        let pair = self.tokens.issue_pair(user.user_id(), access_details(&user))?;
        let swapped = self
            .repo
            .swap_refresh_token(user.id, &presented_hash, &hash_token(&pair.refresh_token))
            .await?;

        if !swapped {
            tracing::debug!(user_id = %user.id, "Lost refresh rotation race");
            return Err(AuthError::SessionRevoked);
        }

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok((pair, user))
    }

    /// Clear the live refresh token; idempotent
    pub async fn end_session(&self, user_id: UserId) -> Result<(), AuthError> {
        match self.repo.update_refresh_token(user_id.0, None).await {
            Ok(()) | Err(vidhub_db::DbError::NotFound) => {
                tracing::debug!(user_id = %user_id, "Session ended");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve an access token to the user it was issued for
    pub async fn authenticate(&self, access_token: &str) -> Result<UserRow, AuthError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        let user_id = claims.user_id()?;

        self.repo
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

impl<U: UserRepository> std::fmt::Debug for SessionManager<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
