//! Access/refresh token issuance and verification
//!
//! Both kinds are HS256 JWTs signed with separate secrets. Every pair gets
//! fresh `jti` values, so two pairs minted in the same second still differ.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use vidhub_types::UserId;

use crate::{AuthConfig, AuthError};

/// Which of the two token kinds a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, authenticates ordinary requests
    Access,
    /// Long-lived, only exchanged for a new pair
    Refresh,
}

/// Profile details embedded in access tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDetails {
    pub email: String,
    pub username: String,
    pub full_name: String,
}

/// Claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Token kind
    pub kind: TokenKind,
    /// Unique token ID
    pub jti: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Present on access tokens only
    #[serde(flatten)]
    pub details: Option<AccessDetails>,
}

impl TokenClaims {
    /// Get the user ID
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        UserId::parse(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// A freshly issued access/refresh token pair
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Token issuer/verifier
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Create a token service from validated config
    pub fn new(config: &AuthConfig) -> Self {
        let access = config.access_token_secret.as_bytes();
        let refresh = config.refresh_token_secret.as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            access_ttl_secs: i64::try_from(config.access_token_ttl.as_secs()).unwrap_or(i64::MAX),
            refresh_ttl_secs: i64::try_from(config.refresh_token_ttl.as_secs())
                .unwrap_or(i64::MAX),
        }
    }

    /// Issue a brand-new, independently signed access/refresh pair
    pub fn issue_pair(
        &self,
        user_id: UserId,
        details: AccessDetails,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();

        let access = TokenClaims {
            sub: user_id.to_string(),
            kind: TokenKind::Access,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.access_ttl_secs),
            details: Some(details),
        };
        let refresh = TokenClaims {
            sub: user_id.to_string(),
            kind: TokenKind::Refresh,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.refresh_ttl_secs),
            details: None,
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Verify signature, expiry and kind of a token
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<TokenClaims>(token, key, &validation).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let claims = token_data.claims;
        if claims.kind != kind {
            tracing::debug!(expected = ?kind, actual = ?claims.kind, "Token kind mismatch");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Sign arbitrary claims with the key for their kind
    pub(crate) fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let key = match claims.kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        };

        encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::Internal("failed to generate tokens".to_string())
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}
