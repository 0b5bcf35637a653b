//! Configuration types for auth service

use std::time::Duration;

use crate::AuthError;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens (must differ from the access secret)
    pub refresh_token_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
}

impl AuthConfig {
    /// Minimum allowed secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create and validate a new auth config
    pub fn try_new(
        access_token_secret: impl Into<String>,
        refresh_token_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let access_token_secret = access_token_secret.into();
        let refresh_token_secret = refresh_token_secret.into();

        for (name, secret) in [
            ("access token secret", &access_token_secret),
            ("refresh token secret", &refresh_token_secret),
        ] {
            if secret.len() < Self::MIN_SECRET_LENGTH {
                return Err(AuthError::Configuration(format!(
                    "{name} too short: got {} bytes, need at least {}",
                    secret.len(),
                    Self::MIN_SECRET_LENGTH
                )));
            }
        }

        if access_token_secret == refresh_token_secret {
            return Err(AuthError::Configuration(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl: Duration::from_secs(24 * 60 * 60), // 1 day
            refresh_token_ttl: Duration::from_secs(10 * 24 * 60 * 60), // 10 days
        })
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secret_rejected() {
        let result = AuthConfig::try_new("short", "r".repeat(32));
        assert!(matches!(result, Err(AuthError::Configuration(_))));

        let result = AuthConfig::try_new("a".repeat(32), "short");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let secret = "s".repeat(40);
        let result = AuthConfig::try_new(secret.clone(), secret);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_defaults_and_builders() {
        let config = AuthConfig::try_new("a".repeat(32), "r".repeat(32))
            .unwrap()
            .with_access_token_ttl(Duration::from_secs(60));

        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(864_000));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AuthConfig::try_new("a".repeat(32), "r".repeat(32)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("aaaa"));
        assert!(!debug.contains("rrrr"));
    }
}
