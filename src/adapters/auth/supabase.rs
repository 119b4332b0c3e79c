//! Supabase adapter for JWT validation.
//!
//! Supabase signs user access tokens with the project's JWT secret (HS256).
//! This adapter implements the `SessionValidator` port by:
//!
//! 1. Validating the HS256 signature against the shared secret
//! 2. Validating audience and expiry claims
//! 3. Mapping claims to the domain `AuthenticatedUser` type
//!
//! # Example
//!
//! ```ignore
//! let config = SupabaseAuthConfig::new(jwt_secret);
//! let validator = SupabaseSessionValidator::new(config);
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Audience Supabase puts on tokens of signed-in users.
pub const DEFAULT_SUPABASE_AUDIENCE: &str = "authenticated";

/// Configuration for the Supabase JWT adapter.
#[derive(Clone)]
pub struct SupabaseAuthConfig {
    /// Project JWT secret.
    pub jwt_secret: SecretString,

    /// Expected audience claim.
    pub audience: String,
}

impl SupabaseAuthConfig {
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            audience: DEFAULT_SUPABASE_AUDIENCE.to_string(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }
}

/// JWT claims carried by Supabase access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SupabaseClaims {
    /// Subject - the auth user ID (UUID)
    pub sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Audience
    #[serde(default)]
    pub aud: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Postgres role, usually "authenticated"
    #[serde(default)]
    pub role: Option<String>,
}

/// Supabase session validator.
///
/// This is the production implementation of `SessionValidator`.
pub struct SupabaseSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    audience: String,
}

impl SupabaseSessionValidator {
    pub fn new(config: SupabaseAuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            decoding_key,
            validation,
            audience: config.audience,
        }
    }
}

#[async_trait]
impl SessionValidator for SupabaseSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data =
            decode::<SupabaseClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!(expected = %self.audience, "Invalid audience in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::warn!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;
        let claims = token_data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token: {}", claims.sub);
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email, claims.role))
    }
}

impl std::fmt::Debug for SupabaseSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSessionValidator")
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";
    const USER_ID: &str = "0b3c1f0e-2d7a-4a57-9d0f-5f5b8f3b8e11";

    fn validator() -> SupabaseSessionValidator {
        SupabaseSessionValidator::new(SupabaseAuthConfig::new(SecretString::new(
            SECRET.to_string(),
        )))
    }

    fn token(secret: &str, aud: &str, exp_offset: i64, email: Option<&str>) -> String {
        let claims = SupabaseClaims {
            sub: USER_ID.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            aud: Some(aud.to_string()),
            email: email.map(str::to_string),
            role: Some("authenticated".to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_maps_claims() {
        let user = validator()
            .validate(&token(SECRET, "authenticated", 3600, Some("user@example.com")))
            .await
            .unwrap();

        assert_eq!(user.id.as_str(), USER_ID);
        assert_eq!(user.email(), Some("user@example.com"));
        assert_eq!(user.role.as_deref(), Some("authenticated"));
    }

    #[tokio::test]
    async fn token_without_email_is_still_valid() {
        let user = validator()
            .validate(&token(SECRET, "authenticated", 3600, None))
            .await
            .unwrap();

        assert!(user.email().is_none());
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let result = validator()
            .validate(&token("another-secret-of-sufficient-length!!", "authenticated", 3600, None))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let result = validator()
            .validate(&token(SECRET, "anon", 3600, None))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let result = validator()
            .validate(&token(SECRET, "authenticated", -3600, None))
            .await;

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let result = validator().validate("not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn config_uses_authenticated_audience_by_default() {
        let config = SupabaseAuthConfig::new(SecretString::new(SECRET.to_string()));
        assert_eq!(config.audience, "authenticated");
        assert_eq!(config.with_audience("custom").audience, "custom");
    }

    #[test]
    fn supabase_validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SupabaseSessionValidator>();
    }
}
