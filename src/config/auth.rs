//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::auth::DEFAULT_SUPABASE_AUDIENCE;

/// Authentication configuration (Supabase access tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret Supabase signs access tokens with
    pub supabase_jwt_secret: SecretString,

    /// Expected `aud` claim
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.supabase_jwt_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("SUPABASE_JWT_SECRET"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_AUDIENCE"));
        }
        Ok(())
    }
}

fn default_audience() -> String {
    DEFAULT_SUPABASE_AUDIENCE.to_string()
}
