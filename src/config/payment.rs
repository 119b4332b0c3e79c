//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::application::handlers::billing::{
    BillingSettings, DEFAULT_CHECKOUT_CANCEL_PATH, DEFAULT_CHECKOUT_SUCCESS_PATH,
};
use crate::domain::billing::{
    PriceMap, StripeMode, WebhookSecretCandidate, DEFAULT_RETURN_BASE, DEFAULT_RETURN_PATH,
};

/// Payment configuration (Stripe)
///
/// Live and test environments are configured side by side. Either may be
/// left out; empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Live secret (or restricted) API key
    pub stripe_api_key: Option<SecretString>,

    /// Test secret (or restricted) API key
    pub stripe_test_key: Option<SecretString>,

    /// Live webhook signing secret
    pub stripe_webhook_secret: Option<SecretString>,

    /// Test webhook signing secret
    pub stripe_test_webhook_secret: Option<SecretString>,

    /// JSON price map, flat or `{ "test": {...}, "live": {...} }`
    pub stripe_price_map: Option<String>,

    pub checkout_success_path: Option<String>,
    pub checkout_cancel_path: Option<String>,
    pub portal_return_path: Option<String>,

    /// Base URL for return URLs when a request has no usable `Origin`
    pub return_url_fallback: Option<String>,

    /// Override for the Stripe API host (stripe-mock, proxies)
    pub stripe_api_base_url: Option<String>,
}

fn present(secret: &Option<SecretString>) -> Option<&SecretString> {
    secret
        .as_ref()
        .filter(|s| !s.expose_secret().trim().is_empty())
}

impl PaymentConfig {
    pub fn live_api_key(&self) -> Option<&SecretString> {
        present(&self.stripe_api_key)
    }

    pub fn test_api_key(&self) -> Option<&SecretString> {
        present(&self.stripe_test_key)
    }

    /// Key used for checkout, portal and subscription checks: live when
    /// configured, otherwise test.
    pub fn default_api_key(&self) -> Option<&SecretString> {
        self.live_api_key().or_else(|| self.test_api_key())
    }

    /// Mode of [`default_api_key`](Self::default_api_key).
    pub fn default_mode(&self) -> Option<StripeMode> {
        if let Some(key) = self.live_api_key() {
            return Some(StripeMode::from_api_key(key.expose_secret()).unwrap_or(StripeMode::Live));
        }
        self.test_api_key()
            .map(|key| StripeMode::from_api_key(key.expose_secret()).unwrap_or(StripeMode::Test))
    }

    /// Webhook verification candidates, test first.
    pub fn webhook_candidates(&self) -> Vec<WebhookSecretCandidate> {
        vec![
            WebhookSecretCandidate::new(
                StripeMode::Test,
                present(&self.stripe_test_webhook_secret).cloned(),
                self.test_api_key().cloned(),
            ),
            WebhookSecretCandidate::new(
                StripeMode::Live,
                present(&self.stripe_webhook_secret).cloned(),
                self.live_api_key().cloned(),
            ),
        ]
    }

    /// Classified price map; absent configuration is `PriceMap::Invalid`.
    pub fn price_map(&self) -> PriceMap {
        PriceMap::parse(self.stripe_price_map.as_deref())
    }

    /// Handler settings derived from this configuration.
    pub fn billing_settings(&self) -> BillingSettings {
        let or_default = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        BillingSettings {
            checkout_success_path: or_default(
                &self.checkout_success_path,
                DEFAULT_CHECKOUT_SUCCESS_PATH,
            ),
            checkout_cancel_path: or_default(&self.checkout_cancel_path, DEFAULT_CHECKOUT_CANCEL_PATH),
            portal_return_path: or_default(&self.portal_return_path, DEFAULT_RETURN_PATH),
            return_url_fallback: or_default(&self.return_url_fallback, DEFAULT_RETURN_BASE),
            ..BillingSettings::new(self.price_map(), self.default_mode())
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_api_key().is_none() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY or STRIPE_TEST_KEY"));
        }
        if present(&self.stripe_webhook_secret).is_none()
            && present(&self.stripe_test_webhook_secret).is_none()
        {
            return Err(ValidationError::MissingRequired(
                "STRIPE_WEBHOOK_SECRET or STRIPE_TEST_WEBHOOK_SECRET",
            ));
        }

        // Verify key prefixes for safety
        for (name, key) in [
            ("STRIPE_API_KEY", self.live_api_key()),
            ("STRIPE_TEST_KEY", self.test_api_key()),
        ] {
            if let Some(key) = key {
                let key = key.expose_secret();
                if !key.starts_with("sk_") && !key.starts_with("rk_") {
                    return Err(ValidationError::InvalidStripeKey(name));
                }
            }
        }
        for (name, secret) in [
            ("STRIPE_WEBHOOK_SECRET", present(&self.stripe_webhook_secret)),
            ("STRIPE_TEST_WEBHOOK_SECRET", present(&self.stripe_test_webhook_secret)),
        ] {
            if let Some(secret) = secret {
                if !secret.expose_secret().starts_with("whsec_") {
                    return Err(ValidationError::InvalidStripeWebhookSecret(name));
                }
            }
        }

        if self.stripe_price_map.is_some() && !self.price_map().is_valid() {
            return Err(ValidationError::InvalidPriceMap);
        }

        for (name, path) in [
            ("CHECKOUT_SUCCESS_PATH", &self.checkout_success_path),
            ("CHECKOUT_CANCEL_PATH", &self.checkout_cancel_path),
            ("PORTAL_RETURN_PATH", &self.portal_return_path),
        ] {
            if let Some(path) = path.as_deref().filter(|p| !p.trim().is_empty()) {
                if !path.trim().starts_with('/') {
                    return Err(ValidationError::InvalidReturnPath(name));
                }
            }
        }

        if let Some(fallback) = self.return_url_fallback.as_deref() {
            if !fallback.starts_with("http://") && !fallback.starts_with("https://") {
                return Err(ValidationError::InvalidReturnUrlFallback);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> Option<SecretString> {
        Some(SecretString::new(value.to_string()))
    }

    fn test_only() -> PaymentConfig {
        PaymentConfig {
            stripe_test_key: secret("sk_test_abcd1234"),
            stripe_test_webhook_secret: secret("whsec_test789"),
            ..Default::default()
        }
    }

    fn both_modes() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: secret("sk_live_abcd1234"),
            stripe_webhook_secret: secret("whsec_live789"),
            ..test_only()
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Key Selection Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn test_default_key_prefers_live() {
        let config = both_modes();
        assert_eq!(
            config.default_api_key().map(|k| k.expose_secret().as_str()),
            Some("sk_live_abcd1234")
        );
        assert_eq!(config.default_mode(), Some(StripeMode::Live));
    }

    #[test]
    fn test_default_key_falls_back_to_test() {
        let config = test_only();
        assert_eq!(config.default_mode(), Some(StripeMode::Test));
    }

    #[test]
    fn test_empty_key_counts_as_absent() {
        let config = PaymentConfig {
            stripe_api_key: secret(""),
            ..test_only()
        };
        assert_eq!(config.default_mode(), Some(StripeMode::Test));
    }

    #[test]
    fn test_webhook_candidates_are_test_then_live() {
        let candidates = both_modes().webhook_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, StripeMode::Test);
        assert_eq!(candidates[1].label, StripeMode::Live);
        assert_eq!(
            candidates[1].api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk_live_abcd1234")
        );
    }

    #[test]
    fn test_webhook_candidates_leave_missing_values_empty() {
        let candidates = test_only().webhook_candidates();
        assert!(candidates[1].secret.is_none());
        assert!(candidates[1].api_key.is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Settings Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn test_billing_settings_defaults() {
        let settings = test_only().billing_settings();
        assert_eq!(settings.checkout_success_path, DEFAULT_CHECKOUT_SUCCESS_PATH);
        assert_eq!(settings.portal_return_path, "/dashboard");
        assert_eq!(settings.return_url_fallback, "http://localhost:3000");
        assert_eq!(settings.default_mode, Some(StripeMode::Test));
        assert!(!settings.price_map.is_valid());
    }

    #[test]
    fn test_billing_settings_uses_price_map() {
        let config = PaymentConfig {
            stripe_price_map: Some(r#"{"Starter:monthly":"price_1"}"#.to_string()),
            checkout_success_path: Some("/welcome".to_string()),
            ..test_only()
        };
        let settings = config.billing_settings();
        assert_eq!(
            settings.price_map.price_for_plan("Starter:monthly", settings.default_mode),
            Some("price_1")
        );
        assert_eq!(settings.checkout_success_path, "/welcome");
    }

    // ══════════════════════════════════════════════════════════════
    // Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn test_validation_missing_api_key() {
        let config = PaymentConfig {
            stripe_webhook_secret: secret("whsec_xxx"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_missing_webhook_secret() {
        let config = PaymentConfig {
            stripe_test_key: secret("sk_test_xxx"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = PaymentConfig {
            stripe_api_key: secret("pk_live_xxx"),
            ..test_only()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeKey("STRIPE_API_KEY"))
        );
    }

    #[test]
    fn test_validation_accepts_restricted_key() {
        let config = PaymentConfig {
            stripe_test_key: secret("rk_test_xxx"),
            ..test_only()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        let config = PaymentConfig {
            stripe_test_webhook_secret: secret("secret_xxx"),
            ..test_only()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret(
                "STRIPE_TEST_WEBHOOK_SECRET"
            ))
        );
    }

    #[test]
    fn test_validation_invalid_price_map() {
        let config = PaymentConfig {
            stripe_price_map: Some(r#"{"Starter": 5}"#.to_string()),
            ..test_only()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPriceMap));
    }

    #[test]
    fn test_validation_nested_price_map() {
        let config = PaymentConfig {
            stripe_price_map: Some(
                r#"{"test":{"Starter":"price_t"},"live":{"Starter":"price_l"}}"#.to_string(),
            ),
            ..both_modes()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_return_settings() {
        let config = PaymentConfig {
            checkout_success_path: Some("dashboard".to_string()),
            ..test_only()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidReturnPath("CHECKOUT_SUCCESS_PATH"))
        );

        let config = PaymentConfig {
            return_url_fallback: Some("app.example.com".to_string()),
            ..test_only()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidReturnUrlFallback)
        );
    }
}
