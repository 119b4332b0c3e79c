//! Webhook error types for Stripe webhook handling.

use http::StatusCode;
use thiserror::Error;

use super::mode::StripeMode;

/// Errors that occur while authenticating and decoding a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the accepted window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Neither the test nor the live webhook secret is configured.
    #[error("No webhook secrets configured")]
    NoSecretsConfigured,

    /// The event verified but no API key is configured for its mode.
    #[error("No Stripe API key configured for {0} mode")]
    MissingApiKey(StripeMode),
}

impl WebhookError {
    /// Returns true if Stripe should retry delivering this webhook.
    ///
    /// Only configuration problems are retryable; a bad delivery stays bad.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::NoSecretsConfigured | WebhookError::MissingApiKey(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Stripe retries 5xx responses and gives up on 4xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::NoSecretsConfigured | WebhookError::MissingApiKey(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
