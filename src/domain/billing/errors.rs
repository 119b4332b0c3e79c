//! Billing error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UnknownPlan | 400 |
//! | EmailRequired | 400 |
//! | CustomerNotFound | 404 |
//! | Webhook | 400 / 500 (see `WebhookError::status_code`) |
//! | PaymentFailed | 502 |
//! | Configuration | 500 |
//! | Infrastructure | 500 |

use thiserror::Error;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors raised by the billing handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// The requested plan key has no configured price.
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// The caller has no email address to look up a customer with.
    #[error("User email is required")]
    EmailRequired,

    /// No Stripe customer exists for the caller's email.
    #[error("No Stripe customer found for {0}")]
    CustomerNotFound(String),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// The payment provider rejected or failed a call.
    #[error("Payment provider error: {reason}")]
    PaymentFailed { reason: String, retryable: bool },

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage failure.
    #[error("Error: {0}")]
    Infrastructure(String),
}

impl BillingError {
    pub fn unknown_plan(plan_key: impl Into<String>) -> Self {
        BillingError::UnknownPlan(plan_key.into())
    }

    pub fn customer_not_found(email: impl Into<String>) -> Self {
        BillingError::CustomerNotFound(email.into())
    }

    pub fn payment_failed(reason: impl Into<String>, retryable: bool) -> Self {
        BillingError::PaymentFailed {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::Configuration(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::UnknownPlan(_) => ErrorCode::UnknownPlan,
            BillingError::EmailRequired => ErrorCode::EmailRequired,
            BillingError::CustomerNotFound(_) => ErrorCode::CustomerNotFound,
            BillingError::Webhook(err) if err.status_code().is_client_error() => {
                ErrorCode::InvalidSignature
            }
            BillingError::Webhook(_) | BillingError::Configuration(_) => {
                ErrorCode::ConfigurationError
            }
            BillingError::PaymentFailed { .. } => ErrorCode::PaymentFailed,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if the caller (or Stripe) should retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BillingError::Infrastructure(_) => true,
            BillingError::PaymentFailed { retryable, .. } => *retryable,
            BillingError::Webhook(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Infrastructure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::StripeMode;

    #[test]
    fn unknown_plan_maps_to_code() {
        let err = BillingError::unknown_plan("Premium:annual");
        assert_eq!(err.code(), ErrorCode::UnknownPlan);
        assert_eq!(err.to_string(), "Unknown plan: Premium:annual");
    }

    #[test]
    fn webhook_errors_split_by_status() {
        let err = BillingError::from(WebhookError::InvalidSignature);
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
        assert_eq!(err.to_string(), "Invalid signature");

        let err = BillingError::from(WebhookError::MissingApiKey(StripeMode::Live));
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
        assert!(err.is_retryable());
    }

    #[test]
    fn domain_errors_become_infrastructure() {
        let err = BillingError::from(DomainError::database("pool timed out"));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.is_retryable());
    }

    #[test]
    fn payment_failure_carries_retryability() {
        assert!(BillingError::payment_failed("timeout", true).is_retryable());
        assert!(!BillingError::payment_failed("card declined", false).is_retryable());
        assert!(!BillingError::EmailRequired.is_retryable());
    }
}
