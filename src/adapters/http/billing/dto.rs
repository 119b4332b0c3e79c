//! Data Transfer Objects for the billing endpoints.
//!
//! Request bodies use the camelCase field names the web client sends;
//! response bodies keep the snake_case names it reads.

use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingPeriod;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /functions/v1/create-checkout`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequestDto {
    pub plan_name: String,

    /// `"monthly"` or `"annual"`; anything else is treated as absent.
    #[serde(default)]
    pub billing_period: Option<String>,
}

impl CreateCheckoutRequestDto {
    pub fn billing_period(&self) -> Option<BillingPeriod> {
        self.billing_period
            .as_deref()
            .and_then(|p| BillingPeriod::parse(p.trim()))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Redirect target returned by create-checkout and customer-portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

/// Acknowledgement returned to Stripe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Standard error response: `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
