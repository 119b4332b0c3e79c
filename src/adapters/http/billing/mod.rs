//! HTTP adapter for the billing endpoints.
//!
//! Exposes the billing handlers under `/functions/v1`:
//! - `POST /functions/v1/create-checkout` - Start a subscription checkout
//! - `GET|POST /functions/v1/check-subscription` - Refresh subscription state
//! - `POST /functions/v1/customer-portal` - Open the Stripe Billing Portal
//! - `POST /functions/v1/stripe-webhook` - Handle Stripe webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{BillingApiError, BillingAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{billing_router, billing_routes, cors_layer, webhook_routes, CORS_ALLOWED_HEADERS};
