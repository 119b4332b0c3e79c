//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe integration:
//! - Customer lookup by email and id
//! - Subscription listing
//! - Checkout and Billing Portal sessions
//!
//! Webhook signature verification lives in the billing domain; this module
//! only talks to the Stripe REST API.

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{
    StripeClientFactory, StripeConfig, StripePaymentAdapter, DEFAULT_STRIPE_API_BASE_URL,
};
