//! Billing handlers.
//!
//! ## Commands
//! - Creating subscription checkout sessions
//! - Refreshing subscription state from Stripe (check-subscription)
//! - Applying Stripe webhook deliveries
//! - Opening the Stripe Billing Portal

mod check_subscription;
mod create_checkout;
mod customer_portal;
mod handle_stripe_webhook;
mod settings;

pub use check_subscription::{CheckSubscriptionCommand, CheckSubscriptionHandler};
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use customer_portal::{CustomerPortalCommand, CustomerPortalHandler, CustomerPortalResult};
pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
pub use settings::{BillingSettings, DEFAULT_CHECKOUT_CANCEL_PATH, DEFAULT_CHECKOUT_SUCCESS_PATH};
