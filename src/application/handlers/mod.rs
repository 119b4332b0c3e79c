//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through ports.

pub mod billing;

pub use billing::{
    BillingSettings, CheckSubscriptionCommand, CheckSubscriptionHandler, CreateCheckoutCommand,
    CreateCheckoutHandler, CreateCheckoutResult, CustomerPortalCommand, CustomerPortalHandler,
    CustomerPortalResult, HandleStripeWebhookCommand, HandleStripeWebhookHandler,
    HandleStripeWebhookResult,
};
