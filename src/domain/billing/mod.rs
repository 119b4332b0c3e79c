//! Billing domain module.
//!
//! Pure translation between Stripe's event/object model and SubjectAI's
//! subscriber records.
//!
//! # Module Structure
//!
//! - `price_map` - Price map classification, plan and tier resolution
//! - `plan` - Plan keys (`"<Plan>:annual"`) and amount-based tier fallback
//! - `status` - Subscription status classification
//! - `interpret` - Webhook interpretation helpers
//! - `return_url` - Checkout / portal return URLs
//! - `webhook_verifier` - Stripe-Signature verification against candidate secrets

mod errors;
mod interpret;
mod mode;
mod plan;
mod price_map;
mod return_url;
mod status;
mod stripe_event;
mod stripe_objects;
mod subscriber;
mod webhook_errors;
mod webhook_verifier;

pub use errors::BillingError;
pub use interpret::{
    coalesce_email, compose_idempotency_key, get_first_price_id, to_iso_from_unix_seconds,
};
pub use mode::StripeMode;
pub use plan::{plan_key, tier_from_amount, BillingPeriod};
pub use price_map::{
    classify_price_map, resolve_price_id, resolve_price_id_in_mode, resolve_tier_for_price,
    resolve_tier_for_price_in_mode, FlatPriceMap, PriceMap,
};
pub use return_url::{
    build_return_url, build_return_url_with_fallback, DEFAULT_RETURN_BASE, DEFAULT_RETURN_PATH,
};
pub use status::{is_subscribed, SubscriptionStatus};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use stripe_objects::{
    CustomerRef, StripeBillingPortalSession, StripeCheckoutSession, StripeCustomer,
    StripeCustomerDetails, StripeList, StripePrice, StripeSubscription, StripeSubscriptionItem,
    StripeSubscriptionItems,
};
pub use subscriber::{SubscriberRecord, SubscriptionSnapshot};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    verify_signature_against_candidates, SignatureHeader, StripeWebhookVerifier,
    VerifiedWebhook, WebhookSecretCandidate,
};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::{compute_test_signature, signed_test_header};
