//! Runtime billing settings shared by the handlers.

use crate::domain::billing::{PriceMap, StripeMode, DEFAULT_RETURN_BASE, DEFAULT_RETURN_PATH};

/// Path Checkout redirects to after payment.
pub const DEFAULT_CHECKOUT_SUCCESS_PATH: &str = "/dashboard?checkout=success";

/// Path Checkout redirects to when the customer backs out.
pub const DEFAULT_CHECKOUT_CANCEL_PATH: &str = "/dashboard?checkout=canceled";

/// Billing configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    /// Classified `STRIPE_PRICE_MAP`.
    pub price_map: PriceMap,

    /// Mode of the API key used for checkout, portal and subscription checks.
    pub default_mode: Option<StripeMode>,

    pub checkout_success_path: String,
    pub checkout_cancel_path: String,
    pub portal_return_path: String,

    /// Base URL used when the request has no usable `Origin`.
    pub return_url_fallback: String,
}

impl BillingSettings {
    pub fn new(price_map: PriceMap, default_mode: Option<StripeMode>) -> Self {
        Self {
            price_map,
            default_mode,
            ..Self::default()
        }
    }
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            price_map: PriceMap::Invalid,
            default_mode: None,
            checkout_success_path: DEFAULT_CHECKOUT_SUCCESS_PATH.to_string(),
            checkout_cancel_path: DEFAULT_CHECKOUT_CANCEL_PATH.to_string(),
            portal_return_path: DEFAULT_RETURN_PATH.to_string(),
            return_url_fallback: DEFAULT_RETURN_BASE.to_string(),
        }
    }
}
