//! Stripe API objects, as far as billing reads them.
//!
//! Stripe payloads vary between API versions and expansion settings, so every
//! field that is not an identifier is optional and unknown fields are ignored.
//! Interpretation code treats each level as possibly absent.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Customer object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    pub email: Option<String>,

    pub name: Option<String>,

    /// Set on the stub Stripe returns for a deleted customer.
    #[serde(default)]
    pub deleted: bool,
}

impl StripeCustomer {
    /// Email of a live customer; deleted customers have none.
    pub fn live_email(&self) -> Option<&str> {
        if self.deleted {
            None
        } else {
            self.email.as_deref()
        }
    }
}

/// A customer reference that is either an id or an expanded object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CustomerRef {
    Id(String),
    Expanded(StripeCustomer),
}

impl CustomerRef {
    pub fn id(&self) -> &str {
        match self {
            CustomerRef::Id(id) => id,
            CustomerRef::Expanded(customer) => &customer.id,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Subscription object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    pub customer: Option<CustomerRef>,

    /// Raw status; see `SubscriptionStatus`.
    pub status: Option<String>,

    /// End of the current billing period (Unix seconds).
    pub current_period_end: Option<i64>,

    pub items: Option<StripeSubscriptionItems>,
}

impl StripeSubscription {
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(CustomerRef::id)
    }

    /// The first item's price, if every level is present.
    pub fn first_price(&self) -> Option<&StripePrice> {
        self.items.as_ref()?.data.as_ref()?.first()?.price.as_ref()
    }
}

/// List of subscription items.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeSubscriptionItems {
    pub data: Option<Vec<StripeSubscriptionItem>>,
}

/// A single item within a subscription.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    pub id: Option<String>,
    pub price: Option<StripePrice>,
}

/// Stripe Price object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripePrice {
    /// Unique price identifier (price_...).
    pub id: Option<String>,

    /// Price in the smallest currency unit (cents).
    pub unit_amount: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout and portal
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    pub customer: Option<CustomerRef>,

    /// Email passed in when the session was created.
    pub customer_email: Option<String>,

    /// Details collected during checkout.
    pub customer_details: Option<StripeCustomerDetails>,

    /// Our user id, set when the session was created.
    pub client_reference_id: Option<String>,

    /// Payment mode (payment, setup, subscription).
    pub mode: Option<String>,

    /// Hosted checkout URL (only while the session is open).
    pub url: Option<String>,
}

impl StripeCheckoutSession {
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(CustomerRef::id)
    }

    pub fn details_email(&self) -> Option<&str> {
        self.customer_details.as_ref()?.email.as_deref()
    }
}

/// Customer details collected by Checkout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Stripe Billing Portal session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StripeBillingPortalSession {
    pub id: String,
    pub url: String,
}

/// Stripe list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub has_more: bool,
}
