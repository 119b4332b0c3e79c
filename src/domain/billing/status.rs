//! Stripe subscription status classification.
//!
//! Stripe's status is an open enumeration: new values may appear at any time.
//! Statuses are kept as strings and only classified; the lifecycle
//! (`incomplete → trialing → active ⇄ past_due → canceled`) is not enforced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A subscription status as reported by Stripe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionStatus(String);

impl SubscriptionStatus {
    pub const INCOMPLETE: &'static str = "incomplete";
    pub const INCOMPLETE_EXPIRED: &'static str = "incomplete_expired";
    pub const TRIALING: &'static str = "trialing";
    pub const ACTIVE: &'static str = "active";
    pub const PAST_DUE: &'static str = "past_due";
    pub const CANCELED: &'static str = "canceled";
    pub const UNPAID: &'static str = "unpaid";
    pub const PAUSED: &'static str = "paused";

    /// Statuses that grant a paid subscription.
    pub const ENTITLED: [&'static str; 2] = [Self::ACTIVE, Self::TRIALING];

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff the status is `active` or `trialing`.
    pub fn is_subscribed(&self) -> bool {
        is_subscribed(Some(&self.0))
    }

    /// True for statuses outside the documented set.
    pub fn is_unknown(&self) -> bool {
        !matches!(
            self.0.as_str(),
            Self::INCOMPLETE
                | Self::INCOMPLETE_EXPIRED
                | Self::TRIALING
                | Self::ACTIVE
                | Self::PAST_DUE
                | Self::CANCELED
                | Self::UNPAID
                | Self::PAUSED
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classifies a raw status string. Absent and unknown statuses are not
/// subscribed.
pub fn is_subscribed(status: Option<&str>) -> bool {
    status.is_some_and(|status| SubscriptionStatus::ENTITLED.contains(&status))
}
