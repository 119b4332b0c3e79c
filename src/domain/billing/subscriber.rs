//! Subscriber records and subscription snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of the `subscribers` store, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub email: String,
    pub user_id: Option<Uuid>,
    pub stripe_customer_id: Option<String>,
    pub subscribed: bool,
    pub subscription_tier: Option<String>,
    /// End of the current period, ISO-8601 UTC.
    pub subscription_end: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriberRecord {
    /// A record for `email` with no subscription.
    pub fn unsubscribed(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_id: None,
            stripe_customer_id: None,
            subscribed: false,
            subscription_tier: None,
            subscription_end: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_customer(mut self, customer_id: Option<&str>) -> Self {
        self.stripe_customer_id = customer_id.map(str::to_string);
        self
    }

    pub fn with_subscription(
        mut self,
        subscribed: bool,
        tier: Option<String>,
        end: Option<String>,
    ) -> Self {
        self.subscribed = subscribed;
        self.subscription_tier = tier;
        self.subscription_end = end;
        self
    }

    /// The client-facing view of this record.
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            subscribed: self.subscribed,
            subscription_tier: self.subscription_tier.clone(),
            subscription_end: self.subscription_end.clone(),
        }
    }
}

/// Response body of check-subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub subscribed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_end: Option<String>,
}

impl SubscriptionSnapshot {
    pub fn unsubscribed() -> Self {
        Self::default()
    }
}
