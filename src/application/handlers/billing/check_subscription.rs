//! CheckSubscriptionHandler - Refreshes a user's subscription state from Stripe.
//!
//! Looks up the Stripe customer for the caller's email, reads their
//! subscriptions, writes the resulting record to the subscriber store and
//! returns the client-facing snapshot.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::billing::{
    get_first_price_id, tier_from_amount, to_iso_from_unix_seconds, BillingError,
    StripeSubscription, SubscriberRecord, SubscriptionSnapshot, SubscriptionStatus,
};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{PaymentProvider, SubscriberRepository};

use super::BillingSettings;

/// Number of subscriptions fetched per check.
const SUBSCRIPTION_LOOKUP_LIMIT: u8 = 10;

/// Command to refresh the caller's subscription state.
#[derive(Debug, Clone)]
pub struct CheckSubscriptionCommand {
    pub user: AuthenticatedUser,
}

/// Handler for check-subscription.
pub struct CheckSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    subscribers: Arc<dyn SubscriberRepository>,
    settings: Arc<BillingSettings>,
}

impl CheckSubscriptionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        subscribers: Arc<dyn SubscriberRepository>,
        settings: Arc<BillingSettings>,
    ) -> Self {
        Self {
            payment_provider,
            subscribers,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CheckSubscriptionCommand,
    ) -> Result<SubscriptionSnapshot, BillingError> {
        let email = cmd.user.email().ok_or(BillingError::EmailRequired)?;
        let user_id = cmd.user.id.as_uuid();

        let Some(customer) = self.payment_provider.find_customer_by_email(email).await? else {
            tracing::info!(user_id = %cmd.user.id, "No Stripe customer, recording unsubscribed");
            let record = SubscriberRecord::unsubscribed(email).with_user_id(user_id);
            self.subscribers.upsert(&record).await?;
            return Ok(SubscriptionSnapshot::unsubscribed());
        };

        let subscriptions = self
            .payment_provider
            .list_subscriptions(&customer.id, SUBSCRIPTION_LOOKUP_LIMIT)
            .await?;

        let entitled = subscriptions.iter().find(|sub| {
            sub.status
                .as_deref()
                .map(|status| SubscriptionStatus::new(status).is_subscribed())
                .unwrap_or(false)
        });

        let record = self.build_record(email, user_id, &customer.id, entitled);
        self.subscribers.upsert(&record).await?;

        tracing::info!(
            user_id = %cmd.user.id,
            customer_id = %customer.id,
            subscribed = record.subscribed,
            tier = ?record.subscription_tier,
            "Subscription state refreshed"
        );

        Ok(record.snapshot())
    }

    fn build_record(
        &self,
        email: &str,
        user_id: Option<Uuid>,
        customer_id: &str,
        subscription: Option<&StripeSubscription>,
    ) -> SubscriberRecord {
        let record = SubscriberRecord::unsubscribed(email)
            .with_user_id(user_id)
            .with_customer(Some(customer_id));

        let Some(subscription) = subscription else {
            return record;
        };

        let tier = self.resolve_tier(subscription);
        let end = to_iso_from_unix_seconds(subscription.current_period_end);
        let subscribed = SubscriptionStatus::new(subscription.status.clone().unwrap_or_default())
            .is_subscribed();

        record.with_subscription(subscribed, tier, end)
    }

    /// Tier from the price map, else from the price amount.
    fn resolve_tier(&self, subscription: &StripeSubscription) -> Option<String> {
        let from_map = get_first_price_id(Some(subscription)).and_then(|price_id| {
            self.settings
                .price_map
                .tier_for_price(price_id, self.settings.default_mode)
        });

        from_map
            .or_else(|| tier_from_amount(subscription.first_price()?.unit_amount))
            .map(str::to_string)
    }
}
