//! HandleStripeWebhookHandler - Applies Stripe webhook deliveries to the subscriber store.
//!
//! 1. Verify the signature against the configured secrets (test, then live)
//! 2. Drop deliveries whose idempotency key was already processed
//! 3. Interpret the event and upsert the subscriber record
//! 4. Mark the key as processed

use std::sync::Arc;

use secrecy::SecretString;
use uuid::Uuid;

use crate::domain::billing::{
    coalesce_email, compose_idempotency_key, get_first_price_id, is_subscribed,
    to_iso_from_unix_seconds, verify_signature_against_candidates, BillingError, CustomerRef,
    StripeCheckoutSession, StripeEvent, StripeEventType, StripeSubscription, SubscriberRecord,
    VerifiedWebhook, WebhookError, WebhookSecretCandidate,
};
use crate::ports::{
    PaymentProviderFactory, SaveResult, SubscriberRepository, WebhookEventRecord,
    WebhookEventRepository,
};

use super::BillingSettings;

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: Option<String>,
}

/// Outcome of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleStripeWebhookResult {
    /// A subscriber record was written.
    SubscriberUpdated { email: String, subscribed: bool },
    /// The event carried no resolvable email.
    SkippedNoEmail,
    /// Event type billing does not react to.
    Ignored { event_type: String },
    /// Already processed.
    Duplicate,
}

/// Handler for Stripe webhook deliveries.
pub struct HandleStripeWebhookHandler {
    providers: Arc<dyn PaymentProviderFactory>,
    subscribers: Arc<dyn SubscriberRepository>,
    processed_events: Arc<dyn WebhookEventRepository>,
    candidates: Vec<WebhookSecretCandidate>,
    settings: Arc<BillingSettings>,
}

impl HandleStripeWebhookHandler {
    pub fn new(
        providers: Arc<dyn PaymentProviderFactory>,
        subscribers: Arc<dyn SubscriberRepository>,
        processed_events: Arc<dyn WebhookEventRepository>,
        candidates: Vec<WebhookSecretCandidate>,
        settings: Arc<BillingSettings>,
    ) -> Self {
        Self {
            providers,
            subscribers,
            processed_events,
            candidates,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<HandleStripeWebhookResult, BillingError> {
        // 1. Verify signature and pick the API key for follow-up calls
        let verified = verify_signature_against_candidates(
            &cmd.payload,
            cmd.signature.as_deref().unwrap_or_default(),
            &self.candidates,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Stripe webhook rejected");
            BillingError::from(e)
        })?;

        let event = &verified.event;
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            mode = %verified.mode,
            verified_with = %verified.verified_with,
            "Stripe webhook verified"
        );

        // 2. Idempotency
        let key = compose_idempotency_key(Some(&event.event_type), Some(&event.id));
        if let Some(key) = key.as_deref() {
            if self.processed_events.find_by_key(key).await?.is_some() {
                tracing::info!(idempotency_key = %key, "Duplicate Stripe webhook, skipping");
                return Ok(HandleStripeWebhookResult::Duplicate);
            }
        }

        // 3. Interpret
        let result = match event.parsed_type() {
            StripeEventType::CheckoutSessionCompleted => self.checkout_completed(event).await?,
            t if t.is_subscription_change() => self.subscription_changed(&verified).await?,
            _ => {
                tracing::info!(event_type = %event.event_type, "Unhandled Stripe event");
                HandleStripeWebhookResult::Ignored {
                    event_type: event.event_type.clone(),
                }
            }
        };

        // 4. Mark processed
        if let Some(key) = key {
            self.mark_processed(key, event, &result).await?;
        }

        Ok(result)
    }

    async fn checkout_completed(
        &self,
        event: &StripeEvent,
    ) -> Result<HandleStripeWebhookResult, BillingError> {
        let session: StripeCheckoutSession = deserialize(event)?;

        let email = coalesce_email(
            session.details_email(),
            session.customer_email.as_deref(),
            None,
        );
        let user_id = session
            .client_reference_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());

        let Some(email) = email.filter(|e| !e.is_empty()) else {
            tracing::warn!(session_id = %session.id, "Checkout session has no email, skipping");
            return Ok(HandleStripeWebhookResult::SkippedNoEmail);
        };

        // Tier is filled in by subscription events and check-subscription.
        let record = SubscriberRecord::unsubscribed(email)
            .with_user_id(user_id)
            .with_customer(session.customer_id())
            .with_subscription(true, None, None);

        self.upsert(record).await
    }

    async fn subscription_changed(
        &self,
        verified: &VerifiedWebhook,
    ) -> Result<HandleStripeWebhookResult, BillingError> {
        let subscription: StripeSubscription = deserialize(&verified.event)?;

        let customer_email = self
            .customer_email(subscription.customer.as_ref(), &verified.api_key)
            .await?;
        let email = coalesce_email(None, None, customer_email.as_deref());

        let Some(email) = email.filter(|e| !e.is_empty()) else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Subscription customer has no email, skipping"
            );
            return Ok(HandleStripeWebhookResult::SkippedNoEmail);
        };

        let subscribed = is_subscribed(subscription.status.as_deref());
        let end = to_iso_from_unix_seconds(subscription.current_period_end);
        let tier = get_first_price_id(Some(&subscription))
            .and_then(|price_id| {
                self.settings
                    .price_map
                    .tier_for_price(price_id, Some(verified.mode))
            })
            .map(str::to_string);

        let record = SubscriberRecord::unsubscribed(email)
            .with_customer(subscription.customer_id())
            .with_subscription(subscribed, tier, end);

        self.upsert(record).await
    }

    /// Email of the subscription's customer; deleted customers have none.
    async fn customer_email(
        &self,
        customer: Option<&CustomerRef>,
        api_key: &SecretString,
    ) -> Result<Option<String>, BillingError> {
        match customer {
            None => Ok(None),
            Some(CustomerRef::Expanded(customer)) if customer.email.is_some() || customer.deleted => {
                Ok(customer.live_email().map(str::to_string))
            }
            Some(reference) => {
                let provider = self.providers.for_api_key(api_key);
                let customer = provider.retrieve_customer(reference.id()).await?;
                Ok(customer.and_then(|c| c.live_email().map(str::to_string)))
            }
        }
    }

    async fn upsert(
        &self,
        record: SubscriberRecord,
    ) -> Result<HandleStripeWebhookResult, BillingError> {
        self.subscribers.upsert(&record).await?;

        tracing::info!(
            customer_id = ?record.stripe_customer_id,
            subscribed = record.subscribed,
            tier = ?record.subscription_tier,
            "Subscriber updated from webhook"
        );

        Ok(HandleStripeWebhookResult::SubscriberUpdated {
            email: record.email,
            subscribed: record.subscribed,
        })
    }

    async fn mark_processed(
        &self,
        key: String,
        event: &StripeEvent,
        result: &HandleStripeWebhookResult,
    ) -> Result<(), BillingError> {
        let record = match result {
            HandleStripeWebhookResult::SubscriberUpdated { .. } => {
                WebhookEventRecord::success(key, &event.id, &event.event_type, event.livemode)
            }
            HandleStripeWebhookResult::SkippedNoEmail => WebhookEventRecord::ignored(
                key,
                &event.id,
                &event.event_type,
                event.livemode,
                "no customer email",
            ),
            HandleStripeWebhookResult::Ignored { .. } => WebhookEventRecord::ignored(
                key,
                &event.id,
                &event.event_type,
                event.livemode,
                "unhandled event type",
            ),
            HandleStripeWebhookResult::Duplicate => return Ok(()),
        };

        if self.processed_events.save(record).await? == SaveResult::AlreadyExists {
            tracing::debug!(event_id = %event.id, "Webhook processed concurrently by another delivery");
        }

        Ok(())
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, BillingError> {
    event.deserialize_object().map_err(|e| {
        tracing::warn!(event_id = %event.id, error = %e, "Malformed Stripe event object");
        BillingError::from(WebhookError::ParseError(e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriberRepository, InMemoryWebhookEventRepository};
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{
        signed_test_header, PriceMap, StripeCustomer, StripeEventBuilder, StripeMode,
    };
    use crate::domain::foundation::ErrorCode;
    use serde_json::json;

    const TEST_SECRET: &str = "whsec_test_secret";
    const LIVE_SECRET: &str = "whsec_live_secret";
    const USER_ID: &str = "0b3c1f0e-2d7a-4a57-9d0f-5f5b8f3b8e11";

    struct Fixture {
        mock: MockPaymentProvider,
        subscribers: Arc<InMemorySubscriberRepository>,
        events: Arc<InMemoryWebhookEventRepository>,
        handler: HandleStripeWebhookHandler,
    }

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_string()))
    }

    fn candidates() -> Vec<WebhookSecretCandidate> {
        vec![
            WebhookSecretCandidate::new(StripeMode::Test, secret(TEST_SECRET), secret("sk_test_1")),
            WebhookSecretCandidate::new(StripeMode::Live, secret(LIVE_SECRET), secret("sk_live_1")),
        ]
    }

    fn fixture_with(candidates: Vec<WebhookSecretCandidate>) -> Fixture {
        let mock = MockPaymentProvider::new();
        let subscribers = Arc::new(InMemorySubscriberRepository::new());
        let events = Arc::new(InMemoryWebhookEventRepository::new());
        let settings = Arc::new(BillingSettings::new(
            PriceMap::parse(Some(
                r#"{"test":{"Basic":"price_b_test"},"live":{"Basic":"price_b_live","Premium":"price_p_live"}}"#,
            )),
            Some(StripeMode::Test),
        ));
        let handler = HandleStripeWebhookHandler::new(
            Arc::new(mock.clone()),
            subscribers.clone(),
            events.clone(),
            candidates,
            settings,
        );
        Fixture {
            mock,
            subscribers,
            events,
            handler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(candidates())
    }

    fn signed(payload: &str, secret: &str) -> HandleStripeWebhookCommand {
        HandleStripeWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: Some(signed_test_header(secret, payload)),
        }
    }

    fn checkout_payload(id: &str) -> String {
        StripeEventBuilder::new()
            .id(id)
            .event_type("checkout.session.completed")
            .object(json!({
                "id": "cs_test_1",
                "customer": "cus_1",
                "customer_email": "session@example.com",
                "customer_details": {"email": "details@example.com"},
                "client_reference_id": USER_ID,
                "mode": "subscription"
            }))
            .payload()
    }

    fn subscription_payload(event_type: &str, status: &str, price: &str, livemode: bool) -> String {
        StripeEventBuilder::new()
            .id("evt_sub_1")
            .event_type(event_type)
            .livemode(livemode)
            .object(json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": status,
                "current_period_end": 1_700_000_000i64,
                "items": {"data": [{"id": "si_1", "price": {"id": price, "unit_amount": 999}}]}
            }))
            .payload()
    }

    fn add_customer(mock: &MockPaymentProvider, deleted: bool) {
        mock.add_customer(StripeCustomer {
            id: "cus_1".to_string(),
            email: Some("customer@example.com".to_string()),
            deleted,
            ..Default::default()
        });
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_signature_is_rejected() {
        let f = fixture();
        let payload = checkout_payload("evt_1");

        let result = f.handler.handle(signed(&payload, "whsec_wrong")).await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
        assert_eq!(f.subscribers.upsert_count(), 0);
    }

    #[tokio::test]
    async fn missing_signature_header_is_rejected() {
        let f = fixture();
        let cmd = HandleStripeWebhookCommand {
            payload: checkout_payload("evt_1").into_bytes(),
            signature: None,
        };

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidSignature);
    }

    #[tokio::test]
    async fn no_configured_secrets_is_configuration_error() {
        let f = fixture_with(vec![WebhookSecretCandidate::new(StripeMode::Test, None, None)]);
        let payload = checkout_payload("evt_1");

        let err = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap_err();

        assert_eq!(err, BillingError::Webhook(WebhookError::NoSecretsConfigured));
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // checkout.session.completed
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_marks_subscribed() {
        let f = fixture();
        let payload = checkout_payload("evt_1");

        let result = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert_eq!(
            result,
            HandleStripeWebhookResult::SubscriberUpdated {
                email: "details@example.com".to_string(),
                subscribed: true,
            }
        );
        let stored = f
            .subscribers
            .find_by_email("details@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(stored.user_id, Uuid::parse_str(USER_ID).ok());
        assert!(stored.subscription_tier.is_none());
    }

    #[tokio::test]
    async fn checkout_completed_without_email_is_skipped() {
        let f = fixture();
        let payload = StripeEventBuilder::new()
            .id("evt_2")
            .event_type("checkout.session.completed")
            .object(json!({"id": "cs_test_2", "customer": "cus_1"}))
            .payload();

        let result = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert_eq!(result, HandleStripeWebhookResult::SkippedNoEmail);
        assert_eq!(f.subscribers.upsert_count(), 0);
        let marked = f
            .events
            .find_by_key("checkout.session.completed:evt_2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(marked.result, "ignored");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // customer.subscription.*
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn live_subscription_update_uses_live_key_and_live_prices() {
        let f = fixture();
        add_customer(&f.mock, false);
        let payload =
            subscription_payload("customer.subscription.updated", "active", "price_p_live", true);

        let result = f.handler.handle(signed(&payload, LIVE_SECRET)).await.unwrap();

        assert!(matches!(
            result,
            HandleStripeWebhookResult::SubscriberUpdated { subscribed: true, .. }
        ));
        assert_eq!(f.mock.api_keys_used(), vec!["sk_live_1".to_string()]);

        let stored = f
            .subscribers
            .find_by_email("customer@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.subscription_tier.as_deref(), Some("Premium"));
        assert_eq!(
            stored.subscription_end.as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
    }

    #[tokio::test]
    async fn canceled_subscription_marks_unsubscribed() {
        let f = fixture();
        add_customer(&f.mock, false);
        let payload =
            subscription_payload("customer.subscription.deleted", "canceled", "price_b_test", false);

        let result = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert!(matches!(
            result,
            HandleStripeWebhookResult::SubscriberUpdated { subscribed: false, .. }
        ));
        let stored = f
            .subscribers
            .find_by_email("customer@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.subscription_tier.as_deref(), Some("Basic"));
    }

    #[tokio::test]
    async fn deleted_customer_yields_no_email() {
        let f = fixture();
        add_customer(&f.mock, true);
        let payload =
            subscription_payload("customer.subscription.updated", "active", "price_b_test", false);

        let result = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert_eq!(result, HandleStripeWebhookResult::SkippedNoEmail);
        assert_eq!(f.subscribers.upsert_count(), 0);
    }

    #[tokio::test]
    async fn missing_api_key_for_event_mode_is_configuration_error() {
        let f = fixture_with(vec![
            WebhookSecretCandidate::new(StripeMode::Test, secret(TEST_SECRET), secret("sk_test_1")),
            WebhookSecretCandidate::new(StripeMode::Live, secret(LIVE_SECRET), None),
        ]);
        let payload =
            subscription_payload("customer.subscription.created", "active", "price_b_live", true);

        let err = f.handler.handle(signed(&payload, LIVE_SECRET)).await.unwrap_err();

        assert_eq!(
            err,
            BillingError::Webhook(WebhookError::MissingApiKey(StripeMode::Live))
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency and Other Events
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn duplicate_delivery_has_no_second_upsert() {
        let f = fixture();
        let payload = checkout_payload("evt_dup");

        f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();
        let second = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert_eq!(second, HandleStripeWebhookResult::Duplicate);
        assert_eq!(f.subscribers.upsert_count(), 1);
        assert_eq!(f.events.len().await, 1);
    }

    #[tokio::test]
    async fn unhandled_event_is_acknowledged() {
        let f = fixture();
        let payload = StripeEventBuilder::new()
            .id("evt_inv")
            .event_type("invoice.paid")
            .object(json!({"id": "in_1"}))
            .payload();

        let result = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap();

        assert_eq!(
            result,
            HandleStripeWebhookResult::Ignored {
                event_type: "invoice.paid".to_string()
            }
        );
        assert!(f.events.find_by_key("invoice.paid:evt_inv").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_upsert_leaves_event_unmarked_for_retry() {
        let f = fixture();
        f.subscribers.fail_writes(true);
        let payload = checkout_payload("evt_retry");

        let err = f.handler.handle(signed(&payload, TEST_SECRET)).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(f.events.is_empty().await);
    }
}
