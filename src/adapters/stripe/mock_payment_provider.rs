//! Mock payment provider for testing.
//!
//! Provides a configurable in-memory implementation of `PaymentProvider`
//! (and of `PaymentProviderFactory`, handing out clones of itself) for unit
//! and integration tests. Supports:
//! - Pre-configured customers and subscriptions
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::billing::{StripeCustomer, StripeSubscription};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentProvider,
    PaymentProviderFactory, PortalSession,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_customer(StripeCustomer { id: "cus_123".into(), email: Some("a@b.c".into()), ..Default::default() });
/// mock.set_method_error("create_portal_session", PaymentError::network("down"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Customers by ID, in insertion order for email lookups.
    customers: Vec<StripeCustomer>,

    /// Subscriptions by customer ID.
    subscriptions: HashMap<String, Vec<StripeSubscription>>,

    /// Next checkout session to return.
    next_checkout: Option<CheckoutSession>,

    /// Next portal session to return.
    next_portal: Option<PortalSession>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// API keys requested through the factory.
    api_keys: Vec<String>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a customer to the "database".
    pub fn add_customer(&self, customer: StripeCustomer) {
        let mut state = self.inner.lock().unwrap();
        state.customers.retain(|c| c.id != customer.id);
        state.customers.push(customer);
    }

    /// Add a subscription for its customer.
    pub fn add_subscription(&self, subscription: StripeSubscription) {
        let customer_id = subscription.customer_id().unwrap_or_default().to_string();
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .entry(customer_id)
            .or_default()
            .push(subscription);
    }

    /// Set the checkout session to return.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.inner.lock().unwrap().next_checkout = Some(session);
    }

    /// Set the portal session to return.
    pub fn set_portal_session(&self, session: PortalSession) {
        self.inner.lock().unwrap().next_portal = Some(session);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Arguments of the last call to `method`.
    pub fn last_call(&self, method: &str) -> Option<MethodCall> {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .rev()
            .find(|c| c.method == method)
            .cloned()
    }

    /// API keys requested through `PaymentProviderFactory::for_api_key`.
    pub fn api_keys_used(&self) -> Vec<String> {
        self.inner.lock().unwrap().api_keys.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();

        // Check method-specific error first
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Check global error (consumes it)
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    fn short_id(prefix: &str) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_mock_{}", prefix, &uuid[..8])
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StripeCustomer>, PaymentError> {
        self.record_call("find_customer_by_email", vec![email.to_string()]);
        self.check_error("find_customer_by_email")?;

        let state = self.inner.lock().unwrap();
        Ok(state
            .customers
            .iter()
            .find(|c| !c.deleted && c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<StripeCustomer>, PaymentError> {
        self.record_call("retrieve_customer", vec![customer_id.to_string()]);
        self.check_error("retrieve_customer")?;

        let state = self.inner.lock().unwrap();
        Ok(state.customers.iter().find(|c| c.id == customer_id).cloned())
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u8,
    ) -> Result<Vec<StripeSubscription>, PaymentError> {
        self.record_call(
            "list_subscriptions",
            vec![customer_id.to_string(), limit.to_string()],
        );
        self.check_error("list_subscriptions")?;

        let state = self.inner.lock().unwrap();
        Ok(state
            .subscriptions
            .get(customer_id)
            .map(|subs| subs.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call(
            "create_checkout_session",
            vec![
                request.price_id.clone(),
                request.customer_id.clone().unwrap_or_default(),
                request.customer_email.clone().unwrap_or_default(),
                request.client_reference_id.clone(),
                request.success_url.clone(),
                request.cancel_url.clone(),
            ],
        );
        self.check_error("create_checkout_session")?;

        let mut state = self.inner.lock().unwrap();

        let session = state.next_checkout.take().unwrap_or_else(|| {
            let id = Self::short_id("cs");
            CheckoutSession {
                url: format!("https://checkout.stripe.com/c/pay/{}", id),
                id,
            }
        });

        Ok(session)
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        self.record_call(
            "create_portal_session",
            vec![customer_id.to_string(), return_url.to_string()],
        );
        self.check_error("create_portal_session")?;

        let mut state = self.inner.lock().unwrap();

        let session = state.next_portal.take().unwrap_or_else(|| {
            let id = Self::short_id("bps");
            PortalSession {
                url: format!("https://billing.stripe.com/p/session/{}", id),
                id,
            }
        });

        Ok(session)
    }
}

impl PaymentProviderFactory for MockPaymentProvider {
    fn for_api_key(&self, api_key: &SecretString) -> Arc<dyn PaymentProvider> {
        self.inner
            .lock()
            .unwrap()
            .api_keys
            .push(api_key.expose_secret().clone());
        Arc::new(self.clone())
    }
}
