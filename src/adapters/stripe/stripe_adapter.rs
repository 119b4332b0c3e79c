//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API using
//! form-encoded requests and HTTP basic auth with the secret key.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::billing::{
    StripeBillingPortalSession, StripeCheckoutSession, StripeCustomer, StripeList,
    StripeSubscription,
};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PaymentProviderFactory, PortalSession,
};

/// Default Stripe API host.
pub const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com";

/// Pinned API version; `current_period_end` lives on the subscription here.
pub const STRIPE_API_VERSION: &str = "2023-10-16";

const STRIPE_VERSION_HEADER: &str = "Stripe-Version";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_..., sk_test_..., rk_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_secret(SecretString::new(api_key.into()))
    }

    /// Create a configuration from an already-wrapped key.
    pub fn from_secret(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_STRIPE_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

/// Stripe payment provider adapter.
///
/// Implements `PaymentProvider` for Stripe API integration.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

/// Error envelope returned by Stripe on non-2xx responses.
#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create an adapter sharing an existing connection pool.
    pub fn with_client(config: StripeConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header(STRIPE_VERSION_HEADER, STRIPE_API_VERSION)
    }

    /// Sends a request and decodes the JSON body, mapping failures to `PaymentError`.
    ///
    /// Returns `Ok(None)` for 404 when `allow_not_found` is set.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
        allow_not_found: bool,
    ) -> Result<Option<T>, PaymentError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "Stripe request failed");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();

        if allow_not_found && status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                operation,
                status = status.as_u16(),
                error = %error_text,
                "Stripe API error"
            );
            return Err(map_error_response(status.as_u16(), &error_text));
        }

        let body = response.json::<T>().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(Some(body))
    }

    async fn execute_required<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PaymentError> {
        self.execute(operation, request, false)
            .await?
            .ok_or_else(|| PaymentError::not_found(operation))
    }
}

/// Maps a Stripe error response to a `PaymentError`.
fn map_error_response(status: u16, body: &str) -> PaymentError {
    let code = PaymentErrorCode::from_http_status(status);

    match serde_json::from_str::<StripeErrorResponse>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let error = PaymentError::new(code, message);
            match parsed.error.code {
                Some(provider_code) => error.with_provider_code(provider_code),
                None => error,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}

/// Form parameters for `POST /v1/checkout/sessions`.
fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("client_reference_id", request.client_reference_id.clone()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ];

    // Stripe rejects sessions carrying both.
    if let Some(customer_id) = &request.customer_id {
        params.push(("customer", customer_id.clone()));
    } else if let Some(email) = &request.customer_email {
        params.push(("customer_email", email.clone()));
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StripeCustomer>, PaymentError> {
        let request = self
            .http_client
            .get(self.url("/v1/customers"))
            .query(&[("email", email), ("limit", "1")]);

        let list: StripeList<StripeCustomer> =
            self.execute_required("list_customers", request).await?;

        Ok(list.data.into_iter().next())
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<StripeCustomer>, PaymentError> {
        let request = self
            .http_client
            .get(self.url(&format!("/v1/customers/{}", customer_id)));

        self.execute("retrieve_customer", request, true).await
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u8,
    ) -> Result<Vec<StripeSubscription>, PaymentError> {
        let request = self.http_client.get(self.url("/v1/subscriptions")).query(&[
            ("customer", customer_id.to_string()),
            ("status", "all".to_string()),
            ("limit", limit.to_string()),
        ]);

        let list: StripeList<StripeSubscription> =
            self.execute_required("list_subscriptions", request).await?;

        Ok(list.data)
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = checkout_params(&request);
        let http_request = self
            .http_client
            .post(self.url("/v1/checkout/sessions"))
            .form(&params);

        let session: StripeCheckoutSession = self
            .execute_required("create_checkout_session", http_request)
            .await?;

        let url = session.url.ok_or_else(|| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                "Stripe checkout session has no URL",
            )
        })?;

        tracing::info!(session_id = %session.id, price_id = %request.price_id, "Checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let request = self
            .http_client
            .post(self.url("/v1/billing_portal/sessions"))
            .form(&[("customer", customer_id), ("return_url", return_url)]);

        let portal: StripeBillingPortalSession = self
            .execute_required("create_portal_session", request)
            .await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }
}

/// Builds `StripePaymentAdapter`s for keys chosen at request time.
///
/// All adapters share one `reqwest::Client` connection pool.
#[derive(Clone)]
pub struct StripeClientFactory {
    api_base_url: String,
    http_client: reqwest::Client,
}

impl StripeClientFactory {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for StripeClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPE_API_BASE_URL)
    }
}

impl PaymentProviderFactory for StripeClientFactory {
    fn for_api_key(&self, api_key: &SecretString) -> Arc<dyn PaymentProvider> {
        let config = StripeConfig::from_secret(api_key.clone()).with_base_url(&self.api_base_url);
        Arc::new(StripePaymentAdapter::with_client(
            config,
            self.http_client.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout_request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            price_id: "price_basic_m".to_string(),
            customer_id: None,
            customer_email: Some("user@example.com".to_string()),
            client_reference_id: "0b3c1f0e-2d7a-4a57-9d0f-5f5b8f3b8e11".to_string(),
            success_url: "https://app.example.com/dashboard?success=true".to_string(),
            cancel_url: "https://app.example.com/dashboard?canceled=true".to_string(),
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = StripeConfig::new("sk_test_key");
        assert_eq!(config.api_base_url(), "https://api.stripe.com");
        assert_eq!(config.api_key.expose_secret(), "sk_test_key");
    }

    #[test]
    fn config_with_base_url_strips_trailing_slash() {
        let config = StripeConfig::new("sk_test_key").with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url(), "http://localhost:12111");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Request Building Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_params_use_email_without_customer() {
        let params = checkout_params(&checkout_request());

        assert_eq!(param(&params, "mode"), Some("subscription"));
        assert_eq!(param(&params, "line_items[0][price]"), Some("price_basic_m"));
        assert_eq!(param(&params, "line_items[0][quantity]"), Some("1"));
        assert_eq!(param(&params, "customer_email"), Some("user@example.com"));
        assert_eq!(param(&params, "customer"), None);
        assert_eq!(
            param(&params, "client_reference_id"),
            Some("0b3c1f0e-2d7a-4a57-9d0f-5f5b8f3b8e11")
        );
    }

    #[test]
    fn checkout_params_prefer_existing_customer() {
        let request = CreateCheckoutRequest {
            customer_id: Some("cus_123".to_string()),
            ..checkout_request()
        };
        let params = checkout_params(&request);

        assert_eq!(param(&params, "customer"), Some("cus_123"));
        assert_eq!(param(&params, "customer_email"), None);
    }

    #[test]
    fn requests_pin_api_version_and_authenticate() {
        let adapter = StripePaymentAdapter::new(StripeConfig::new("sk_test_key"));
        let request = adapter
            .authorize(adapter.http_client.get(adapter.url("/v1/customers")))
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get("stripe-version").unwrap(),
            STRIPE_API_VERSION
        );
        assert!(request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Basic "));
        assert_eq!(request.url().as_str(), "https://api.stripe.com/v1/customers");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn error_response_with_stripe_envelope() {
        let body = r#"{"error":{"code":"resource_missing","message":"No such price: 'price_x'","type":"invalid_request_error"}}"#;
        let err = map_error_response(400, body);

        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        assert_eq!(err.message, "No such price: 'price_x'");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
        assert!(!err.retryable);
    }

    #[test]
    fn error_response_with_unparseable_body() {
        let err = map_error_response(503, "upstream unavailable");

        assert_eq!(err.code, PaymentErrorCode::ProviderError);
        assert!(err.message.contains("upstream unavailable"));
        assert!(err.retryable);
    }

    #[test]
    fn error_response_auth_failure() {
        let body = r#"{"error":{"message":"Invalid API Key provided"}}"#;
        let err = map_error_response(401, body);

        assert_eq!(err.code, PaymentErrorCode::AuthenticationError);
        assert!(err.provider_code.is_none());
    }

    #[test]
    fn factory_builds_providers() {
        let factory = StripeClientFactory::new("http://localhost:12111");
        let _provider = factory.for_api_key(&SecretString::new("sk_test_key".to_string()));
    }
}
