//! Axum router configuration for billing endpoints.
//!
//! Paths mirror the edge-function names the web client already calls.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::post,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    check_subscription, create_checkout, customer_portal, stripe_webhook, BillingAppState,
};

/// Headers browsers may send on cross-origin billing requests.
pub const CORS_ALLOWED_HEADERS: [&str; 5] = [
    "authorization",
    "x-client-info",
    "apikey",
    "content-type",
    "stripe-signature",
];

/// Create the authenticated billing routes.
///
/// # Routes
/// - `POST /create-checkout` - Start a subscription checkout
/// - `GET|POST /check-subscription` - Refresh and return subscription state
/// - `POST /customer-portal` - Open the Stripe Billing Portal
pub fn billing_routes(validator: AuthState) -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout", post(create_checkout))
        .route(
            "/check-subscription",
            post(check_subscription).get(check_subscription),
        )
        .route("/customer-portal", post(customer_portal))
        .route_layer(middleware::from_fn_with_state(validator, auth_middleware))
}

/// Create the Stripe webhook router.
///
/// Separate from the billing routes because Stripe authenticates with a
/// signature, not a bearer token.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe-webhook", post(stripe_webhook))
}

/// Create the complete billing router, mounted at `/functions/v1`.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(validator, &[])
///     .with_state(app_state);
/// ```
pub fn billing_router(validator: AuthState, cors_origins: &[String]) -> Router<BillingAppState> {
    Router::new()
        .nest(
            "/functions/v1",
            billing_routes(validator).merge(webhook_routes()),
        )
        .layer(cors_layer(cors_origins))
}

/// CORS for the billing endpoints; no configured origins means any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let headers: Vec<HeaderName> = CORS_ALLOWED_HEADERS
        .into_iter()
        .map(HeaderName::from_static)
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(headers)
        .expose_headers([header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::memory::{InMemorySubscriberRepository, InMemoryWebhookEventRepository};
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::handlers::billing::BillingSettings;
    use crate::domain::billing::{StripeMode, WebhookSecretCandidate};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let provider = MockPaymentProvider::new();
        let state = BillingAppState {
            payment_provider: Arc::new(provider.clone()),
            payment_providers: Arc::new(provider),
            subscribers: Arc::new(InMemorySubscriberRepository::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
            webhook_candidates: Arc::new(vec![WebhookSecretCandidate::new(
                StripeMode::Test,
                Some(SecretString::new("whsec_test_secret".to_string())),
                Some(SecretString::new("sk_test_123".to_string())),
            )]),
            settings: Arc::new(BillingSettings::default()),
        };
        let validator: AuthState = Arc::new(MockSessionValidator::new());
        billing_router(validator, &[]).with_state(state)
    }

    #[tokio::test]
    async fn preflight_is_answered_with_allowed_headers() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/functions/v1/create-checkout")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(allowed.contains("stripe-signature"));
        assert!(allowed.contains("x-client-info"));
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn authenticated_routes_reject_anonymous_callers() {
        for uri in [
            "/functions/v1/create-checkout",
            "/functions/v1/check-subscription",
            "/functions/v1/customer-portal",
        ] {
            let request = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"planName":"Starter"}"#))
                .unwrap();

            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn webhook_route_needs_no_bearer_token() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/functions/v1/stripe-webhook")
            .body(Body::from("{}"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        // Reaches the handler, which fails on the missing signature header.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
