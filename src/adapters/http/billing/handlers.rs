//! HTTP handlers for the billing endpoints.
//!
//! These handlers connect Axum routes to the billing command handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::billing::{
    BillingSettings, CheckSubscriptionCommand, CheckSubscriptionHandler, CreateCheckoutCommand,
    CreateCheckoutHandler, CustomerPortalCommand, CustomerPortalHandler,
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
use crate::domain::billing::{BillingError, WebhookSecretCandidate};
use crate::domain::foundation::DomainError;
use crate::ports::{
    PaymentProvider, PaymentProviderFactory, SubscriberRepository, WebhookEventRepository,
};

use super::dto::{CreateCheckoutRequestDto, ErrorResponse, UrlResponse, WebhookAck};

/// Header carrying Stripe's webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct BillingAppState {
    /// Provider bound to the default API key (live when configured).
    pub payment_provider: Arc<dyn PaymentProvider>,
    /// Builds providers for the key a webhook delivery was verified with.
    pub payment_providers: Arc<dyn PaymentProviderFactory>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub webhook_candidates: Arc<Vec<WebhookSecretCandidate>>,
    pub settings: Arc<BillingSettings>,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.payment_provider.clone(), self.settings.clone())
    }

    pub fn check_subscription_handler(&self) -> CheckSubscriptionHandler {
        CheckSubscriptionHandler::new(
            self.payment_provider.clone(),
            self.subscribers.clone(),
            self.settings.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(
            self.payment_providers.clone(),
            self.subscribers.clone(),
            self.webhook_events.clone(),
            self.webhook_candidates.as_ref().clone(),
            self.settings.clone(),
        )
    }

    pub fn customer_portal_handler(&self) -> CustomerPortalHandler {
        CustomerPortalHandler::new(self.payment_provider.clone(), self.settings.clone())
    }
}

fn origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /functions/v1/create-checkout - Start a subscription checkout
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutRequestDto>,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CreateCheckoutCommand {
        billing_period: request.billing_period(),
        plan_name: request.plan_name,
        origin: origin(&headers),
        user,
    };

    let result = state.create_checkout_handler().handle(cmd).await?;

    Ok(Json(UrlResponse { url: result.url }))
}

/// GET|POST /functions/v1/check-subscription - Refresh subscription state
pub async fn check_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let snapshot = state
        .check_subscription_handler()
        .handle(CheckSubscriptionCommand { user })
        .await?;

    Ok(Json(snapshot))
}

/// POST /functions/v1/stripe-webhook - Apply a Stripe webhook delivery
pub async fn stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.webhook_handler().handle(cmd).await? {
        HandleStripeWebhookResult::Duplicate => {
            tracing::debug!("Duplicate webhook acknowledged");
        }
        HandleStripeWebhookResult::Ignored { event_type } => {
            tracing::debug!(event_type = %event_type, "Webhook event ignored");
        }
        HandleStripeWebhookResult::SkippedNoEmail
        | HandleStripeWebhookResult::SubscriberUpdated { .. } => {}
    }

    Ok(Json(WebhookAck::received()))
}

/// POST /functions/v1/customer-portal - Open the Stripe Billing Portal
pub async fn customer_portal(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = CustomerPortalCommand {
        user,
        origin: origin(&headers),
    };

    let result = state.customer_portal_handler().handle(cmd).await?;

    Ok(Json(UrlResponse { url: result.url }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(pub BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(BillingError::from(err))
    }
}

impl BillingApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillingError::UnknownPlan(_) | BillingError::EmailRequired => StatusCode::BAD_REQUEST,
            BillingError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Webhook(err) => err.status_code(),
            BillingError::PaymentFailed { .. } => StatusCode::BAD_GATEWAY,
            BillingError::Configuration(_) | BillingError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.0.code().to_string();

        let message = match &self.0 {
            BillingError::Infrastructure(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, code = %code, "Billing request failed");
        } else {
            tracing::warn!(error = %self.0, code = %code, "Billing request rejected");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
