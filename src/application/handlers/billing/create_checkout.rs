//! CreateCheckoutHandler - Command handler for starting a subscription checkout.

use std::sync::Arc;

use crate::domain::billing::{build_return_url_with_fallback, plan_key, BillingError, BillingPeriod};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{CreateCheckoutRequest, PaymentProvider};

use super::BillingSettings;

/// Command to create a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user: AuthenticatedUser,
    /// Plan name as shown in the UI (e.g. "Professional").
    pub plan_name: String,
    pub billing_period: Option<BillingPeriod>,
    /// `Origin` header of the request, used for redirect URLs.
    pub origin: Option<String>,
}

/// Result of successful checkout creation.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub session_id: String,
    /// Hosted checkout URL to redirect the browser to.
    pub url: String,
    pub price_id: String,
}

/// Handler for creating subscription checkout sessions.
pub struct CreateCheckoutHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    settings: Arc<BillingSettings>,
}

impl CreateCheckoutHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, settings: Arc<BillingSettings>) -> Self {
        Self {
            payment_provider,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, BillingError> {
        let email = cmd.user.email().ok_or(BillingError::EmailRequired)?;

        // 1. Resolve the price for the composite plan key
        let key = plan_key(cmd.plan_name.trim(), cmd.billing_period);
        let price_id = self
            .settings
            .price_map
            .price_for_plan(&key, self.settings.default_mode)
            .filter(|price| !price.is_empty())
            .ok_or_else(|| {
                tracing::warn!(plan_key = %key, "No price configured for plan");
                BillingError::unknown_plan(&key)
            })?
            .to_string();

        // 2. Reuse an existing customer when there is one
        let customer = self.payment_provider.find_customer_by_email(email).await?;
        let customer_id = customer.map(|c| c.id);

        // 3. Create the session
        let origin = cmd.origin.as_deref();
        let request = CreateCheckoutRequest {
            price_id: price_id.clone(),
            customer_email: customer_id.is_none().then(|| email.to_string()),
            customer_id,
            client_reference_id: cmd.user.id.to_string(),
            success_url: build_return_url_with_fallback(
                origin,
                &self.settings.checkout_success_path,
                &self.settings.return_url_fallback,
            ),
            cancel_url: build_return_url_with_fallback(
                origin,
                &self.settings.checkout_cancel_path,
                &self.settings.return_url_fallback,
            ),
        };

        let session = self.payment_provider.create_checkout_session(request).await?;

        tracing::info!(
            user_id = %cmd.user.id,
            plan_key = %key,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(CreateCheckoutResult {
            session_id: session.id,
            url: session.url,
            price_id,
        })
    }
}
