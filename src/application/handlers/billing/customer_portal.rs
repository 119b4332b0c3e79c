//! CustomerPortalHandler - Opens a Stripe Billing Portal session.

use std::sync::Arc;

use crate::domain::billing::{build_return_url_with_fallback, BillingError};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::PaymentProvider;

use super::BillingSettings;

/// Command to open the billing portal.
#[derive(Debug, Clone)]
pub struct CustomerPortalCommand {
    pub user: AuthenticatedUser,
    /// `Origin` header of the request.
    pub origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomerPortalResult {
    pub url: String,
}

/// Handler for customer-portal.
pub struct CustomerPortalHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    settings: Arc<BillingSettings>,
}

impl CustomerPortalHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, settings: Arc<BillingSettings>) -> Self {
        Self {
            payment_provider,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CustomerPortalCommand,
    ) -> Result<CustomerPortalResult, BillingError> {
        let email = cmd.user.email().ok_or(BillingError::EmailRequired)?;

        let customer = self
            .payment_provider
            .find_customer_by_email(email)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(email))?;

        let return_url = build_return_url_with_fallback(
            cmd.origin.as_deref(),
            &self.settings.portal_return_path,
            &self.settings.return_url_fallback,
        );

        let session = self
            .payment_provider
            .create_portal_session(&customer.id, &return_url)
            .await?;

        tracing::info!(
            user_id = %cmd.user.id,
            customer_id = %customer.id,
            "Billing portal session created"
        );

        Ok(CustomerPortalResult { url: session.url })
    }
}
