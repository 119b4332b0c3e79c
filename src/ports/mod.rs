//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the billing domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` / `PaymentProviderFactory` - Stripe API access
//! - `SubscriberRepository` - Subscriber records keyed by email
//! - `WebhookEventRepository` - Stripe webhook idempotency tracking
//! - `SessionValidator` - Bearer token validation

mod payment_provider;
mod session_validator;
mod subscriber_repository;
mod webhook_event_repository;

pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PaymentProviderFactory, PortalSession,
};
pub use session_validator::SessionValidator;
pub use subscriber_repository::SubscriberRepository;
pub use webhook_event_repository::{SaveResult, WebhookEventRecord, WebhookEventRepository};
