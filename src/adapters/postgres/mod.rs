//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresSubscriberRepository` - `subscribers` rows keyed by email
//! - `PostgresWebhookEventRepository` - Processed Stripe webhook keys

mod subscriber_repository;
mod webhook_event_repository;

pub use subscriber_repository::PostgresSubscriberRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
