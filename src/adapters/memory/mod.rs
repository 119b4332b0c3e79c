//! In-memory repository adapters.
//!
//! Used by unit and integration tests, and by `main` when no database URL is
//! configured for local runs.

mod subscriber_repository;
mod webhook_event_repository;

pub use subscriber_repository::InMemorySubscriberRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
