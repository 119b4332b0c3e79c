//! WebhookEventRepository port - Interface for tracking processed Stripe webhooks.
//!
//! Stripe may deliver the same webhook more than once (timeouts, 5xx
//! responses, lost acknowledgements). Deliveries are keyed by the idempotency
//! key `"{event_type}:{event_id}"`; a key that was already recorded is
//! acknowledged without side effects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// `"{event_type}:{event_id}"`.
    pub idempotency_key: String,

    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type of Stripe event (e.g., "checkout.session.completed").
    pub event_type: String,

    pub livemode: bool,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    /// Result of processing: "success" or "ignored".
    pub result: String,

    /// Reason an event was ignored.
    pub note: Option<String>,
}

impl WebhookEventRecord {
    /// Creates a new success record.
    pub fn success(
        idempotency_key: impl Into<String>,
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        livemode: bool,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            event_id: event_id.into(),
            event_type: event_type.into(),
            livemode,
            processed_at: Utc::now(),
            result: "success".to_string(),
            note: None,
        }
    }

    /// Creates a new ignored record.
    pub fn ignored(
        idempotency_key: impl Into<String>,
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        livemode: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            result: "ignored".to_string(),
            note: Some(reason.into()),
            ..Self::success(idempotency_key, event_id, event_type, livemode)
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations should use a PRIMARY KEY on the idempotency key so
/// concurrent deliveries of one event cannot both insert.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously processed event by its idempotency key.
    async fn find_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempt to save a webhook event record (`ON CONFLICT DO NOTHING`).
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records processed before `timestamp`; returns the number deleted.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}
