//! In-memory webhook event repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Processed-webhook store keyed by idempotency key.
#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    events: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.events.read().await.get(idempotency_key).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut events = self.events.write().await;
        if events.contains_key(&record.idempotency_key) {
            return Ok(SaveResult::AlreadyExists);
        }
        events.insert(record.idempotency_key.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|_, record| record.processed_at >= timestamp);
        Ok((before - events.len()) as u64)
    }
}
