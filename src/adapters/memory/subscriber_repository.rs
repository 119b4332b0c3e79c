//! In-memory subscriber repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::SubscriberRecord;
use crate::domain::foundation::DomainError;
use crate::ports::SubscriberRepository;

/// Subscriber store backed by a `HashMap` keyed by email.
///
/// Applies the same merge rules as the Postgres adapter: `user_id` and
/// `stripe_customer_id` survive an upsert that carries `None`.
#[derive(Default)]
pub struct InMemorySubscriberRepository {
    records: RwLock<HashMap<String, SubscriberRecord>>,
    upserts: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemorySubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as an upsert.
    pub async fn insert(&self, record: SubscriberRecord) {
        self.records
            .write()
            .await
            .insert(record.email.clone(), record);
    }

    /// Snapshot of every stored record.
    pub async fn records(&self) -> Vec<SubscriberRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Number of `upsert` calls that reached the store.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscriberRepository {
    async fn upsert(&self, record: &SubscriberRecord) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("subscribers upsert failed"));
        }

        let mut records = self.records.write().await;
        let merged = match records.get(&record.email) {
            Some(existing) => SubscriberRecord {
                user_id: record.user_id.or(existing.user_id),
                stripe_customer_id: record
                    .stripe_customer_id
                    .clone()
                    .or_else(|| existing.stripe_customer_id.clone()),
                ..record.clone()
            },
            None => record.clone(),
        };
        records.insert(merged.email.clone(), merged);
        self.upserts.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError> {
        Ok(self.records.read().await.get(email).cloned())
    }
}
