//! Subscriber repository port.
//!
//! The `subscribers` store holds one row per email. Writes are upserts keyed
//! by email; the newest write for an email determines its subscription state.

use async_trait::async_trait;

use crate::domain::billing::SubscriberRecord;
use crate::domain::foundation::DomainError;

/// Repository port for subscriber records.
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Insert or update the record for `record.email`.
    ///
    /// Subscription fields are overwritten. `user_id` and
    /// `stripe_customer_id` keep their stored value when the incoming record
    /// has none.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn upsert(&self, record: &SubscriberRecord) -> Result<(), DomainError>;

    /// Find the record for an email.
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError>;
}
