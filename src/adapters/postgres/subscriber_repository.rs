//! PostgreSQL implementation of SubscriberRepository.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::SubscriberRecord;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::SubscriberRepository;

/// PostgreSQL implementation of the SubscriberRepository port.
pub struct PostgresSubscriberRepository {
    pool: PgPool,
}

impl PostgresSubscriberRepository {
    /// Creates a new PostgresSubscriberRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscriber.
#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    email: String,
    user_id: Option<Uuid>,
    stripe_customer_id: Option<String>,
    subscribed: bool,
    subscription_tier: Option<String>,
    subscription_end: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl From<SubscriberRow> for SubscriberRecord {
    fn from(row: SubscriberRow) -> Self {
        SubscriberRecord {
            email: row.email,
            user_id: row.user_id,
            stripe_customer_id: row.stripe_customer_id,
            subscribed: row.subscribed,
            subscription_tier: row.subscription_tier,
            subscription_end: row
                .subscription_end
                .map(|end| end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            updated_at: row.updated_at,
        }
    }
}

/// Parses the ISO-8601 `subscription_end` of a record for binding.
fn parse_subscription_end(value: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::InvalidFormat,
                        format!("Invalid subscription_end '{}': {}", s, e),
                    )
                })
        })
        .transpose()
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    async fn upsert(&self, record: &SubscriberRecord) -> Result<(), DomainError> {
        let subscription_end = parse_subscription_end(record.subscription_end.as_deref())?;

        sqlx::query(
            r#"
            INSERT INTO subscribers (
                email, user_id, stripe_customer_id, subscribed,
                subscription_tier, subscription_end, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                user_id = COALESCE(EXCLUDED.user_id, subscribers.user_id),
                stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscribers.stripe_customer_id),
                subscribed = EXCLUDED.subscribed,
                subscription_tier = EXCLUDED.subscription_tier,
                subscription_end = EXCLUDED.subscription_end,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.email)
        .bind(record.user_id)
        .bind(&record.stripe_customer_id)
        .bind(record.subscribed)
        .bind(&record.subscription_tier)
        .bind(subscription_end)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert subscriber: {}", e)))?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT email, user_id, stripe_customer_id, subscribed,
                   subscription_tier, subscription_end, updated_at
            FROM subscribers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch subscriber: {}", e)))?;

        Ok(row.map(SubscriberRecord::from))
    }
}
