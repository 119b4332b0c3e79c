//! Webhook event interpretation helpers.
//!
//! Small total functions that decide what a Stripe payload means for the
//! subscriber record. None of them fail: missing or malformed input maps to
//! `None` (or `false`).

use chrono::{DateTime, SecondsFormat, Utc};

use super::stripe_objects::StripeSubscription;

/// Latest instant representable as a four-digit year (9999-12-31T23:59:59Z).
const MAX_UNIX_SECONDS: i64 = 253_402_300_799;

/// Converts Unix seconds to an ISO-8601 UTC string with millisecond precision.
///
/// `1700000000` becomes `"2023-11-14T22:13:20.000Z"`. Absent, zero, negative
/// and out-of-range inputs yield `None`. The accepted range ends at
/// 9999-12-31T23:59:59Z so the output always has a four-digit year; later
/// instants are not converted.
pub fn to_iso_from_unix_seconds(seconds: Option<i64>) -> Option<String> {
    let seconds = seconds.filter(|s| *s > 0 && *s <= MAX_UNIX_SECONDS)?;
    let instant: DateTime<Utc> = DateTime::from_timestamp(seconds, 0)?;
    Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Returns `items.data[0].price.id`, tolerating absence at every level.
pub fn get_first_price_id(subscription: Option<&StripeSubscription>) -> Option<&str> {
    subscription?.first_price()?.id.as_deref()
}

/// Builds the webhook idempotency key `"{event_type}:{event_id}"`.
///
/// Defined only when both parts are present and non-empty.
pub fn compose_idempotency_key(event_type: Option<&str>, event_id: Option<&str>) -> Option<String> {
    let event_type = event_type.filter(|t| !t.is_empty())?;
    let event_id = event_id.filter(|id| !id.is_empty())?;
    Some(format!("{}:{}", event_type, event_id))
}

/// Picks the first present email, in strict left-to-right priority.
///
/// Presence is `Some`, whatever the content; callers decide what an empty
/// address means.
pub fn coalesce_email<'a>(
    customer_details_email: Option<&'a str>,
    session_email: Option<&'a str>,
    customer_object_email: Option<&'a str>,
) -> Option<&'a str> {
    customer_details_email
        .or(session_email)
        .or(customer_object_email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::stripe_objects::{
        StripePrice, StripeSubscriptionItem, StripeSubscriptionItems,
    };
    use proptest::prelude::*;

    fn subscription_with_items(items: Option<Vec<StripeSubscriptionItem>>) -> StripeSubscription {
        StripeSubscription {
            id: "sub_1".to_string(),
            items: Some(StripeSubscriptionItems { data: items }),
            ..Default::default()
        }
    }

    fn item_with_price(id: &str) -> StripeSubscriptionItem {
        StripeSubscriptionItem {
            id: Some("si_1".to_string()),
            price: Some(StripePrice {
                id: Some(id.to_string()),
                unit_amount: Some(1000),
            }),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Converter Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn to_iso_formats_with_millis_and_z() {
        assert_eq!(
            to_iso_from_unix_seconds(Some(1_700_000_000)),
            Some("2023-11-14T22:13:20.000Z".to_string())
        );
    }

    #[test]
    fn to_iso_rejects_absent_zero_and_negative() {
        assert_eq!(to_iso_from_unix_seconds(None), None);
        assert_eq!(to_iso_from_unix_seconds(Some(0)), None);
        assert_eq!(to_iso_from_unix_seconds(Some(-1)), None);
    }

    #[test]
    fn to_iso_rejects_unrepresentable_values() {
        assert_eq!(to_iso_from_unix_seconds(Some(i64::MAX)), None);
        assert_eq!(to_iso_from_unix_seconds(Some(MAX_UNIX_SECONDS + 1)), None);
        assert_eq!(
            to_iso_from_unix_seconds(Some(MAX_UNIX_SECONDS)),
            Some("9999-12-31T23:59:59.000Z".to_string())
        );
    }

    // ══════════════════════════════════════════════════════════════
    // First Price Extractor Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn first_price_id_of_absent_subscription_is_none() {
        assert_eq!(get_first_price_id(None), None);
    }

    #[test]
    fn first_price_id_handles_missing_levels() {
        let no_items = StripeSubscription::default();
        assert_eq!(get_first_price_id(Some(&no_items)), None);

        let no_data = subscription_with_items(None);
        assert_eq!(get_first_price_id(Some(&no_data)), None);

        let empty = subscription_with_items(Some(vec![]));
        assert_eq!(get_first_price_id(Some(&empty)), None);

        let no_price = subscription_with_items(Some(vec![StripeSubscriptionItem::default()]));
        assert_eq!(get_first_price_id(Some(&no_price)), None);
    }

    #[test]
    fn first_price_id_keeps_present_empty_id() {
        let sub = subscription_with_items(Some(vec![item_with_price("")]));
        assert_eq!(get_first_price_id(Some(&sub)), Some(""));
    }

    #[test]
    fn first_price_id_takes_first_item() {
        let sub = subscription_with_items(Some(vec![
            item_with_price("price_123"),
            item_with_price("price_456"),
        ]));
        assert_eq!(get_first_price_id(Some(&sub)), Some("price_123"));
    }

    #[test]
    fn first_price_id_from_raw_payload() {
        let sub: StripeSubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "items": {"data": [{"price": {"id": "price_123"}}]}
        }))
        .unwrap();
        assert_eq!(get_first_price_id(Some(&sub)), Some("price_123"));
    }

    // ══════════════════════════════════════════════════════════════
    // Idempotency Key Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn idempotency_key_requires_both_parts() {
        assert_eq!(compose_idempotency_key(None, Some("evt_1")), None);
        assert_eq!(compose_idempotency_key(Some("t"), None), None);
        assert_eq!(compose_idempotency_key(Some(""), Some("evt_1")), None);
        assert_eq!(compose_idempotency_key(Some("t"), Some("")), None);
    }

    #[test]
    fn idempotency_key_joins_with_colon() {
        assert_eq!(
            compose_idempotency_key(Some("t"), Some("evt_1")),
            Some("t:evt_1".to_string())
        );
        assert_eq!(
            compose_idempotency_key(Some("customer.subscription.updated"), Some("evt_9")),
            Some("customer.subscription.updated:evt_9".to_string())
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Email Coalescer Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn coalesce_email_priority_is_left_to_right() {
        assert_eq!(
            coalesce_email(Some("d@x.com"), Some("s@x.com"), Some("c@x.com")),
            Some("d@x.com")
        );
        assert_eq!(
            coalesce_email(None, Some("s@x.com"), Some("c@x.com")),
            Some("s@x.com")
        );
        assert_eq!(coalesce_email(None, None, Some("c@x.com")), Some("c@x.com"));
        assert_eq!(coalesce_email(None, None, None), None);
    }

    #[test]
    fn coalesce_email_keeps_present_empty_value() {
        assert_eq!(coalesce_email(Some(""), Some("s@x.com"), None), Some(""));
    }

    // ══════════════════════════════════════════════════════════════
    // Property Tests
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn to_iso_round_trips_whole_seconds(seconds in 1i64..=MAX_UNIX_SECONDS) {
            let iso = to_iso_from_unix_seconds(Some(seconds)).unwrap();
            let parsed = DateTime::parse_from_rfc3339(&iso).unwrap();
            prop_assert_eq!(parsed.timestamp_millis().div_euclid(1000), seconds);
            prop_assert!(iso.ends_with(".000Z"));
        }

        #[test]
        fn to_iso_is_none_for_non_positive(seconds in i64::MIN..=0) {
            prop_assert_eq!(to_iso_from_unix_seconds(Some(seconds)), None);
        }
    }
}
