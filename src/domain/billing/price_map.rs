//! Price map classification and lookups.
//!
//! The price map is operator configuration (a JSON string) that ties plan keys
//! or tier names to Stripe price identifiers. Two shapes are accepted:
//!
//! - **Flat**: `{"Premium": "price_123", "Starter:annual": "price_456"}`
//! - **Nested**: `{"test": {...flat...}, "live": {...flat...}}`
//!
//! Anything else classifies as [`PriceMap::Invalid`] and every lookup against
//! it yields `None`. Classification happens once; the resolvers below only
//! match on the resulting tag.

use serde_json::{Map, Value};

use super::mode::StripeMode;

/// Ordered mapping of plan key / tier name to price identifier.
///
/// Entries keep configuration order, so reverse lookups resolve to the
/// first matching entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatPriceMap {
    entries: Vec<(String, String)>,
}

impl FlatPriceMap {
    /// Builds a flat map from a JSON object whose values are all strings.
    ///
    /// Returns `None` if any value is not a string.
    fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            entries.push((key.clone(), value.as_str()?.to_string()));
        }
        Some(Self { entries })
    }

    /// Exact-key lookup of a price identifier.
    pub fn price_for(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, price)| price.as_str())
    }

    /// Reverse lookup: the first key whose price equals `price_id`.
    pub fn tier_for(&self, price_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, price)| price == price_id)
            .map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Classified price map configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceMap {
    Flat(FlatPriceMap),
    Nested {
        test: FlatPriceMap,
        live: FlatPriceMap,
    },
    Invalid,
}

/// Classifies a raw JSON price map.
///
/// Detection order is Flat first (non-empty object, every value a string),
/// then Nested (`test` and `live` both objects of string values; other keys
/// are ignored). Unparseable input and every other shape are `Invalid`.
pub fn classify_price_map(json: &str) -> PriceMap {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => PriceMap::from_value(&value),
        Err(_) => PriceMap::Invalid,
    }
}

impl PriceMap {
    /// Classifies optional configuration; absent configuration is `Invalid`.
    pub fn parse(json: Option<&str>) -> Self {
        json.map(classify_price_map).unwrap_or(PriceMap::Invalid)
    }

    /// Classifies an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return PriceMap::Invalid;
        };

        if !object.is_empty() {
            if let Some(flat) = FlatPriceMap::from_object(object) {
                return PriceMap::Flat(flat);
            }
        }

        let sub_map = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_object)
                .and_then(FlatPriceMap::from_object)
        };

        match (sub_map("test"), sub_map("live")) {
            (Some(test), Some(live)) => PriceMap::Nested { test, live },
            _ => PriceMap::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, PriceMap::Invalid)
    }

    /// Returns the flat map that applies to `mode`.
    ///
    /// A flat map applies to every mode. A nested map needs an explicit mode.
    pub fn for_mode(&self, mode: Option<StripeMode>) -> Option<&FlatPriceMap> {
        match (self, mode) {
            (PriceMap::Flat(flat), _) => Some(flat),
            (PriceMap::Nested { test, .. }, Some(StripeMode::Test)) => Some(test),
            (PriceMap::Nested { live, .. }, Some(StripeMode::Live)) => Some(live),
            (PriceMap::Nested { .. }, None) | (PriceMap::Invalid, _) => None,
        }
    }

    /// Forward lookup of a plan key.
    pub fn price_for_plan(&self, plan_key: &str, mode: Option<StripeMode>) -> Option<&str> {
        if plan_key.is_empty() {
            return None;
        }
        self.for_mode(mode)?.price_for(plan_key)
    }

    /// Reverse lookup of a price identifier.
    ///
    /// Without a mode a nested map is scanned `test` first, then `live`, so a
    /// price configured in both resolves to the test tier.
    pub fn tier_for_price(&self, price_id: &str, mode: Option<StripeMode>) -> Option<&str> {
        if price_id.is_empty() {
            return None;
        }
        match (self, mode) {
            (PriceMap::Nested { test, live }, None) => {
                test.tier_for(price_id).or_else(|| live.tier_for(price_id))
            }
            _ => self.for_mode(mode)?.tier_for(price_id),
        }
    }
}

/// Resolves the price identifier for a checkout plan.
///
/// The caller builds the composite key (`"Starter:annual"`); no suffix
/// parsing happens here.
pub fn resolve_price_id(plan_name: Option<&str>, price_map_json: Option<&str>) -> Option<String> {
    resolve_price_id_in_mode(plan_name, price_map_json, None)
}

/// Like [`resolve_price_id`], selecting the `test`/`live` sub-map of a nested
/// configuration by `mode`.
pub fn resolve_price_id_in_mode(
    plan_name: Option<&str>,
    price_map_json: Option<&str>,
    mode: Option<StripeMode>,
) -> Option<String> {
    let plan_name = plan_name?;
    PriceMap::parse(price_map_json)
        .price_for_plan(plan_name, mode)
        .map(str::to_string)
}

/// Resolves the tier name configured for a Stripe price identifier.
pub fn resolve_tier_for_price(
    price_id: Option<&str>,
    price_map_json: Option<&str>,
) -> Option<String> {
    resolve_tier_for_price_in_mode(price_id, price_map_json, None)
}

/// Like [`resolve_tier_for_price`], restricting a nested scan to one mode.
pub fn resolve_tier_for_price_in_mode(
    price_id: Option<&str>,
    price_map_json: Option<&str>,
    mode: Option<StripeMode>,
) -> Option<String> {
    let price_id = price_id?;
    PriceMap::parse(price_map_json)
        .tier_for_price(price_id, mode)
        .map(str::to_string)
}
