//! Plan keys and tier fallbacks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing period suffix of a composite plan key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Annual,
}

impl BillingPeriod {
    /// Parses `"monthly"` or `"annual"`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(BillingPeriod::Monthly),
            "annual" => Some(BillingPeriod::Annual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the key looked up in the price map: `"<plan>"` or `"<plan>:<period>"`.
pub fn plan_key(plan: &str, period: Option<BillingPeriod>) -> String {
    match period {
        Some(period) => format!("{}:{}", plan, period.as_str()),
        None => plan.to_string(),
    }
}

/// Tier names used when a price has no entry in the price map.
pub const TIER_BASIC: &str = "Basic";
pub const TIER_PREMIUM: &str = "Premium";
pub const TIER_ENTERPRISE: &str = "Enterprise";

/// Derives a tier from a price's unit amount (in cents).
///
/// Used by check-subscription when the price map has no entry for the
/// subscription's price.
pub fn tier_from_amount(unit_amount_cents: Option<i64>) -> Option<&'static str> {
    match unit_amount_cents? {
        amount if amount <= 0 => None,
        amount if amount < 1000 => Some(TIER_BASIC),
        amount if amount < 2000 => Some(TIER_PREMIUM),
        _ => Some(TIER_ENTERPRISE),
    }
}
