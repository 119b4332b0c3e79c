//! Payment provider environment (test vs live).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The Stripe environment an event, key or price belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeMode {
    Test,
    Live,
}

impl StripeMode {
    /// Maps an event's `livemode` flag to a mode.
    pub fn from_livemode(livemode: bool) -> Self {
        if livemode {
            StripeMode::Live
        } else {
            StripeMode::Test
        }
    }

    /// Infers the mode from a secret or restricted API key prefix.
    ///
    /// Returns `None` for keys that carry no recognizable prefix.
    pub fn from_api_key(key: &str) -> Option<Self> {
        if key.starts_with("sk_test_") || key.starts_with("rk_test_") {
            Some(StripeMode::Test)
        } else if key.starts_with("sk_live_") || key.starts_with("rk_live_") {
            Some(StripeMode::Live)
        } else {
            None
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StripeMode::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StripeMode::Test => "test",
            StripeMode::Live => "live",
        }
    }
}

impl fmt::Display for StripeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
