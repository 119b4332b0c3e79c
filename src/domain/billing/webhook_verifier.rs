//! Stripe webhook signature verification.
//!
//! Implements verification of the `Stripe-Signature` header using
//! HMAC-SHA256, with timestamp validation to prevent replay attacks, and
//! verification against an ordered list of candidate secrets (test and live
//! endpoints can deliver to the same URL).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::mode::StripeMode;
use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signatures (HMAC-SHA256). Stripe sends one per active secret
    /// while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
    /// Optional v0 legacy signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures: Vec<Vec<u8>> = Vec::new();
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value.trim()).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                "v0" => {
                    v0_signature = Some(hex::decode(value.trim()).map_err(|_| {
                        WebhookError::ParseError("invalid v0 signature hex".to_string())
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
            v0_signature,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from Stripe dashboard.
    secret: SecretString,
}

impl StripeWebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self::from_secret(SecretString::new(secret.into()))
    }

    pub fn from_secret(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within acceptable range
    /// 3. Compute expected signature using HMAC-SHA256
    /// 4. Compare against every v1 signature in constant time
    /// 5. Parse the JSON payload into a StripeEvent
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - Signature verification failed
    /// - `TimestampOutOfRange` - Event is older than 5 minutes
    /// - `InvalidTimestamp` - Event timestamp is in the future
    /// - `ParseError` - Failed to parse header or JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected_signature = self.compute_signature(header.timestamp, payload)?;

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected_signature, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now
            .checked_sub(timestamp)
            .ok_or(WebhookError::TimestampOutOfRange)?;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature of `"{timestamp}.{payload}"`.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

// ════════════════════════════════════════════════════════════════════════════════
// Candidate verification
// ════════════════════════════════════════════════════════════════════════════════

/// One configured webhook endpoint: its signing secret and the API key of
/// the same Stripe environment.
#[derive(Debug, Clone)]
pub struct WebhookSecretCandidate {
    pub label: StripeMode,
    pub secret: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

impl WebhookSecretCandidate {
    pub fn new(label: StripeMode, secret: Option<SecretString>, api_key: Option<SecretString>) -> Self {
        Self {
            label,
            secret,
            api_key,
        }
    }

    fn usable_secret(&self) -> Option<&SecretString> {
        self.secret
            .as_ref()
            .filter(|secret| !secret.expose_secret().is_empty())
    }

    fn usable_api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
    }
}

/// A delivery that passed verification.
#[derive(Debug, Clone)]
pub struct VerifiedWebhook {
    pub event: StripeEvent,
    /// Mode of the event (`livemode`).
    pub mode: StripeMode,
    /// Label of the candidate whose secret verified the signature.
    pub verified_with: StripeMode,
    /// API key for follow-up calls, chosen by the event's mode.
    pub api_key: SecretString,
}

/// Verifies a delivery against each candidate in order.
///
/// Candidates without a secret are skipped. The first candidate that
/// verifies wins; the API key is then taken from the candidate labelled with
/// the event's mode. When every candidate fails the last error is returned.
///
/// # Errors
///
/// - `NoSecretsConfigured` - no candidate carries a secret
/// - `MissingApiKey` - the event verified but its mode has no API key
/// - any verification error of the last candidate tried
pub fn verify_signature_against_candidates(
    payload: &[u8],
    signature_header: &str,
    candidates: &[WebhookSecretCandidate],
) -> Result<VerifiedWebhook, WebhookError> {
    let mut last_error: Option<WebhookError> = None;

    for candidate in candidates {
        let Some(secret) = candidate.usable_secret() else {
            continue;
        };

        match StripeWebhookVerifier::from_secret(secret.clone())
            .verify_and_parse(payload, signature_header)
        {
            Ok(event) => {
                let mode = event.mode();
                let api_key = candidates
                    .iter()
                    .filter(|c| c.label == mode)
                    .find_map(WebhookSecretCandidate::usable_api_key)
                    .cloned()
                    .ok_or(WebhookError::MissingApiKey(mode))?;

                return Ok(VerifiedWebhook {
                    event,
                    mode,
                    verified_with: candidate.label,
                    api_key,
                });
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or(WebhookError::NoSecretsConfigured))
}

/// Computes HMAC-SHA256 for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a valid `Stripe-Signature` header for `payload`, signed now.
#[cfg(test)]
pub fn signed_test_header(secret: &str, payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    format!(
        "t={},v1={}",
        timestamp,
        compute_test_signature(secret, timestamp, payload)
    )
}
