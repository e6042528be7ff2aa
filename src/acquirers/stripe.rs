//! Stripe charge notification rules.
//!
//! Charges carry the merchant reference in `metadata.reference`. When a webhook
//! signing secret is configured, deliveries must carry a `t=<unix>,v1=<hex>`
//! signature over `"<t>.<body>"` (HMAC-SHA256).

use crate::domain::acquirer::{AcquirerConfig, Environment};
use crate::domain::notification::{Feedback, Notification, StripeFeedback};
use crate::domain::ports::AcquirerRules;
use crate::error::{ReconcileError, Result};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const NAME: &str = "stripe";

/// Maximum age of a signed delivery, in seconds.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;
/// Allowed clock skew for timestamps from the future, in seconds.
const FUTURE_SKEW_SECS: i64 = 60;

fn compute_signature(secret: &str, timestamp: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ReconcileError::Config("invalid stripe webhook secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds the signature header Stripe would send for `payload` at `timestamp`.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let ts = timestamp.to_string();
    Ok(format!("t={},v1={}", ts, compute_signature(secret, &ts, payload)?))
}

/// Checks a `t=...,v1=...` header against `payload` at time `now` (unix seconds).
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, now: i64) -> Result<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        if let Some(t) = part.trim().strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(s) = part.trim().strip_prefix("v1=") {
            candidates.push(s);
        }
    }

    let timestamp_str = timestamp
        .ok_or_else(|| ReconcileError::Authenticity("signature header has no timestamp".into()))?;
    if candidates.is_empty() {
        return Err(ReconcileError::Authenticity(
            "signature header has no v1 signature".into(),
        ));
    }

    let timestamp: i64 = timestamp_str
        .parse()
        .map_err(|_| ReconcileError::Authenticity("invalid timestamp in signature".into()))?;
    let age = now
        .checked_sub(timestamp)
        .ok_or_else(|| ReconcileError::Authenticity("signature timestamp out of range".into()))?;
    if age > TIMESTAMP_TOLERANCE_SECS {
        return Err(ReconcileError::Authenticity(format!(
            "signature timestamp too old (age={}s)",
            age
        )));
    }
    if age < -FUTURE_SKEW_SECS {
        return Err(ReconcileError::Authenticity(format!(
            "signature timestamp in the future (age={}s)",
            age
        )));
    }

    let expected = compute_signature(secret, timestamp_str, payload)?;
    let matched = candidates.iter().any(|candidate| {
        let provided = candidate.to_ascii_lowercase();
        provided.len() == expected.len()
            && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
    });

    if matched {
        Ok(())
    } else {
        Err(ReconcileError::Authenticity("signature mismatch".into()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StripeRules;

impl AcquirerRules for StripeRules {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parse(&self, notification: &Notification) -> Result<Feedback> {
        let reference = match notification.get("metadata") {
            Some(Value::Object(metadata)) => match metadata.get("reference") {
                Some(Value::String(r)) if !r.is_empty() => r.clone(),
                _ => {
                    return Err(ReconcileError::MalformedNotification(
                        "missing field 'metadata.reference'".to_string(),
                    ));
                }
            },
            _ => {
                return Err(ReconcileError::MalformedNotification(
                    "missing object 'metadata'".to_string(),
                ));
            }
        };

        let (has_error, error_message) = match notification.get("error") {
            None | Some(Value::Null) => (false, None),
            Some(Value::Object(error)) => (
                true,
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            ),
            Some(other) => (true, Some(other.to_string())),
        };

        let amount_minor = match notification.get("amount") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                ReconcileError::MalformedNotification(format!(
                    "field 'amount' is not an integer: {}",
                    value
                ))
            })?),
        };

        Ok(Feedback::Stripe(StripeFeedback {
            id: notification.require_str("id")?,
            reference,
            status: notification.require_str("status")?,
            error_message,
            has_error,
            amount_minor,
        }))
    }

    fn validate_authenticity(
        &self,
        notification: &Notification,
        _feedback: &Feedback,
        config: &AcquirerConfig,
    ) -> Result<()> {
        match (&config.webhook_secret, config.environment) {
            (Some(secret), _) => {
                let header = notification.signature().ok_or_else(|| {
                    ReconcileError::Authenticity("missing stripe signature".to_string())
                })?;
                let payload = notification.signed_payload()?;
                verify_signature(secret, &payload, header, chrono::Utc::now().timestamp())
            }
            (None, Environment::Test) => {
                tracing::warn!(
                    acquirer = NAME,
                    "accepting unsigned notification: no webhook secret configured (test environment)"
                );
                Ok(())
            }
            (None, Environment::Production) => Err(ReconcileError::Authenticity(
                "no webhook secret configured for stripe in production".to_string(),
            )),
        }
    }
}
