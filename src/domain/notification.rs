//! Inbound gateway notifications.
//!
//! A [`Notification`] is the untrusted payload exactly as the gateway posted it.
//! Acquirer rules turn it into a [`Feedback`], a closed per-gateway record,
//! before any business logic looks at it.

use super::amount::Amount;
use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of a gateway answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Declined,
    Error,
}

/// Raw notification fields plus transport metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    fields: Map<String, Value>,
    body: Option<Vec<u8>>,
    signature: Option<String>,
}

impl Notification {
    /// Builds a notification from an already decoded JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Builds a notification from url-encoded form pairs.
    pub fn from_form<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self::from_fields(fields)
    }

    /// Decodes a raw JSON body, keeping the bytes for signature verification.
    pub fn from_json_body(body: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => Ok(Self {
                fields,
                body: Some(body.to_vec()),
                signature: None,
            }),
            _ => Err(ReconcileError::MalformedNotification(
                "body is not a JSON object".to_string(),
            )),
        }
    }

    /// Attaches the signature header delivered alongside the payload.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The bytes the gateway signed: the original body when known, otherwise
    /// the canonical JSON serialization of the fields.
    pub fn signed_payload(&self) -> Result<Vec<u8>> {
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Ok(serde_json::to_vec(&self.fields)?),
        }
    }

    /// A required string field. Numbers are accepted and rendered as text,
    /// since form posts and JSON callbacks disagree on typing.
    pub fn require_str(&self, key: &str) -> Result<String> {
        match self.fields.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Null) | None => Err(ReconcileError::MalformedNotification(format!(
                "missing field '{}'",
                key
            ))),
            Some(other) => Err(ReconcileError::MalformedNotification(format!(
                "field '{}' has unexpected type: {}",
                key, other
            ))),
        }
    }

    /// An optional string field; empty strings count as absent.
    pub fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.require_str(key) {
            Ok(s) if s.is_empty() => Ok(None),
            Ok(s) => Ok(Some(s)),
            Err(_) if matches!(self.fields.get(key), None | Some(Value::Null)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Authorize.Net relay response, after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizeFeedback {
    pub invoice_num: String,
    pub trans_id: String,
    pub response_code: String,
    pub response_reason_text: Option<String>,
    pub amount: Amount,
    pub fp_sequence: String,
    pub fp_timestamp: String,
    /// Amount exactly as posted, which is what the fingerprint covers.
    pub raw_amount: String,
    pub fp_hash: String,
}

/// Stripe charge object, after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct StripeFeedback {
    pub id: String,
    pub reference: String,
    pub status: String,
    pub error_message: Option<String>,
    pub has_error: bool,
    /// Amount in minor units, informational only.
    pub amount_minor: Option<i64>,
}

/// A notification that passed structural validation for one gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Authorize(AuthorizeFeedback),
    Stripe(StripeFeedback),
}

impl Feedback {
    pub fn reference(&self) -> &str {
        match self {
            Feedback::Authorize(f) => &f.invoice_num,
            Feedback::Stripe(f) => &f.reference,
        }
    }

    pub fn external_id(&self) -> &str {
        match self {
            Feedback::Authorize(f) => &f.trans_id,
            Feedback::Stripe(f) => &f.id,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Feedback::Authorize(f) => match f.response_code.as_str() {
                "1" => Outcome::Approved,
                "2" => Outcome::Declined,
                _ => Outcome::Error,
            },
            Feedback::Stripe(f) => {
                if f.has_error {
                    Outcome::Error
                } else {
                    match f.status.as_str() {
                        "succeeded" => Outcome::Approved,
                        "failed" => Outcome::Declined,
                        _ => Outcome::Error,
                    }
                }
            }
        }
    }

    /// Human readable reason, if the gateway supplied one.
    pub fn message(&self) -> Option<String> {
        match self {
            Feedback::Authorize(f) => f.response_reason_text.clone(),
            Feedback::Stripe(f) => f.error_message.clone(),
        }
    }

    /// Amount echoed back by the gateway in major units, when comparable.
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Feedback::Authorize(f) => Some(f.amount),
            Feedback::Stripe(_) => None,
        }
    }
}
