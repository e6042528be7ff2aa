//! Authorize.Net relay-response rules.
//!
//! The gateway echoes the fingerprint fields of the payment form back in its
//! relay response. The fingerprint is an HMAC-MD5 keyed with the merchant
//! transaction key over `login^sequence^timestamp^amount^`.

use crate::domain::acquirer::AcquirerConfig;
use crate::domain::amount::Amount;
use crate::domain::notification::{AuthorizeFeedback, Feedback, Notification};
use crate::domain::ports::AcquirerRules;
use crate::error::{ReconcileError, Result};
use hmac::{Hmac, Mac};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

pub const NAME: &str = "authorize";

const SEPARATOR: char = '^';

pub const FIELD_REFERENCE: &str = "x_invoice_num";
pub const FIELD_TRANS_ID: &str = "x_trans_id";
pub const FIELD_RESPONSE_CODE: &str = "x_response_code";
pub const FIELD_REASON_TEXT: &str = "x_response_reason_text";
pub const FIELD_AMOUNT: &str = "x_amount";
pub const FIELD_SEQUENCE: &str = "x_fp_sequence";
pub const FIELD_TIMESTAMP: &str = "x_fp_timestamp";
pub const FIELD_HASH: &str = "x_fp_hash";

fn mac_for(key: &str, login: &str, sequence: &str, timestamp: &str, amount: &str) -> Result<HmacMd5> {
    let mut data = String::new();
    for part in [login, sequence, timestamp, amount] {
        data.push_str(part);
        data.push(SEPARATOR);
    }
    let mut mac = HmacMd5::new_from_slice(key.as_bytes())
        .map_err(|_| ReconcileError::Config("invalid authorize transaction key".to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac)
}

/// Computes the lowercase hex fingerprint for a set of form fields.
///
/// The same routine signs outgoing payment forms and checks relay responses.
pub fn fingerprint(
    login: &str,
    sequence: &str,
    timestamp: &str,
    amount: &str,
    transaction_key: &str,
) -> Result<String> {
    let mac = mac_for(transaction_key, login, sequence, timestamp, amount)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorizeRules;

impl AcquirerRules for AuthorizeRules {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parse(&self, notification: &Notification) -> Result<Feedback> {
        let raw_amount = notification.require_str(FIELD_AMOUNT)?;
        let amount = raw_amount.parse::<Amount>().map_err(|e| {
            ReconcileError::MalformedNotification(format!("{}: {}", FIELD_AMOUNT, e))
        })?;

        Ok(Feedback::Authorize(AuthorizeFeedback {
            invoice_num: notification.require_str(FIELD_REFERENCE)?,
            trans_id: notification.require_str(FIELD_TRANS_ID)?,
            response_code: notification.require_str(FIELD_RESPONSE_CODE)?,
            response_reason_text: notification.optional_str(FIELD_REASON_TEXT)?,
            amount,
            fp_sequence: notification.require_str(FIELD_SEQUENCE)?,
            fp_timestamp: notification.require_str(FIELD_TIMESTAMP)?,
            raw_amount,
            fp_hash: notification.require_str(FIELD_HASH)?,
        }))
    }

    fn validate_authenticity(
        &self,
        _notification: &Notification,
        feedback: &Feedback,
        config: &AcquirerConfig,
    ) -> Result<()> {
        let Feedback::Authorize(f) = feedback else {
            return Err(ReconcileError::Internal(
                "authorize rules received foreign feedback".into(),
            ));
        };

        // hex decoding accepts both cases, so the comparison is case-insensitive.
        let supplied = hex::decode(f.fp_hash.trim()).map_err(|_| {
            ReconcileError::Authenticity(format!("{} is not a hex digest", FIELD_HASH))
        })?;

        mac_for(
            &config.secret_key,
            &config.login,
            &f.fp_sequence,
            &f.fp_timestamp,
            &f.raw_amount,
        )?
        .verify_slice(&supplied)
        .map_err(|_| {
            ReconcileError::Authenticity(format!(
                "fingerprint mismatch for reference '{}'",
                f.invoice_num
            ))
        })
    }
}
