use crate::domain::notification::Notification;
use crate::error::{ReconcileError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::BufRead;

/// One recorded gateway delivery.
///
/// `body` holds the raw JSON body exactly as delivered and takes precedence
/// over `fields`; signed stripe deliveries need it, since their signature
/// covers the original bytes. The signature age is still checked against the
/// current time, so a signed delivery only verifies within the tolerance
/// window after it was sent.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub gateway: String,
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl NotificationEnvelope {
    pub fn into_parts(self) -> Result<(String, Notification)> {
        let notification = match (self.body, self.fields) {
            (Some(body), _) => Notification::from_json_body(body.as_bytes())?,
            (None, Some(fields)) => Notification::from_fields(fields),
            (None, None) => {
                return Err(ReconcileError::MalformedNotification(format!(
                    "{} delivery has neither 'body' nor 'fields'",
                    self.gateway
                )));
            }
        };
        let notification = match self.signature {
            Some(signature) => notification.with_signature(signature),
            None => notification,
        };
        Ok((self.gateway, notification))
    }
}

/// Reads notifications stored as JSON lines. Blank lines are skipped.
pub struct NotificationReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> NotificationReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn notifications(self) -> impl Iterator<Item = Result<NotificationEnvelope>> {
        self.source
            .lines()
            .enumerate()
            .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|(index, line)| {
                let line = line?;
                serde_json::from_str(&line).map_err(|e| {
                    ReconcileError::MalformedNotification(format!("line {}: {}", index + 1, e))
                })
            })
    }
}
