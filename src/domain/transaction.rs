use super::acquirer::AutoConfirm;
use super::amount::Amount;
use crate::error::ReconcileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    #[default]
    Draft,
    Pending,
    Authorized,
    Done,
    Cancel,
    Error,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Draft => "draft",
            TransactionState::Pending => "pending",
            TransactionState::Authorized => "authorized",
            TransactionState::Done => "done",
            TransactionState::Cancel => "cancel",
            TransactionState::Error => "error",
        }
    }

    /// States a gateway notification is allowed to move out of.
    pub fn accepts_feedback(&self) -> bool {
        matches!(self, TransactionState::Draft | TransactionState::Pending)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment attempt as seen by the reconciler.
///
/// The record is owned by the transaction store; the reconciler only touches
/// `state`, `acquirer_reference`, `date_validate` and `state_message`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    /// Merchant correlation key. Immutable once created.
    pub reference: String,
    /// Gateway identifier selecting the rule set.
    pub acquirer: String,
    pub amount: Amount,
    pub currency: String,
    #[serde(default)]
    pub state: TransactionState,
    /// Transaction id assigned by the gateway, set on approval.
    #[serde(default)]
    pub acquirer_reference: Option<String>,
    #[serde(default)]
    pub date_validate: Option<DateTime<Utc>>,
    /// Reason text reported by the gateway on decline or error.
    #[serde(default)]
    pub state_message: Option<String>,
}

impl Transaction {
    pub fn new(
        reference: impl Into<String>,
        acquirer: impl Into<String>,
        amount: Amount,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            acquirer: acquirer.into(),
            amount,
            currency: currency.into(),
            state: TransactionState::Draft,
            acquirer_reference: None,
            date_validate: None,
            state_message: None,
        }
    }

    /// Records a successful authorization according to the acquirer policy.
    pub fn approve(
        &mut self,
        acquirer_reference: impl Into<String>,
        policy: AutoConfirm,
        now: DateTime<Utc>,
    ) {
        self.state = match policy {
            AutoConfirm::ConfirmSo => TransactionState::Done,
            AutoConfirm::Authorize => TransactionState::Authorized,
        };
        self.acquirer_reference = Some(acquirer_reference.into());
        self.date_validate = Some(now);
        self.state_message = None;
    }

    /// Records a declined or failed payment. The acquirer reference is left alone.
    pub fn fail(&mut self, message: Option<String>) {
        self.state = TransactionState::Error;
        self.state_message = message;
    }

    /// Records a capture performed against the gateway.
    pub fn capture(&mut self, now: DateTime<Utc>) -> Result<(), ReconcileError> {
        self.require_authorized("capture")?;
        self.state = TransactionState::Done;
        self.date_validate = Some(now);
        Ok(())
    }

    /// Records a void performed against the gateway.
    pub fn void(&mut self) -> Result<(), ReconcileError> {
        self.require_authorized("void")?;
        self.state = TransactionState::Cancel;
        Ok(())
    }

    /// Puts the transaction back to `draft` so that feedback can be applied again.
    pub fn reset_to_draft(&mut self) {
        self.state = TransactionState::Draft;
        self.acquirer_reference = None;
        self.date_validate = None;
        self.state_message = None;
    }

    fn require_authorized(&self, action: &'static str) -> Result<(), ReconcileError> {
        if self.state == TransactionState::Authorized {
            Ok(())
        } else {
            Err(ReconcileError::InvalidTransition {
                reference: self.reference.clone(),
                from: self.state,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> Transaction {
        Transaction::new("SO004", "authorize", Amount::new(dec!(320.0)).unwrap(), "USD")
    }

    #[test]
    fn test_transaction_deserialization_defaults_to_draft() {
        let csv = "reference, acquirer, amount, currency\nSO004, authorize, 320.0, USD";
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());
        let mut iter = reader.deserialize();

        let result: Transaction = iter
            .next()
            .unwrap()
            .expect("Failed to deserialize transaction");

        assert_eq!(result.reference, "SO004");
        assert_eq!(result.amount.value(), dec!(320.0));
        assert_eq!(result.state, TransactionState::Draft);
        assert!(result.acquirer_reference.is_none());
    }

    #[test]
    fn test_approve_follows_policy() {
        let now = Utc::now();

        let mut tx = draft();
        tx.approve("2217460311", AutoConfirm::ConfirmSo, now);
        assert_eq!(tx.state, TransactionState::Done);
        assert_eq!(tx.acquirer_reference.as_deref(), Some("2217460311"));
        assert_eq!(tx.date_validate, Some(now));

        let mut tx = draft();
        tx.approve("2217460311", AutoConfirm::Authorize, now);
        assert_eq!(tx.state, TransactionState::Authorized);
    }

    #[test]
    fn test_fail_keeps_acquirer_reference_unset() {
        let mut tx = draft();
        tx.fail(Some("The credit card has expired.".to_string()));
        assert_eq!(tx.state, TransactionState::Error);
        assert!(tx.acquirer_reference.is_none());
        assert!(tx.date_validate.is_none());
    }

    #[test]
    fn test_capture_and_void_require_authorized() {
        let mut tx = draft();
        assert!(matches!(
            tx.capture(Utc::now()),
            Err(ReconcileError::InvalidTransition { action: "capture", .. })
        ));
        assert!(matches!(
            tx.void(),
            Err(ReconcileError::InvalidTransition { action: "void", .. })
        ));

        tx.approve("ext", AutoConfirm::Authorize, Utc::now());
        tx.void().unwrap();
        assert_eq!(tx.state, TransactionState::Cancel);
    }

    #[test]
    fn test_reset_to_draft_clears_validation() {
        let mut tx = draft();
        tx.approve("ext", AutoConfirm::ConfirmSo, Utc::now());
        tx.reset_to_draft();

        assert_eq!(tx.state, TransactionState::Draft);
        assert!(tx.acquirer_reference.is_none());
        assert!(tx.date_validate.is_none());
        assert!(tx.state.accepts_feedback());
    }
}
