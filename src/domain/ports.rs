use super::acquirer::AcquirerConfig;
use super::notification::{Feedback, Notification, Outcome};
use super::transaction::{Transaction, TransactionState};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Adds a new transaction, replacing any record with the same reference.
    async fn insert(&self, tx: Transaction) -> Result<()>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>>;
    /// Unconditionally overwrites the stored record.
    async fn update(&self, tx: Transaction) -> Result<()>;
    /// Overwrites the stored record only if it is still in `expected` state.
    ///
    /// Returns `false` when another writer moved the transaction first.
    async fn update_if_state(&self, tx: Transaction, expected: TransactionState) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Transaction>>;
}

pub trait AcquirerConfigProvider: Send + Sync {
    fn get_config(&self, gateway: &str) -> Result<AcquirerConfig>;
}

/// Gateway specific rules for reading and trusting a notification.
pub trait AcquirerRules: Send + Sync {
    /// Registry key, matching `Transaction::acquirer`.
    fn name(&self) -> &'static str;

    /// Validating parse of the raw payload.
    fn parse(&self, notification: &Notification) -> Result<Feedback>;

    /// Fails with `ReconcileError::Authenticity` when the payload cannot be trusted.
    fn validate_authenticity(
        &self,
        notification: &Notification,
        feedback: &Feedback,
        config: &AcquirerConfig,
    ) -> Result<()>;

    fn classify_outcome(&self, feedback: &Feedback) -> Outcome {
        feedback.outcome()
    }

    fn extract_reference<'a>(&self, feedback: &'a Feedback) -> &'a str {
        feedback.reference()
    }

    fn extract_external_id<'a>(&self, feedback: &'a Feedback) -> &'a str {
        feedback.external_id()
    }
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type ConfigProviderBox = Box<dyn AcquirerConfigProvider>;
pub type AcquirerRulesBox = Box<dyn AcquirerRules>;
