use crate::domain::transaction::TransactionState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Authenticity error: {0}")]
    Authenticity(String),
    #[error("Unknown reference: no transaction found for '{0}'")]
    UnknownReference(String),
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),
    #[error("Unknown gateway: {0}")]
    UnknownGateway(String),
    #[error("Cannot {action} transaction '{reference}' in state {from}")]
    InvalidTransition {
        reference: String,
        from: TransactionState,
        action: &'static str,
    },
    #[error("Transaction '{reference}' belongs to acquirer '{expected}', notification came from '{received}'")]
    AcquirerMismatch {
        reference: String,
        expected: String,
        received: String,
    },
    #[error("Transaction '{0}' was modified concurrently")]
    ConcurrentUpdate(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ReconcileError {
    /// Whether the transport layer should answer the gateway with an error
    /// status, so that the gateway delivers the notification again later.
    ///
    /// Declined payments never reach this point: they are reported in-band.
    pub fn is_retryable_by_gateway(&self) -> bool {
        matches!(
            self,
            ReconcileError::Authenticity(_)
                | ReconcileError::UnknownReference(_)
                | ReconcileError::MalformedNotification(_)
                | ReconcileError::ConcurrentUpdate(_)
                | ReconcileError::Io(_)
                | ReconcileError::Internal(_)
        )
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ReconcileError {
    fn from(err: rocksdb::Error) -> Self {
        ReconcileError::Internal(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
