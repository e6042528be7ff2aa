use crate::acquirers::AcquirerRegistry;
use crate::domain::notification::{Notification, Outcome};
use crate::domain::ports::{ConfigProviderBox, TransactionStoreBox};
use crate::domain::transaction::{Transaction, TransactionState};
use crate::error::{ReconcileError, Result};
use chrono::Utc;
use serde::Serialize;

/// What a call to [`FeedbackReconciler::reconcile`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub reference: String,
    pub outcome: Outcome,
    /// State of the transaction after the call.
    pub state: TransactionState,
    pub acquirer_reference: Option<String>,
    /// `false` when the notification was a duplicate and nothing was written.
    pub applied: bool,
    pub warnings: Vec<String>,
}

/// Applies gateway notifications to stored transactions.
///
/// Holds no lock of its own; concurrent deliveries for one reference are
/// settled by the store's conditional update.
pub struct FeedbackReconciler {
    transactions: TransactionStoreBox,
    configs: ConfigProviderBox,
    registry: AcquirerRegistry,
}

impl FeedbackReconciler {
    /// Creates a reconciler with every built-in acquirer registered.
    pub fn new(transactions: TransactionStoreBox, configs: ConfigProviderBox) -> Self {
        Self::with_registry(transactions, configs, AcquirerRegistry::with_defaults())
    }

    pub fn with_registry(
        transactions: TransactionStoreBox,
        configs: ConfigProviderBox,
        registry: AcquirerRegistry,
    ) -> Self {
        Self {
            transactions,
            configs,
            registry,
        }
    }

    /// Validates `notification` against the rules of `gateway` and applies it.
    ///
    /// Declined payments are a normal result (`Outcome::Declined`/`Outcome::Error`
    /// with state `error`); only untrusted, malformed or unmatched notifications
    /// are returned as errors, and those never modify a transaction.
    pub async fn reconcile(&self, gateway: &str, notification: &Notification) -> Result<Reconciliation> {
        let rules = self.registry.get(gateway)?;
        let config = self.configs.get_config(gateway)?;

        let feedback = rules.parse(notification)?;
        rules.validate_authenticity(notification, &feedback, &config)?;

        let reference = rules.extract_reference(&feedback);
        let mut tx = self
            .transactions
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ReconcileError::UnknownReference(reference.to_string()))?;

        // Only the owning acquirer's rules may vouch for a transaction.
        if tx.acquirer != gateway {
            return Err(ReconcileError::AcquirerMismatch {
                reference: tx.reference,
                expected: tx.acquirer,
                received: gateway.to_string(),
            });
        }

        let outcome = rules.classify_outcome(&feedback);
        let mut warnings = Vec::new();

        if let Some(amount) = feedback.amount()
            && amount != tx.amount
        {
            warnings.push(format!(
                "amount mismatch: expected {}, gateway reported {}",
                tx.amount, amount
            ));
        }
        for warning in &warnings {
            tracing::warn!(reference = %tx.reference, gateway, "{}", warning);
        }

        if !tx.state.accepts_feedback() {
            tracing::info!(
                reference = %tx.reference,
                state = %tx.state,
                ?outcome,
                "duplicate notification ignored"
            );
            return Ok(Self::report(&tx, outcome, false, warnings));
        }

        let previous = tx.state;
        match outcome {
            Outcome::Approved => {
                tx.approve(rules.extract_external_id(&feedback), config.auto_confirm, Utc::now());
            }
            Outcome::Declined | Outcome::Error => tx.fail(feedback.message()),
        }

        if !self.transactions.update_if_state(tx.clone(), previous).await? {
            let current = self
                .transactions
                .find_by_reference(&tx.reference)
                .await?
                .ok_or_else(|| ReconcileError::UnknownReference(tx.reference.clone()))?;
            tracing::info!(
                reference = %current.reference,
                state = %current.state,
                "transaction changed concurrently, notification not applied"
            );
            return Ok(Self::report(&current, outcome, false, warnings));
        }

        tracing::info!(
            reference = %tx.reference,
            gateway,
            from = %previous,
            to = %tx.state,
            acquirer_reference = tx.acquirer_reference.as_deref().unwrap_or(""),
            "transaction reconciled"
        );
        Ok(Self::report(&tx, outcome, true, warnings))
    }

    /// Records a capture the caller performed against the gateway
    /// (`authorized` to `done`).
    pub async fn capture(&self, reference: &str) -> Result<Transaction> {
        self.transition(reference, |tx| tx.capture(Utc::now())).await
    }

    /// Records a void the caller performed against the gateway
    /// (`authorized` to `cancel`).
    pub async fn void(&self, reference: &str) -> Result<Transaction> {
        self.transition(reference, Transaction::void).await
    }

    /// Read access to the underlying store, for callers that reset or inspect records.
    pub fn transactions(&self) -> &TransactionStoreBox {
        &self.transactions
    }

    /// Consumes the reconciler and returns every stored transaction.
    pub async fn into_results(self) -> Result<Vec<Transaction>> {
        self.transactions.all().await
    }

    async fn transition<F>(&self, reference: &str, apply: F) -> Result<Transaction>
    where
        F: FnOnce(&mut Transaction) -> Result<()>,
    {
        let mut tx = self
            .transactions
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ReconcileError::UnknownReference(reference.to_string()))?;

        let previous = tx.state;
        apply(&mut tx)?;

        if !self.transactions.update_if_state(tx.clone(), previous).await? {
            return Err(ReconcileError::ConcurrentUpdate(reference.to_string()));
        }

        tracing::info!(reference, from = %previous, to = %tx.state, "transaction updated");
        Ok(tx)
    }

    fn report(tx: &Transaction, outcome: Outcome, applied: bool, warnings: Vec<String>) -> Reconciliation {
        Reconciliation {
            reference: tx.reference.clone(),
            outcome,
            state: tx.state,
            acquirer_reference: tx.acquirer_reference.clone(),
            applied,
            warnings,
        }
    }
}
