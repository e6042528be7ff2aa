use crate::domain::acquirer::AcquirerConfig;
use crate::domain::ports::{AcquirerConfigProvider, TransactionStore};
use crate::domain::transaction::{Transaction, TransactionState};
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for transactions, keyed by reference.
///
/// Uses `Arc<RwLock<HashMap<String, Transaction>>>` for shared concurrent access.
/// The conditional update runs entirely under the write lock.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.reference.clone(), tx);
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(reference).cloned())
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&tx.reference) {
            Some(slot) => {
                *slot = tx;
                Ok(())
            }
            None => Err(ReconcileError::UnknownReference(tx.reference)),
        }
    }

    async fn update_if_state(&self, tx: Transaction, expected: TransactionState) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&tx.reference) {
            Some(slot) if slot.state == expected => {
                *slot = tx;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ReconcileError::UnknownReference(tx.reference)),
        }
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut all: Vec<Transaction> = transactions.values().cloned().collect();
        all.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(all)
    }
}

/// Acquirer configuration held in memory, keyed by gateway name.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigProvider {
    configs: HashMap<String, AcquirerConfig>,
}

impl StaticConfigProvider {
    pub fn new(configs: impl IntoIterator<Item = AcquirerConfig>) -> Self {
        Self {
            configs: configs
                .into_iter()
                .map(|config| (config.name.clone(), config))
                .collect(),
        }
    }
}

impl AcquirerConfigProvider for StaticConfigProvider {
    fn get_config(&self, gateway: &str) -> Result<AcquirerConfig> {
        self.configs.get(gateway).cloned().ok_or_else(|| {
            ReconcileError::Config(format!("no configuration for acquirer '{}'", gateway))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use rust_decimal_macros::dec;

    fn tx(reference: &str) -> Transaction {
        Transaction::new(reference, "authorize", Amount::new(dec!(320.0)).unwrap(), "USD")
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store() {
        let store = InMemoryTransactionStore::new();
        store.insert(tx("SO004")).await.unwrap();

        let retrieved = store.find_by_reference("SO004").await.unwrap().unwrap();
        assert_eq!(retrieved, tx("SO004"));
        assert!(store.find_by_reference("SO005").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_reference() {
        let store = InMemoryTransactionStore::new();
        assert!(matches!(
            store.update(tx("SO004")).await,
            Err(ReconcileError::UnknownReference(_))
        ));
    }

    #[tokio::test]
    async fn test_update_if_state_is_conditional() {
        let store = InMemoryTransactionStore::new();
        store.insert(tx("SO004")).await.unwrap();

        let mut done = tx("SO004");
        done.state = TransactionState::Done;
        assert!(store
            .update_if_state(done.clone(), TransactionState::Draft)
            .await
            .unwrap());

        let mut error = tx("SO004");
        error.state = TransactionState::Error;
        assert!(!store
            .update_if_state(error, TransactionState::Draft)
            .await
            .unwrap());

        let current = store.find_by_reference("SO004").await.unwrap().unwrap();
        assert_eq!(current.state, TransactionState::Done);
    }

    #[tokio::test]
    async fn test_all_is_sorted_by_reference() {
        let store = InMemoryTransactionStore::new();
        store.insert(tx("SO005")).await.unwrap();
        store.insert(tx("SO004")).await.unwrap();

        let all = store.all().await.unwrap();
        let references: Vec<&str> = all.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(references, ["SO004", "SO005"]);
    }

    #[test]
    fn test_static_config_provider() {
        let provider = StaticConfigProvider::new([AcquirerConfig::new("authorize", "login", "key")]);
        assert_eq!(provider.get_config("authorize").unwrap().login, "login");
        assert!(matches!(
            provider.get_config("stripe"),
            Err(ReconcileError::Config(_))
        ));
    }
}
