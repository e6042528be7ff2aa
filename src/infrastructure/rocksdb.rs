use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{Transaction, TransactionState};
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing transactions, keyed by reference.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent transaction store backed by RocksDB.
///
/// Values are JSON encoded `Transaction` records. Writes go through a
/// store-wide mutex so that `update_if_state` is a real compare-and-set.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, reference: &str) -> Result<Option<Transaction>> {
        let cf = self.cf()?;
        match self.db.get_cf(&cf, reference.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, tx: &Transaction) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(tx)?;
        self.db.put_cf(&cf, tx.reference.as_bytes(), value)?;
        Ok(())
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            ReconcileError::Internal(Box::new(std::io::Error::other(
                "Transactions column family not found",
            )))
        })
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(&tx)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        self.read(reference)
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(&tx.reference)?.is_none() {
            return Err(ReconcileError::UnknownReference(tx.reference));
        }
        self.write(&tx)
    }

    async fn update_if_state(&self, tx: Transaction, expected: TransactionState) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.read(&tx.reference)? {
            Some(current) if current.state == expected => {
                self.write(&tx)?;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ReconcileError::UnknownReference(tx.reference)),
        }
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let cf = self.cf()?;
        let mut transactions = Vec::new();
        // Keys are references, so iteration order is already sorted.
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            transactions.push(serde_json::from_slice(&value)?);
        }
        Ok(transactions)
    }
}
