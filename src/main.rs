use acquirer_feedback::application::reconciler::FeedbackReconciler;
use acquirer_feedback::config::Settings;
use acquirer_feedback::domain::ports::TransactionStoreBox;
use acquirer_feedback::infrastructure::in_memory::InMemoryTransactionStore;
use acquirer_feedback::interfaces::csv::transaction_reader::TransactionReader;
use acquirer_feedback::interfaces::csv::transaction_writer::TransactionWriter;
use acquirer_feedback::interfaces::json::notification_reader::NotificationReader;
use acquirer_feedback::telemetry;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway notifications, one JSON object per line
    notifications: PathBuf,

    /// Acquirer configuration file (JSON)
    #[arg(long)]
    acquirers: PathBuf,

    /// Transactions CSV file to load before replaying notifications
    #[arg(long)]
    transactions: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn open_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = acquirer_feedback::infrastructure::rocksdb::RocksDBStore::open(path)
                .into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Box::new(InMemoryTransactionStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let settings = Settings::load(&cli.acquirers).into_diagnostic()?;
    let store = open_store(cli.db_path)?;
    let reconciler = FeedbackReconciler::new(store, Box::new(settings.into_provider()));

    if let Some(path) = cli.transactions {
        let file = File::open(path).into_diagnostic()?;
        for tx_result in TransactionReader::new(file).transactions() {
            match tx_result {
                Ok(tx) => {
                    let store = reconciler.transactions();
                    if store
                        .find_by_reference(&tx.reference)
                        .await
                        .into_diagnostic()?
                        .is_some()
                    {
                        tracing::warn!(reference = %tx.reference, "transaction already stored, keeping stored state");
                        continue;
                    }
                    store.insert(tx).await.into_diagnostic()?;
                }
                Err(e) => tracing::error!("Error reading transaction: {}", e),
            }
        }
    }

    let file = File::open(cli.notifications).into_diagnostic()?;
    for envelope in NotificationReader::new(BufReader::new(file)).notifications() {
        let (gateway, notification) = match envelope.and_then(|e| e.into_parts()) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Error reading notification: {}", e);
                continue;
            }
        };
        if let Err(e) = reconciler.reconcile(&gateway, &notification).await {
            tracing::error!(
                gateway = %gateway,
                retry = e.is_retryable_by_gateway(),
                "Error processing notification: {}",
                e
            );
        }
    }

    let transactions = reconciler.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    writer.write_transactions(transactions).into_diagnostic()?;

    Ok(())
}
