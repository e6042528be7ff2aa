use crate::domain::transaction::Transaction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TransactionRow<'a> {
    reference: &'a str,
    acquirer: &'a str,
    amount: String,
    currency: &'a str,
    state: &'static str,
    acquirer_reference: &'a str,
    date_validate: String,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            reference: &tx.reference,
            acquirer: &tx.acquirer,
            amount: tx.amount.to_string(),
            currency: &tx.currency,
            state: tx.state.as_str(),
            acquirer_reference: tx.acquirer_reference.as_deref().unwrap_or(""),
            date_validate: tx
                .date_validate
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Writes the final transaction table as CSV.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transactions(&mut self, transactions: Vec<Transaction>) -> Result<()> {
        for tx in &transactions {
            self.writer.serialize(TransactionRow::from(tx))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
