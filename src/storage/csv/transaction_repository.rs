//! CSV-backed transaction repository.
use anyhow::{Context, Result};
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use crate::domain::models::transaction::{PaymentMethod, Transaction, TransactionType};
use crate::storage::traits::{TransactionFilter, TransactionStore};

use super::connection::CsvConnection;

const HEADER: [&str; 9] = [
    "id",
    "user_id",
    "type",
    "amount",
    "category",
    "date",
    "payment_method",
    "description",
    "notes",
];

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    connection: CsvConnection,
}

impl TransactionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read the user's full ledger from disk. A missing file is an empty
    /// ledger, not an error.
    fn read_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let file_path = self.connection.transactions_file_path(user_id);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("opening ledger for user {}", user_id))?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut transactions = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => {
                    // A corrupt row must not take the whole ledger down.
                    warn!("Skipping unparseable ledger row for user {}: {}", user_id, e);
                }
            }
        }
        Ok(transactions)
    }

    fn parse_record(record: &csv::StringRecord) -> Result<Transaction, String> {
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let transaction_type = TransactionType::parse(&field(2))?;
        let amount = field(3)
            .parse::<f64>()
            .map_err(|e| format!("invalid amount: {}", e))?;
        let date = chrono::DateTime::parse_from_rfc3339(&field(5))
            .map_err(|e| format!("invalid date: {}", e))?;
        let payment_method = PaymentMethod::parse(&field(6))?;
        let optional = |idx: usize| {
            let value = field(idx);
            if value.is_empty() { None } else { Some(value) }
        };
        Ok(Transaction {
            id: field(0),
            user_id: field(1),
            transaction_type,
            amount,
            category: field(4),
            date,
            payment_method,
            description: optional(7),
            notes: optional(8),
        })
    }

    fn write_transactions(&self, user_id: &str, transactions: &[Transaction]) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let file_path = self.connection.transactions_file_path(user_id);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)?;
        let mut csv_writer = Writer::from_writer(BufWriter::new(file));

        csv_writer.write_record(&HEADER)?;
        for transaction in transactions {
            csv_writer.write_record(&[
                transaction.id.as_str(),
                transaction.user_id.as_str(),
                transaction.transaction_type.as_str(),
                &transaction.amount.to_string(),
                transaction.category.as_str(),
                &transaction.date.to_rfc3339(),
                transaction.payment_method.as_str(),
                transaction.description.as_deref().unwrap_or(""),
                transaction.notes.as_deref().unwrap_or(""),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl TransactionStore for TransactionRepository {
    fn append(&self, transaction: &Transaction) -> Result<()> {
        // The whole-file rewrite must not interleave with another append,
        // or one of the two rows would be lost.
        let lock = self.connection.user_lock(&transaction.user_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        info!(
            "Appending {} transaction {} for user {}",
            transaction.transaction_type.as_str(),
            transaction.id,
            transaction.user_id
        );
        let mut transactions = self.read_transactions(&transaction.user_id)?;
        transactions.push(transaction.clone());
        transactions.sort_by(|a, b| a.date.cmp(&b.date));
        self.write_transactions(&transaction.user_id, &transactions)
    }

    fn get(&self, user_id: &str, transaction_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .read_transactions(user_id)?
            .into_iter()
            .find(|t| t.id == transaction_id))
    }

    fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut transactions = self.read_transactions(&filter.user_id)?;
        transactions.retain(|t| filter.matches(t));
        transactions.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(transactions)
    }

    fn count(&self, filter: &TransactionFilter) -> Result<usize> {
        Ok(self.list(filter)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::traits::Connection;

    fn transaction(id: &str, user: &str, tx_type: TransactionType, amount: f64, date: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: user.to_string(),
            transaction_type: tx_type,
            amount,
            category: "General".to_string(),
            date: chrono::DateTime::parse_from_rfc3339(date).unwrap(),
            payment_method: PaymentMethod::Cash,
            description: Some("test".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_append_and_get() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_transaction_repository();

        let tx = transaction("tx1", "alice", TransactionType::Income, 25.5, "2024-01-15T10:30:00Z");
        repo.append(&tx).unwrap();

        let found = repo.get("alice", "tx1").unwrap().unwrap();
        assert_eq!(found.amount, 25.5);
        assert_eq!(found.transaction_type, TransactionType::Income);
        assert_eq!(found.description.as_deref(), Some("test"));
    }

    #[test]
    fn test_list_is_chronological_and_filtered() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_transaction_repository();

        repo.append(&transaction("tx2", "alice", TransactionType::Expense, 10.0, "2024-02-01T00:00:00Z")).unwrap();
        repo.append(&transaction("tx1", "alice", TransactionType::Income, 50.0, "2024-01-01T00:00:00Z")).unwrap();
        repo.append(&transaction("tx3", "bob", TransactionType::Expense, 5.0, "2024-01-15T00:00:00Z")).unwrap();

        let all = repo.list(&TransactionFilter::for_user("alice")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "tx1");
        assert_eq!(all[1].id, "tx2");

        let mut expenses = TransactionFilter::for_user("alice");
        expenses.transaction_type = Some(TransactionType::Expense);
        let listed = repo.list(&expenses).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "tx2");
    }

    #[test]
    fn test_date_range_filter() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_transaction_repository();

        for (id, date) in [
            ("tx1", "2024-01-01T00:00:00Z"),
            ("tx2", "2024-02-01T00:00:00Z"),
            ("tx3", "2024-03-01T00:00:00Z"),
        ] {
            repo.append(&transaction(id, "alice", TransactionType::Expense, 1.0, date)).unwrap();
        }

        let mut filter = TransactionFilter::for_user("alice");
        filter.start_date = Some(chrono::DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z").unwrap());
        filter.end_date = Some(chrono::DateTime::parse_from_rfc3339("2024-02-15T00:00:00Z").unwrap());
        let listed = repo.list(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "tx2");
        assert_eq!(repo.count(&filter).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_appends_keep_every_row() {
        let env = TestEnvironment::new().unwrap();

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let repo = env.connection.create_transaction_repository();
                scope.spawn(move || {
                    for row in 0..10 {
                        let id = format!("tx-{}-{}", writer, row);
                        repo.append(&transaction(
                            &id,
                            "alice",
                            TransactionType::Expense,
                            1.0,
                            "2024-01-15T00:00:00Z",
                        ))
                        .unwrap();
                    }
                });
            }
        });

        let repo = env.connection.create_transaction_repository();
        let all = repo.list(&TransactionFilter::for_user("alice")).unwrap();
        assert_eq!(all.len(), 40);
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_transaction_repository();
        assert!(repo.list(&TransactionFilter::for_user("nobody")).unwrap().is_empty());
    }
}
