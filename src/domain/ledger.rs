//! Ledger synchronizer: the audit-trail keeper.
//!
//! Every balance mutation on a wallet flows through `synthesize`, which
//! turns the raw delta into a ledger entry so the transaction log stays a
//! complete audit trail of the account (modulo the explicitly unaudited
//! `set_cash` path). It also owns the plain record/list surface of the log.

use log::info;
use std::sync::Arc;

use crate::domain::commands::transactions::{
    PaginationInfo, RecordTransactionCommand, TransactionListQuery, TransactionListResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::transaction::{PaymentMethod, Transaction, TransactionType};
use crate::domain::{now_fixed, now_millis};
use crate::storage::traits::{Connection, TransactionFilter, TransactionStore};

pub struct LedgerSynchronizer<C: Connection> {
    transactions: C::TransactionRepository,
}

impl<C: Connection> LedgerSynchronizer<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            transactions: connection.create_transaction_repository(),
        }
    }

    /// Mirror a balance delta into the ledger. A zero delta synthesizes
    /// nothing; the sign picks income vs expense and the stored amount is
    /// the absolute delta.
    pub fn synthesize(
        &self,
        user_id: &str,
        delta: f64,
        payment_method: PaymentMethod,
        category: String,
        description: Option<String>,
    ) -> DomainResult<Option<Transaction>> {
        if delta == 0.0 {
            return Ok(None);
        }
        let transaction_type = if delta > 0.0 {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };
        let transaction = Transaction {
            id: Transaction::generate_id(transaction_type, now_millis()),
            user_id: user_id.to_string(),
            transaction_type,
            amount: delta.abs(),
            category,
            date: now_fixed(),
            payment_method,
            description,
            notes: None,
        };
        self.transactions.append(&transaction)?;
        info!(
            "Synthesized {} entry {} ({:.2}) for user {}",
            transaction_type.as_str(),
            transaction.id,
            transaction.amount,
            user_id
        );
        Ok(Some(transaction))
    }

    /// Append a caller-supplied ledger entry. Does not touch any wallet
    /// balance.
    pub fn record(&self, command: RecordTransactionCommand) -> DomainResult<Transaction> {
        if command.user_id.trim().is_empty() {
            return Err(DomainError::validation("user id must not be empty"));
        }
        if !command.amount.is_finite() || command.amount < 0.0 {
            return Err(DomainError::validation(
                "transaction amount must be a non-negative number",
            ));
        }
        if command.category.trim().is_empty() {
            return Err(DomainError::validation("category must not be empty"));
        }

        let transaction = Transaction {
            id: Transaction::generate_id(command.transaction_type, now_millis()),
            user_id: command.user_id,
            transaction_type: command.transaction_type,
            amount: command.amount,
            category: command.category,
            date: command.date.unwrap_or_else(now_fixed),
            payment_method: command.payment_method,
            description: command.description,
            notes: command.notes,
        };
        self.transactions.append(&transaction)?;
        Ok(transaction)
    }

    /// List ledger entries newest-first with cursor pagination.
    pub fn list(&self, query: TransactionListQuery) -> DomainResult<TransactionListResult> {
        let filter = TransactionFilter {
            user_id: query.user_id.clone(),
            transaction_type: query.transaction_type,
            category: query.category.clone(),
            start_date: query.start_date,
            end_date: query.end_date,
        };
        let mut transactions = self.transactions.list(&filter)?;
        transactions.reverse();

        if let Some(after_id) = &query.after {
            if let Some(index) = transactions.iter().position(|t| &t.id == after_id) {
                transactions = transactions.split_off(index + 1);
            }
        }

        let limit = query.limit.unwrap_or(20) as usize;
        let has_more = transactions.len() > limit;
        transactions.truncate(limit);
        let next_cursor = if has_more {
            transactions.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TransactionListResult {
            transactions,
            pagination: PaginationInfo { has_more, next_cursor },
        })
    }

    /// Every ledger entry for a user, chronological.
    pub fn all_for_user(&self, user_id: &str) -> DomainResult<Vec<Transaction>> {
        Ok(self.transactions.list(&TransactionFilter::for_user(user_id))?)
    }

    /// Entries in the trailing lookback window, chronological.
    pub fn in_lookback_window(
        &self,
        user_id: &str,
        lookback_months: u32,
        transaction_type: Option<TransactionType>,
        category: Option<String>,
    ) -> DomainResult<Vec<Transaction>> {
        let now = now_fixed();
        let start = now
            .checked_sub_months(chrono::Months::new(lookback_months))
            .ok_or_else(|| DomainError::validation("lookback window underflows the calendar"))?;
        let filter = TransactionFilter {
            user_id: user_id.to_string(),
            transaction_type,
            category,
            start_date: Some(start),
            end_date: Some(now),
        };
        Ok(self.transactions.list(&filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::csv::CsvConnection;

    fn ledger() -> (LedgerSynchronizer<CsvConnection>, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let ledger = LedgerSynchronizer::new(Arc::new(env.connection.clone()));
        (ledger, env)
    }

    #[test]
    fn test_synthesize_maps_sign_to_type() {
        let (ledger, _env) = ledger();

        let income = ledger
            .synthesize("alice", 120.0, PaymentMethod::Cash, "Deposit".to_string(), None)
            .unwrap()
            .unwrap();
        assert_eq!(income.transaction_type, TransactionType::Income);
        assert_eq!(income.amount, 120.0);

        let expense = ledger
            .synthesize("alice", -45.0, PaymentMethod::Card, "Card Removal".to_string(), None)
            .unwrap()
            .unwrap();
        assert_eq!(expense.transaction_type, TransactionType::Expense);
        assert_eq!(expense.amount, 45.0);
    }

    #[test]
    fn test_synthesize_skips_zero_delta() {
        let (ledger, _env) = ledger();
        let none = ledger
            .synthesize("alice", 0.0, PaymentMethod::Cash, "Noop".to_string(), None)
            .unwrap();
        assert!(none.is_none());
        assert!(ledger.all_for_user("alice").unwrap().is_empty());
    }

    #[test]
    fn test_record_validates_amount() {
        let (ledger, _env) = ledger();
        let command = RecordTransactionCommand {
            user_id: "alice".to_string(),
            transaction_type: TransactionType::Expense,
            amount: -5.0,
            category: "Food".to_string(),
            date: None,
            payment_method: PaymentMethod::Cash,
            description: None,
            notes: None,
        };
        assert!(matches!(
            ledger.record(command),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_list_paginates_newest_first() {
        let (ledger, _env) = ledger();
        for (amount, date) in [
            (10.0, "2024-01-01T00:00:00Z"),
            (20.0, "2024-02-01T00:00:00Z"),
            (30.0, "2024-03-01T00:00:00Z"),
        ] {
            ledger
                .record(RecordTransactionCommand {
                    user_id: "alice".to_string(),
                    transaction_type: TransactionType::Expense,
                    amount,
                    category: "Food".to_string(),
                    date: Some(chrono::DateTime::parse_from_rfc3339(date).unwrap()),
                    payment_method: PaymentMethod::Cash,
                    description: None,
                    notes: None,
                })
                .unwrap();
        }

        let page = ledger
            .list(TransactionListQuery {
                user_id: "alice".to_string(),
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].amount, 30.0);
        assert_eq!(page.transactions[1].amount, 20.0);
        assert!(page.pagination.has_more);

        let rest = ledger
            .list(TransactionListQuery {
                user_id: "alice".to_string(),
                after: page.pagination.next_cursor.clone(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rest.transactions.len(), 1);
        assert_eq!(rest.transactions[0].amount, 10.0);
        assert!(!rest.pagination.has_more);
    }
}
