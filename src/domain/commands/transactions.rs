//! Commands and queries for the transaction ledger.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::models::transaction::{PaymentMethod, Transaction, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTransactionCommand {
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub category: String,
    /// Defaults to the current time when absent.
    pub date: Option<DateTime<FixedOffset>>,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionListQuery {
    pub user_id: String,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
    /// Cursor for pagination - transaction ID to start after.
    pub after: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResult {
    pub transactions: Vec<Transaction>,
    pub pagination: PaginationInfo,
}
