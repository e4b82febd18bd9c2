//! # Storage Traits
//!
//! Storage abstraction for the wallet ledger. The domain layer only ever
//! talks to these traits, so file-backed, SQL or in-memory backends can be
//! swapped without touching the services.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};

use crate::domain::models::goal::SavingsGoal;
use crate::domain::models::transaction::{Transaction, TransactionType};
use crate::domain::models::wallet::WalletAccount;

/// Filter contract for ledger queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: String,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl TransactionFilter {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        if transaction.user_id != self.user_id {
            return false;
        }
        if let Some(tx_type) = self.transaction_type {
            if transaction.transaction_type != tx_type {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &transaction.category != category {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if transaction.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if transaction.date > end {
                return false;
            }
        }
        true
    }
}

/// Append-only transaction log.
pub trait TransactionStore: Send + Sync {
    /// Append a new transaction to the user's ledger. Concurrent appends
    /// to the same ledger must all survive; implementations that rewrite
    /// shared state serialize internally.
    fn append(&self, transaction: &Transaction) -> Result<()>;

    /// Retrieve a specific transaction by ID.
    fn get(&self, user_id: &str, transaction_id: &str) -> Result<Option<Transaction>>;

    /// List transactions matching the filter, ordered by date ascending.
    fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Count transactions matching the filter.
    fn count(&self, filter: &TransactionFilter) -> Result<usize>;
}

/// Persistence for the wallet aggregate, one document per user.
pub trait WalletStore: Send + Sync {
    fn find_by_user(&self, user_id: &str) -> Result<Option<WalletAccount>>;

    /// Create the account. Returns `false` when a document for the user
    /// already exists (uniqueness constraint on `user_id`).
    fn create(&self, account: &WalletAccount) -> Result<bool>;

    /// Persist a mutated account. The account's `version` must be exactly
    /// one ahead of the persisted document; returns `false` on a
    /// concurrent-modification conflict so the caller can re-read and retry.
    /// The version check and the write are one atomic step: of two
    /// concurrent saves carrying the same version, at most one succeeds.
    fn save(&self, account: &WalletAccount) -> Result<bool>;
}

/// Persistence for savings goals.
pub trait GoalStore: Send + Sync {
    fn store_goal(&self, goal: &SavingsGoal) -> Result<()>;

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SavingsGoal>>;

    /// Goals ordered by `created_at` descending (most recent first).
    fn list_goals(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<SavingsGoal>>;

    fn update_goal(&self, goal: &SavingsGoal) -> Result<()>;

    /// The user's active goal, if any.
    fn current_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>>;

    fn has_active_goal(&self, user_id: &str) -> Result<bool>;
}

/// Factory for repositories bound to one storage backend.
pub trait Connection: Send + Sync + Clone {
    type TransactionRepository: TransactionStore;
    type WalletRepository: WalletStore;
    type GoalRepository: GoalStore;

    fn create_transaction_repository(&self) -> Self::TransactionRepository;
    fn create_wallet_repository(&self) -> Self::WalletRepository;
    fn create_goal_repository(&self) -> Self::GoalRepository;
}
