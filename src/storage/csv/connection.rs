//! File-backed storage connection.
//!
//! Each user gets a directory under the base data directory:
//!
//! ```text
//! <base>/<user>/transactions.csv   append-only ledger
//! <base>/<user>/wallet.json        wallet document (versioned)
//! <base>/<user>/goals.csv          savings goals
//! ```

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::storage::traits::Connection;

use super::goal_repository::GoalRepository;
use super::transaction_repository::TransactionRepository;
use super::wallet_repository::WalletRepository;

#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CsvConnection {
    pub fn new(base_directory: impl AsRef<Path>) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        fs::create_dir_all(&base_directory)?;
        Ok(Self {
            base_directory,
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Lock guarding all of one user's files. Repositories hold it across
    /// any read-modify-write so concurrent mutations serialize instead of
    /// overwriting each other. The registry is shared by every repository
    /// created from this connection and its clones; it does not protect
    /// against a second process opening the same data directory.
    pub(crate) fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(Self::safe_user_directory(user_id))
            .or_default()
            .clone()
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Filesystem-safe directory name for a user ID.
    fn safe_user_directory(user_id: &str) -> String {
        user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    pub fn user_directory(&self, user_id: &str) -> PathBuf {
        self.base_directory.join(Self::safe_user_directory(user_id))
    }

    pub fn ensure_user_directory(&self, user_id: &str) -> Result<PathBuf> {
        let dir = self.user_directory(user_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn transactions_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join("transactions.csv")
    }

    pub fn wallet_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join("wallet.json")
    }

    pub fn goals_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join("goals.csv")
    }
}

impl Connection for CsvConnection {
    type TransactionRepository = TransactionRepository;
    type WalletRepository = WalletRepository;
    type GoalRepository = GoalRepository;

    fn create_transaction_repository(&self) -> TransactionRepository {
        TransactionRepository::new(self.clone())
    }

    fn create_wallet_repository(&self) -> WalletRepository {
        WalletRepository::new(self.clone())
    }

    fn create_goal_repository(&self) -> GoalRepository {
        GoalRepository::new(self.clone())
    }
}
