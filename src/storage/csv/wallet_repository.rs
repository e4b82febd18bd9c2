//! JSON-document wallet repository.
//!
//! The wallet aggregate carries a nested card list, so it is persisted as a
//! single JSON document per user instead of CSV rows. The document's
//! `version` field implements the optimistic concurrency check: `save` only
//! overwrites when the persisted version is exactly one behind the incoming
//! account.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};

use crate::domain::models::wallet::WalletAccount;
use crate::storage::traits::WalletStore;

use super::connection::CsvConnection;

#[derive(Debug, Clone)]
pub struct WalletRepository {
    connection: CsvConnection,
}

impl WalletRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_account(&self, user_id: &str) -> Result<Option<WalletAccount>> {
        let file_path = self.connection.wallet_file_path(user_id);
        if !file_path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&file_path)
            .with_context(|| format!("reading wallet document for user {}", user_id))?;
        let account = serde_json::from_str(&contents)
            .with_context(|| format!("parsing wallet document for user {}", user_id))?;
        Ok(Some(account))
    }

    fn write_account(&self, account: &WalletAccount) -> Result<()> {
        self.connection.ensure_user_directory(&account.user_id)?;
        let file_path = self.connection.wallet_file_path(&account.user_id);
        let contents = serde_json::to_string_pretty(account)?;
        fs::write(&file_path, contents)
            .with_context(|| format!("writing wallet document for user {}", account.user_id))?;
        Ok(())
    }
}

impl WalletStore for WalletRepository {
    fn find_by_user(&self, user_id: &str) -> Result<Option<WalletAccount>> {
        self.read_account(user_id)
    }

    fn create(&self, account: &WalletAccount) -> Result<bool> {
        self.connection.ensure_user_directory(&account.user_id)?;
        let file_path = self.connection.wallet_file_path(&account.user_id);
        let contents = serde_json::to_string_pretty(account)?;

        // create_new makes the uniqueness check atomic: of two concurrent
        // creators, the filesystem admits exactly one.
        match OpenOptions::new().write(true).create_new(true).open(&file_path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes()).with_context(|| {
                    format!("writing wallet document for user {}", account.user_id)
                })?;
                info!("Created wallet document for user {}", account.user_id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!("Wallet already exists for user {}, refusing create", account.user_id);
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| {
                format!("creating wallet document for user {}", account.user_id)
            }),
        }
    }

    fn save(&self, account: &WalletAccount) -> Result<bool> {
        // The version check and the overwrite must be one atomic step, or
        // two writers could both pass the check and one delta would vanish.
        let lock = self.connection.user_lock(&account.user_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let persisted = match self.read_account(&account.user_id)? {
            Some(existing) => existing,
            None => {
                warn!("Save for missing wallet document, user {}", account.user_id);
                return Ok(false);
            }
        };

        if persisted.version + 1 != account.version {
            info!(
                "Version conflict saving wallet for user {}: persisted {}, incoming {}",
                account.user_id, persisted.version, account.version
            );
            return Ok(false);
        }

        self.write_account(account)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{test_account, TestEnvironment};
    use crate::storage::traits::Connection;

    #[test]
    fn test_create_then_find() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_wallet_repository();

        let account = test_account("alice");
        assert!(repo.create(&account).unwrap());

        let found = repo.find_by_user("alice").unwrap().unwrap();
        assert_eq!(found, account);
    }

    #[test]
    fn test_create_enforces_uniqueness() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_wallet_repository();

        assert!(repo.create(&test_account("alice")).unwrap());
        assert!(!repo.create(&test_account("alice")).unwrap());
    }

    #[test]
    fn test_save_accepts_next_version_only() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_wallet_repository();

        let mut account = test_account("alice");
        repo.create(&account).unwrap();

        account.cash_amount = 50.0;
        account.version += 1;
        assert!(repo.save(&account).unwrap());

        // Replaying the same version is a conflict.
        assert!(!repo.save(&account).unwrap());

        // A stale writer that read version 1 loses against the version-2 document.
        let mut stale = test_account("alice");
        stale.cash_amount = 999.0;
        stale.version = 2;
        assert!(!repo.save(&stale).unwrap());
    }

    #[test]
    fn test_save_without_create_is_conflict() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_wallet_repository();
        assert!(!repo.save(&test_account("ghost")).unwrap());
    }

    #[test]
    fn test_concurrent_saves_admit_one_winner() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_wallet_repository();

        let account = test_account("alice");
        repo.create(&account).unwrap();

        // Four writers all read version 1 and race to write version 2.
        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let repo = env.connection.create_wallet_repository();
                    let mut contender = account.clone();
                    contender.version = 2;
                    contender.cash_amount = f64::from(i) * 100.0;
                    scope.spawn(move || repo.save(&contender).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|won| **won).count(), 1);
        assert_eq!(repo.find_by_user("alice").unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_concurrent_creates_admit_one_winner() {
        let env = TestEnvironment::new().unwrap();

        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let repo = env.connection.create_wallet_repository();
                    scope.spawn(move || repo.create(&test_account("alice")).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|won| **won).count(), 1);
        assert!(env
            .connection
            .create_wallet_repository()
            .find_by_user("alice")
            .unwrap()
            .is_some());
    }
}
