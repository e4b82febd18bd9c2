//! Shared fixtures for storage tests.
use anyhow::Result;
use tempfile::TempDir;

use crate::domain::models::goal::{GoalState, SavingsGoal};
use crate::domain::models::wallet::WalletAccount;

use super::connection::CsvConnection;

/// An isolated data directory plus a connection into it. The directory is
/// removed when the environment is dropped.
pub struct TestEnvironment {
    pub connection: CsvConnection,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            _temp_dir: temp_dir,
        })
    }
}

pub fn test_account(user_id: &str) -> WalletAccount {
    WalletAccount {
        user_id: user_id.to_string(),
        cash_amount: 0.0,
        cards: Vec::new(),
        pin_hash: "salt$digest".to_string(),
        pin_must_change: true,
        version: 1,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub fn test_goal(user_id: &str, goal_id: &str, target: f64, current: f64) -> SavingsGoal {
    SavingsGoal {
        id: goal_id.to_string(),
        user_id: user_id.to_string(),
        description: "Test goal".to_string(),
        target_amount: target,
        current_amount: current,
        target_date: "2027-12-31T00:00:00Z".to_string(),
        state: GoalState::Active,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}
