//! Domain model for a savings goal.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalState {
    Active,
    Cancelled,
    Completed,
}

impl GoalState {
    /// Convert to string for CSV storage
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalState::Active => "active",
            GoalState::Cancelled => "cancelled",
            GoalState::Completed => "completed",
        }
    }

    /// Parse from string for CSV loading
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "active" => Ok(GoalState::Active),
            "cancelled" => Ok(GoalState::Cancelled),
            "completed" => Ok(GoalState::Completed),
            _ => Err(format!("Invalid goal state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    /// Deadline the owner wants the goal met by (RFC 3339).
    pub target_date: String,
    pub state: GoalState,
    pub created_at: String,
    pub updated_at: String,
}

impl SavingsGoal {
    pub fn generate_id(user_id: &str, timestamp_ms: u64) -> String {
        format!(
            "goal::{}_{}_{}",
            user_id,
            timestamp_ms,
            crate::domain::models::transaction::generate_random_suffix(4)
        )
    }

    pub fn remaining_amount(&self) -> f64 {
        self.target_amount - self.current_amount
    }

    pub fn is_reached(&self) -> bool {
        self.remaining_amount() <= 0.0
    }
}
