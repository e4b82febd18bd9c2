//! Commands and results for savings-goal management.
use serde::{Deserialize, Serialize};

use crate::domain::models::goal::SavingsGoal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalCommand {
    pub user_id: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    /// Deadline (RFC 3339) the projection is judged against.
    pub target_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalResult {
    pub goal: SavingsGoal,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalProgressCommand {
    pub user_id: String,
    pub goal_id: String,
    pub current_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalProgressResult {
    pub goal: SavingsGoal,
    /// True when this update pushed the goal over its target and it was
    /// marked completed.
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelGoalCommand {
    pub user_id: String,
    pub goal_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelGoalResult {
    pub goal: SavingsGoal,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGoalsQuery {
    pub user_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGoalsResult {
    pub goals: Vec<SavingsGoal>,
}
