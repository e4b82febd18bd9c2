//! Savings goals: CRUD plus completion projection.
//!
//! One active goal per user. The projection divides the remaining amount by
//! the average net savings of the positive months in the lookback window;
//! an already-reached goal short-circuits before any history is consulted.

use chrono::{DateTime, FixedOffset, Months};
use log::info;
use std::sync::Arc;

use crate::config::WalletConfig;
use crate::domain::commands::forecast::{GoalProjection, ProjectionStatus};
use crate::domain::commands::goal::{
    CancelGoalCommand, CancelGoalResult, CreateGoalCommand, CreateGoalResult, ListGoalsQuery,
    ListGoalsResult, UpdateGoalProgressCommand, UpdateGoalProgressResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ledger::LedgerSynchronizer;
use crate::domain::models::goal::{GoalState, SavingsGoal};
use crate::domain::monthly::{monthly_series, AggregationMode};
use crate::domain::{now_fixed, now_millis, now_rfc3339};
use crate::storage::traits::{Connection, GoalStore};

pub struct GoalService<C: Connection> {
    goals: C::GoalRepository,
    ledger: LedgerSynchronizer<C>,
    config: WalletConfig,
}

impl<C: Connection> GoalService<C> {
    pub fn new(connection: Arc<C>, config: WalletConfig) -> Self {
        Self {
            goals: connection.create_goal_repository(),
            ledger: LedgerSynchronizer::new(connection),
            config,
        }
    }

    pub fn create_goal(&self, command: CreateGoalCommand) -> DomainResult<CreateGoalResult> {
        if command.description.trim().is_empty() {
            return Err(DomainError::validation("goal description is required"));
        }
        if !command.target_amount.is_finite() || command.target_amount <= 0.0 {
            return Err(DomainError::validation("target amount must be positive"));
        }
        if !command.current_amount.is_finite() || command.current_amount < 0.0 {
            return Err(DomainError::validation(
                "current amount must not be negative",
            ));
        }
        let target_date = parse_rfc3339(&command.target_date)?;
        if target_date <= now_fixed() {
            return Err(DomainError::validation("target date must be in the future"));
        }
        if self.goals.has_active_goal(&command.user_id)? {
            return Err(DomainError::validation(
                "an active goal already exists; cancel or complete it first",
            ));
        }

        let now = now_rfc3339();
        let goal = SavingsGoal {
            id: SavingsGoal::generate_id(&command.user_id, now_millis()),
            user_id: command.user_id.clone(),
            description: command.description.trim().to_string(),
            target_amount: command.target_amount,
            current_amount: command.current_amount,
            target_date: command.target_date,
            state: GoalState::Active,
            created_at: now.clone(),
            updated_at: now,
        };
        self.goals.store_goal(&goal)?;
        info!("Created goal {} for user {}", goal.id, goal.user_id);

        Ok(CreateGoalResult {
            success_message: format!("Goal \"{}\" created", goal.description),
            goal,
        })
    }

    /// Set the goal's saved-so-far amount. Crossing the target marks the
    /// goal completed in the same write.
    pub fn update_goal_progress(
        &self,
        command: UpdateGoalProgressCommand,
    ) -> DomainResult<UpdateGoalProgressResult> {
        if !command.current_amount.is_finite() || command.current_amount < 0.0 {
            return Err(DomainError::validation(
                "current amount must not be negative",
            ));
        }

        let mut goal = self.load(&command.user_id, &command.goal_id)?;
        if goal.state != GoalState::Active {
            return Err(DomainError::validation(format!(
                "goal {} is {}, not active",
                goal.id,
                goal.state.as_str()
            )));
        }

        goal.current_amount = command.current_amount;
        let completed = goal.is_reached();
        if completed {
            goal.state = GoalState::Completed;
            info!("Goal {} reached its target and was completed", goal.id);
        }
        goal.updated_at = now_rfc3339();
        self.goals.update_goal(&goal)?;

        Ok(UpdateGoalProgressResult { goal, completed })
    }

    pub fn cancel_goal(&self, command: CancelGoalCommand) -> DomainResult<CancelGoalResult> {
        let mut goal = self.load(&command.user_id, &command.goal_id)?;
        if goal.state != GoalState::Active {
            return Err(DomainError::validation(format!(
                "goal {} is already {}",
                goal.id,
                goal.state.as_str()
            )));
        }

        goal.state = GoalState::Cancelled;
        goal.updated_at = now_rfc3339();
        self.goals.update_goal(&goal)?;
        info!("Cancelled goal {} for user {}", goal.id, goal.user_id);

        Ok(CancelGoalResult {
            success_message: "Goal cancelled".to_string(),
            goal,
        })
    }

    pub fn get_goal(&self, user_id: &str, goal_id: &str) -> DomainResult<SavingsGoal> {
        self.load(user_id, goal_id)
    }

    pub fn list_goals(&self, query: ListGoalsQuery) -> DomainResult<ListGoalsResult> {
        Ok(ListGoalsResult {
            goals: self.goals.list_goals(&query.user_id, query.limit)?,
        })
    }

    /// Project when the goal will be reached, extrapolating from the
    /// average net savings of the positive months in the lookback window.
    pub fn project_completion(&self, user_id: &str, goal_id: &str) -> DomainResult<GoalProjection> {
        let goal = self.load(user_id, goal_id)?;

        let remaining = goal.remaining_amount();
        if remaining <= 0.0 {
            return Ok(GoalProjection {
                goal_id: goal.id,
                description: goal.description,
                target_amount: goal.target_amount,
                current_amount: goal.current_amount,
                remaining_amount: remaining,
                status: ProjectionStatus::Reached,
                is_reached: true,
                months_to_completion: 0,
                projected_completion_date: None,
                will_reach_by_target_date: Some(true),
                average_monthly_savings: None,
            });
        }

        let history =
            self.ledger
                .in_lookback_window(user_id, self.config.lookback_months, None, None)?;
        if history.len() < self.config.min_samples {
            return Err(DomainError::InsufficientData(format!(
                "need at least {} ledger entries in the last {} months, found {}",
                self.config.min_samples,
                self.config.lookback_months,
                history.len()
            )));
        }

        let series = monthly_series(&history, AggregationMode::NetSavings);
        let positive: Vec<f64> = series
            .iter()
            .map(|point| point.amount)
            .filter(|amount| *amount > 0.0)
            .collect();
        if positive.is_empty() {
            return Ok(GoalProjection {
                goal_id: goal.id,
                description: goal.description,
                target_amount: goal.target_amount,
                current_amount: goal.current_amount,
                remaining_amount: remaining,
                status: ProjectionStatus::NoPositiveSavings,
                is_reached: false,
                months_to_completion: 0,
                projected_completion_date: None,
                will_reach_by_target_date: Some(false),
                average_monthly_savings: None,
            });
        }

        let average = positive.iter().sum::<f64>() / positive.len() as f64;
        let months = (remaining / average).ceil() as u32;
        let completion = now_fixed()
            .checked_add_months(Months::new(months))
            .ok_or_else(|| DomainError::validation("projected completion date out of range"))?;
        let will_reach = parse_rfc3339(&goal.target_date)
            .ok()
            .map(|target| completion <= target);

        info!(
            "Goal {} projected to complete in {} months at {:.2}/month",
            goal.id, months, average
        );
        Ok(GoalProjection {
            goal_id: goal.id,
            description: goal.description,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            remaining_amount: remaining,
            status: ProjectionStatus::Projected,
            is_reached: false,
            months_to_completion: months,
            projected_completion_date: Some(completion.to_rfc3339()),
            will_reach_by_target_date: will_reach,
            average_monthly_savings: Some(average),
        })
    }

    fn load(&self, user_id: &str, goal_id: &str) -> DomainResult<SavingsGoal> {
        self.goals
            .get_goal(user_id, goal_id)?
            .ok_or_else(|| DomainError::not_found(format!("goal {} for user {}", goal_id, user_id)))
    }
}

fn parse_rfc3339(value: &str) -> DomainResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| DomainError::validation(format!("invalid RFC 3339 date {}: {}", value, e)))
}
