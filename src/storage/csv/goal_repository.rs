//! CSV-backed savings-goal repository.
use anyhow::{Context, Result};
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use crate::domain::models::goal::{GoalState, SavingsGoal};
use crate::storage::traits::GoalStore;

use super::connection::CsvConnection;

const HEADER: [&str; 9] = [
    "id",
    "user_id",
    "description",
    "target_amount",
    "current_amount",
    "target_date",
    "state",
    "created_at",
    "updated_at",
];

#[derive(Debug, Clone)]
pub struct GoalRepository {
    connection: CsvConnection,
}

impl GoalRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        let file_path = self.connection.goals_file_path(user_id);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("opening goals file for user {}", user_id))?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut goals = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(goal) => goals.push(goal),
                Err(e) => warn!("Skipping unparseable goal row for user {}: {}", user_id, e),
            }
        }
        Ok(goals)
    }

    fn parse_record(record: &csv::StringRecord) -> Result<SavingsGoal, String> {
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let target_amount = field(3)
            .parse::<f64>()
            .map_err(|e| format!("invalid target amount: {}", e))?;
        let current_amount = field(4)
            .parse::<f64>()
            .map_err(|e| format!("invalid current amount: {}", e))?;
        let state = GoalState::parse(&field(6))?;
        Ok(SavingsGoal {
            id: field(0),
            user_id: field(1),
            description: field(2),
            target_amount,
            current_amount,
            target_date: field(5),
            state,
            created_at: field(7),
            updated_at: field(8),
        })
    }

    fn write_goals(&self, user_id: &str, goals: &[SavingsGoal]) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let file_path = self.connection.goals_file_path(user_id);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)?;
        let mut csv_writer = Writer::from_writer(BufWriter::new(file));

        csv_writer.write_record(&HEADER)?;
        for goal in goals {
            csv_writer.write_record(&[
                goal.id.as_str(),
                goal.user_id.as_str(),
                goal.description.as_str(),
                &goal.target_amount.to_string(),
                &goal.current_amount.to_string(),
                goal.target_date.as_str(),
                goal.state.as_str(),
                goal.created_at.as_str(),
                goal.updated_at.as_str(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl GoalStore for GoalRepository {
    fn store_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let lock = self.connection.user_lock(&goal.user_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        info!("Storing goal {} for user {}", goal.id, goal.user_id);
        let mut goals = self.read_goals(&goal.user_id)?;
        goals.push(goal.clone());
        self.write_goals(&goal.user_id, &goals)
    }

    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<SavingsGoal>> {
        Ok(self
            .read_goals(user_id)?
            .into_iter()
            .find(|g| g.id == goal_id))
    }

    fn list_goals(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<SavingsGoal>> {
        let mut goals = self.read_goals(user_id)?;
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            goals.truncate(limit as usize);
        }
        Ok(goals)
    }

    fn update_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let lock = self.connection.user_lock(&goal.user_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut goals = self.read_goals(&goal.user_id)?;
        match goals.iter().position(|g| g.id == goal.id) {
            Some(index) => {
                goals[index] = goal.clone();
                self.write_goals(&goal.user_id, &goals)
            }
            None => Err(anyhow::anyhow!(
                "goal {} not found for user {}",
                goal.id,
                goal.user_id
            )),
        }
    }

    fn current_goal(&self, user_id: &str) -> Result<Option<SavingsGoal>> {
        let mut active: Vec<SavingsGoal> = self
            .read_goals(user_id)?
            .into_iter()
            .filter(|g| g.state == GoalState::Active)
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active.into_iter().next())
    }

    fn has_active_goal(&self, user_id: &str) -> Result<bool> {
        Ok(self.current_goal(user_id)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{test_goal, TestEnvironment};
    use crate::storage::traits::Connection;

    #[test]
    fn test_store_and_get_goal() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_goal_repository();

        let goal = test_goal("alice", "g1", 10000.0, 2500.0);
        repo.store_goal(&goal).unwrap();

        let found = repo.get_goal("alice", "g1").unwrap().unwrap();
        assert_eq!(found, goal);
    }

    #[test]
    fn test_current_goal_is_latest_active() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_goal_repository();

        let mut old = test_goal("alice", "g1", 100.0, 0.0);
        old.created_at = "2024-01-01T00:00:00Z".to_string();
        let mut newer = test_goal("alice", "g2", 200.0, 0.0);
        newer.created_at = "2024-06-01T00:00:00Z".to_string();
        let mut cancelled = test_goal("alice", "g3", 300.0, 0.0);
        cancelled.created_at = "2024-12-01T00:00:00Z".to_string();
        cancelled.state = GoalState::Cancelled;

        repo.store_goal(&old).unwrap();
        repo.store_goal(&newer).unwrap();
        repo.store_goal(&cancelled).unwrap();

        let current = repo.current_goal("alice").unwrap().unwrap();
        assert_eq!(current.id, "g2");
        assert!(repo.has_active_goal("alice").unwrap());
    }

    #[test]
    fn test_update_goal_replaces_record() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_goal_repository();

        let mut goal = test_goal("alice", "g1", 100.0, 0.0);
        repo.store_goal(&goal).unwrap();

        goal.current_amount = 40.0;
        goal.state = GoalState::Completed;
        repo.update_goal(&goal).unwrap();

        let found = repo.get_goal("alice", "g1").unwrap().unwrap();
        assert_eq!(found.current_amount, 40.0);
        assert_eq!(found.state, GoalState::Completed);
    }

    #[test]
    fn test_update_missing_goal_fails() {
        let env = TestEnvironment::new().unwrap();
        let repo = env.connection.create_goal_repository();
        assert!(repo.update_goal(&test_goal("alice", "ghost", 1.0, 0.0)).is_err());
    }
}
