//! Uniform response envelope over the domain services.
//!
//! Every exposed operation returns an `ApiResponse` instead of a `Result`,
//! so hosts that serialize responses straight onto a wire get one shape for
//! success and failure alike.

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::domain::commands::forecast::{GoalProjection, SpendingForecast, SpendingForecastQuery};
use crate::domain::commands::goal::{
    CancelGoalCommand, CancelGoalResult, CreateGoalCommand, CreateGoalResult, ListGoalsQuery,
    ListGoalsResult, UpdateGoalProgressCommand, UpdateGoalProgressResult,
};
use crate::domain::commands::transactions::{
    RecordTransactionCommand, TransactionListQuery, TransactionListResult,
};
use crate::domain::commands::wallet::{
    AddCardCommand, AddCashCommand, RemoveCardCommand, SetCashCommand,
    SyncWithTransactionsCommand, UpdateCardBalanceCommand, UpdatePinCommand, VerifyPinCommand,
    VerifyPinResult, WalletMutationResult,
};
use crate::domain::models::goal::SavingsGoal;
use crate::domain::models::transaction::Transaction;
use crate::domain::models::wallet::WalletAccount;
use crate::domain::{DomainError, DomainResult};
use crate::storage::traits::Connection;
use crate::WalletBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &DomainError) -> Self {
        Self {
            success: false,
            message: failure_message(error).to_string(),
            data: None,
            error: Some(error.to_string()),
        }
    }
}

fn failure_message(error: &DomainError) -> &'static str {
    match error {
        DomainError::Validation(_) => "Invalid request",
        DomainError::NotFound(_) => "Not found",
        DomainError::InsufficientData(_) => "Not enough history",
        DomainError::ConcurrencyConflict(_) => "Conflicting update, try again",
        DomainError::Upstream(_) => "Storage failure",
    }
}

fn respond<T>(result: DomainResult<T>, success_message: &str) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::ok(success_message, data),
        Err(err) => {
            match &err {
                DomainError::Upstream(inner) => error!("Storage failure: {:#}", inner),
                other => warn!("Request failed: {}", other),
            }
            ApiResponse::failure(&err)
        }
    }
}

impl<C: Connection> WalletBackend<C> {
    pub fn ensure_account(&self, user_id: &str) -> ApiResponse<WalletAccount> {
        respond(self.wallet.ensure_account(user_id), "Wallet ready")
    }

    pub fn get_account(&self, user_id: &str) -> ApiResponse<WalletAccount> {
        respond(self.wallet.get_account(user_id), "Wallet loaded")
    }

    pub fn set_cash(&self, command: SetCashCommand) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.set_cash(command), "Cash balance set")
    }

    pub fn add_cash(&self, command: AddCashCommand) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.add_cash(command), "Cash added")
    }

    pub fn add_card(&self, command: AddCardCommand) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.add_card(command), "Card added")
    }

    pub fn remove_card(&self, command: RemoveCardCommand) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.remove_card(command), "Card removed")
    }

    pub fn update_card_balance(
        &self,
        command: UpdateCardBalanceCommand,
    ) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.update_card_balance(command), "Card balance set")
    }

    pub fn sync_with_transactions(
        &self,
        command: SyncWithTransactionsCommand,
    ) -> ApiResponse<WalletMutationResult> {
        respond(
            self.wallet.sync_with_transactions(command),
            "Wallet synced with ledger",
        )
    }

    pub fn verify_pin(&self, command: VerifyPinCommand) -> ApiResponse<VerifyPinResult> {
        respond(self.wallet.verify_pin(command), "PIN checked")
    }

    pub fn update_pin(&self, command: UpdatePinCommand) -> ApiResponse<WalletMutationResult> {
        respond(self.wallet.update_pin(command), "PIN updated")
    }

    pub fn record_transaction(
        &self,
        command: RecordTransactionCommand,
    ) -> ApiResponse<Transaction> {
        respond(self.ledger.record(command), "Transaction recorded")
    }

    pub fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> ApiResponse<TransactionListResult> {
        respond(self.ledger.list(query), "Transactions listed")
    }

    pub fn predict_spending(&self, query: SpendingForecastQuery) -> ApiResponse<SpendingForecast> {
        respond(self.forecast.predict_spending(query), "Forecast computed")
    }

    pub fn predict_savings_goal_completion(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> ApiResponse<GoalProjection> {
        respond(
            self.goals.project_completion(user_id, goal_id),
            "Projection computed",
        )
    }

    pub fn create_goal(&self, command: CreateGoalCommand) -> ApiResponse<CreateGoalResult> {
        respond(self.goals.create_goal(command), "Goal created")
    }

    pub fn update_goal_progress(
        &self,
        command: UpdateGoalProgressCommand,
    ) -> ApiResponse<UpdateGoalProgressResult> {
        respond(self.goals.update_goal_progress(command), "Goal progress updated")
    }

    pub fn get_goal(&self, user_id: &str, goal_id: &str) -> ApiResponse<SavingsGoal> {
        respond(self.goals.get_goal(user_id, goal_id), "Goal loaded")
    }

    pub fn cancel_goal(&self, command: CancelGoalCommand) -> ApiResponse<CancelGoalResult> {
        respond(self.goals.cancel_goal(command), "Goal cancelled")
    }

    pub fn list_goals(&self, query: ListGoalsQuery) -> ApiResponse<ListGoalsResult> {
        respond(self.goals.list_goals(query), "Goals listed")
    }

    pub fn validate_ledger(&self, user_id: &str) -> ApiResponse<Vec<String>> {
        respond(self.wallet.validate_ledger(user_id), "Ledger validated")
    }
}
