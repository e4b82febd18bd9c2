//! Commands and results for wallet mutations.
use serde::{Deserialize, Serialize};

use crate::domain::models::transaction::Transaction;
use crate::domain::models::wallet::{CardType, WalletAccount};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCashCommand {
    pub user_id: String,
    pub new_amount: f64,
    /// When true, any non-zero delta is mirrored into the ledger. When
    /// false the cash balance is allowed to drift from the transaction-derived
    /// balance; this asymmetry is a deliberate part of the contract.
    pub record_audit: bool,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCashCommand {
    pub user_id: String,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCardCommand {
    pub user_id: String,
    pub number: String,
    pub holder_name: String,
    pub expiry: String,
    pub cvv: String,
    pub card_type: CardType,
    pub balance: f64,
    pub color_tag: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveCardCommand {
    pub user_id: String,
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCardBalanceCommand {
    pub user_id: String,
    pub card_id: String,
    pub new_balance: f64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncWithTransactionsCommand {
    pub user_id: String,
    /// Also clear the card list, leaving cash as the only instrument.
    pub reset_cards: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyPinCommand {
    pub user_id: String,
    pub pin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyPinResult {
    pub valid: bool,
    /// The account still carries the configured default PIN.
    pub must_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePinCommand {
    pub user_id: String,
    pub current_pin: String,
    pub new_pin: String,
}

/// Result of any mutating wallet operation: the account as persisted plus
/// the ledger entries (if any) synthesized for the mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMutationResult {
    pub account: WalletAccount,
    pub recorded: Vec<Transaction>,
}
