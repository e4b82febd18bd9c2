//! Wallet service: every externally visible balance mutation goes through
//! here, and every significant delta leaves a matching ledger entry behind
//! (except the explicitly unaudited `set_cash` path).
//!
//! Each mutation is a read-modify-write against the user's wallet document.
//! The store enforces a version check on save; on a conflict the whole
//! mutation is re-run against a fresh read, a bounded number of times.

use log::{info, warn};
use std::sync::Arc;

use crate::config::WalletConfig;
use crate::domain::commands::wallet::{
    AddCardCommand, AddCashCommand, RemoveCardCommand, SetCashCommand,
    SyncWithTransactionsCommand, UpdateCardBalanceCommand, UpdatePinCommand, VerifyPinCommand,
    VerifyPinResult, WalletMutationResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ledger::LedgerSynchronizer;
use crate::domain::models::transaction::{PaymentMethod, Transaction};
use crate::domain::models::wallet::{CardAccount, WalletAccount};
use crate::domain::pin::{PinHasher, Sha256PinHasher};
use crate::domain::{now_millis, now_rfc3339};
use crate::storage::traits::{Connection, WalletStore};

/// A ledger entry waiting to be written once the owning account mutation
/// has been persisted.
struct PendingEntry {
    delta: f64,
    payment_method: PaymentMethod,
    category: String,
    description: Option<String>,
}

pub struct WalletService<C: Connection> {
    wallets: C::WalletRepository,
    ledger: LedgerSynchronizer<C>,
    config: WalletConfig,
    pin_hasher: Arc<dyn PinHasher>,
}

impl<C: Connection> WalletService<C> {
    pub fn new(connection: Arc<C>, config: WalletConfig) -> Self {
        Self::with_pin_hasher(connection, config, Arc::new(Sha256PinHasher))
    }

    pub fn with_pin_hasher(
        connection: Arc<C>,
        config: WalletConfig,
        pin_hasher: Arc<dyn PinHasher>,
    ) -> Self {
        Self {
            wallets: connection.create_wallet_repository(),
            ledger: LedgerSynchronizer::new(connection),
            config,
            pin_hasher,
        }
    }

    /// Get-or-create the user's wallet. Creation relies on the store's
    /// uniqueness constraint, not a check-then-insert race: a lost create
    /// simply re-reads the winner's document.
    pub fn ensure_account(&self, user_id: &str) -> DomainResult<WalletAccount> {
        if user_id.trim().is_empty() {
            return Err(DomainError::validation("user id must not be empty"));
        }

        for _ in 0..=self.config.save_retries {
            if let Some(account) = self.wallets.find_by_user(user_id)? {
                return Ok(account);
            }

            let now = now_rfc3339();
            let account = WalletAccount {
                user_id: user_id.to_string(),
                cash_amount: 0.0,
                cards: Vec::new(),
                pin_hash: self.pin_hasher.hash(&self.config.default_pin),
                pin_must_change: true,
                version: 1,
                created_at: now.clone(),
                updated_at: now,
            };
            if self.wallets.create(&account)? {
                info!("Created wallet account for user {}", user_id);
                return Ok(account);
            }
            // Someone else created it between our read and create.
        }
        Err(DomainError::ConcurrencyConflict(format!(
            "could not create or read wallet for user {}",
            user_id
        )))
    }

    /// Overwrite the cash balance. The delta is mirrored into the ledger
    /// only when `record_audit` is set; otherwise the cash balance silently
    /// drifts from the transaction-derived balance. That asymmetry with
    /// `add_cash`/`update_card_balance` is part of the contract.
    pub fn set_cash(&self, command: SetCashCommand) -> DomainResult<WalletMutationResult> {
        validate_amount("cash amount", command.new_amount)?;

        self.mutate(&command.user_id, |account| {
            let delta = command.new_amount - account.cash_amount;
            account.cash_amount = command.new_amount;
            if command.record_audit && delta != 0.0 {
                Ok(vec![PendingEntry {
                    delta,
                    payment_method: PaymentMethod::Cash,
                    category: command
                        .category
                        .clone()
                        .unwrap_or_else(|| "Balance Adjustment".to_string()),
                    description: None,
                }])
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Add cash. Always audited.
    pub fn add_cash(&self, command: AddCashCommand) -> DomainResult<WalletMutationResult> {
        validate_amount("cash amount", command.amount)?;
        if command.amount <= 0.0 {
            return Err(DomainError::validation("amount to add must be positive"));
        }

        self.mutate(&command.user_id, |account| {
            account.cash_amount += command.amount;
            Ok(vec![PendingEntry {
                delta: command.amount,
                payment_method: PaymentMethod::Cash,
                category: command
                    .category
                    .clone()
                    .unwrap_or_else(|| "Cash Deposit".to_string()),
                description: command.description.clone(),
            }])
        })
    }

    /// Add a card. The initial balance is recorded as realized income.
    pub fn add_card(&self, command: AddCardCommand) -> DomainResult<WalletMutationResult> {
        for (field, value) in [
            ("card number", &command.number),
            ("holder name", &command.holder_name),
            ("expiry", &command.expiry),
            ("cvv", &command.cvv),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{} is required", field)));
            }
        }
        validate_amount("card balance", command.balance)?;
        if command.balance < 0.0 {
            return Err(DomainError::validation("card balance must not be negative"));
        }

        self.mutate(&command.user_id, |account| {
            let card = CardAccount {
                id: CardAccount::generate_id(now_millis()),
                number: command.number.clone(),
                holder_name: command.holder_name.clone(),
                expiry: command.expiry.clone(),
                cvv: command.cvv.clone(),
                card_type: command.card_type,
                balance: command.balance,
                color_tag: command.color_tag.clone(),
                is_default: command.is_default || account.cards.is_empty(),
            };
            if card.is_default {
                for existing in &mut account.cards {
                    existing.is_default = false;
                }
            }
            let masked = card.masked_number();
            account.cards.push(card);

            if command.balance > 0.0 {
                Ok(vec![PendingEntry {
                    delta: command.balance,
                    payment_method: PaymentMethod::Card,
                    category: "Card Addition".to_string(),
                    description: Some(format!("Initial balance for card {}", masked)),
                }])
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Remove a card. A remaining positive balance is treated as realized
    /// spending and recorded as an expense.
    pub fn remove_card(&self, command: RemoveCardCommand) -> DomainResult<WalletMutationResult> {
        self.mutate(&command.user_id, |account| {
            let index = account
                .cards
                .iter()
                .position(|c| c.id == command.card_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "card {} for user {}",
                        command.card_id, command.user_id
                    ))
                })?;
            let removed = account.cards.remove(index);

            if removed.balance > 0.0 {
                Ok(vec![PendingEntry {
                    delta: -removed.balance,
                    payment_method: PaymentMethod::Card,
                    category: "Card Removal".to_string(),
                    description: Some(format!("Removed card {}", removed.masked_number())),
                }])
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Set a card's balance. Unlike `set_cash`, every non-zero delta is
    /// recorded unconditionally.
    pub fn update_card_balance(
        &self,
        command: UpdateCardBalanceCommand,
    ) -> DomainResult<WalletMutationResult> {
        validate_amount("card balance", command.new_balance)?;
        if command.new_balance < 0.0 {
            return Err(DomainError::validation("card balance must not be negative"));
        }

        self.mutate(&command.user_id, |account| {
            let card = account.card_mut(&command.card_id).ok_or_else(|| {
                DomainError::not_found(format!(
                    "card {} for user {}",
                    command.card_id, command.user_id
                ))
            })?;
            let delta = command.new_balance - card.balance;
            card.balance = command.new_balance;

            if delta != 0.0 {
                Ok(vec![PendingEntry {
                    delta,
                    payment_method: PaymentMethod::Card,
                    category: command
                        .category
                        .clone()
                        .unwrap_or_else(|| "Card Balance Update".to_string()),
                    description: None,
                }])
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Reconciliation escape hatch: recompute cash from the full ledger
    /// (clamped at zero) and optionally drop all cards. Emits no ledger
    /// entry itself, so it is idempotent.
    pub fn sync_with_transactions(
        &self,
        command: SyncWithTransactionsCommand,
    ) -> DomainResult<WalletMutationResult> {
        let transactions = self.ledger.all_for_user(&command.user_id)?;
        let derived: f64 = transactions.iter().map(Transaction::signed_amount).sum();
        let recomputed = derived.max(0.0);

        self.mutate(&command.user_id, |account| {
            info!(
                "Syncing wallet for user {}: cash {:.2} -> {:.2}",
                command.user_id, account.cash_amount, recomputed
            );
            account.cash_amount = recomputed;
            if command.reset_cards {
                account.cards.clear();
            }
            Ok(Vec::new())
        })
    }

    pub fn verify_pin(&self, command: VerifyPinCommand) -> DomainResult<VerifyPinResult> {
        let account = self.load(&command.user_id)?;
        Ok(VerifyPinResult {
            valid: self.pin_hasher.verify(&command.pin, &account.pin_hash),
            must_change: account.pin_must_change,
        })
    }

    pub fn update_pin(&self, command: UpdatePinCommand) -> DomainResult<WalletMutationResult> {
        if command.new_pin.len() < 4 {
            return Err(DomainError::validation(
                "new PIN must be at least 4 characters",
            ));
        }

        self.mutate(&command.user_id, |account| {
            if !self.pin_hasher.verify(&command.current_pin, &account.pin_hash) {
                return Err(DomainError::validation("current PIN is incorrect"));
            }
            account.pin_hash = self.pin_hasher.hash(&command.new_pin);
            account.pin_must_change = false;
            Ok(Vec::new())
        })
    }

    /// Diagnostic: report drift between the stored cash balance and the
    /// transaction-derived balance. An account mutated through unaudited
    /// `set_cash` calls will show up here.
    pub fn validate_ledger(&self, user_id: &str) -> DomainResult<Vec<String>> {
        let account = self.load(user_id)?;
        let transactions = self.ledger.all_for_user(user_id)?;
        let derived: f64 = transactions.iter().map(Transaction::signed_amount).sum();

        let mut findings = Vec::new();
        if (account.cash_amount - derived.max(0.0)).abs() > 0.001 {
            let finding = format!(
                "cash balance {:.2} differs from transaction-derived balance {:.2}",
                account.cash_amount,
                derived.max(0.0)
            );
            warn!("Ledger drift for user {}: {}", user_id, finding);
            findings.push(finding);
        }
        Ok(findings)
    }

    pub fn get_account(&self, user_id: &str) -> DomainResult<WalletAccount> {
        self.load(user_id)
    }

    fn load(&self, user_id: &str) -> DomainResult<WalletAccount> {
        self.wallets
            .find_by_user(user_id)?
            .ok_or_else(|| DomainError::not_found(format!("wallet account for user {}", user_id)))
    }

    /// Run one read-modify-write cycle, retrying on optimistic-lock
    /// conflicts. Ledger entries produced by the closure are appended only
    /// after the account save succeeded.
    fn mutate<F>(&self, user_id: &str, mut apply: F) -> DomainResult<WalletMutationResult>
    where
        F: FnMut(&mut WalletAccount) -> DomainResult<Vec<PendingEntry>>,
    {
        for attempt in 0..=self.config.save_retries {
            let mut account = self.load(user_id)?;
            let pending = apply(&mut account)?;
            account.version += 1;
            account.updated_at = now_rfc3339();

            if self.wallets.save(&account)? {
                let mut recorded = Vec::new();
                for entry in pending {
                    if let Some(transaction) = self.ledger.synthesize(
                        user_id,
                        entry.delta,
                        entry.payment_method,
                        entry.category,
                        entry.description,
                    )? {
                        recorded.push(transaction);
                    }
                }
                return Ok(WalletMutationResult { account, recorded });
            }

            warn!(
                "Save conflict for user {} (attempt {}), retrying with fresh read",
                user_id,
                attempt + 1
            );
        }
        Err(DomainError::ConcurrencyConflict(format!(
            "wallet for user {} kept changing underneath us",
            user_id
        )))
    }
}

fn validate_amount(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!(
            "{} must be a finite number",
            field
        )));
    }
    Ok(())
}
