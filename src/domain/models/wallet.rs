//! Domain models for the wallet aggregate: one account per user holding a
//! cash balance and any number of card sub-accounts.
use serde::{Deserialize, Serialize};

use super::transaction::generate_random_suffix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Debit,
    Credit,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Debit => "debit",
            CardType::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(CardType::Debit),
            "credit" => Ok(CardType::Credit),
            _ => Err(format!("Invalid card type: {}", s)),
        }
    }
}

/// A card held inside a wallet. Removal is structural: the card entry is
/// dropped from the owning wallet, not soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAccount {
    pub id: String,
    pub number: String,
    pub holder_name: String,
    pub expiry: String,
    /// Write-only secret; excluded from API-facing serialization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cvv: String,
    pub card_type: CardType,
    pub balance: f64,
    pub color_tag: Option<String>,
    pub is_default: bool,
}

impl CardAccount {
    /// Generate a unique card ID.
    /// Format: card-<timestamp_ms>-<random_suffix>
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("card-{}-{}", timestamp_ms, generate_random_suffix(4))
    }

    /// Card number with everything but the last four digits masked.
    pub fn masked_number(&self) -> String {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() <= 4 {
            return digits;
        }
        let tail: String = digits.chars().skip(digits.len() - 4).collect();
        format!("****{}", tail)
    }
}

/// The wallet aggregate for a single user.
///
/// `version` is a monotonically increasing write counter used for optimistic
/// concurrency control: every mutation bumps it by one, and the store refuses
/// a save whose predecessor version does not match what is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub user_id: String,
    pub cash_amount: f64,
    pub cards: Vec<CardAccount>,
    /// Salted digest of the wallet PIN; plaintext is never stored.
    pub pin_hash: String,
    /// True until the owner replaces the configured default PIN.
    pub pin_must_change: bool,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl WalletAccount {
    /// Sum of all card balances.
    pub fn cards_total(&self) -> f64 {
        self.cards.iter().map(|card| card.balance).sum()
    }

    /// Cash plus all card balances. Always computed on read, never cached.
    pub fn total_balance(&self) -> f64 {
        self.cash_amount + self.cards_total()
    }

    pub fn card(&self, card_id: &str) -> Option<&CardAccount> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut CardAccount> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, balance: f64) -> CardAccount {
        CardAccount {
            id: id.to_string(),
            number: "4111111111111111".to_string(),
            holder_name: "Test Holder".to_string(),
            expiry: "12/28".to_string(),
            cvv: "123".to_string(),
            card_type: CardType::Debit,
            balance,
            color_tag: None,
            is_default: false,
        }
    }

    #[test]
    fn test_total_balance_is_cash_plus_cards() {
        let account = WalletAccount {
            user_id: "u1".to_string(),
            cash_amount: 1000.0,
            cards: vec![card("c1", 500.0), card("c2", 250.0)],
            pin_hash: "digest".to_string(),
            pin_must_change: true,
            version: 1,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(account.cards_total(), 750.0);
        assert_eq!(account.total_balance(), 1750.0);
    }

    #[test]
    fn test_masked_number_keeps_last_four() {
        let c = card("c1", 0.0);
        assert_eq!(c.masked_number(), "****1111");
    }
}
