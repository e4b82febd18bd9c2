//! Domain model for a ledger transaction.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Convert to string for CSV storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parse from string for CSV loading
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// A single entry in a user's append-only ledger.
///
/// `amount` is always non-negative; the direction of the money movement is
/// carried by `transaction_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<FixedOffset>,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl Transaction {
    /// Generate a unique transaction ID based on type and current timestamp.
    /// Format: <in|ex>-<timestamp_ms>-<random_suffix>
    /// Example: in-1625846400123-af3c
    pub fn generate_id(transaction_type: TransactionType, timestamp_ms: u64) -> String {
        let prefix = match transaction_type {
            TransactionType::Income => "in",
            TransactionType::Expense => "ex",
        };
        let random_suffix = generate_random_suffix(4);
        format!("{}-{}-{}", prefix, timestamp_ms, random_suffix)
    }

    /// Parse a transaction ID to extract its type prefix and timestamp.
    pub fn parse_id(id: &str) -> Result<(&str, u64), String> {
        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() != 3 {
            return Err(format!("Invalid transaction ID format: {}", id));
        }
        let prefix = parts[0];
        let timestamp = parts[1]
            .parse::<u64>()
            .map_err(|_| format!("Invalid timestamp in ID: {}", parts[1]))?;
        Ok((prefix, timestamp))
    }

    /// Amount with the sign implied by the transaction type.
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Generate a random hex suffix for generated IDs.
pub(crate) fn generate_random_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_parse_id() {
        let id = Transaction::generate_id(TransactionType::Income, 1625846400123);
        assert!(id.starts_with("in-1625846400123-"));

        let (prefix, timestamp) = Transaction::parse_id(&id).unwrap();
        assert_eq!(prefix, "in");
        assert_eq!(timestamp, 1625846400123);
    }

    #[test]
    fn test_parse_id_rejects_malformed() {
        assert!(Transaction::parse_id("nonsense").is_err());
        assert!(Transaction::parse_id("in-notanumber-af3c").is_err());
    }

    #[test]
    fn test_signed_amount() {
        let mut tx = Transaction {
            id: "ex-1-0000".to_string(),
            user_id: "u1".to_string(),
            transaction_type: TransactionType::Expense,
            amount: 42.0,
            category: "Food".to_string(),
            date: chrono::DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z").unwrap(),
            payment_method: PaymentMethod::Cash,
            description: None,
            notes: None,
        };
        assert_eq!(tx.signed_amount(), -42.0);
        tx.transaction_type = TransactionType::Income;
        assert_eq!(tx.signed_amount(), 42.0);
    }
}
