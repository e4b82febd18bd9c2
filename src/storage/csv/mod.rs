//! # File-Backed Storage
//!
//! Reference storage backend for the wallet ledger. The append-only
//! transaction log and the goal list are plain CSV files; the wallet
//! aggregate (nested card list, version counter) is a JSON document.
//! All of it lives under one base data directory, one subdirectory per user.
//!
//! The same `Connection` trait can be implemented over a database without
//! touching the domain layer.

pub mod connection;
pub mod goal_repository;
pub mod transaction_repository;
pub mod wallet_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use goal_repository::GoalRepository;
pub use transaction_repository::TransactionRepository;
pub use wallet_repository::WalletRepository;
