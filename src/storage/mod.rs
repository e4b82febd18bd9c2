//! Storage layer: trait contracts plus the file-backed reference backend.

pub mod csv;
pub mod traits;

pub use traits::{Connection, GoalStore, TransactionFilter, TransactionStore, WalletStore};
