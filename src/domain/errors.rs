//! Error taxonomy for the wallet ledger core.
//!
//! Storage layers report plain `anyhow::Result`; everything crossing the
//! service boundary is folded into `DomainError` so callers can branch on the
//! failure class without string matching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing, negative or otherwise invalid input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Account, card or goal absent. 404-equivalent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Fewer than the minimum qualifying historical transactions exist in
    /// the lookback window. A normal "cannot predict yet" outcome.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// An optimistic-lock mismatch persisted across the bounded retry
    /// budget. The caller may retry the whole operation with a fresh read.
    #[error("concurrent modification conflict: {0}")]
    ConcurrencyConflict(String),

    /// The backing store failed. Logged by the service, surfaced as a
    /// generic failure envelope, never silently swallowed.
    #[error("storage failure: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
