//! Domain layer: models, commands, and the services that implement the
//! ledger, wallet, forecasting, and goal behavior on top of the storage
//! traits.

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod commands;
pub mod errors;
pub mod forecast_service;
pub mod goal_service;
pub mod ledger;
pub mod models;
pub mod monthly;
pub mod pin;
pub mod wallet_service;

pub use errors::{DomainError, DomainResult};
pub use forecast_service::{ClockVariation, FixedVariation, ForecastEngine, VariationSource};
pub use goal_service::GoalService;
pub use ledger::LedgerSynchronizer;
pub use wallet_service::WalletService;

/// Current time in the machine's local offset.
pub(crate) fn now_fixed() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Current time as an RFC 3339 string, used for `created_at`/`updated_at`.
pub(crate) fn now_rfc3339() -> String {
    now_fixed().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Milliseconds since the Unix epoch, used for generated IDs.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
