//! # Wallet Ledger & Forecast Engine
//!
//! Core of a personal-finance backend: a per-user wallet (cash plus cards)
//! kept consistent with an append-only transaction ledger, plus spending
//! forecasts and savings-goal projections derived from that ledger.
//!
//! Balance mutations flow through [`domain::WalletService`], which mirrors
//! every significant delta into the ledger so the transaction history stays
//! a faithful audit trail of the balances. Forecasting
//! ([`domain::ForecastEngine`]) and goal projection
//! ([`domain::GoalService`]) are read-only consumers of that history.
//!
//! Storage is abstracted behind the traits in [`storage::traits`]; the
//! crate ships a file-backed reference backend
//! ([`storage::csv::CsvConnection`]). [`WalletBackend`] wires the services
//! over one connection and exposes every operation through the
//! [`api::ApiResponse`] envelope.
//!
//! ```no_run
//! use wallet_ledger::{WalletBackend, WalletConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let backend = WalletBackend::open("./data", WalletConfig::new("4821"))?;
//! let response = backend.ensure_account("alice");
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod domain;
pub mod storage;

pub use api::ApiResponse;
pub use config::WalletConfig;
pub use domain::{DomainError, DomainResult};
pub use storage::csv::CsvConnection;

use domain::forecast_service::VariationSource;
use domain::pin::PinHasher;
use domain::{ForecastEngine, GoalService, LedgerSynchronizer, WalletService};
use storage::traits::Connection;

/// All services wired over one storage connection.
pub struct WalletBackend<C: Connection> {
    wallet: WalletService<C>,
    ledger: LedgerSynchronizer<C>,
    forecast: ForecastEngine<C>,
    goals: GoalService<C>,
}

impl<C: Connection> WalletBackend<C> {
    pub fn new(connection: Arc<C>, config: WalletConfig) -> Self {
        Self {
            wallet: WalletService::new(connection.clone(), config.clone()),
            ledger: LedgerSynchronizer::new(connection.clone()),
            forecast: ForecastEngine::new(connection.clone(), config.clone()),
            goals: GoalService::new(connection, config),
        }
    }

    /// Like [`WalletBackend::new`], with the PIN hasher and forecast
    /// variation source swapped out. Mainly for tests and embedders with
    /// their own hashing policy.
    pub fn with_components(
        connection: Arc<C>,
        config: WalletConfig,
        pin_hasher: Arc<dyn PinHasher>,
        variation: Arc<dyn VariationSource>,
    ) -> Self {
        Self {
            wallet: WalletService::with_pin_hasher(
                connection.clone(),
                config.clone(),
                pin_hasher,
            ),
            ledger: LedgerSynchronizer::new(connection.clone()),
            forecast: ForecastEngine::with_variation(
                connection.clone(),
                config.clone(),
                variation,
            ),
            goals: GoalService::new(connection, config),
        }
    }
}

impl WalletBackend<CsvConnection> {
    /// Open (creating if needed) a file-backed backend rooted at
    /// `base_directory`.
    pub fn open(base_directory: impl AsRef<Path>, config: WalletConfig) -> anyhow::Result<Self> {
        let connection = CsvConnection::new(base_directory)?;
        Ok(Self::new(Arc::new(connection), config))
    }
}
