//! Engine configuration.
//!
//! Everything the original system buried in globals (the wallet default PIN
//! in particular) is injected here instead. There is no baked-in default
//! secret: constructing a config requires the host to pick one explicitly.

#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// PIN assigned to accounts created by `ensure_account`. Accounts keep
    /// `pin_must_change = true` until the owner replaces it.
    pub default_pin: String,
    /// How far back (in calendar months) forecasting and projection look.
    pub lookback_months: u32,
    /// How many trailing monthly points the moving average uses.
    pub window: usize,
    /// Minimum qualifying transactions before a forecast is attempted.
    pub min_samples: usize,
    /// How many times a wallet read-modify-write is retried on an
    /// optimistic-lock conflict before giving up.
    pub save_retries: u32,
}

impl WalletConfig {
    pub fn new(default_pin: impl Into<String>) -> Self {
        Self {
            default_pin: default_pin.into(),
            lookback_months: 12,
            window: 3,
            min_samples: 3,
            save_retries: 3,
        }
    }
}
